//! Integration tests that run the pipeline against local mock responders.

#[cfg(test)]
mod support;

mod scan;
