//! Shared building blocks for the sonar workspace.
//!
//! Everything here is free of scanning logic: the records the pipeline produces,
//! the validated configuration it consumes, the error taxonomy and the target model.

pub mod config;
pub mod error;
pub mod log;
pub mod models;
pub mod network;

#[doc(hidden)]
pub use tracing;
