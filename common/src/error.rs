//! # Error Taxonomy
//!
//! Only conditions that must abort a scan are modelled here. Refused
//! connections, timeouts and unmatched probes are *results*, never errors, and
//! are absorbed by the component that observed them.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures while turning a [`Target`](crate::network::target::Target) into an address.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("failed to resolve '{target}': {source}")]
    Resolution {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("'{target}' did not resolve to any address")]
    NoAddress { target: String },
}

/// Problems with the configuration file or the merged profile.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Problems while building the vulnerability rule table.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rule '{rule}' has an invalid pattern: {source}")]
    Pattern {
        rule: String,
        #[source]
        source: regex::Error,
    },

    #[error("rule '{rule}': {reason}")]
    Invalid { rule: String, reason: String },

    #[error("cannot read rule file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed rule file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// A scan-level failure. Any of these aborts the run and discards partial results.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Rules(#[from] RuleError),

    #[error("scan interrupted by user")]
    Interrupted,
}

impl ScanError {
    pub fn is_interrupt(&self) -> bool {
        matches!(self, Self::Interrupted)
    }
}
