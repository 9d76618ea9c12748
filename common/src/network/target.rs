//! # Scan Target Model
//!
//! A target is the single host a scan is aimed at. It can be:
//! * An IPv4 or IPv6 literal (e.g., `192.168.1.5`, `::1`).
//! * A hostname (e.g., `scanme.example.org`), resolved lazily.
//!
//! Resolution is the only way a target can fail a scan; everything downstream
//! works on the resolved [`IpAddr`].

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::NetworkError;

/// The host a scan is aimed at. Immutable for the duration of a scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// A literal address, no lookup needed.
    Addr { addr: IpAddr },
    /// A DNS name that still has to be resolved.
    Hostname { name: String },
}

impl Target {
    /// Resolves the target to a single address.
    ///
    /// IPv4 results are preferred over IPv6 ones when a name has both, since
    /// the TTL heuristic only speaks IPv4.
    pub async fn resolve(&self) -> Result<IpAddr, NetworkError> {
        let name = match self {
            Target::Addr { addr } => return Ok(*addr),
            Target::Hostname { name } => name,
        };

        let addrs: Vec<SocketAddr> = tokio::net::lookup_host((name.as_str(), 0))
            .await
            .map_err(|source| NetworkError::Resolution {
                target: name.clone(),
                source,
            })?
            .collect();

        addrs
            .iter()
            .find(|sock| sock.is_ipv4())
            .or_else(|| addrs.first())
            .map(|sock| sock.ip())
            .ok_or_else(|| NetworkError::NoAddress {
                target: name.clone(),
            })
    }
}

impl From<IpAddr> for Target {
    fn from(addr: IpAddr) -> Self {
        Target::Addr { addr }
    }
}

impl FromStr for Target {
    type Err = String;

    /// Parses a string into a `Target`.
    ///
    /// Supported formats:
    /// * **Address**: IPv4/IPv6 literal, optionally bracketed (`[::1]`).
    /// * **Hostname**: dot-separated labels of letters, digits and hyphens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if let Some(target) = parse_addr(s) {
            return Ok(target);
        }

        if let Some(target) = parse_hostname(s) {
            return Ok(target);
        }

        Err(format!("invalid target: {s}"))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Addr { addr } => write!(f, "{addr}"),
            Target::Hostname { name } => write!(f, "{name}"),
        }
    }
}

impl Serialize for Target {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parses a single IP address, accepting the bracketed IPv6 form.
fn parse_addr(s: &str) -> Option<Target> {
    let unbracketed = s
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(s);

    unbracketed
        .parse::<IpAddr>()
        .ok()
        .map(|addr| Target::Addr { addr })
}

/// Parses a DNS name following the RFC 1123 label rules.
fn parse_hostname(s: &str) -> Option<Target> {
    let name = s.strip_suffix('.').unwrap_or(s);
    if name.is_empty() || name.len() > 253 {
        return None;
    }

    // An all-numeric dotted string is a malformed address, not a name.
    if name.split('.').all(|label| label.chars().all(|c| c.is_ascii_digit())) {
        return None;
    }

    let valid = name.split('.').all(is_valid_label);
    valid.then(|| Target::Hostname {
        name: name.to_ascii_lowercase(),
    })
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= 63
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
