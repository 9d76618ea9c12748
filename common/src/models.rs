//! # Scan Records
//!
//! The shapes the pipeline hands to its collaborators. Report writers consume
//! these verbatim, so nothing format-specific belongs here.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ScanProfile;
use crate::network::target::Target;

/// Service name recorded when no signature matched.
pub const UNKNOWN_SERVICE: &str = "unknown";

/// Longest banner kept on a [`ServiceResult`], in bytes.
pub const BANNER_LIMIT: usize = 100;

/// Best guess for what listens on one open port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceResult {
    pub port: u16,
    pub service: String,
    pub banner: String,
}

impl ServiceResult {
    /// Builds a result from the raw response that triggered the match.
    pub fn matched(port: u16, service: &str, response: &[u8]) -> Self {
        Self {
            port,
            service: service.to_string(),
            banner: banner_text(response),
        }
    }

    pub fn unknown(port: u16) -> Self {
        Self {
            port,
            service: UNKNOWN_SERVICE.to_string(),
            banner: String::new(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.service == UNKNOWN_SERVICE
    }
}

/// Truncates a raw response to [`BANNER_LIMIT`] bytes and decodes it,
/// dropping whatever is not valid UTF-8.
pub fn banner_text(response: &[u8]) -> String {
    let head = &response[..response.len().min(BANNER_LIMIT)];
    String::from_utf8_lossy(head)
        .chars()
        .filter(|c| *c != char::REPLACEMENT_CHARACTER)
        .collect()
}

/// One heuristic's opinion about the remote operating system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsGuess {
    pub os_name: String,
    pub os_version: Option<String>,
    pub confidence: u8,
}

impl OsGuess {
    pub fn new(os_name: impl Into<String>, confidence: u8) -> Self {
        Self {
            os_name: os_name.into(),
            os_version: None,
            confidence: confidence.min(100),
        }
    }

    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.os_version = version;
        self
    }
}

/// The winning OS guess of a fingerprinting run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsInfo {
    pub os_name: String,
    pub os_version: Option<String>,
    pub confidence: u8,
}

impl From<OsGuess> for OsInfo {
    fn from(guess: OsGuess) -> Self {
        Self {
            os_name: guess.os_name,
            os_version: guess.os_version,
            confidence: guess.confidence,
        }
    }
}

/// Running best guess across heuristics.
///
/// Starts empty at confidence 0. A guess replaces the held one wholesale only
/// when its confidence is strictly greater, so the held confidence never drops.
#[derive(Debug, Default)]
pub struct OsAccumulator {
    best: Option<OsGuess>,
}

impl OsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confidence(&self) -> u8 {
        self.best.as_ref().map_or(0, |guess| guess.confidence)
    }

    /// Offers a guess; returns whether it replaced the held one.
    pub fn offer(&mut self, guess: OsGuess) -> bool {
        if guess.confidence > self.confidence() {
            self.best = Some(guess);
            true
        } else {
            false
        }
    }

    pub fn finish(self) -> Option<OsInfo> {
        self.best.map(OsInfo::from)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(label)
    }
}

/// Which piece of evidence a finding was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingKind {
    Service,
    Os,
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingKind::Service => f.write_str("service"),
            FindingKind::Os => f.write_str("os"),
        }
    }
}

/// A correlation-rule hit. Never produced without matching evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vulnerability {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(rename = "type")]
    pub kind: FindingKind,
    pub vulnerability: String,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

/// Named configuration profiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanType {
    #[default]
    Quick,
    Full,
    Stealth,
}

impl ScanType {
    pub const ALL: [ScanType; 3] = [ScanType::Quick, ScanType::Full, ScanType::Stealth];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanType::Quick => "quick",
            ScanType::Full => "full",
            ScanType::Stealth => "stealth",
        }
    }
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScanType::ALL
            .into_iter()
            .find(|ty| ty.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown scan type '{s}' (expected quick, full or stealth)"))
    }
}

/// Snapshot of how a run was configured, taken once when the scan starts.
#[derive(Debug, Clone, Serialize)]
pub struct ScanMetadata {
    pub target: Target,
    pub scan_type: ScanType,
    pub timestamp: DateTime<Utc>,
    pub config: ScanProfile,
}

impl ScanMetadata {
    pub fn new(target: Target, scan_type: ScanType, config: ScanProfile) -> Self {
        Self {
            target,
            scan_type,
            timestamp: Utc::now(),
            config,
        }
    }
}

/// Aggregate output of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    /// Open ports, ascending and duplicate-free.
    pub ports: Vec<u16>,
    /// One entry per open port, sorted by port.
    pub services: Vec<ServiceResult>,
    pub os_info: Option<OsInfo>,
    /// Present only when vulnerability correlation actually ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vulnerabilities: Option<Vec<Vulnerability>>,
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
