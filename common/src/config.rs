//! # Configuration
//!
//! Two layers live here:
//! * [`Config`]: per-invocation switches that only affect presentation.
//! * [`ConfigFile`] / [`ScanProfile`]: the YAML file and the validated,
//!   merged profile the scan pipeline consumes.
//!
//! A profile is assembled field by field, later layers winning:
//! built-in defaults, built-in scan-type tweaks, the file's `default`
//! section, the file's section for the chosen scan type.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::ScanType;
use crate::network::range::PortRange;

/// Presentation switches for a single run.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// 0 prints everything, 1 drops decorations, 2 prints only results.
    pub quiet: u8,
    /// Disables the `q` key listener.
    pub disable_input: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortScanConfig {
    #[serde(with = "secs")]
    pub timeout: Duration,
    pub threads: usize,
    pub port_range: PortRange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceDetectionConfig {
    #[serde(with = "secs")]
    pub timeout: Duration,
    pub max_workers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OsDetectionConfig {
    #[serde(with = "secs")]
    pub timeout: Duration,
    /// Port connected to when reading TCP options.
    pub tcp_option_port: u16,
    /// Ports tried, in order, when grepping banners for OS tokens.
    pub banner_ports: Vec<u16>,
}

/// Validated settings for one scan. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanProfile {
    pub port_scan: PortScanConfig,
    pub service_detection: ServiceDetectionConfig,
    pub os_detection: OsDetectionConfig,
    pub enable_vuln_scan: bool,
    /// Rule file replacing the built-in vulnerability rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vuln_rules: Option<PathBuf>,
}

impl ScanProfile {
    /// The profile used when no config file says otherwise.
    pub fn builtin(scan_type: ScanType) -> Self {
        let mut profile = Self {
            port_scan: PortScanConfig {
                timeout: Duration::from_secs(1),
                threads: 50,
                port_range: PortRange::WELL_KNOWN,
            },
            service_detection: ServiceDetectionConfig {
                timeout: Duration::from_secs(2),
                max_workers: 10,
            },
            os_detection: OsDetectionConfig {
                timeout: Duration::from_secs(2),
                tcp_option_port: 80,
                banner_ports: vec![22, 80, 443],
            },
            enable_vuln_scan: false,
            vuln_rules: None,
        };

        match scan_type {
            ScanType::Quick => {}
            ScanType::Full => {
                profile.port_scan.port_range = PortRange::ALL;
                profile.port_scan.threads = 200;
                profile.enable_vuln_scan = true;
            }
            ScanType::Stealth => {
                profile.port_scan.threads = 5;
                profile.port_scan.timeout = Duration::from_secs(3);
                profile.service_detection.max_workers = 2;
            }
        }
        profile
    }
}

/// The on-disk configuration: a `default` section plus one optional section per scan type.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub default: ProfileSection,
    pub quick: Option<ProfileSection>,
    pub full: Option<ProfileSection>,
    pub stealth: Option<ProfileSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileSection {
    pub port_scan: PortScanSection,
    pub service_detection: ServiceDetectionSection,
    pub os_detection: OsDetectionSection,
    pub enable_vuln_scan: Option<bool>,
    pub vuln_rules: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PortScanSection {
    /// Seconds.
    pub timeout: Option<f64>,
    pub threads: Option<usize>,
    pub port_range: Option<(u16, u16)>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceDetectionSection {
    /// Seconds.
    pub timeout: Option<f64>,
    pub max_workers: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OsDetectionSection {
    /// Seconds.
    pub timeout: Option<f64>,
    pub tcp_option_port: Option<u16>,
    pub banner_ports: Option<Vec<u16>>,
}

impl ConfigFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to an empty mapping.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Merges the sections relevant to `scan_type` and validates the outcome.
    pub fn profile(&self, scan_type: ScanType) -> Result<ScanProfile, ConfigError> {
        let mut profile = ScanProfile::builtin(scan_type);
        self.default.apply(&mut profile)?;

        let specific = match scan_type {
            ScanType::Quick => self.quick.as_ref(),
            ScanType::Full => self.full.as_ref(),
            ScanType::Stealth => self.stealth.as_ref(),
        };
        if let Some(section) = specific {
            section.apply(&mut profile)?;
        }

        Ok(profile)
    }
}

impl ProfileSection {
    fn apply(&self, profile: &mut ScanProfile) -> Result<(), ConfigError> {
        let ps = &self.port_scan;
        if let Some(secs) = ps.timeout {
            profile.port_scan.timeout = to_timeout("port_scan.timeout", secs)?;
        }
        if let Some(threads) = ps.threads {
            profile.port_scan.threads = to_workers("port_scan.threads", threads)?;
        }
        if let Some(pair) = ps.port_range {
            profile.port_scan.port_range = PortRange::try_from(pair)
                .map_err(|reason| ConfigError::invalid("port_scan.port_range", reason))?;
        }

        let sd = &self.service_detection;
        if let Some(secs) = sd.timeout {
            profile.service_detection.timeout = to_timeout("service_detection.timeout", secs)?;
        }
        if let Some(workers) = sd.max_workers {
            profile.service_detection.max_workers =
                to_workers("service_detection.max_workers", workers)?;
        }

        let od = &self.os_detection;
        if let Some(secs) = od.timeout {
            profile.os_detection.timeout = to_timeout("os_detection.timeout", secs)?;
        }
        if let Some(port) = od.tcp_option_port {
            profile.os_detection.tcp_option_port = to_port("os_detection.tcp_option_port", port)?;
        }
        if let Some(ports) = &od.banner_ports {
            profile.os_detection.banner_ports = ports
                .iter()
                .map(|port| to_port("os_detection.banner_ports", *port))
                .collect::<Result<_, _>>()?;
        }

        if let Some(enabled) = self.enable_vuln_scan {
            profile.enable_vuln_scan = enabled;
        }
        if let Some(path) = &self.vuln_rules {
            profile.vuln_rules = Some(path.clone());
        }
        Ok(())
    }
}

fn to_timeout(field: &str, secs: f64) -> Result<Duration, ConfigError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ConfigError::invalid(field, format!("{secs} is not a positive number of seconds")));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| ConfigError::invalid(field, e.to_string()))
}

fn to_workers(field: &str, count: usize) -> Result<usize, ConfigError> {
    if count == 0 {
        return Err(ConfigError::invalid(field, "at least one worker is required"));
    }
    Ok(count)
}

fn to_port(field: &str, port: u16) -> Result<u16, ConfigError> {
    if port == 0 {
        return Err(ConfigError::invalid(field, "port 0 is not scannable"));
    }
    Ok(port)
}

mod secs {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
