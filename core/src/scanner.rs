//! The scan **orchestrator**.
//!
//! Runs the four phases in a fixed order, each one consuming the complete
//! output of the previous one:
//!
//! ```text
//! PortScan ─► ServiceDetect ─► OsFingerprint ─► VulnCorrelate
//! ```
//!
//! The target is resolved once, at the start of the port scan, and every phase
//! works against that one address.
//!
//! Service detection is skipped when no port is open, and correlation is
//! skipped unless the profile enables it and at least one service was found.
//! The interrupt is checked after every phase; a triggered interrupt, like any
//! other phase failure, aborts the run and discards partial results.

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use sonar_common::config::ScanProfile;
use sonar_common::error::ScanError;
use sonar_common::models::{ScanMetadata, ScanResult, ScanType};
use sonar_common::network::target::Target;
use sonar_common::{error, info, success, warn};
use tracing::{Instrument, debug, info_span};

use crate::fingerprint::OsFingerprinter;
use crate::interrupt::Interrupt;
use crate::ports::PortProber;
use crate::services::ServiceIdentifier;
use crate::vuln::{RuleTable, correlate_vulnerabilities};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    PortScan,
    ServiceDetect,
    OsFingerprint,
    VulnCorrelate,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::PortScan => "port scan",
            Phase::ServiceDetect => "service detection",
            Phase::OsFingerprint => "OS fingerprinting",
            Phase::VulnCorrelate => "vulnerability correlation",
        };
        f.write_str(label)
    }
}

/// Progress notifications for whoever drives the scan (spinners, logs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanEvent {
    PhaseStarted(Phase),
    Resolved(IpAddr),
    PortOpen(u16),
}

pub type EventHook = Arc<dyn Fn(ScanEvent) + Send + Sync>;

pub struct Scanner {
    target: Target,
    profile: ScanProfile,
    metadata: ScanMetadata,
    rules: RuleTable,
    interrupt: Interrupt,
    on_event: Option<EventHook>,
}

impl Scanner {
    /// Prepares a run. Loads the vulnerability rules up front when correlation
    /// is enabled so a broken rule file fails before any packet is sent.
    pub fn new(target: Target, scan_type: ScanType, profile: ScanProfile) -> Result<Self, ScanError> {
        let rules = match (&profile.vuln_rules, profile.enable_vuln_scan) {
            (_, false) => RuleTable::default(),
            (Some(path), true) => RuleTable::load(path)?,
            (None, true) => RuleTable::builtin()?,
        };

        Ok(Self {
            metadata: ScanMetadata::new(target.clone(), scan_type, profile.clone()),
            target,
            profile,
            rules,
            interrupt: Interrupt::new(),
            on_event: None,
        })
    }

    pub fn with_rules(mut self, rules: RuleTable) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn on_event(mut self, hook: EventHook) -> Self {
        self.on_event = Some(hook);
        self
    }

    pub fn interrupt(&self) -> Interrupt {
        self.interrupt.clone()
    }

    pub fn metadata(&self) -> &ScanMetadata {
        &self.metadata
    }

    pub async fn run(&self) -> Result<ScanResult, ScanError> {
        let span = info_span!("scan", host = %self.target, scan_type = %self.metadata.scan_type);
        match self.execute().instrument(span).await {
            Ok(result) => Ok(result),
            Err(e) if e.is_interrupt() => {
                warn!("Scan of {} interrupted, discarding partial results", self.target);
                Err(e)
            }
            Err(e) => {
                error!("Scan of {} failed: {e}", self.target);
                Err(e)
            }
        }
    }

    async fn execute(&self) -> Result<ScanResult, ScanError> {
        let profile = &self.profile;
        let mut result = ScanResult::default();
        info!("Starting {} scan of {}", self.metadata.scan_type, self.target);

        self.enter(Phase::PortScan);
        let addr = self.target.resolve().await?;
        debug!("{} resolved to {addr}", self.target);
        self.emit(ScanEvent::Resolved(addr));

        let mut prober = PortProber::from_config(&profile.port_scan).with_interrupt(self.interrupt());
        if let Some(hook) = self.on_event.clone() {
            prober = prober.on_open(Arc::new(move |port| hook(ScanEvent::PortOpen(port))));
        }
        result.ports = prober.scan_addr(addr, profile.port_scan.port_range).await;
        self.interrupt.check()?;
        info!("{} open ports", result.ports.len());

        if result.ports.is_empty() {
            debug!("No open ports, skipping {}", Phase::ServiceDetect);
        } else {
            self.enter(Phase::ServiceDetect);
            result.services = ServiceIdentifier::from_config(&profile.service_detection)
                .with_interrupt(self.interrupt())
                .detect_addr(addr, &result.ports)
                .await;
            self.interrupt.check()?;
            let identified = result.services.iter().filter(|s| !s.is_unknown()).count();
            info!("{identified} of {} services identified", result.services.len());
        }

        self.enter(Phase::OsFingerprint);
        result.os_info = OsFingerprinter::from_config(&profile.os_detection)
            .with_interrupt(self.interrupt())
            .detect_addr(addr)
            .await;
        self.interrupt.check()?;
        match &result.os_info {
            Some(os) => info!("OS looks like {} ({}% confidence)", os.os_name, os.confidence),
            None => info!("Could not determine the OS"),
        }

        if profile.enable_vuln_scan && !result.services.is_empty() {
            self.enter(Phase::VulnCorrelate);
            let findings = correlate_vulnerabilities(
                &self.target,
                &result.services,
                result.os_info.as_ref(),
                &self.rules,
            );
            info!("{} potential vulnerabilities", findings.len());
            result.vulnerabilities = Some(findings);
        }

        success!("Scan of {} complete", self.target);
        Ok(result)
    }

    fn enter(&self, phase: Phase) {
        debug!("Entering {phase}");
        self.emit(ScanEvent::PhaseStarted(phase));
    }

    fn emit(&self, event: ScanEvent) {
        if let Some(hook) = &self.on_event {
            hook(event);
        }
    }
}

/// Runs every phase against `target` with `profile`.
pub async fn run_scan(target: &Target, profile: &ScanProfile) -> Result<ScanResult, ScanError> {
    Scanner::new(target.clone(), ScanType::default(), profile.clone())?
        .run()
        .await
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
