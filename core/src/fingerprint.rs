//! # OS Fingerprinting
//!
//! A fixed, ordered list of heuristics runs one after another. Each may
//! produce an [`OsGuess`]; the running best only changes when a later guess is
//! *strictly* more confident. Heuristic failures (no privileges, no reply,
//! closed port) are swallowed and logged at debug level.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use sonar_common::config::OsDetectionConfig;
use sonar_common::error::NetworkError;
use sonar_common::models::{OsAccumulator, OsGuess, OsInfo};
use sonar_common::network::target::Target;
use tracing::debug;

use crate::interrupt::Interrupt;

pub mod banner;
pub mod tcp_option;
pub mod ttl;

pub const DEFAULT_TCP_OPTION_PORT: u16 = 80;
pub const DEFAULT_BANNER_PORTS: [u16; 3] = [22, 80, 443];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Heuristic {
    /// Initial TTL of an ICMP echo reply. Needs raw socket privileges.
    Ttl,
    /// Negotiated maximum segment size of a connection to `port`.
    TcpOption { port: u16 },
    /// OS tokens in the HTTP-style response of the first port that has any.
    Banner { ports: Vec<u16> },
}

impl Heuristic {
    pub fn name(&self) -> &'static str {
        match self {
            Heuristic::Ttl => "ttl",
            Heuristic::TcpOption { .. } => "tcp-option",
            Heuristic::Banner { .. } => "banner",
        }
    }

    pub async fn attempt(&self, addr: IpAddr, timeout: Duration) -> anyhow::Result<Option<OsGuess>> {
        match self {
            Heuristic::Ttl => ttl::attempt(addr, timeout).await,
            Heuristic::TcpOption { port } => tcp_option::attempt(SocketAddr::new(addr, *port), timeout).await,
            Heuristic::Banner { ports } => banner::attempt(addr, ports, timeout).await,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsFingerprinter {
    heuristics: Vec<Heuristic>,
    timeout: Duration,
    interrupt: Interrupt,
}

impl OsFingerprinter {
    /// TTL, then TCP options on port 80, then banners on 22, 80 and 443.
    pub fn new(timeout: Duration) -> Self {
        Self::with_heuristics(
            timeout,
            vec![
                Heuristic::Ttl,
                Heuristic::TcpOption {
                    port: DEFAULT_TCP_OPTION_PORT,
                },
                Heuristic::Banner {
                    ports: DEFAULT_BANNER_PORTS.to_vec(),
                },
            ],
        )
    }

    pub fn from_config(config: &OsDetectionConfig) -> Self {
        Self::with_heuristics(
            config.timeout,
            vec![
                Heuristic::Ttl,
                Heuristic::TcpOption {
                    port: config.tcp_option_port,
                },
                Heuristic::Banner {
                    ports: config.banner_ports.clone(),
                },
            ],
        )
    }

    pub fn with_heuristics(timeout: Duration, heuristics: Vec<Heuristic>) -> Self {
        Self {
            heuristics,
            timeout,
            interrupt: Interrupt::new(),
        }
    }

    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub async fn detect(&self, target: &Target) -> Result<Option<OsInfo>, NetworkError> {
        let addr = target.resolve().await?;
        Ok(self.detect_addr(addr).await)
    }

    pub async fn detect_addr(&self, addr: IpAddr) -> Option<OsInfo> {
        let mut best = OsAccumulator::new();

        for heuristic in &self.heuristics {
            if self.interrupt.is_triggered() {
                break;
            }
            let outcome = heuristic.attempt(addr, self.timeout).await;
            record(&mut best, heuristic.name(), outcome);
        }

        best.finish()
    }
}

/// Folds one heuristic outcome into the running best guess.
fn record(best: &mut OsAccumulator, heuristic: &str, outcome: anyhow::Result<Option<OsGuess>>) {
    match outcome {
        Ok(Some(guess)) => {
            let summary = format!("{} ({}%)", guess.os_name, guess.confidence);
            if best.offer(guess) {
                debug!("{heuristic}: best guess is now {summary}");
            } else {
                debug!("{heuristic}: {summary} does not beat {}%", best.confidence());
            }
        }
        Ok(None) => debug!("{heuristic}: no opinion"),
        Err(e) => debug!("{heuristic}: skipped, {e:#}"),
    }
}

pub async fn detect_os(target: &Target, timeout: Duration) -> Result<Option<OsInfo>, NetworkError> {
    OsFingerprinter::new(timeout).detect(target).await
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
