//! TCP connect port probing.
//!
//! A port is open iff a full handshake completes within the timeout. Refused,
//! unreachable and timed-out attempts all count as closed and are never errors.

use std::collections::BTreeSet;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use sonar_common::config::PortScanConfig;
use sonar_common::error::NetworkError;
use sonar_common::network::range::PortRange;
use sonar_common::network::target::Target;
use tracing::debug;

use crate::interrupt::Interrupt;
use crate::network::tcp;
use crate::pool;

pub type OpenPortHook = Arc<dyn Fn(u16) + Send + Sync>;

#[derive(Clone)]
pub struct PortProber {
    timeout: Duration,
    workers: usize,
    interrupt: Interrupt,
    on_open: Option<OpenPortHook>,
}

impl PortProber {
    pub fn new(timeout: Duration, workers: usize) -> Self {
        Self {
            timeout,
            workers: workers.max(1),
            interrupt: Interrupt::new(),
            on_open: None,
        }
    }

    pub fn from_config(config: &PortScanConfig) -> Self {
        Self::new(config.timeout, config.threads)
    }

    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Called from worker tasks each time a port answers.
    pub fn on_open(mut self, hook: OpenPortHook) -> Self {
        self.on_open = Some(hook);
        self
    }

    /// Returns the open ports of `range`, ascending and without duplicates.
    pub async fn scan(&self, target: &Target, range: PortRange) -> Result<Vec<u16>, NetworkError> {
        let addr = target.resolve().await?;
        Ok(self.scan_addr(addr, range).await)
    }

    /// Same as [`PortProber::scan`] against an already resolved address.
    pub async fn scan_addr(&self, addr: IpAddr, range: PortRange) -> Vec<u16> {
        let workers = self.workers.min(range.len());
        debug!("Probing {range} on {addr} with {workers} workers");

        let probe_timeout = self.timeout;
        let hook = self.on_open.clone();
        let found = pool::run(range.into_iter(), workers, &self.interrupt, move |port| {
            let hook = hook.clone();
            async move {
                tcp::connect(SocketAddr::new(addr, port), probe_timeout).await?;
                if let Some(hook) = hook {
                    hook(port);
                }
                Some(port)
            }
        })
        .await;

        let open: BTreeSet<u16> = found.into_iter().collect();
        debug!("{} open ports on {addr}", open.len());
        open.into_iter().collect()
    }
}

/// Probes every port of `range` on `target` with at most `workers` concurrent attempts.
pub async fn scan_ports(
    target: &Target,
    range: PortRange,
    timeout: Duration,
    workers: usize,
) -> Result<Vec<u16>, NetworkError> {
    PortProber::new(timeout, workers).scan(target, range).await
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
