//! Service identification by active probing.
//!
//! Each open port gets one connection. The fixed probe list is sent over it in
//! order and every response is tested against the signature table; the first
//! signature match ends probing for that port.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use sonar_common::config::ServiceDetectionConfig;
use sonar_common::error::NetworkError;
use sonar_common::models::ServiceResult;
use sonar_common::network::target::Target;
use sonar_protocols::probes::SERVICE_PROBES;
use sonar_protocols::signatures::SignatureTable;
use tracing::{debug, trace};

use crate::interrupt::Interrupt;
use crate::network::tcp::{self, Exchange};
use crate::pool;

/// How probing a single port ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Matched(ServiceResult),
    NoMatch,
    ConnectionFailed,
}

impl ProbeOutcome {
    /// Every port yields a record: unmatched and unreachable ones become `unknown`.
    pub fn into_result(self, port: u16) -> ServiceResult {
        match self {
            ProbeOutcome::Matched(result) => result,
            ProbeOutcome::NoMatch | ProbeOutcome::ConnectionFailed => ServiceResult::unknown(port),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceIdentifier {
    timeout: Duration,
    workers: usize,
    signatures: Arc<SignatureTable>,
    interrupt: Interrupt,
}

impl ServiceIdentifier {
    pub fn new(timeout: Duration, workers: usize) -> Self {
        Self {
            timeout,
            workers: workers.max(1),
            signatures: Arc::new(SignatureTable::builtin().clone()),
            interrupt: Interrupt::new(),
        }
    }

    pub fn from_config(config: &ServiceDetectionConfig) -> Self {
        Self::new(config.timeout, config.max_workers)
    }

    pub fn with_signatures(mut self, signatures: SignatureTable) -> Self {
        self.signatures = Arc::new(signatures);
        self
    }

    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Identifies every port in `ports`; the result is sorted by port.
    pub async fn detect(&self, target: &Target, ports: &[u16]) -> Result<Vec<ServiceResult>, NetworkError> {
        if ports.is_empty() {
            return Ok(Vec::new());
        }
        let addr = target.resolve().await?;
        Ok(self.detect_addr(addr, ports).await)
    }

    pub async fn detect_addr(&self, addr: IpAddr, ports: &[u16]) -> Vec<ServiceResult> {
        if ports.is_empty() {
            return Vec::new();
        }
        let workers = self.workers.min(ports.len());
        debug!("Identifying {} services on {addr} with {workers} workers", ports.len());

        let probe_timeout = self.timeout;
        let signatures = Arc::clone(&self.signatures);
        let mut services = pool::run(ports.to_vec().into_iter(), workers, &self.interrupt, move |port| {
            let signatures = Arc::clone(&signatures);
            async move {
                let outcome = probe_port(addr, port, probe_timeout, &signatures).await;
                if outcome == ProbeOutcome::ConnectionFailed {
                    debug!("Port {port} stopped accepting connections, recording it as unknown");
                }
                Some(outcome.into_result(port))
            }
        })
        .await;

        services.sort_by_key(|service| service.port);
        services
    }
}

/// Runs the probe sequence against one port.
pub async fn probe_port(
    addr: IpAddr,
    port: u16,
    probe_timeout: Duration,
    signatures: &SignatureTable,
) -> ProbeOutcome {
    let Some(mut stream) = tcp::connect(SocketAddr::new(addr, port), probe_timeout).await else {
        return ProbeOutcome::ConnectionFailed;
    };

    for probe in &SERVICE_PROBES {
        match tcp::exchange(&mut stream, probe.payload, probe_timeout).await {
            Exchange::Response(response) => {
                if let Some(signature) = signatures.identify(&response) {
                    trace!("Port {port} answered {} with {}", probe.name, signature.name());
                    return ProbeOutcome::Matched(ServiceResult::matched(port, signature.name(), &response));
                }
            }
            Exchange::Closed => break,
            Exchange::Failed => continue,
        }
    }
    ProbeOutcome::NoMatch
}

pub async fn detect_services(
    target: &Target,
    ports: &[u16],
    timeout: Duration,
    workers: usize,
) -> Result<Vec<ServiceResult>, NetworkError> {
    ServiceIdentifier::new(timeout, workers).detect(target, ports).await
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    /// Answers every request on one connection with `reply`.
    async fn echo_server(reply: &'static [u8]) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut conn, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 256];
            while let Ok(n) = conn.read(&mut buf).await {
                if n == 0 || conn.write_all(reply).await.is_err() {
                    break;
                }
            }
        });
        port
    }

    #[tokio::test]
    async fn matches_on_first_probe_response() {
        let port = echo_server(b"HTTP/1.1 200 OK\r\nServer: nginx\r\n\r\n").await;
        let outcome = probe_port(LOCALHOST, port, Duration::from_secs(1), SignatureTable::builtin()).await;

        let ProbeOutcome::Matched(result) = outcome else {
            panic!("expected a match, got {outcome:?}");
        };
        assert_eq!(result.service, "http");
        assert!(result.banner.starts_with("HTTP/1.1 200 OK"));
    }

    #[tokio::test]
    async fn unmatched_responses_exhaust_the_probe_list() {
        let port = echo_server(b"??").await;
        let outcome = probe_port(LOCALHOST, port, Duration::from_millis(500), SignatureTable::builtin()).await;
        assert_eq!(outcome, ProbeOutcome::NoMatch);
        assert_eq!(outcome.into_result(port), ServiceResult::unknown(port));
    }

    #[tokio::test]
    async fn closed_port_is_a_connection_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let outcome = probe_port(LOCALHOST, port, Duration::from_millis(500), SignatureTable::builtin()).await;
        assert_eq!(outcome, ProbeOutcome::ConnectionFailed);
    }

    #[tokio::test]
    async fn every_port_yields_one_sorted_record() {
        let redis = echo_server(b"+PONG\r\n").await;
        let silent = echo_server(b"").await;
        let target = Target::from(LOCALHOST);

        let services = detect_services(&target, &[silent, redis], Duration::from_millis(300), 4)
            .await
            .unwrap();

        assert_eq!(services.len(), 2);
        assert!(services.windows(2).all(|w| w[0].port < w[1].port));
        let redis_result = services.iter().find(|s| s.port == redis).unwrap();
        assert_eq!(redis_result.service, "redis");
        let silent_result = services.iter().find(|s| s.port == silent).unwrap();
        assert!(silent_result.is_unknown());
        assert!(silent_result.banner.is_empty());
    }

    #[tokio::test]
    async fn no_ports_means_no_work() {
        let target = Target::Hostname {
            name: "does-not-exist.invalid".to_string(),
        };
        let services = detect_services(&target, &[], Duration::from_millis(100), 4).await.unwrap();
        assert!(services.is_empty());
    }
}
