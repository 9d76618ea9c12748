#![cfg(test)]
use std::time::Duration;

use sonar_common::config::ScanProfile;
use sonar_common::error::ScanError;
use sonar_common::models::{FindingKind, ScanType};
use sonar_common::network::range::PortRange;
use sonar_core::{Interrupt, Scanner, run_scan};

use crate::support::{closed_port, greeter, localhost};

/// Quick profile aimed at a single localhost port, with short timeouts.
fn profile_for(port: u16, vuln_scan: bool) -> ScanProfile {
    let mut profile = ScanProfile::builtin(ScanType::Quick);
    profile.port_scan.port_range = PortRange::single(port).unwrap();
    profile.port_scan.timeout = Duration::from_millis(300);
    profile.service_detection.timeout = Duration::from_millis(300);
    profile.os_detection.timeout = Duration::from_millis(300);
    profile.os_detection.tcp_option_port = port;
    profile.os_detection.banner_ports = vec![port];
    profile.enable_vuln_scan = vuln_scan;
    profile
}

#[tokio::test]
async fn scan_without_correlation() {
    let ssh = greeter(b"SSH-2.0-OpenSSH_8.9p1 Ubuntu-3ubuntu0.6\r\n").await;

    let result = run_scan(&localhost(), &profile_for(ssh, false)).await.unwrap();

    assert_eq!(result.ports, vec![ssh]);
    assert_eq!(result.services.len(), 1);
    assert_eq!(result.services[0].service, "ssh");
    let os = result.os_info.expect("banner names the OS");
    assert_eq!(os.os_name, "Linux");
    assert_eq!(result.vulnerabilities, None);
}

#[tokio::test]
async fn old_openssh_is_reported() {
    let ssh = greeter(b"SSH-2.0-OpenSSH_7.4\r\n").await;

    let result = run_scan(&localhost(), &profile_for(ssh, true)).await.unwrap();
    let findings = result.vulnerabilities.expect("correlation ran");

    let hit = findings
        .iter()
        .find(|v| v.vulnerability.contains("CVE-2018-15473"))
        .expect("OpenSSH 7.4 finding");
    assert_eq!(hit.port, Some(ssh));
    assert_eq!(hit.kind, FindingKind::Service);
}

#[tokio::test]
async fn correlation_is_skipped_without_services() {
    let port = closed_port().await;

    let result = run_scan(&localhost(), &profile_for(port, true)).await.unwrap();

    assert!(result.ports.is_empty());
    assert!(result.services.is_empty());
    assert_eq!(result.vulnerabilities, None);
}

#[tokio::test]
async fn interrupted_scan_returns_no_partial_result() {
    let ssh = greeter(b"SSH-2.0-OpenSSH_9.6p1\r\n").await;
    let interrupt = Interrupt::new();
    interrupt.trigger();

    let scanner = Scanner::new(localhost(), ScanType::Quick, profile_for(ssh, false))
        .unwrap()
        .with_interrupt(interrupt);

    assert!(matches!(scanner.run().await, Err(ScanError::Interrupted)));
}
