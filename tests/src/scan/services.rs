#![cfg(test)]
use std::time::Duration;

use sonar_core::detect_services;
use sonar_core::services::ServiceIdentifier;
use sonar_protocols::signatures::{Signature, SignatureTable};

use crate::support::{closed_port, greeter, http_response, localhost, redis_response, serve, silent};

const TIMEOUT: Duration = Duration::from_millis(400);

#[tokio::test]
async fn identifies_ssh_http_and_unknown() {
    let ssh = greeter(b"SSH-2.0-OpenSSH_8.9p1 Ubuntu-3ubuntu0.6\r\n").await;
    let http = serve(None, http_response).await;
    let quiet = silent().await;

    let services = detect_services(&localhost(), &[ssh, http, quiet], TIMEOUT, 3)
        .await
        .unwrap();
    assert_eq!(services.len(), 3);

    let by_port = |port: u16| services.iter().find(|s| s.port == port).unwrap();
    assert_eq!(by_port(ssh).service, "ssh");
    assert!(by_port(ssh).banner.starts_with("SSH-2.0-OpenSSH_8.9p1"));
    assert_eq!(by_port(http).service, "http");
    assert_eq!(by_port(quiet).service, "unknown");
    assert!(by_port(quiet).banner.is_empty());
}

#[tokio::test]
async fn later_probes_reach_the_service() {
    let redis = serve(None, redis_response).await;

    let services = detect_services(&localhost(), &[redis], TIMEOUT, 1).await.unwrap();
    assert_eq!(services[0].service, "redis");
    assert_eq!(services[0].banner, "+PONG\r\n");
}

#[tokio::test]
async fn embedded_ssh_string_wins_over_http() {
    fn confusing(_: &[u8]) -> Option<Vec<u8>> {
        Some(b"HTTP/1.1 200 OK\r\nX-Backend: SSH-2.0-dropbear\r\n\r\n".to_vec())
    }
    let port = serve(None, confusing).await;

    let services = detect_services(&localhost(), &[port], TIMEOUT, 1).await.unwrap();
    assert_eq!(services[0].service, "ssh");

    let http_first = SignatureTable::new(vec![
        Signature::new("http", r"HTTP/\d\.\d").unwrap(),
        Signature::new("ssh", r"SSH-\d\.\d").unwrap(),
    ]);
    let services = ServiceIdentifier::new(TIMEOUT, 1)
        .with_signatures(http_first)
        .detect(&localhost(), &[port])
        .await
        .unwrap();
    assert_eq!(services[0].service, "http");
}

#[tokio::test]
async fn port_closed_since_the_port_scan_is_still_reported() {
    let gone = closed_port().await;
    let services = detect_services(&localhost(), &[gone], TIMEOUT, 1).await.unwrap();

    assert_eq!(services.len(), 1);
    assert!(services[0].is_unknown());
}
