#![cfg(test)]
use std::time::Duration;

use sonar_core::fingerprint::{Heuristic, OsFingerprinter};

use crate::support::{closed_port, localhost, serve};

const TIMEOUT: Duration = Duration::from_millis(500);

fn ubuntu_http(_: &[u8]) -> Option<Vec<u8>> {
    Some(b"HTTP/1.1 200 OK\r\nServer: Apache/2.4.52 (Ubuntu) Ubuntu/22.04\r\n\r\n".to_vec())
}

fn plain_http(_: &[u8]) -> Option<Vec<u8>> {
    Some(b"HTTP/1.1 200 OK\r\nServer: nginx\r\n\r\n".to_vec())
}

#[tokio::test]
async fn banner_heuristic_reads_ubuntu_version() {
    let closed = closed_port().await;
    let web = serve(None, ubuntu_http).await;

    let fingerprinter = OsFingerprinter::with_heuristics(
        TIMEOUT,
        vec![Heuristic::Banner {
            ports: vec![closed, web],
        }],
    );
    let os = fingerprinter.detect(&localhost()).await.unwrap().unwrap();

    assert_eq!(os.os_name, "Linux");
    assert_eq!(os.os_version.as_deref(), Some("22.04"));
    assert_eq!(os.confidence, 80);
}

#[tokio::test]
async fn banner_beats_weaker_heuristics() {
    let web = serve(None, ubuntu_http).await;

    // TTL fails without root and the loopback MSS matches no known value,
    // so whatever they contribute stays below the banner's 80.
    let fingerprinter = OsFingerprinter::with_heuristics(
        TIMEOUT,
        vec![
            Heuristic::Ttl,
            Heuristic::TcpOption { port: web },
            Heuristic::Banner { ports: vec![web] },
        ],
    );
    let os = fingerprinter.detect(&localhost()).await.unwrap().unwrap();

    assert_eq!(os.os_name, "Linux");
    assert_eq!(os.confidence, 80);
}

#[tokio::test]
async fn no_tokens_means_no_opinion() {
    let web = serve(None, plain_http).await;
    let fingerprinter =
        OsFingerprinter::with_heuristics(TIMEOUT, vec![Heuristic::Banner { ports: vec![web] }]);

    assert_eq!(fingerprinter.detect(&localhost()).await.unwrap(), None);
}
