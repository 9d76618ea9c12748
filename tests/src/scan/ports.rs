#![cfg(test)]
use std::time::Duration;

use sonar_common::network::range::PortRange;
use sonar_core::scan_ports;

use crate::support::{closed_port, is_open, localhost, silent};

const TIMEOUT: Duration = Duration::from_millis(500);

/// Ports within `radius` of `port`, clamped to the valid range.
fn window(port: u16, radius: u16) -> PortRange {
    PortRange::new(port.saturating_sub(radius).max(1), port.saturating_add(radius)).unwrap()
}

#[tokio::test]
async fn open_ports_are_sorted_unique_and_verifiable() {
    let port = silent().await;
    let range = window(port, 10);

    let open = scan_ports(&localhost(), range, TIMEOUT, 8).await.unwrap();

    assert!(open.contains(&port));
    assert!(open.windows(2).all(|w| w[0] < w[1]), "not strictly ascending: {open:?}");
    for found in &open {
        assert!(range.contains(*found));
        assert!(is_open(*found).await, "port {found} reported open but refuses connections");
    }
}

#[tokio::test]
async fn worker_count_does_not_change_the_answer() {
    // Kept narrow: other tests open listeners concurrently.
    let port = silent().await;
    let range = window(port, 3);

    let serial = scan_ports(&localhost(), range, TIMEOUT, 1).await.unwrap();
    let parallel = scan_ports(&localhost(), range, TIMEOUT, 50).await.unwrap();

    assert!(serial.contains(&port));
    assert_eq!(serial, parallel);
}

#[tokio::test]
async fn closed_port_is_empty_every_time() {
    let port = closed_port().await;
    let range = PortRange::single(port).unwrap();

    let first = scan_ports(&localhost(), range, TIMEOUT, 4).await.unwrap();
    let second = scan_ports(&localhost(), range, TIMEOUT, 4).await.unwrap();

    assert!(first.is_empty());
    assert!(second.is_empty());
}
