use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};

use anyhow::{Context, bail, ensure};
use pnet::packet::ipv4::Ipv4Packet;
use pnet::transport::ipv4_packet_iter;
use sonar_common::models::OsGuess;
use sonar_protocols::icmp::{self, EchoId};
use tracing::trace;

use crate::network::transport;

pub async fn attempt(addr: IpAddr, timeout: Duration) -> anyhow::Result<Option<OsGuess>> {
    let IpAddr::V4(dst) = addr else {
        bail!("TTL probing only supports IPv4");
    };
    ensure!(is_root::is_root(), "raw ICMP needs root privileges");

    let ttl = tokio::task::spawn_blocking(move || probe_ttl(dst, timeout))
        .await
        .context("TTL probe task failed")??;
    Ok(ttl.map(classify))
}

/// Maps an observed TTL to the most likely initial TTL family.
pub fn classify(ttl: u8) -> OsGuess {
    match ttl {
        0..=64 => OsGuess::new("Linux", 60),
        65..=128 => OsGuess::new("Windows", 60),
        _ => OsGuess::new("Cisco/Network", 50),
    }
}

fn probe_ttl(dst: Ipv4Addr, timeout: Duration) -> anyhow::Result<Option<u8>> {
    let (mut tx, mut rx) = transport::open_icmp_channel()?;
    let id = EchoId::random();
    let request = icmp::create_echo_request(dst, id)?;
    let packet = Ipv4Packet::new(&request).context("wrapping echo request")?;
    tx.send_to(packet, IpAddr::V4(dst)).context("sending echo request")?;

    let deadline = Instant::now() + timeout;
    let mut replies = ipv4_packet_iter(&mut rx);
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(None);
        }
        let Some((reply, _)) = replies.next_with_timeout(remaining)? else {
            return Ok(None);
        };
        if let Some(ttl) = icmp::reply_ttl(&reply, dst, id) {
            trace!("echo reply from {dst} with TTL {ttl}");
            return Ok(Some(ttl));
        }
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
