use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use sonar_common::models::OsGuess;
use tokio::net::TcpStream;
use tracing::trace;

/// Reads the negotiated MSS of a fresh connection to `addr`.
pub async fn attempt(addr: SocketAddr, timeout: Duration) -> anyhow::Result<Option<OsGuess>> {
    let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
        .await
        .context("connect timed out")?
        .context("connect failed")?;

    let mss = read_mss(&stream)?;
    trace!("{addr} negotiated MSS {mss}");
    Ok(classify_mss(mss))
}

pub fn classify_mss(mss: u32) -> Option<OsGuess> {
    match mss {
        65535 => Some(OsGuess::new("Windows", 70)),
        5840 => Some(OsGuess::new("Linux", 70)),
        _ => None,
    }
}

#[cfg(unix)]
fn read_mss(stream: &TcpStream) -> anyhow::Result<u32> {
    socket2::SockRef::from(stream)
        .mss()
        .context("reading TCP_MAXSEG")
}

#[cfg(not(unix))]
fn read_mss(_stream: &TcpStream) -> anyhow::Result<u32> {
    anyhow::bail!("TCP_MAXSEG is not readable on this platform")
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
    use tokio::net::TcpListener;

    #[test]
    fn only_known_segment_sizes_classify() {
        assert_eq!(classify_mss(65535), Some(OsGuess::new("Windows", 70)));
        assert_eq!(classify_mss(5840), Some(OsGuess::new("Linux", 70)));
        assert_eq!(classify_mss(1460), None);
    }

    #[tokio::test]
    async fn closed_port_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        assert!(attempt(addr, Duration::from_millis(500)).await.is_err());
    }
}
