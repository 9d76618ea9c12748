use std::net::SocketAddr;
use std::time::Duration;

use sonar_protocols::probes::READ_BUFFER_LEN;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

/// What came back after sending one probe payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exchange {
    /// The peer answered with at least one byte.
    Response(Vec<u8>),
    /// The peer closed its side; further probes on this connection are pointless.
    Closed,
    /// Write or read failed or timed out.
    Failed,
}

/// Attempts a full TCP handshake. Refusals and timeouts both map to `None`.
pub async fn connect(addr: SocketAddr, probe_timeout: Duration) -> Option<TcpStream> {
    match timeout(probe_timeout, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => Some(stream),
        Ok(Err(e)) => {
            trace!("connect {addr}: {e}");
            None
        }
        Err(_elapsed) => {
            trace!("connect {addr}: timed out");
            None
        }
    }
}

/// Sends `payload` and reads a single response chunk of up to
/// [`READ_BUFFER_LEN`] bytes. Each direction gets its own `io_timeout`.
pub async fn exchange(stream: &mut TcpStream, payload: &[u8], io_timeout: Duration) -> Exchange {
    match timeout(io_timeout, stream.write_all(payload)).await {
        Ok(Ok(())) => {}
        Ok(Err(_)) | Err(_) => return Exchange::Failed,
    }

    let mut buf = vec![0u8; READ_BUFFER_LEN];
    match timeout(io_timeout, stream.read(&mut buf)).await {
        Ok(Ok(0)) => Exchange::Closed,
        Ok(Ok(n)) => {
            buf.truncate(n);
            Exchange::Response(buf)
        }
        Ok(Err(_)) | Err(_) => Exchange::Failed,
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

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn connect_returns_none_for_closed_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        assert!(connect(addr, Duration::from_millis(500)).await.is_none());
    }

    #[tokio::test]
    async fn exchange_reads_one_response() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut conn, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 64];
            let _ = conn.read(&mut buf).await;
            conn.write_all(b"+PONG\r\n").await.unwrap();
        });

        let mut stream = connect(addr, Duration::from_secs(1)).await.unwrap();
        let reply = exchange(&mut stream, b"PING\r\n", Duration::from_secs(1)).await;
        assert_eq!(reply, Exchange::Response(b"+PONG\r\n".to_vec()));
    }

    #[tokio::test]
    async fn exchange_reports_peer_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut conn, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 64];
            let _ = conn.read(&mut buf).await;
            let _ = conn.shutdown().await;
        });

        let mut stream = connect(addr, Duration::from_secs(1)).await.unwrap();
        let reply = exchange(&mut stream, b"HELP\r\n", Duration::from_secs(1)).await;
        assert_eq!(reply, Exchange::Closed);
    }

    #[tokio::test]
    #[ignore]
    async fn connect_times_out_on_unroutable_address() {
        let addr: SocketAddr = "203.0.113.1:443".parse().unwrap();
        assert!(connect(addr, Duration::from_millis(200)).await.is_none());
    }
}
