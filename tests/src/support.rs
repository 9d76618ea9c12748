use std::net::{IpAddr, Ipv4Addr};

use sonar_common::network::target::Target;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub type Responder = fn(&[u8]) -> Option<Vec<u8>>;

pub fn localhost() -> Target {
    Target::from(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

/// A mock service on an ephemeral localhost port.
///
/// Every accepted connection first receives `greeting` (if any), then each
/// chunk read from the client is passed to `respond`. `None` keeps quiet.
pub async fn serve(greeting: Option<&'static [u8]>, respond: Responder) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        while let Ok((mut conn, _)) = listener.accept().await {
            tokio::spawn(async move {
                if let Some(greeting) = greeting {
                    if conn.write_all(greeting).await.is_err() {
                        return;
                    }
                }
                let mut buf = [0u8; 1024];
                loop {
                    let n = match conn.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => n,
                    };
                    let Some(reply) = respond(&buf[..n]) else {
                        continue;
                    };
                    if conn.write_all(&reply).await.is_err() {
                        return;
                    }
                }
            });
        }
    });
    port
}

/// Sends a fixed greeting on connect and ignores everything afterwards.
pub async fn greeter(greeting: &'static [u8]) -> u16 {
    serve(Some(greeting), |_| None).await
}

pub async fn silent() -> u16 {
    serve(None, |_| None).await
}

pub fn http_response(_request: &[u8]) -> Option<Vec<u8>> {
    Some(b"HTTP/1.1 400 Bad Request\r\nServer: nginx/1.24.0\r\n\r\n".to_vec())
}

pub fn redis_response(request: &[u8]) -> Option<Vec<u8>> {
    if request.starts_with(b"PING") {
        Some(b"+PONG\r\n".to_vec())
    } else {
        Some(b"-ERR unknown command\r\n".to_vec())
    }
}

/// A port nothing listens on, at least for the moment it is returned.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

pub async fn is_open(port: u16) -> bool {
    tokio::net::TcpStream::connect(("127.0.0.1", port)).await.is_ok()
}
