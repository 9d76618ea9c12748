use std::net::{IpAddr, SocketAddr};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::Context;
use regex::Regex;
use sonar_common::models::OsGuess;
use sonar_protocols::probes::OS_BANNER_PROBE;
use tracing::trace;

use crate::network::tcp::{self, Exchange};

static UBUNTU_VERSION: OnceLock<Regex> = OnceLock::new();
static WINDOWS_VERSION: OnceLock<Regex> = OnceLock::new();

/// Tries `ports` in order and stops at the first response carrying an OS token.
pub async fn attempt(addr: IpAddr, ports: &[u16], timeout: Duration) -> anyhow::Result<Option<OsGuess>> {
    for &port in ports {
        let Some(mut stream) = tcp::connect(SocketAddr::new(addr, port), timeout).await else {
            continue;
        };
        let Exchange::Response(response) = tcp::exchange(&mut stream, OS_BANNER_PROBE.payload, timeout).await else {
            continue;
        };

        let text = String::from_utf8_lossy(&response);
        if let Some(guess) = classify_banner(&text)? {
            trace!("port {port} banner points to {}", guess.os_name);
            return Ok(Some(guess));
        }
    }
    Ok(None)
}

pub fn classify_banner(text: &str) -> anyhow::Result<Option<OsGuess>> {
    if text.contains("Ubuntu") || text.contains("Debian") {
        let version = capture(&UBUNTU_VERSION, r"Ubuntu/(\d+\.\d+)", text)?;
        return Ok(Some(OsGuess::new("Linux", 80).with_version(version)));
    }
    if text.contains("Win") {
        let version = capture(&WINDOWS_VERSION, r"Win(\d+)", text)?;
        return Ok(Some(OsGuess::new("Windows", 80).with_version(version)));
    }
    Ok(None)
}

fn capture(cell: &OnceLock<Regex>, pattern: &str, text: &str) -> anyhow::Result<Option<String>> {
    let re = compiled(cell, pattern)?;
    Ok(re
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string()))
}

fn compiled<'a>(cell: &'a OnceLock<Regex>, pattern: &str) -> anyhow::Result<&'a Regex> {
    if let Some(re) = cell.get() {
        return Ok(re);
    }
    let re = Regex::new(pattern).with_context(|| format!("compiling version pattern {pattern}"))?;
    Ok(cell.get_or_init(|| re))
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

    #[test]
    fn ubuntu_server_header_carries_version() {
        let guess = classify_banner("HTTP/1.1 200 OK\r\nServer: Apache/2.4 Ubuntu/22.04\r\n").unwrap().unwrap();
        assert_eq!(guess.os_name, "Linux");
        assert_eq!(guess.os_version.as_deref(), Some("22.04"));
        assert_eq!(guess.confidence, 80);
    }

    #[test]
    fn debian_without_version() {
        let guess = classify_banner("SSH-2.0-OpenSSH_9.2p1 Debian-2+deb12u3").unwrap().unwrap();
        assert_eq!(guess.os_name, "Linux");
        assert_eq!(guess.os_version, None);
    }

    #[test]
    fn windows_token() {
        let guess = classify_banner("Server: Microsoft-IIS/10.0 (Win64)").unwrap().unwrap();
        assert_eq!(guess.os_name, "Windows");
        assert_eq!(guess.os_version.as_deref(), Some("64"));
    }

    #[test]
    fn linux_tokens_take_precedence() {
        let guess = classify_banner("Server: Apache (Debian) Win32-compat").unwrap().unwrap();
        assert_eq!(guess.os_name, "Linux");
    }

    #[test]
    fn plain_banner_has_no_opinion() {
        assert_eq!(classify_banner("HTTP/1.0 200 OK\r\nServer: nginx\r\n").unwrap(), None);
    }

    #[test]
    fn broken_version_pattern_is_an_error_not_a_panic() {
        let cell = OnceLock::new();
        assert!(capture(&cell, r"Ubuntu/(\d+", "Ubuntu/22.04").is_err());
        assert!(cell.get().is_none());
        assert_eq!(
            capture(&cell, r"Ubuntu/(\d+)", "Ubuntu/22.04").unwrap().as_deref(),
            Some("22")
        );
    }
}
