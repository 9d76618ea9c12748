use colored::*;
use sonar_common::models::{OsInfo, ServiceResult, Severity, Vulnerability};

use crate::terminal::colors;

pub type Detail = (String, ColoredString);

pub fn severity_color(severity: Option<Severity>) -> Color {
    match severity {
        Some(Severity::Critical) => colors::SEVERITY_CRITICAL,
        Some(Severity::High) => colors::SEVERITY_HIGH,
        Some(Severity::Medium) => colors::SEVERITY_MEDIUM,
        Some(Severity::Low) => colors::SEVERITY_LOW,
        Some(Severity::Info) | None => colors::SEVERITY_INFO,
    }
}

/// First line of a banner with control characters stripped.
pub fn banner_line(banner: &str) -> String {
    banner
        .lines()
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_control())
        .collect()
}

pub fn service_to_details(service: &ServiceResult) -> Vec<Detail> {
    let name: ColoredString = if service.is_unknown() {
        service.service.color(colors::UNKNOWN)
    } else {
        service.service.color(colors::SERVICE).bold()
    };

    let mut details: Vec<Detail> = vec![("Service".to_string(), name)];
    let banner: String = banner_line(&service.banner);
    if !banner.is_empty() {
        details.push(("Banner".to_string(), banner.color(colors::BANNER)));
    }
    details
}

pub fn os_to_details(os: &OsInfo) -> Vec<Detail> {
    let mut details: Vec<Detail> = vec![("Name".to_string(), os.os_name.color(colors::OS).bold())];
    if let Some(version) = &os.os_version {
        details.push(("Version".to_string(), version.color(colors::TEXT_DEFAULT)));
    }
    details.push((
        "Confidence".to_string(),
        format!("{}%", os.confidence).color(colors::ACCENT),
    ));
    details
}

pub fn vulnerability_to_details(vuln: &Vulnerability) -> Vec<Detail> {
    let severity: String = vuln
        .severity
        .map_or_else(|| "unrated".to_string(), |s| s.to_string().to_uppercase());

    let mut details: Vec<Detail> = vec![
        ("Severity".to_string(), severity.color(severity_color(vuln.severity)).bold()),
        ("Source".to_string(), vuln.kind.to_string().color(colors::TEXT_DEFAULT)),
    ];
    if let Some(port) = vuln.port {
        details.push(("Port".to_string(), port.to_string().color(colors::PORT)));
    }
    details.push(("Details".to_string(), vuln.details.color(colors::TEXT_DEFAULT)));
    details
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
