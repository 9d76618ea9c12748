//! Report files written after a successful scan.

use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use sonar_common::models::{ScanMetadata, ScanResult};

#[derive(Serialize)]
struct Report<'a> {
    metadata: &'a ScanMetadata,
    results: &'a ScanResult,
}

#[derive(Debug)]
pub struct ReportPaths {
    pub json: PathBuf,
    pub text: PathBuf,
}

/// Writes `scan_report_<timestamp>.json` and `.txt` into `dir`, creating it if needed.
pub fn write_reports(dir: &Path, metadata: &ScanMetadata, result: &ScanResult) -> anyhow::Result<ReportPaths> {
    fs::create_dir_all(dir).with_context(|| format!("creating report directory {}", dir.display()))?;

    let base_name = format!("scan_report_{}", metadata.timestamp.format("%Y%m%d_%H%M%S"));
    let paths = ReportPaths {
        json: dir.join(format!("{base_name}.json")),
        text: dir.join(format!("{base_name}.txt")),
    };

    let file = File::create(&paths.json).with_context(|| format!("creating {}", paths.json.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &Report { metadata, results: result })
        .context("serializing JSON report")?;
    writer.flush()?;

    fs::write(&paths.text, render_text(metadata, result))
        .with_context(|| format!("writing {}", paths.text.display()))?;

    Ok(paths)
}

pub fn render_text(metadata: &ScanMetadata, result: &ScanResult) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_text(&mut out, metadata, result);
    out
}

fn write_text(out: &mut String, metadata: &ScanMetadata, result: &ScanResult) -> std::fmt::Result {
    writeln!(out, "Network Security Scan Report")?;
    writeln!(out, "{}\n", "=".repeat(50))?;

    writeln!(out, "Scan Details:")?;
    writeln!(out, "Target: {}", metadata.target)?;
    writeln!(out, "Scan Type: {}", metadata.scan_type)?;
    writeln!(out, "Timestamp: {}\n", metadata.timestamp.to_rfc3339())?;

    writeln!(out, "Open Ports:")?;
    for port in &result.ports {
        writeln!(out, "- {port}")?;
    }
    writeln!(out)?;

    if !result.services.is_empty() {
        writeln!(out, "Detected Services:")?;
        for service in &result.services {
            let banner = service.banner.lines().next().unwrap_or_default().trim();
            if banner.is_empty() {
                writeln!(out, "- {}/tcp {}", service.port, service.service)?;
            } else {
                writeln!(out, "- {}/tcp {} ({banner})", service.port, service.service)?;
            }
        }
        writeln!(out)?;
    }

    if let Some(os) = &result.os_info {
        writeln!(out, "Operating System:")?;
        match &os.os_version {
            Some(version) => writeln!(out, "- {} {version} ({}% confidence)", os.os_name, os.confidence)?,
            None => writeln!(out, "- {} ({}% confidence)", os.os_name, os.confidence)?,
        }
        writeln!(out)?;
    }

    if let Some(vulns) = &result.vulnerabilities {
        writeln!(out, "Potential Vulnerabilities:")?;
        for vuln in vulns {
            let severity = vuln.severity.map_or_else(|| "unrated".to_string(), |s| s.to_string());
            match vuln.port {
                Some(port) => writeln!(out, "- [{severity}] port {port}: {}: {}", vuln.vulnerability, vuln.details)?,
                None => writeln!(out, "- [{severity}] {}: {}: {}", vuln.kind, vuln.vulnerability, vuln.details)?,
            }
        }
    }
    Ok(())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
