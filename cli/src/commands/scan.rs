use std::path::Path;
use std::time::{Duration, Instant};

use colored::*;
use sonar_common::config::{Config, ConfigFile, ScanProfile};
use sonar_common::error::ConfigError;
use sonar_common::models::{ScanResult, ScanType, Vulnerability};
use sonar_common::{error, success, warn};
use sonar_core::{Interrupt, Scanner};
use tokio::task::JoinHandle;

use crate::commands::CommandLine;
use crate::report;
use crate::terminal::input::InputHandle;
use crate::terminal::spinner::ScanSpinner;
use crate::terminal::{colors, format, print};
use crate::mprint;

const DEFAULT_CONFIG: &str = "config.yaml";

pub async fn scan(cmd: &CommandLine, cfg: &Config) -> anyhow::Result<()> {
    let profile = load_profile(cmd.config.as_deref(), cmd.scan_type).inspect_err(|e| error!("{e}"))?;
    let scanner = Scanner::new(cmd.target.clone(), cmd.scan_type, profile).inspect_err(|e| error!("{e}"))?;
    let metadata = scanner.metadata().clone();

    print::header("scan plan", cfg.quiet);
    print_plan(&metadata.config, cmd, cfg);

    let interrupt = scanner.interrupt();
    let input = if cfg.disable_input {
        None
    } else {
        InputHandle::start(interrupt.clone())
    };
    let ctrl_c = watch_ctrl_c(interrupt);
    let spinner = ScanSpinner::start(input.is_some());
    let scanner = scanner.on_event(spinner.hook());

    let start_time: Instant = Instant::now();
    let outcome = scanner.run().await;

    drop(scanner);
    drop(spinner);
    drop(input);
    ctrl_c.abort();

    let result: ScanResult = outcome?;
    scan_ends(&result, start_time.elapsed(), cfg);

    if let Some(dir) = &cmd.output {
        let paths = report::write_reports(dir, &metadata, &result)?;
        success!("Reports written to {} and {}", paths.json.display(), paths.text.display());
    }
    Ok(())
}

fn load_profile(path: Option<&Path>, scan_type: ScanType) -> Result<ScanProfile, ConfigError> {
    let file = match path {
        Some(path) => ConfigFile::load(path)?,
        None if Path::new(DEFAULT_CONFIG).is_file() => ConfigFile::load(DEFAULT_CONFIG)?,
        None => ConfigFile::default(),
    };
    file.profile(scan_type)
}

fn watch_ctrl_c(interrupt: Interrupt) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, waiting for in-flight probes");
            interrupt.trigger();
        }
    })
}

fn print_plan(profile: &ScanProfile, cmd: &CommandLine, cfg: &Config) {
    if cfg.quiet > 0 {
        return;
    }
    let key_width: usize = 14;
    let ps = &profile.port_scan;
    print::aligned_line("Target", cmd.target.to_string().color(colors::ACCENT), key_width);
    print::aligned_line("Profile", cmd.scan_type.to_string().color(colors::PRIMARY), key_width);
    print::aligned_line(
        "Ports",
        format!("{} ({} workers, {:.1}s timeout)", ps.port_range, ps.threads, ps.timeout.as_secs_f64()),
        key_width,
    );
    let vuln: ColoredString = if profile.enable_vuln_scan {
        "enabled".green()
    } else {
        "disabled".bright_black()
    };
    print::aligned_line("Vuln rules", vuln, key_width);
}

fn scan_ends(result: &ScanResult, total_time: Duration, cfg: &Config) {
    if result.ports.is_empty() {
        print::header("nothing open", cfg.quiet);
        if cfg.quiet == 0 {
            print::no_results();
        }
    } else {
        print::header("services", cfg.quiet);
        print_services(result, cfg);
    }

    if let Some(os) = &result.os_info {
        print::header("operating system", cfg.quiet);
        if cfg.quiet < 2 {
            print::as_tree_one_level(format::os_to_details(os));
        }
    }

    if let Some(vulns) = &result.vulnerabilities {
        print::header("vulnerabilities", cfg.quiet);
        print_vulnerabilities(vulns, cfg);
    }

    print_summary(result, total_time, cfg);
}

fn print_services(result: &ScanResult, cfg: &Config) {
    for (idx, service) in result.services.iter().enumerate() {
        match cfg.quiet {
            2 => {
                mprint!(&format!("{}/tcp {}", service.port, service.service));
            }
            _ => {
                print::tree_head(idx, &format!("{}/tcp", service.port));
                print::as_tree_one_level(format::service_to_details(service));
                if idx + 1 != result.services.len() {
                    mprint!();
                }
            }
        }
    }
}

fn print_vulnerabilities(vulns: &[Vulnerability], cfg: &Config) {
    if vulns.is_empty() {
        if cfg.quiet < 2 {
            success!("No known vulnerabilities matched");
        }
        return;
    }
    for (idx, vuln) in vulns.iter().enumerate() {
        match cfg.quiet {
            2 => {
                mprint!(&vuln.vulnerability);
            }
            _ => {
                print::tree_head(idx, &vuln.vulnerability);
                print::as_tree_one_level(format::vulnerability_to_details(vuln));
                if idx + 1 != vulns.len() {
                    mprint!();
                }
            }
        }
    }
}

fn print_summary(result: &ScanResult, total_time: Duration, cfg: &Config) {
    let open_ports: ColoredString = format!("{} open ports", result.ports.len()).bold().green();
    let findings: usize = result.vulnerabilities.as_ref().map_or(0, Vec::len);
    let findings: ColoredString = format!("{findings} findings").bold().red();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let output: &ColoredString =
        &format!("Scan Complete: {open_ports} and {findings} in {total_time}").color(colors::TEXT_DEFAULT);

    match cfg.quiet {
        0 => {
            print::fat_separator();
            print::centerln(&output.to_string());
            print::end_of_program();
        }
        _ => {
            mprint!();
            success!("{}", output)
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
