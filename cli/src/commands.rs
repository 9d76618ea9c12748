pub mod scan;

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use sonar_common::models::ScanType;
use sonar_common::network::target::Target;

#[derive(Parser)]
#[command(name = "sonar", version)]
#[command(about = "Probes a host for open ports, services, its OS and known vulnerabilities.")]
pub struct CommandLine {
    /// Host to scan (IP address or hostname)
    pub target: Target,

    /// Scan profile to run
    #[arg(short = 't', long, default_value_t = ScanType::Quick)]
    pub scan_type: ScanType,

    /// YAML config file (defaults to ./config.yaml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory to write JSON and text reports into
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long)]
    pub verbose: bool,

    /// Reduce output; repeat for results only
    #[arg(short, long, action = ArgAction::Count)]
    pub quiet: u8,

    /// Do not listen for the 'q' key
    #[arg(long)]
    pub no_input: bool,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
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
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        CommandLine::command().debug_assert();
    }

    #[test]
    fn parses_full_invocation() {
        let cmd = CommandLine::try_parse_from([
            "sonar", "scanme.example.org", "--scan-type", "full", "-c", "cfg.yaml", "-o", "out", "-v", "-qq",
        ])
        .unwrap();

        assert_eq!(cmd.scan_type, ScanType::Full);
        assert_eq!(cmd.config, Some(PathBuf::from("cfg.yaml")));
        assert_eq!(cmd.output, Some(PathBuf::from("out")));
        assert!(cmd.verbose);
        assert_eq!(cmd.quiet, 2);
        assert!(!cmd.no_input);
    }

    #[test]
    fn defaults_to_quick() {
        let cmd = CommandLine::try_parse_from(["sonar", "10.0.0.1"]).unwrap();
        assert_eq!(cmd.scan_type, ScanType::Quick);
        assert_eq!(cmd.config, None);
    }

    #[test]
    fn rejects_unknown_scan_type() {
        assert!(CommandLine::try_parse_from(["sonar", "10.0.0.1", "-t", "aggressive"]).is_err());
    }
}
