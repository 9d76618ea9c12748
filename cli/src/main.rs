mod commands;
mod report;
mod terminal;

use std::process::ExitCode;

use commands::{CommandLine, scan};
use sonar_common::config::Config;
use sonar_common::error;
use sonar_common::error::{ConfigError, ScanError};
use terminal::{logging, print};

/// Conventional status for a run stopped by the user (128 + SIGINT).
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let commands = CommandLine::parse_args();

    let _log_guard = logging::init_logging(commands.verbose);
    print::banner(commands.quiet);

    let cfg = Config {
        quiet: commands.quiet,
        disable_input: commands.no_input,
    };

    match scan::scan(&commands, &cfg).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<ScanError>() {
            Some(scan_error) if scan_error.is_interrupt() => ExitCode::from(EXIT_INTERRUPTED),
            // Already logged where it happened.
            Some(_) => ExitCode::FAILURE,
            None if e.is::<ConfigError>() => ExitCode::FAILURE,
            None => {
                error!("{e:#}");
                ExitCode::FAILURE
            }
        },
    }
}
