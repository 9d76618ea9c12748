use std::path::Path;

use colored::*;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::fmt::FormatEvent;
use tracing_subscriber::fmt::format::{self, Writer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub const PRINT_TARGET: &str = "sonar::print";
pub const SUCCESS_TARGET: &str = "sonar::success";

pub const LOG_DIR: &str = "logs";
pub const LOG_FILE: &str = "scanner.log";

pub struct SonarFormatter;

impl<S, N> FormatEvent<S, N> for SonarFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> format::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();

        // Terminal output from print.rs, already styled.
        if meta.target() == PRINT_TARGET {
            let mut raw = RawMessage::default();
            event.record(&mut raw);
            return writeln!(writer, "{}", raw.0);
        }

        let (symbol, color_func): (&str, fn(ColoredString) -> ColoredString) = match *meta.level() {
            Level::INFO if meta.target() == SUCCESS_TARGET => ("[✓]", |s| s.bright_green().bold()),
            Level::TRACE => ("[ ]", |s| s.dimmed()),
            Level::DEBUG => ("[?]", |s| s.blue()),
            Level::INFO => ("[+]", |s| s.green().bold()),
            Level::WARN => ("[*]", |s| s.yellow().bold()),
            Level::ERROR => ("[-]", |s| s.red().bold()),
        };

        write!(writer, "{} ", color_func(symbol.into()))?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

#[derive(Default)]
struct RawMessage(String);

impl Visit for RawMessage {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "raw_msg" {
            self.0 = value.to_string();
        }
    }

    fn record_debug(&mut self, _field: &Field, _value: &dyn std::fmt::Debug) {}
}

/// Installs the global subscriber.
///
/// The terminal gets `info` (or `debug` with `verbose`; `RUST_LOG` wins over
/// both). Everything down to `debug` is also appended to `logs/scanner.log`.
/// The returned guard flushes the file writer and must outlive the program.
pub fn init_logging(verbose: bool) -> Option<WorkerGuard> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{default_level},{PRINT_TARGET}=info")));

    let indicatif_layer = IndicatifLayer::new();
    let fmt_layer = tracing_subscriber::fmt::layer()
        .event_format(SonarFormatter)
        .with_writer(indicatif_layer.get_stdout_writer())
        .with_filter(filter);

    let (file_layer, guard, file_error) = match open_log_file(Path::new(LOG_DIR)) {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(file_filter());
            (Some(layer), Some(guard), None)
        }
        Err(e) => (None, None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(file_layer)
        .with(indicatif_layer.with_filter(LevelFilter::INFO))
        .init();

    if let Some(e) = file_error {
        tracing::warn!("Not writing {LOG_DIR}/{LOG_FILE}: {e}");
    }
    guard
}

/// Opens `<dir>/scanner.log` for appending, creating `dir` if needed.
pub fn open_log_file(dir: &Path) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE)
        .build(dir)
}

/// Debug and up from every target, minus the already-styled terminal prints.
fn file_filter() -> Targets {
    Targets::new()
        .with_default(LevelFilter::DEBUG)
        .with_target(PRINT_TARGET, LevelFilter::OFF)
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
    use std::fs;
    use std::io::Write;

    #[test]
    fn file_log_keeps_debug_and_drops_terminal_prints() {
        let filter = file_filter();
        assert!(filter.would_enable("sonar_core::services", &Level::DEBUG));
        assert!(filter.would_enable(SUCCESS_TARGET, &Level::INFO));
        assert!(!filter.would_enable("sonar_core::ports", &Level::TRACE));
        assert!(!filter.would_enable(PRINT_TARGET, &Level::INFO));
    }

    #[test]
    fn log_file_is_created_under_a_fresh_directory() {
        let dir = std::env::temp_dir().join(format!("sonar-logs-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);

        let mut appender = open_log_file(&dir).unwrap();
        appender.write_all(b"port 22: skipped\n").unwrap();
        appender.flush().unwrap();

        let written = fs::read_to_string(dir.join(LOG_FILE)).unwrap();
        assert!(written.contains("port 22: skipped"));
        let _ = fs::remove_dir_all(&dir);
    }
}
