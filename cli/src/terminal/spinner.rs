use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use colored::*;
use indicatif::ProgressStyle;
use sonar_core::scanner::{EventHook, Phase, ScanEvent};
use tracing::{Span, info_span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

use crate::terminal::colors;

const TIP: &str = "You can press 'q' to finish early";

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&[
            "▁▁▁▁▁",
            "▁▂▂▂▁",
            "▁▄▂▄▁",
            "▂▄▆▄▂",
            "▄▆█▆▄",
            "▂▄▆▄▂",
            "▁▄▂▄▁",
            "▁▂▂▂▁",
        ])
}

/// A spinner bound to a tracing span, so log lines print above it.
#[derive(Clone)]
pub struct ScanSpinner {
    span: Span,
    open_ports: Arc<AtomicUsize>,
}

impl ScanSpinner {
    pub fn start(show_tip: bool) -> Self {
        let span = info_span!("scanning", indicatif.pb_show = true);
        span.pb_set_style(&spinner_style());
        span.pb_start();

        if show_tip {
            span.pb_set_message(&format!("{}", TIP.italic().white()));
        }

        Self {
            span,
            open_ports: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn report(&self, event: ScanEvent) {
        let message: String = match event {
            ScanEvent::PhaseStarted(phase) => phase_message(phase),
            ScanEvent::Resolved(addr) => format!("Resolved target to {addr}...")
                .color(colors::TEXT_DEFAULT)
                .to_string(),
            ScanEvent::PortOpen(_) => {
                let count: usize = self.open_ports.fetch_add(1, Ordering::Relaxed) + 1;
                format!(
                    "Found {} so far...",
                    format!("{count} open ports").green().bold()
                )
                .color(colors::TEXT_DEFAULT)
                .to_string()
            }
        };
        self.span.pb_set_message(&message);
    }

    pub fn hook(&self) -> EventHook {
        let spinner = self.clone();
        Arc::new(move |event| spinner.report(event))
    }
}

fn phase_message(phase: Phase) -> String {
    let verb: &str = match phase {
        Phase::PortScan => "Probing ports",
        Phase::ServiceDetect => "Identifying services",
        Phase::OsFingerprint => "Fingerprinting the OS",
        Phase::VulnCorrelate => "Correlating vulnerabilities",
    };
    format!("{}...", verb).color(colors::TEXT_DEFAULT).to_string()
}
