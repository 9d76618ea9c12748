use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use sonar_common::error::ScanError;

/// Cooperative stop signal shared by the orchestrator and every pool worker.
///
/// Workers poll it before taking the next unit of work; connection attempts
/// already in flight run to completion or to their timeout.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    flag: Arc<AtomicBool>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    pub fn check(&self) -> Result<(), ScanError> {
        if self.is_triggered() {
            return Err(ScanError::Interrupted);
        }
        Ok(())
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

    #[test]
    fn clones_share_the_flag() {
        let interrupt = Interrupt::new();
        let worker_view = interrupt.clone();
        assert!(interrupt.check().is_ok());

        worker_view.trigger();
        assert!(interrupt.is_triggered());
        assert!(matches!(interrupt.check(), Err(ScanError::Interrupted)));
    }
}
