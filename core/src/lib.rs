//! # The scan pipeline
//!
//! Four phases run strictly one after another, each fully materialising its
//! output before the next starts:
//!
//! 1. [`ports`]: concurrent TCP connect probing over a port range.
//! 2. [`services`]: concurrent protocol probing of every open port.
//! 3. [`fingerprint`]: sequential OS heuristics merged by confidence.
//! 4. [`vuln`]: offline rule matching over the evidence gathered so far.
//!
//! [`scanner`] wires them together. Concurrency lives only inside phases 1
//! and 2, both driven by the bounded worker [`pool`].

pub mod fingerprint;
pub mod interrupt;
pub mod network;
pub mod pool;
pub mod ports;
pub mod scanner;
pub mod services;
pub mod vuln;

pub use fingerprint::detect_os;
pub use interrupt::Interrupt;
pub use ports::scan_ports;
pub use scanner::{Scanner, run_scan};
pub use services::detect_services;
pub use vuln::correlate_vulnerabilities;
