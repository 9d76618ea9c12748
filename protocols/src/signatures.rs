//! Service signatures.
//!
//! A response is tested against the table in order and the **first** signature
//! that matches wins, even if a later one would describe the response better.

use std::sync::OnceLock;

use regex::bytes::{Regex, RegexBuilder};

static BUILTIN: OnceLock<SignatureTable> = OnceLock::new();

const BUILTIN_PATTERNS: [(&str, &str); 6] = [
    ("ssh", r"SSH-\d\.\d"),
    ("http", r"HTTP/\d\.\d"),
    ("ftp", r"220.*FTP"),
    ("smtp", r"220.*SMTP"),
    ("mysql", r".\x00\x00\x00\x0a\d+\.\d+\.\d+"),
    ("redis", r"\+PONG"),
];

#[derive(Debug, Clone)]
pub struct Signature {
    name: String,
    pattern: Regex,
}

impl Signature {
    /// Compiles a byte-oriented pattern; `.` matches any single byte except `\n`.
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        let pattern = RegexBuilder::new(pattern).unicode(false).build()?;
        Ok(Self {
            name: name.into(),
            pattern,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_match(&self, response: &[u8]) -> bool {
        self.pattern.is_match(response)
    }
}

#[derive(Debug, Clone)]
pub struct SignatureTable {
    signatures: Vec<Signature>,
}

impl SignatureTable {
    pub fn new(signatures: Vec<Signature>) -> Self {
        Self { signatures }
    }

    /// The default table: ssh, http, ftp, smtp, mysql, redis.
    pub fn builtin() -> &'static SignatureTable {
        BUILTIN.get_or_init(|| {
            let signatures = BUILTIN_PATTERNS
                .iter()
                .filter_map(|(name, pattern)| Signature::new(*name, pattern).ok())
                .collect();
            SignatureTable::new(signatures)
        })
    }

    /// Returns the first signature, in table order, matching `response`.
    pub fn identify(&self, response: &[u8]) -> Option<&Signature> {
        self.signatures.iter().find(|sig| sig.is_match(response))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.signatures.iter().map(Signature::name)
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
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
