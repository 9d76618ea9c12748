use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An inclusive range of TCP ports, `1 <= lo <= hi <= 65535`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "(u16, u16)", into = "(u16, u16)")]
pub struct PortRange {
    lo: u16,
    hi: u16,
}

impl PortRange {
    pub const WELL_KNOWN: PortRange = PortRange { lo: 1, hi: 1024 };
    pub const ALL: PortRange = PortRange { lo: 1, hi: u16::MAX };

    pub fn new(lo: u16, hi: u16) -> Result<Self, String> {
        if lo == 0 {
            return Err("port 0 is not scannable".to_string());
        }
        if lo > hi {
            return Err(format!("range start {lo} is above range end {hi}"));
        }
        Ok(Self { lo, hi })
    }

    pub fn single(port: u16) -> Result<Self, String> {
        Self::new(port, port)
    }

    pub fn lo(&self) -> u16 {
        self.lo
    }

    pub fn hi(&self) -> u16 {
        self.hi
    }

    pub fn len(&self) -> usize {
        usize::from(self.hi - self.lo) + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, port: u16) -> bool {
        (self.lo..=self.hi).contains(&port)
    }

    pub fn to_iter(&self) -> RangeInclusive<u16> {
        self.lo..=self.hi
    }
}

impl TryFrom<(u16, u16)> for PortRange {
    type Error = String;

    fn try_from((lo, hi): (u16, u16)) -> Result<Self, Self::Error> {
        Self::new(lo, hi)
    }
}

impl From<PortRange> for (u16, u16) {
    fn from(range: PortRange) -> Self {
        (range.lo, range.hi)
    }
}

impl IntoIterator for PortRange {
    type Item = u16;
    type IntoIter = RangeInclusive<u16>;

    fn into_iter(self) -> Self::IntoIter {
        self.to_iter()
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lo == self.hi {
            write!(f, "{}", self.lo)
        } else {
            write!(f, "{}-{}", self.lo, self.hi)
        }
    }
}

impl FromStr for PortRange {
    type Err = String;

    /// Accepts a single port ("443") or an inclusive span ("1-1024").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some((lo_str, hi_str)) = s.split_once('-') else {
            let port = parse_port(s)?;
            return Self::single(port);
        };

        let lo = parse_port(lo_str)?;
        let hi = parse_port(hi_str)?;
        Self::new(lo, hi)
    }
}

fn parse_port(s: &str) -> Result<u16, String> {
    s.trim()
        .parse::<u16>()
        .map_err(|e| format!("invalid port '{}': {e}", s.trim()))
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
    fn parses_single_ports_and_spans() {
        assert_eq!(PortRange::from_str("443"), PortRange::new(443, 443));
        assert_eq!(PortRange::from_str("1-1024"), PortRange::new(1, 1024));
        assert_eq!(PortRange::from_str(" 20 - 25 "), PortRange::new(20, 25));
    }

    #[test]
    fn rejects_bad_bounds() {
        assert!(PortRange::from_str("0-10").is_err());
        assert!(PortRange::from_str("100-10").is_err());
        assert!(PortRange::from_str("1-70000").is_err());
        assert!(PortRange::from_str("http").is_err());
        assert!(PortRange::from_str("").is_err());
    }

    #[test]
    fn iterates_ascending_and_inclusive() {
        let range = PortRange::new(20, 23).unwrap();
        assert_eq!(range.len(), 4);
        assert_eq!(range.into_iter().collect::<Vec<_>>(), vec![20, 21, 22, 23]);

        let full = PortRange::new(1, u16::MAX).unwrap();
        assert_eq!(full.len(), 65_535);
        assert_eq!(full.into_iter().last(), Some(u16::MAX));
    }

    #[test]
    fn deserializes_from_a_pair() {
        let range: PortRange = serde_yaml::from_str("[1, 1024]").unwrap();
        assert_eq!(range, PortRange::new(1, 1024).unwrap());
        assert!(serde_yaml::from_str::<PortRange>("[10, 1]").is_err());
    }
}
