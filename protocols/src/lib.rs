//! Wire-level knowledge: what to send to a port, how to recognise what comes
//! back, and the raw packets the TTL heuristic needs.

pub mod icmp;
pub mod ipv4;
pub mod probes;
pub mod signatures;
pub mod version;
