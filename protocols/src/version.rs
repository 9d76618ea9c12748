//! Loose version comparison for banner-extracted versions such as `7.4p1` or `2.4.49`.

use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
enum VersionPart {
    Numeric(u64),
    Alpha(String),
}

/// Compares two version strings part by part. Missing parts count as `0`,
/// and a numeric part sorts before an alphabetic one (`7.4 < 7.4p1`).
pub fn compare(a: &str, b: &str) -> Ordering {
    let a_parts = parse_parts(a);
    let b_parts = parse_parts(b);
    let max_len = a_parts.len().max(b_parts.len());

    for i in 0..max_len {
        let a_part = a_parts.get(i).cloned().unwrap_or(VersionPart::Numeric(0));
        let b_part = b_parts.get(i).cloned().unwrap_or(VersionPart::Numeric(0));

        let ord = match (a_part, b_part) {
            (VersionPart::Numeric(x), VersionPart::Numeric(y)) => x.cmp(&y),
            (VersionPart::Alpha(x), VersionPart::Alpha(y)) => x.cmp(&y),
            (VersionPart::Numeric(_), VersionPart::Alpha(_)) => Ordering::Less,
            (VersionPart::Alpha(_), VersionPart::Numeric(_)) => Ordering::Greater,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

pub fn is_older(version: &str, fixed_in: &str) -> bool {
    compare(version, fixed_in) == Ordering::Less
}

fn parse_parts(version: &str) -> Vec<VersionPart> {
    let mut parts = Vec::new();
    let mut digits = String::new();
    let mut alpha = String::new();

    for c in version.chars() {
        if c.is_ascii_digit() {
            flush_alpha(&mut alpha, &mut parts);
            digits.push(c);
        } else if c.is_ascii_alphabetic() {
            flush_digits(&mut digits, &mut parts);
            alpha.push(c.to_ascii_lowercase());
        } else {
            flush_digits(&mut digits, &mut parts);
            flush_alpha(&mut alpha, &mut parts);
        }
    }
    flush_digits(&mut digits, &mut parts);
    flush_alpha(&mut alpha, &mut parts);
    parts
}

fn flush_digits(digits: &mut String, parts: &mut Vec<VersionPart>) {
    if !digits.is_empty() {
        parts.push(VersionPart::Numeric(digits.parse().unwrap_or(u64::MAX)));
        digits.clear();
    }
}

fn flush_alpha(alpha: &mut String, parts: &mut Vec<VersionPart>) {
    if !alpha.is_empty() {
        parts.push(VersionPart::Alpha(std::mem::take(alpha)));
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
