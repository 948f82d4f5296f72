use regex::Regex;
use std::sync::OnceLock;

use crate::models::Invoice;

pub const DEFAULT_NUMBER_PREFIX: &str = "JF4SD8WV-";
pub const DEFAULT_ATCUD_PREFIX: &str = "A/";
pub const NUMBER_PAD_WIDTH: usize = 4;
pub const ATCUD_PAD_WIDTH: usize = 4;

static SUFFIX_RE: OnceLock<Regex> = OnceLock::new();

fn suffix_re() -> &'static Regex {
    SUFFIX_RE.get_or_init(|| Regex::new(r"^(.+?)(\d+)$").expect("valid suffix regex"))
}

/// `AF0009` split as prefix `AF`, value 9, width 4.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split<'a> {
    pub prefix: &'a str,
    pub value: u64,
    pub width: usize,
}

impl Split<'_> {
    fn incremented(&self, prefix: &str) -> String {
        pad(prefix, self.value.saturating_add(1), self.width)
    }
}

pub fn split(value: &str) -> Option<Split<'_>> {
    let caps = suffix_re().captures(value)?;
    let prefix = caps.get(1)?.as_str();
    let digits = caps.get(2)?.as_str();
    let parsed = digits.parse::<u64>().ok()?;
    Some(Split {
        prefix,
        value: parsed,
        width: digits.len(),
    })
}

fn pad(prefix: &str, value: u64, width: usize) -> String {
    format!("{}{:0width$}", prefix, value, width = width)
}

/// Next identifier after the highest `prefix`-numbered entry in `existing`.
pub fn next_identifier<S: AsRef<str>>(existing: &[S], default_prefix: &str, pad_width: usize) -> String {
    let highest = existing
        .iter()
        .filter_map(|entry| entry.as_ref().strip_prefix(default_prefix))
        .filter_map(leading_number)
        .max();

    match highest {
        Some(max) => pad(default_prefix, max.saturating_add(1), pad_width),
        None => pad(default_prefix, 1, pad_width),
    }
}

/// The run of ASCII digits `rest` starts with, so `0005a` reads as 5. `None` when there is none.
fn leading_number(rest: &str) -> Option<u64> {
    let end = rest
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    rest[..end].parse::<u64>().ok()
}

/// Rapid-entry successor: bump the trailing number of `current`, keeping its digit width.
/// Without a number to bump, start at 1 padded to `pad_width`.
pub fn next_with_prefix(current: &str, prefix: &str, pad_width: usize) -> String {
    match split(current) {
        Some(parts) => parts.incremented(prefix),
        None => pad(prefix, 1, pad_width),
    }
}

/// The prefix implied by what the user typed, if it implies one.
pub fn observed_prefix(value: &str) -> Option<String> {
    if let Some(parts) = split(value) {
        return Some(parts.prefix.to_string());
    }
    if !value.is_empty() && !value.chars().all(|c| c.is_ascii_digit()) {
        return Some(value.to_string());
    }
    None
}

/// Add one to the trailing number, keeping the value's own prefix. Non-matching values pass through.
pub fn increment_suffix(value: &str) -> String {
    match split(value) {
        Some(parts) => parts.incremented(parts.prefix),
        None => value.to_string(),
    }
}

pub fn next_number(invoices: &[Invoice]) -> String {
    let numbers: Vec<&str> = invoices.iter().map(|inv| inv.number.as_str()).collect();
    next_identifier(&numbers, DEFAULT_NUMBER_PREFIX, NUMBER_PAD_WIDTH)
}

pub fn next_atcud(invoices: &[Invoice]) -> String {
    let atcuds: Vec<&str> = invoices.iter().map(|inv| inv.atcud.as_str()).collect();
    next_identifier(&atcuds, DEFAULT_ATCUD_PREFIX, ATCUD_PAD_WIDTH)
}

/// Shift every invoice from `start` onwards up by one number and one ATCUD.
pub fn renumber_from(invoices: &mut [Invoice], start: usize) {
    for invoice in invoices.iter_mut().skip(start) {
        invoice.number = increment_suffix(&invoice.number);
        invoice.atcud = increment_suffix(&invoice.atcud);
    }
}
