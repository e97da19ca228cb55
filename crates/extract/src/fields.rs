use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::{Captures, Regex};
use rust_decimal::Decimal;
use serde_json::Value;
use tally_core::{CheckNumber, PartialDate};

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

// Field values arrive already isolated, so every pattern is anchored.
re!(re_full_iso,
    r"^\s*(\d{4})-(\d{1,2})-(\d{1,2})\s*$");
re!(re_full_us,
    r"^\s*(\d{1,2})/(\d{1,2})/(\d{2}|\d{4})\s*$");
re!(re_full_month_first,
    r"(?i)^\s*([a-z]{3,})\.?\s+(\d{1,2}),?\s+(\d{4})\s*$");
re!(re_full_day_first,
    r"(?i)^\s*(\d{1,2})\s+([a-z]{3,})\.?,?\s+(\d{4})\s*$");

re!(re_partial_numeric,
    r"^\s*(\d{1,2})\s*[/\-.]\s*(\d{1,2})(?:\s*[/\-.]\s*\d{2,4})?\s*$");
re!(re_partial_named,
    r"(?i)^\s*([a-z]{3,})\.?\s+(\d{1,2})\s*$");

re!(re_amount,
    r"^\s*(\()?\s*(-)?\s*\$?\s*(-)?\s*([\d,]*\.?\d+)\s*(-)?\s*(\))?\s*$");

// ── Public coercion API ──────────────────────────────────────────────────────
//
// Each helper returns `None` both for an absent field (`null` / missing) and
// for a value that cannot be coerced. Callers decide whether that is a
// suspicion or an error.

/// Non-empty, trimmed text.
pub fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Month/day as printed on a transaction line: `12/5`, `12-05`, `Dec 5`.
/// A trailing year (`12/05/19`) is tolerated and ignored.
pub fn partial_date(value: Option<&Value>) -> Option<PartialDate> {
    let s = text(value)?;
    let (month, day) = if let Some(c) = re_partial_numeric().captures(&s) {
        (number(&c, 1)?, number(&c, 2)?)
    } else if let Some(c) = re_partial_named().captures(&s) {
        (month_number(c.get(1)?.as_str())?, number(&c, 2)?)
    } else {
        return None;
    };
    PartialDate::new(month, day).ok()
}

/// A full calendar date: ISO, `MM/DD/YYYY` (two-digit years are 20xx),
/// `January 15, 2020` or `15 Jan 2020`.
pub fn full_date(value: Option<&Value>) -> Option<NaiveDate> {
    let s = text(value)?;
    let (year, month, day) = if let Some(c) = re_full_iso().captures(&s) {
        (number(&c, 1)?, number(&c, 2)?, number(&c, 3)?)
    } else if let Some(c) = re_full_us().captures(&s) {
        (with_century(number(&c, 3)?), number(&c, 1)?, number(&c, 2)?)
    } else if let Some(c) = re_full_month_first().captures(&s) {
        (number(&c, 3)?, month_number(c.get(1)?.as_str())?, number(&c, 2)?)
    } else if let Some(c) = re_full_day_first().captures(&s) {
        (number(&c, 3)?, month_number(c.get(2)?.as_str())?, number(&c, 1)?)
    } else {
        return None;
    };
    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)
}

/// A monetary amount. Strings may carry `$`, thousands separators, and a
/// negative written as `-12.00`, `12.00-` or `(12.00)`.
pub fn amount(value: Option<&Value>) -> Option<Decimal> {
    match value? {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        Value::String(s) => parse_amount_str(s),
        _ => None,
    }
}

pub fn check_number(value: Option<&Value>) -> Option<CheckNumber> {
    text(value)?.parse().ok()
}

/// A positive page counter (`page_number`, `total_pages`).
pub fn counter(value: Option<&Value>) -> Option<u32> {
    let n: u32 = match value? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok())?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (n > 0).then_some(n)
}

// ── Date helpers ──────────────────────────────────────────────────────────────

const MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june",
    "july", "august", "september", "october", "november", "december",
];

/// Any word of three or more letters that begins a month name: `Dec`, `Sept`,
/// `december`.
fn month_number(word: &str) -> Option<u32> {
    let word = word.to_ascii_lowercase();
    if word.len() < 3 {
        return None;
    }
    let index = MONTHS.iter().position(|m| m.starts_with(word.as_str()))?;
    u32::try_from(index + 1).ok()
}

fn number(c: &Captures<'_>, group: usize) -> Option<u32> {
    c.get(group)?.as_str().parse().ok()
}

fn with_century(year: u32) -> u32 {
    if year < 100 { 2000 + year } else { year }
}

// ── Amount parsing ────────────────────────────────────────────────────────────

fn parse_amount_str(s: &str) -> Option<Decimal> {
    let c = re_amount().captures(s)?;
    let open = c.get(1).is_some();
    let close = c.get(6).is_some();
    if open != close {
        return None;
    }
    let minus = [c.get(2), c.get(3), c.get(5)].iter().filter(|m| m.is_some()).count();
    if minus > 1 {
        return None;
    }
    let value = Decimal::from_str(&c.get(4)?.as_str().replace(',', "")).ok()?;
    Some(if open || minus == 1 { -value } else { value })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
