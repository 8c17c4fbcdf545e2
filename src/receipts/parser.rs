//! Receipt parser — raw OCR text to structured line records
//!
//! Splits on line breaks, throws away everything that is not a purchasable
//! line (totals, tax, payment noise, separators, loyalty chatter), then
//! extracts price, quantity text and the residual item name per kept line.
//! Vendor and purchase date come from the receipt header.

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::LazyLock;

/// One kept receipt line
#[derive(Debug, Clone)]
pub struct ParsedLine {
    pub raw_line: String,
    pub item_name: String,
    pub qty_text: Option<String>,
    pub price: Option<Decimal>,
}

/// Parser output for a whole receipt
#[derive(Debug)]
pub struct ParsedReceipt {
    pub lines: Vec<ParsedLine>,
    pub vendor: Option<String>,
    pub purchased_on: Option<NaiveDate>,
    pub discarded_lines: usize,
}

const PRICE_SANITY_MIN: f64 = 0.10;
const PRICE_SANITY_MAX: f64 = 1000.0;

static IGNORE_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(subtotal|total|tax|visa|mastercard|amex|discover|debit|credit|cash|change|auth|thank you|thanks|savings|discount|coupon|balance|points|rewards)\b",
    )
    .expect("static regex")
});

static STORE_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(store|str)\s*#?\s*\d+").expect("static regex"));

static DATETIME_ONLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4}|\d{4}-\d{2}-\d{2})?\s*(\d{1,2}:\d{2}(:\d{2})?\s*(am|pm)?)?\s*$",
    )
    .expect("static regex")
});

static PRICE_DOLLAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\s*(\d+\.\d{2})").expect("static regex"));

static PRICE_TRAILING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.\d{2})\s*$").expect("static regex"));

static QTY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*@").expect("static regex"),
        Regex::new(r"(?i)\bx\s*(\d+)\b").expect("static regex"),
        Regex::new(r"(?i)\bqty:?\s*(\d+(?:\.\d+)?)").expect("static regex"),
        Regex::new(r"(?i)\b(\d+(?:\.\d+)?)\s*(ct|ea|lb|lbs|oz|kg|g|dz|pk)\b").expect("static regex"),
    ]
});

static DATE_MDY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})\b").expect("static regex"));

static DATE_ISO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("static regex"));

static PHONE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(tel|phone|fax)\b").expect("static regex"));

fn is_separator_run(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| "-=_*#".contains(c) || c.is_whitespace())
}

fn is_ignored(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.len() < 3 {
        return true;
    }
    if trimmed.chars().all(|c| c.is_ascii_digit() || c.is_whitespace()) {
        return true;
    }
    if is_separator_run(trimmed) {
        return true;
    }
    if IGNORE_KEYWORDS.is_match(trimmed) || STORE_HEADER.is_match(trimmed) {
        return true;
    }
    // date/time-only lines carry no item
    if DATETIME_ONLY.is_match(trimmed) {
        return true;
    }
    false
}

/// Extract a price, preferring `$X.XX` over a bare trailing decimal
fn extract_price(line: &str) -> (Option<Decimal>, Option<(usize, usize)>) {
    if let Some(caps) = PRICE_DOLLAR.captures(line) {
        let full = caps.get(0).expect("group 0");
        if let Ok(price) = Decimal::from_str(&caps[1]) {
            return (Some(price), Some((full.start(), full.end())));
        }
    }
    if let Some(caps) = PRICE_TRAILING.captures(line) {
        let full = caps.get(0).expect("group 0");
        let value: f64 = caps[1].parse().unwrap_or(0.0);
        if (PRICE_SANITY_MIN..PRICE_SANITY_MAX).contains(&value) {
            if let Ok(price) = Decimal::from_str(&caps[1]) {
                return (Some(price), Some((full.start(), full.end())));
            }
        }
    }
    (None, None)
}

/// First matching quantity pattern, with the span it occupied
fn extract_qty(line: &str) -> (Option<String>, Option<(usize, usize)>) {
    for pattern in QTY_PATTERNS.iter() {
        if let Some(m) = pattern.find(line) {
            return (Some(m.as_str().trim().to_string()), Some((m.start(), m.end())));
        }
    }
    (None, None)
}

/// Cut the matched spans out of the line; what remains is the item name
fn residual(line: &str, spans: &[Option<(usize, usize)>]) -> String {
    let mut keep: Vec<char> = Vec::new();
    for (i, ch) in line.char_indices() {
        let inside = spans
            .iter()
            .flatten()
            .any(|&(start, end)| i >= start && i < end);
        if !inside {
            keep.push(ch);
        }
    }
    let joined: String = keep.into_iter().collect();
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_line(line: &str) -> Option<ParsedLine> {
    let (price, price_span) = extract_price(line);
    let (qty_text, qty_span) = extract_qty(line);
    let name = residual(line, &[price_span, qty_span]);

    if name.len() < 3 || !name.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    Some(ParsedLine {
        raw_line: line.to_string(),
        item_name: name,
        qty_text,
        price,
    })
}

/// Vendor comes from one of the first five lines of the receipt
fn extract_vendor(lines: &[&str]) -> Option<String> {
    for line in lines.iter().take(5) {
        let trimmed = line.trim();
        if trimmed.is_empty()
            || trimmed.starts_with(|c: char| c.is_ascii_digit())
            || PHONE_PREFIX.is_match(trimmed)
            || is_separator_run(trimmed)
        {
            continue;
        }
        return Some(trimmed.to_string());
    }
    None
}

/// First recognizable purchase date anywhere on the receipt.
/// Two-digit years below 50 map to the 2000s.
fn extract_date(text: &str) -> Option<NaiveDate> {
    if let Some(caps) = DATE_ISO.captures(text) {
        let (y, m, d) = (caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?);
        if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
            return Some(date);
        }
    }
    if let Some(caps) = DATE_MDY.captures(text) {
        let month: u32 = caps[1].parse().ok()?;
        let day: u32 = caps[2].parse().ok()?;
        let mut year: i32 = caps[3].parse().ok()?;
        if year < 100 {
            year += if year < 50 { 2000 } else { 1900 };
        }
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }
    None
}

/// Parse raw OCR text into structured line records plus header metadata
pub fn parse_receipt(text: &str) -> ParsedReceipt {
    let raw_lines: Vec<&str> = text.lines().collect();

    let mut lines = Vec::new();
    let mut discarded = 0usize;
    for (idx, raw) in raw_lines.iter().enumerate() {
        if is_ignored(raw) {
            discarded += 1;
            continue;
        }
        match parse_line(raw) {
            // Header zone: a line in the first five with neither price nor
            // quantity is store/vendor metadata, not an item
            Some(parsed) if idx < 5 && parsed.price.is_none() && parsed.qty_text.is_none() => {
                discarded += 1;
            }
            Some(parsed) => lines.push(parsed),
            None => discarded += 1,
        }
    }

    ParsedReceipt {
        vendor: extract_vendor(&raw_lines),
        purchased_on: extract_date(text),
        lines,
        discarded_lines: discarded,
    }
}
