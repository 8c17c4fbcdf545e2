//! Content-hash dedupe fingerprint
//!
//! SHA-256 over normalized OCR text + normalized vendor + purchase date,
//! joined with `|`. Stable under whitespace collapse and case folding, so
//! re-uploads of the same receipt photo land on the same canonical row.

use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("static regex"));

/// Trim, collapse all whitespace runs to single spaces, lowercase, strip
/// non-printable characters.
fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = true;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        } else if !ch.is_control() {
            for lower in ch.to_lowercase() {
                out.push(lower);
            }
            last_was_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Pull the `YYYY-MM-DD` day out of any ISO-ish timestamp string
fn normalize_date(purchased_at: Option<&str>) -> String {
    purchased_at
        .and_then(|s| ISO_DATE.find(s))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// 64-char lowercase hex fingerprint of a receipt's content
pub fn content_hash(ocr_text: &str, vendor: Option<&str>, purchased_at: Option<&str>) -> String {
    let text = normalize_text(ocr_text);
    let vendor = normalize_text(vendor.unwrap_or(""));
    let date = normalize_date(purchased_at);

    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update(b"|");
    hasher.update(vendor.as_bytes());
    hasher.update(b"|");
    hasher.update(date.as_bytes());
    hex::encode(hasher.finalize())
}
