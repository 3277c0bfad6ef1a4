//! Field normalization — the canonical comparable form for every field kind.
//!
//! The diff planner decides "changed vs unchanged" by structural equality of
//! normalized payloads, so every function here must be pure, total (defined
//! for every legal input) and idempotent: `normalize(normalize(x)) ==
//! normalize(x)`. Nothing in this module touches the network or the clock.

use chrono::NaiveDate;
use serde_json::Value;

/// Date formats accepted for full dates, tried in order.
const FULL_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%d/%m/%Y"];

/// Month-name formats ("Jan 2024", "January 2024").
const MONTH_NAME_FORMATS: &[&str] = &["%b %Y", "%B %Y"];

/// Normalizes a heterogeneous date representation to `YYYY-MM-DD`.
///
/// Accepts full dates, `YYYY-MM` year-months, month-name strings and bare
/// years; missing components default to the first day/month. Anything
/// unparseable that still contains a 4-digit year collapses to `YYYY-01-01`;
/// otherwise the result is the empty string.
pub fn normalize_date(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    for fmt in FULL_DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return d.format("%Y-%m-%d").to_string();
        }
    }

    // Year-month ("2024-01", "2024/01")
    for sep in ['-', '/'] {
        let padded = format!("{}{}01", raw, sep);
        let fmt = if sep == '-' { "%Y-%m-%d" } else { "%Y/%m/%d" };
        if raw.matches(sep).count() == 1 {
            if let Ok(d) = NaiveDate::parse_from_str(&padded, fmt) {
                return d.format("%Y-%m-%d").to_string();
            }
        }
    }

    // Month-name forms
    for fmt in MONTH_NAME_FORMATS {
        let padded = format!("01 {}", raw);
        let day_fmt = format!("%d {}", fmt);
        if let Ok(d) = NaiveDate::parse_from_str(&padded, &day_fmt) {
            return d.format("%Y-%m-%d").to_string();
        }
    }

    // Last resort: first 4-digit run is treated as a bare year.
    let year = normalize_year(raw);
    if year.is_empty() {
        String::new()
    } else {
        format!("{}-01-01", year)
    }
}

/// Extracts the first 4-digit run from a string, or empty if none exists.
pub fn normalize_year(raw: &str) -> String {
    let mut run = String::new();
    for c in raw.chars() {
        if c.is_ascii_digit() {
            run.push(c);
            if run.len() == 4 {
                return run;
            }
        } else {
            run.clear();
        }
    }
    String::new()
}

/// Trims surrounding whitespace; the canonical form of a free-text field.
pub fn normalize_string(raw: &str) -> String {
    raw.trim().to_string()
}

/// Case-insensitive key variant: trimmed and lowercased. Used for content
/// keys so `"Python"` and `"python "` compare equal.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Normalizes a string-set field to a sorted, deduplicated list.
///
/// Accepts a JSON array of strings or a single `,`/`;`-delimited string.
/// Sorting makes the comparison order-insensitive.
pub fn normalize_string_set(value: &Value) -> Vec<String> {
    let mut items: Vec<String> = match value {
        Value::Array(arr) => arr
            .iter()
            .filter_map(|v| v.as_str())
            .map(normalize_string)
            .collect(),
        Value::String(s) => s.split([',', ';']).map(normalize_string).collect(),
        _ => Vec::new(),
    };
    items.retain(|s| !s.is_empty());
    items.sort();
    items.dedup();
    items
}

/// Tri-state boolean: explicit true/false vs "unset" (`None`).
///
/// Accepts JSON booleans, the usual string spellings, and 0/1 numbers.
/// Anything else is unset rather than an error.
pub fn normalize_tristate(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        _ => None,
    }
}
