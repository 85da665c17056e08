//! Presentation filters available to every template.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};
use tera::{Result as TeraResult, Value};

use crate::invoice::models::coerce_number;

pub const DEFAULT_CURRENCY: &str = "₪";
const DEFAULT_DATE_FORMAT: &str = "DD/MM/YYYY";

/// Format `amount` for display.
///
/// Shekel amounts follow he-IL currency formatting (grouped digits, the
/// symbol trailing after a no-break space, RTL mark in front). Any other
/// symbol is simply prefixed to a two-decimal figure.
pub fn format_currency(amount: f64, symbol: &str) -> String {
    let symbol = if symbol.is_empty() { DEFAULT_CURRENCY } else { symbol };
    if symbol == "₪" || symbol == "ILS" {
        format_shekel(amount)
    } else {
        format!("{}{:.2}", symbol, amount)
    }
}

fn format_shekel(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let grouped = whole
        .parse::<u64>()
        .map(|n| n.to_formatted_string(&Locale::he))
        .unwrap_or_else(|_| whole.to_string());
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("\u{200f}{}{}.{}\u{a0}₪", sign, grouped, fraction)
}

/// Plain quantity or rate: whole values print without a fractional part.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Translate moment-style tokens (`YYYY`, `MM`, `DD`, ...) into a chrono format string.
pub fn moment_to_chrono(format: &str) -> String {
    const TOKENS: [(&str, &str); 7] = [
        ("YYYY", "%Y"),
        ("YY", "%y"),
        ("MM", "%m"),
        ("DD", "%d"),
        ("HH", "%H"),
        ("mm", "%M"),
        ("ss", "%S"),
    ];

    let mut out = String::with_capacity(format.len() * 2);
    let mut rest = format;
    'outer: while !rest.is_empty() {
        for (token, replacement) in TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(replacement);
                rest = tail;
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            if ch == '%' {
                out.push_str("%%");
            } else {
                out.push(ch);
            }
        }
        rest = chars.as_str();
    }
    out
}

fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_local())
}

/// Format a date string with a moment-style pattern. Unparsable input comes back unchanged.
pub fn format_date(raw: &str, format: &str) -> String {
    match parse_date(raw) {
        Some(dt) => dt.format(&moment_to_chrono(format)).to_string(),
        None => raw.to_string(),
    }
}

fn number_arg(args: &HashMap<String, Value>, name: &str) -> f64 {
    args.get(name).and_then(coerce_number).unwrap_or(0.0)
}

pub fn format_currency_filter(value: &Value, args: &HashMap<String, Value>) -> TeraResult<Value> {
    let amount = coerce_number(value).unwrap_or(0.0);
    let symbol = args
        .get("currency")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_CURRENCY);
    Ok(Value::String(format_currency(amount, symbol)))
}

pub fn format_date_filter(value: &Value, args: &HashMap<String, Value>) -> TeraResult<Value> {
    let format = args
        .get("format")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_DATE_FORMAT);
    let formatted = match value {
        Value::String(raw) => format_date(raw, format),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    Ok(Value::String(formatted))
}

pub fn format_number_filter(value: &Value, _args: &HashMap<String, Value>) -> TeraResult<Value> {
    let formatted = match (coerce_number(value), value) {
        (Some(number), _) => format_number(number),
        (None, Value::Null) => String::new(),
        (None, Value::String(raw)) => raw.clone(),
        (None, other) => other.to_string(),
    };
    Ok(Value::String(formatted))
}

pub fn multiply_filter(value: &Value, args: &HashMap<String, Value>) -> TeraResult<Value> {
    let product = coerce_number(value).unwrap_or(0.0) * number_arg(args, "by");
    Ok(Value::String(format!("{:.2}", product)))
}

pub fn add_filter(value: &Value, args: &HashMap<String, Value>) -> TeraResult<Value> {
    let sum = coerce_number(value).unwrap_or(0.0) + number_arg(args, "value");
    Ok(Value::String(format!("{:.2}", sum)))
}
