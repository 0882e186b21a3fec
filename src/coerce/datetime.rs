//! Date/time pattern translation and parsing.
//!
//! Field patterns are written in the `yyyyMMdd` letter style common to
//! flat-file layouts and translated once into chrono format strings.

use std::fmt::Write as _;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

static TOKENS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"'[^']*'|y+|M+|d+|H+|h+|m+|s+|S+|a+|E+|[A-Za-z]|[^'A-Za-z]+")
        .expect("pattern tokenizer is valid")
});

/// Translate a letter-style pattern (`dd-MMM-yyyy HH:mm`) to a chrono format.
///
/// A pattern that already contains `%` is returned unchanged.
///
/// ```
/// use ironflat::coerce::datetime::to_chrono_format;
///
/// assert_eq!(to_chrono_format("yyyyMMdd"), "%Y%m%d");
/// assert_eq!(to_chrono_format("dd-MMM-yyyy"), "%d-%b-%Y");
/// assert_eq!(to_chrono_format("yyyy-MM-dd'T'HH:mm:ss"), "%Y-%m-%dT%H:%M:%S");
/// ```
pub fn to_chrono_format(pattern: &str) -> String {
    if pattern.contains('%') {
        return pattern.to_string();
    }
    let mut out = String::with_capacity(pattern.len() * 2);
    for token in TOKENS.find_iter(pattern) {
        let t = token.as_str();
        let mapped = match t {
            "yyyy" | "y" | "yyy" => "%Y",
            "yy" => "%y",
            "MMMM" => "%B",
            "MMM" => "%b",
            "MM" => "%m",
            "M" => "%-m",
            "dd" => "%d",
            "d" => "%-d",
            "HH" => "%H",
            "H" => "%-H",
            "hh" => "%I",
            "h" => "%-I",
            "mm" => "%M",
            "ss" => "%S",
            "SSS" => "%3f",
            "SSSSSS" => "%6f",
            "SSSSSSSSS" => "%9f",
            "a" => "%p",
            "EEEE" => "%A",
            "E" | "EE" | "EEE" => "%a",
            _ => {
                push_literal(&mut out, t);
                continue;
            }
        };
        out.push_str(mapped);
    }
    out
}

fn push_literal(out: &mut String, token: &str) {
    let text = if token == "''" {
        "'"
    } else if token.len() >= 2 && token.starts_with('\'') && token.ends_with('\'') {
        &token[1..token.len() - 1]
    } else {
        token
    };
    for c in text.chars() {
        if c == '%' {
            out.push_str("%%");
        } else {
            out.push(c);
        }
    }
}

/// Parse a date. Month and weekday names match case-insensitively.
pub fn parse_date(text: &str, format: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(text, format).map_err(|e| format!("{e} (format {format})"))
}

/// Parse a date-time; a date-only format yields midnight.
pub fn parse_date_time(text: &str, format: &str) -> Result<NaiveDateTime, String> {
    match NaiveDateTime::parse_from_str(text, format) {
        Ok(dt) => Ok(dt),
        Err(e) => NaiveDate::parse_from_str(text, format)
            .map(|d| d.and_time(NaiveTime::MIN))
            .map_err(|_| format!("{e} (format {format})")),
    }
}

/// Format a date-time, surfacing bad format strings as errors instead of panicking.
pub fn format_date_time(value: &NaiveDateTime, format: &str) -> Result<String, String> {
    let mut out = String::new();
    write!(out, "{}", value.format(format))
        .map_err(|_| format!("cannot format {value} with format {format}"))?;
    Ok(out)
}

pub fn format_date(value: &NaiveDate, format: &str) -> Result<String, String> {
    format_date_time(&value.and_time(NaiveTime::MIN), format)
}
