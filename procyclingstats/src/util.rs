use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};
use crate::value::Value;

// 1: day, 2: month name, 3: year ("21st September 1998", "1 January 1990")
const REGEX_LONG_DATE: &'static str = r#"(\d{1,2})(?:st|nd|rd|th)?\s+([A-Za-z]+)\s+(\d{4})"#;
// 1: day, 2: month (both numeric, "05/07", "5-7", "05.07")
const REGEX_DAY_MONTH_NUMERIC: &'static str = r#"^(\d{1,2})[/.-](\d{1,2})$"#;
// 1: day, 2: month name ("1 Aug", "01-August")
const REGEX_DAY_MONTH_NAMED: &'static str = r#"(\d{1,2})[\s-]+([A-Za-z]{3,})"#;
const REGEX_NUMBER: &'static str = r#"-?\d+(?:[.,]\d+)?"#;

lazy_static! {
    static ref RE_LONG_DATE: Regex = Regex::new(REGEX_LONG_DATE).unwrap();
    static ref RE_DAY_MONTH_NUMERIC: Regex = Regex::new(REGEX_DAY_MONTH_NUMERIC).unwrap();
    static ref RE_DAY_MONTH_NAMED: Regex = Regex::new(REGEX_DAY_MONTH_NAMED).unwrap();
    static ref RE_NUMBER: Regex = Regex::new(REGEX_NUMBER).unwrap();
}

/// Collapses runs of whitespace (including nbsp) into single spaces
pub fn normalize_ws(s: &str) -> String {
    s.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn month_number(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    let month = match name.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Finds a long-form date ("21st September 1998") in `text`
pub fn parse_long_date(text: &str) -> Result<NaiveDate> {
    let captures = RE_LONG_DATE
        .captures(text)
        .ok_or_else(|| Error::expected(format!("no date in {:?}", text)))?;
    let day: u32 = captures[1].parse().map_err(Error::unexpected)?;
    let month = month_number(&captures[2])
        .ok_or_else(|| Error::unexpected(format!("invalid month: {}", &captures[2])))?;
    let year: i32 = captures[3].parse().map_err(Error::unexpected)?;
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| Error::unexpected(format!("invalid date {:?}", text)))
}

/// `YYYY-MM-DD` for a long-form date
pub fn convert_date(text: &str) -> Result<String> {
    Ok(parse_long_date(text)?.format("%Y-%m-%d").to_string())
}

/// Converts a day-first partial date ("05/07", "1 Aug") into `MM-DD`
pub fn get_day_month(text: &str) -> Result<String> {
    let text = text.trim();
    let (day, month) = if let Some(c) = RE_DAY_MONTH_NUMERIC.captures(text) {
        (
            c[1].parse::<u32>().map_err(Error::unexpected)?,
            c[2].parse::<u32>().map_err(Error::unexpected)?,
        )
    } else if let Some(c) = RE_DAY_MONTH_NAMED.captures(text) {
        let month = month_number(&c[2])
            .ok_or_else(|| Error::unexpected(format!("invalid month: {}", &c[2])))?;
        (c[1].parse::<u32>().map_err(Error::unexpected)?, month)
    } else {
        return Err(Error::unexpected(format!("invalid day-month {:?}", text)));
    };

    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(Error::unexpected(format!("invalid day-month {:?}", text)));
    }
    Ok(format!("{:02}-{:02}", month, day))
}

/// First number in `text`, accepting a decimal comma
pub fn parse_float(text: &str) -> Option<f64> {
    let m = RE_NUMBER.find(text)?;
    m.as_str().replace(',', ".").parse().ok()
}

/// Integer value of `text`, ignoring thousands separators
pub fn parse_int(text: &str) -> Option<i64> {
    let digits: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '.' | ' ' | '\u{a0}'))
        .collect();
    digits.parse().ok()
}

/// Points cells: integers stay integers, empty cells count as zero
pub fn parse_points(text: &str) -> Value {
    let text = text.trim();
    if text.is_empty() || text == "-" {
        return Value::Int(0);
    }
    match text.parse::<i64>() {
        Ok(i) => Value::Int(i),
        Err(_) => match parse_float(text) {
            Some(f) if f.fract() == 0.0 => Value::Int(f as i64),
            Some(f) => Value::Float(f),
            None => Value::Int(0),
        },
    }
}

/// Text inside the first pair of parentheses, "UAE Team Emirates (WT)" -> "WT"
pub fn parenthesized(text: &str) -> Option<&str> {
    let start = text.find('(')?;
    let end = text[start..].find(')')? + start;
    Some(text[start + 1..end].trim())
}

/// Text before the first parenthesis
pub fn strip_parenthesized(text: &str) -> &str {
    match text.find('(') {
        Some(i) => text[..i].trim(),
        None => text.trim(),
    }
}
