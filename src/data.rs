use anyhow::{Result, anyhow, bail};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

// Slash dates read month-first; day-first only catches what month-first rejects.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M",
];

// Month labels carry no day; chrono needs one, so `%d` is appended with `01`.
const MONTH_FORMATS: &[&str] = &["%Y-%m", "%Y/%m", "%b %Y", "%B %Y", "%b-%Y", "%m/%Y"];

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

/// Parses a timestamp cell. A bare date is accepted and maps to midnight.
pub fn parse_naive_datetime(value: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(parsed);
        }
    }
    if let Ok(date) = parse_naive_date(trimmed) {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    Err(anyhow!("Failed to parse '{value}' as datetime"))
}

/// Parses an `order_month` cell into a date.
///
/// Month-only labels such as `2024-03` or `Mar 2024` land on the first of the
/// month. Full dates and datetimes keep their day, so `2024-03-15` stays on
/// the 15th.
pub fn parse_month_label(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        bail!("Empty month label");
    }
    if let Ok(date) = parse_naive_date(trimmed) {
        return Ok(date);
    }
    if let Ok(dt) = parse_naive_datetime(trimmed) {
        return Ok(dt.date());
    }
    let padded = format!("{trimmed} 01");
    for fmt in MONTH_FORMATS {
        let with_day = format!("{fmt} %d");
        if let Ok(parsed) = NaiveDate::parse_from_str(&padded, &with_day) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as month"))
}

/// Numeric coercion. Non-finite values are rejected so they cannot leak into sums.
pub fn parse_number(value: &str) -> Result<f64> {
    let trimmed = value.trim();
    let parsed: f64 = trimmed
        .parse()
        .map_err(|_| anyhow!("Failed to parse '{value}' as number"))?;
    if !parsed.is_finite() {
        bail!("Non-finite number '{value}'");
    }
    Ok(parsed)
}

pub fn parse_integer(value: &str) -> Result<i64> {
    let trimmed = value.trim();
    if let Ok(parsed) = trimmed.parse::<i64>() {
        return Ok(parsed);
    }
    // "34.0" is what a float-typed export writes for an integer column
    let as_float = parse_number(trimmed)?;
    // `as` saturates, so out-of-range magnitudes must be rejected first
    if as_float.fract() == 0.0 && as_float >= i64::MIN as f64 && as_float < i64::MAX as f64 {
        Ok(as_float as i64)
    } else {
        Err(anyhow!("Failed to parse '{value}' as integer"))
    }
}

pub fn parse_flag(value: &str) -> Result<bool> {
    let lowered = value.trim().to_ascii_lowercase();
    match lowered.as_str() {
        "true" | "t" | "yes" | "y" | "1" | "1.0" => Ok(true),
        "false" | "f" | "no" | "n" | "0" | "0.0" => Ok(false),
        _ => bail!("Failed to parse '{value}' as boolean"),
    }
}

/// Formats a metric the way the rest of the crate prints numbers.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

/// Thousands-separated rendering used for KPI output, e.g. `12,345.68`.
pub fn format_grouped(value: f64, decimals: usize) -> String {
    let rendered = format!("{:.*}", decimals, value.abs());
    let (integer, fraction) = match rendered.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rendered.as_str(), None),
    };
    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (idx, ch) in integer.chars().enumerate() {
        if idx > 0 && (integer.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 && rendered.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    match fraction {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}
