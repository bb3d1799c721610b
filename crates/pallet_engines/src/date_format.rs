#![forbid(unsafe_code)]

use chrono::{DateTime, NaiveDate, NaiveDateTime};

pub const DISPLAY_DATE_LAYOUT: &str = "%d/%m/%Y";

const DATE_LAYOUTS: &[&str] = &["%Y-%m-%d"];
const DATE_TIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

pub fn parse_date_portion(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Some(date) = DATE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDate::parse_from_str(raw, layout).ok())
    {
        return Some(date);
    }
    if let Some(date_time) = DATE_TIME_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(raw, layout).ok())
    {
        return Some(date_time.date());
    }
    if let Ok(date_time) = DateTime::parse_from_rfc3339(raw) {
        return Some(date_time.date_naive());
    }
    // Any other timestamp: the part before `T` is the date.
    let (date_part, _) = raw.split_once('T')?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Renders the date portion as `DD/MM/YYYY`. Text in no known layout comes back
/// unchanged.
pub fn format_display_date(raw: &str) -> String {
    match parse_date_portion(raw) {
        Some(date) => date.format(DISPLAY_DATE_LAYOUT).to_string(),
        None => raw.to_string(),
    }
}
