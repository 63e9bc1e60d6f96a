//! Cell normalization: any calamine cell to canonical text
//!
//! `None` means the cell held no value; `Some("")` and whitespace-only strings
//! are values and are kept verbatim. Formula cells arrive here as their cached
//! result, so they follow the numeric or string rules.

use calamine::{Data, ExcelDateTime};
use chrono::{NaiveDateTime, Timelike};

/// Normalize one cell. Never fails: unclassifiable cells (errors) become `None`.
pub fn normalize(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(format_number(*f)),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => Some(format_excel_datetime(dt)),
        Data::DateTimeIso(s) => Some(s.replace('T', " ")),
        Data::DurationIso(s) => Some(s.clone()),
        Data::Error(e) => {
            log::debug!("Unclassifiable cell value {:?}, treated as no value", e);
            None
        }
    }
}

/// Normalize an optional cell (absent cells count as blank)
pub fn normalize_opt(cell: Option<&Data>) -> Option<String> {
    cell.and_then(normalize)
}

/// Integral values print without a decimal point; others use the default representation
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

fn format_excel_datetime(dt: &ExcelDateTime) -> String {
    if dt.is_duration() {
        return format_duration(dt.as_f64());
    }
    match dt.as_datetime() {
        Some(datetime) => format_datetime(&datetime),
        None => format_number(dt.as_f64()),
    }
}

/// Date-only values drop the midnight time part
fn format_datetime(datetime: &NaiveDateTime) -> String {
    if datetime.time().num_seconds_from_midnight() == 0 && datetime.time().nanosecond() == 0 {
        datetime.format("%Y-%m-%d").to_string()
    } else {
        datetime.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

fn format_duration(days: f64) -> String {
    let total_seconds = (days * 86_400f64).round() as i64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
