//! Time coordinate decoding
//!
//! NetCDF cubes store time as numeric offsets with CF-style units such as
//! `days since 1901-01-01 00:00:00`. Some products ship a time variable whose
//! values are unusable; for those the axis is rebuilt as consecutive month
//! starts from a known origin.

use crate::errors::{ExtractError, Result};
use chrono::{Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use serde::Deserialize;

/// How the time axis of a cube is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimeAxisSpec {
    /// Decode stored values with their `units` attribute
    #[default]
    Cf,
    /// Month starts counted from `year-month`, one per time step
    MonthlyFrom { year: i32, month: u32 },
}

/// Inclusive date window applied to decoded time steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, time: &NaiveDateTime) -> bool {
        let date = time.date();
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Unit {
    Seconds(f64),
    Months(u32),
}

fn parse_unit(token: &str) -> Option<Unit> {
    match token {
        "seconds" | "second" | "secs" | "sec" | "s" => Some(Unit::Seconds(1.0)),
        "minutes" | "minute" | "mins" | "min" => Some(Unit::Seconds(60.0)),
        "hours" | "hour" | "hrs" | "hr" | "h" => Some(Unit::Seconds(3600.0)),
        "days" | "day" | "d" => Some(Unit::Seconds(86_400.0)),
        "months" | "month" => Some(Unit::Months(1)),
        "years" | "year" => Some(Unit::Months(12)),
        _ => None,
    }
}

fn parse_reference(text: &str, units: &str) -> Result<NaiveDateTime> {
    let invalid = |message: String| ExtractError::InvalidTimeUnits {
        units: units.to_string(),
        message,
    };

    let mut text = text.trim();
    for suffix in ["UTC", "utc", "Z", "+00:00", "+0000"] {
        if let Some(stripped) = text.strip_suffix(suffix) {
            text = stripped.trim_end();
        }
    }

    let (date_part, time_part) = match text.split_once(&['T', 't', ' '][..]) {
        Some((d, t)) => (d, Some(t.trim())),
        None => (text, None),
    };

    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|e| invalid(format!("bad reference date '{date_part}': {e}")))?;

    let time = match time_part.filter(|t| !t.is_empty()) {
        None => NaiveTime::MIN,
        Some(t) => ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"]
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(t, fmt).ok())
            .ok_or_else(|| invalid(format!("bad reference time '{t}'")))?,
    };

    Ok(date.and_time(time))
}

/// Decodes numeric time values with a CF `units` string.
pub fn decode_cf_times(values: &[f64], units: &str) -> Result<Vec<NaiveDateTime>> {
    let invalid = |message: String| ExtractError::InvalidTimeUnits {
        units: units.to_string(),
        message,
    };

    let trimmed = units.trim();
    // ASCII lowercasing keeps byte offsets valid for slicing `trimmed`
    let lowered = trimmed.to_ascii_lowercase();
    let split = lowered
        .find(" since ")
        .ok_or_else(|| invalid("expected '<unit> since <reference>'".to_string()))?;
    let unit_token = lowered[..split].trim();
    let unit = parse_unit(unit_token)
        .ok_or_else(|| invalid(format!("unsupported unit '{unit_token}'")))?;
    let reference = parse_reference(&trimmed[split + " since ".len()..], units)?;

    values
        .iter()
        .map(|&value| {
            if !value.is_finite() {
                return Err(invalid(format!("non-finite time value {value}")));
            }
            let decoded = match unit {
                Unit::Seconds(scale) => {
                    let millis = (value * scale * 1000.0).round() as i64;
                    TimeDelta::try_milliseconds(millis)
                        .and_then(|delta| reference.checked_add_signed(delta))
                }
                Unit::Months(per_unit) => {
                    if value.fract() != 0.0 {
                        return Err(invalid(format!("non-integral calendar offset {value}")));
                    }
                    let months = (value.abs() as u32).checked_mul(per_unit);
                    months.and_then(|m| {
                        if value >= 0.0 {
                            reference.checked_add_months(Months::new(m))
                        } else {
                            reference.checked_sub_months(Months::new(m))
                        }
                    })
                }
            };
            decoded.ok_or_else(|| invalid(format!("offset {value} out of range")))
        })
        .collect()
}

/// Builds `count` month-start timestamps beginning at `year-month`.
pub fn monthly_axis(year: i32, month: u32, count: usize) -> Result<Vec<NaiveDateTime>> {
    let origin = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        ExtractError::Generic(format!("Invalid monthly origin {year}-{month:02}"))
    })?;

    (0..count)
        .map(|i| {
            u32::try_from(i)
                .ok()
                .and_then(|m| origin.checked_add_months(Months::new(m)))
                .map(|d| d.and_time(NaiveTime::MIN))
                .ok_or_else(|| ExtractError::Generic(format!("Monthly step {i} out of range")))
        })
        .collect()
}

/// Picks the label layout for a set of time keys: date only when every
/// step falls on midnight.
pub fn label_format(times: &[NaiveDateTime]) -> &'static str {
    let midnight_only = times
        .iter()
        .all(|t| t.hour() == 0 && t.minute() == 0 && t.second() == 0 && t.nanosecond() == 0);
    if midnight_only {
        "%Y-%m-%d"
    } else {
        "%Y-%m-%d %H:%M:%S"
    }
}
