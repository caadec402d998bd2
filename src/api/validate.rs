use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::ApiError;

/// Collects the first failure message per field
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: HashMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: &str) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    /// Record `message` under `field` unless `ok`
    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Validation failed", Some(self.errors)))
        }
    }
}

/// Trimmed value if present and non-empty
pub fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn is_email(value: &str) -> bool {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| {
            !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

/// `HH:MM` (hour 0-23, optional leading zero) with an optional `AM`/`PM` suffix
pub fn is_event_time(value: &str) -> bool {
    let upper = value.trim().to_ascii_uppercase();
    let clock = upper
        .strip_suffix("AM")
        .or_else(|| upper.strip_suffix("PM"))
        .map(str::trim_end)
        .unwrap_or(&upper);

    let Some((hours, minutes)) = clock.split_once(':') else {
        return false;
    };
    let hours_ok = (1..=2).contains(&hours.len())
        && hours.chars().all(|c| c.is_ascii_digit())
        && hours.parse::<u32>().map_or(false, |h| h <= 23);
    let minutes_ok = minutes.len() == 2 && minutes.chars().all(|c| c.is_ascii_digit());

    hours_ok && minutes_ok && NaiveTime::parse_from_str(&format!("{}:{}", hours, minutes), "%H:%M").is_ok()
}

/// Optional leading `+`, then digits, spaces and dashes
pub fn is_phone(value: &str) -> bool {
    let rest = value.strip_prefix('+').unwrap_or(value);
    !rest.is_empty()
        && rest.chars().all(|c| c.is_ascii_digit() || c == ' ' || c == '-')
}

/// ISO-8601 calendar date, or the date part of an ISO-8601 date-time
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(value).map(|dt| dt.date_naive()))
}

/// ISO-8601 date-time with or without an offset, or a bare date.
/// Date-times without an offset (`datetime-local` style) and bare dates are read as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| parse_local_datetime(value).map(|dt| dt.and_utc()))
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        })
}

fn parse_local_datetime(value: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

/// Integer from a JSON number (`80.0` included) or a numeric string
pub fn as_int(value: &Value) -> Option<i64> {
    // Beyond 2^53 a float no longer holds every integer exactly
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;

    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() <= MAX_EXACT)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
