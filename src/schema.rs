//! Validation of inbound log payloads.
//!
//! The body arrives as untyped JSON so that every field problem can be
//! reported back at once, with the field name attached, instead of failing
//! on the first serde error.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDateTime, SubsecRound, TimeZone, Utc};
use serde::Serialize;
use serde_json::{Map, Number, Value};
use validator::Validate;

use crate::models::LogEntry;

/// One problem with one field of the payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, code: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// A rejected payload. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.errors.iter().map(|e| e.field.as_str()).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

impl std::error::Error for ValidationError {}

/// Range rules applied once the payload's types are known.
#[derive(Debug, Validate)]
struct RangeChecked {
    #[validate(range(min = 1, max = 5, message = "Mood must be between 1 and 5"))]
    mood: i64,
}

pub fn validate_log_entry(body: &Value) -> Result<LogEntry, ValidationError> {
    let Some(object) = body.as_object() else {
        return Err(ValidationError {
            errors: vec![FieldError::new(
                "body",
                "type",
                "Request body must be a JSON object",
            )],
        });
    };

    let mut errors = Vec::new();

    let timestamp = required(object, "timestamp", &mut errors).and_then(|v| {
        parse_timestamp(v)
            .map_err(|message| errors.push(FieldError::new("timestamp", "datetime", message)))
            .ok()
    });

    let mood = required(object, "mood", &mut errors).and_then(|v| match v.as_i64() {
        Some(mood) => Some(mood),
        None => {
            errors.push(FieldError::new("mood", "int", "Mood must be an integer"));
            None
        }
    });

    let lat = required(object, "lat", &mut errors).and_then(|v| number(v, "lat", &mut errors));
    let lng = required(object, "lng", &mut errors).and_then(|v| number(v, "lng", &mut errors));

    let video_uri = match object.get("videoUri") {
        None | Some(Value::Null) => Some(String::new()),
        Some(Value::String(uri)) => Some(uri.clone()),
        Some(_) => {
            errors.push(FieldError::new(
                "videoUri",
                "string",
                "videoUri must be a string",
            ));
            None
        }
    };

    if let Some(mood) = mood {
        if let Err(range_errors) = (RangeChecked { mood }).validate() {
            let mut fields: Vec<_> = range_errors.field_errors().into_iter().collect();
            fields.sort_by_key(|(field, _)| *field);
            for (field, field_errors) in fields {
                for e in field_errors {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{field} is out of range"));
                    errors.push(FieldError::new(field, &e.code, message));
                }
            }
        }
    }

    match (timestamp, mood, video_uri, lat, lng) {
        (Some(timestamp), Some(mood), Some(video_uri), Some(lat), Some(lng))
            if errors.is_empty() =>
        {
            let mood = i16::try_from(mood).map_err(|_| ValidationError {
                errors: vec![FieldError::new("mood", "range", "Mood must be between 1 and 5")],
            })?;
            Ok(LogEntry {
                timestamp,
                mood,
                video_uri,
                lat,
                lng,
            })
        }
        _ => Err(ValidationError { errors }),
    }
}

fn required<'a>(
    object: &'a Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<&'a Value> {
    match object.get(field) {
        None => {
            errors.push(FieldError::new(field, "required", format!("{field} is required")));
            None
        }
        Some(value) => Some(value),
    }
}

fn number(value: &Value, field: &str, errors: &mut Vec<FieldError>) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => {
            errors.push(FieldError::new(field, "float", format!("{field} must be a number")));
            None
        }
    }
}

/// Epoch values above this magnitude are milliseconds, below it seconds.
const EPOCH_MILLIS_THRESHOLD: f64 = 2e10;

/// Years representable in a PostgreSQL `TIMESTAMPTZ` (4713 BC is year -4712).
const STORE_YEARS: std::ops::RangeInclusive<i32> = -4712..=294_276;

/// Accepts RFC 3339 (any offset), ISO-8601 without an offset (taken as
/// UTC), or a Unix epoch in seconds or milliseconds. The result is rounded to
/// microseconds, the precision the store keeps.
fn parse_timestamp(value: &Value) -> Result<DateTime<Utc>, String> {
    let parsed = match value {
        Value::String(raw) => {
            let raw = raw.trim();
            match DateTime::parse_from_rfc3339(raw) {
                Ok(ts) => ts.with_timezone(&Utc),
                Err(_) => ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                    .map(|naive| Utc.from_utc_datetime(&naive))
                    .ok_or_else(|| {
                        format!("timestamp {raw:?} is not a valid ISO-8601 date-time")
                    })?,
            }
        }
        Value::Number(n) => parse_epoch(n).ok_or_else(|| "timestamp is out of range".to_string())?,
        _ => return Err("timestamp must be an ISO-8601 string or a Unix epoch".to_string()),
    };

    if !STORE_YEARS.contains(&parsed.year()) {
        return Err(format!(
            "timestamp year {} is outside the supported range",
            parsed.year()
        ));
    }
    Ok(parsed.round_subsecs(6))
}

fn parse_epoch(n: &Number) -> Option<DateTime<Utc>> {
    let raw = n.as_f64().filter(|v| v.is_finite())?;
    let is_millis = raw.abs() > EPOCH_MILLIS_THRESHOLD;

    match n.as_i64() {
        Some(millis) if is_millis => Utc.timestamp_millis_opt(millis).single(),
        Some(secs) => Utc.timestamp_opt(secs, 0).single(),
        None => {
            let micros = if is_millis { raw * 1e3 } else { raw * 1e6 };
            if micros.abs() >= i64::MAX as f64 {
                return None;
            }
            Utc.timestamp_nanos(0)
                .checked_add_signed(chrono::Duration::microseconds(micros.round() as i64))
        }
    }
}
