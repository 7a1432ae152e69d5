// src/domain/coerce.rs

//! Raw JSON value -> typed attribute conversion.
//!
//! Every (input type, target type) pair has a defined outcome. JSON `null` and
//! strings that are empty after trimming count as absent for every target.
//!
//! | target    | string                                   | number                       | bool            | array / object |
//! |-----------|------------------------------------------|------------------------------|-----------------|----------------|
//! | text      | as given                                 | decimal text                 | "true"/"false"  | reject         |
//! | integer   | integer, or decimal with zero fraction   | integral values only         | reject          | reject         |
//! | decimal   | plain or scientific notation             | exact value                  | reject          | reject         |
//! | boolean   | true/false t/f yes/no y/n 1/0 on/off     | 0 or 1                       | as is           | reject         |
//! | date/time | RFC 3339 and the formats in DATE_FORMATS | Unix seconds (or millis)     | reject          | reject         |
//! | object    | text holding a JSON object               | reject                       | reject          | object only    |

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::errors::ValidationError;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

// Above this magnitude a numeric timestamp is read as milliseconds.
const MILLIS_THRESHOLD: u64 = 20_000_000_000;

/// True for values that mean "no data": null and blank strings.
pub fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn reject(field: &str, value: &Value, target: &str) -> ValidationError {
    ValidationError::new(field, format!("cannot read {} as {target}", type_name(value)))
}

pub fn to_text(field: &str, value: &Value) -> Result<Option<String>, ValidationError> {
    if is_absent(value) {
        return Ok(None);
    }
    match value {
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(reject(field, other, "text")),
    }
}

pub fn to_integer(field: &str, value: &Value) -> Result<Option<i64>, ValidationError> {
    if is_absent(value) {
        return Ok(None);
    }
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(Some(i));
            }
            let d = number_to_decimal(field, n)?;
            integral(field, d).map(Some)
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Ok(Some(i));
            }
            let d = parse_decimal(s)
                .ok_or_else(|| ValidationError::new(field, format!("'{s}' is not an integer")))?;
            integral(field, d).map(Some)
        }
        other => Err(reject(field, other, "integer")),
    }
}

fn integral(field: &str, d: Decimal) -> Result<i64, ValidationError> {
    if !d.fract().is_zero() {
        return Err(ValidationError::new(
            field,
            format!("{d} has a fractional part"),
        ));
    }
    d.to_i64()
        .ok_or_else(|| ValidationError::new(field, format!("{d} is out of range")))
}

pub fn to_decimal(field: &str, value: &Value) -> Result<Option<Decimal>, ValidationError> {
    if is_absent(value) {
        return Ok(None);
    }
    match value {
        Value::Number(n) => number_to_decimal(field, n).map(Some),
        Value::String(s) => {
            let s = s.trim();
            parse_decimal(s)
                .map(Some)
                .ok_or_else(|| ValidationError::new(field, format!("'{s}' is not a number")))
        }
        other => Err(reject(field, other, "decimal")),
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn number_to_decimal(field: &str, n: &serde_json::Number) -> Result<Decimal, ValidationError> {
    let text = n.to_string();
    parse_decimal(&text)
        .ok_or_else(|| ValidationError::new(field, format!("{text} is out of decimal range")))
}

pub fn to_boolean(field: &str, value: &Value) -> Result<Option<bool>, ValidationError> {
    if is_absent(value) {
        return Ok(None);
    }
    match value {
        Value::Bool(b) => Ok(Some(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(Some(false)),
            Some(1) => Ok(Some(true)),
            _ => Err(ValidationError::new(
                field,
                format!("{n} is not a boolean (expected 0 or 1)"),
            )),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" | "on" => Ok(Some(true)),
            "false" | "f" | "no" | "n" | "0" | "off" => Ok(Some(false)),
            _ => Err(ValidationError::new(
                field,
                format!("'{}' is not a boolean", s.trim()),
            )),
        },
        other => Err(reject(field, other, "boolean")),
    }
}

pub fn to_datetime(field: &str, value: &Value) -> Result<Option<NaiveDateTime>, ValidationError> {
    if is_absent(value) {
        return Ok(None);
    }
    match value {
        Value::String(s) => parse_datetime(s.trim())
            .map(Some)
            .ok_or_else(|| ValidationError::new(field, format!("'{}' is not a date", s.trim()))),
        Value::Number(n) => {
            let ts = n.as_i64().ok_or_else(|| {
                ValidationError::new(field, format!("{n} is not a whole-second timestamp"))
            })?;
            let parsed = if ts.unsigned_abs() > MILLIS_THRESHOLD {
                DateTime::from_timestamp_millis(ts)
            } else {
                DateTime::from_timestamp(ts, 0)
            };
            parsed
                .map(|dt| Some(dt.naive_utc()))
                .ok_or_else(|| ValidationError::new(field, format!("{ts} is out of range")))
        }
        other => Err(reject(field, other, "date")),
    }
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

pub fn to_json_object(
    field: &str,
    value: &Value,
) -> Result<Option<Map<String, Value>>, ValidationError> {
    if is_absent(value) {
        return Ok(None);
    }
    match value {
        Value::Object(map) => Ok(Some(map.clone())),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(map)) => Ok(Some(map)),
            _ => Err(ValidationError::new(
                field,
                "text does not hold a JSON object",
            )),
        },
        other => Err(reject(field, other, "object")),
    }
}
