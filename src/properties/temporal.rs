//! Date, datetime and time properties
//!
//! Canonical forms are ISO-8601 strings without offsets:
//!
//! | property  | canonical                     | exact mode                       |
//! |-----------|-------------------------------|----------------------------------|
//! | date      | `YYYY-MM-DD`                  | n/a                              |
//! | datetime  | `YYYY-MM-DDTHH:MM:SSZ`        | `YYYY-MM-DDTHH:MM:SS.ffffffZ`    |
//! | time      | `HH:MM:SS`                    | `HH:MM:SS[.ffffff]`              |
//!
//! Outside exact mode sub-second precision is dropped, and anything after
//! the seconds (fraction, `Z`, numeric offset) is ignored when parsing.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde_json::Value as JsonValue;

use super::{Property, PropertyOptions};
use crate::error::{Error, Result};
use crate::value::Value;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const TIME_FORMAT: &str = "%H:%M:%S";

fn not_formatted(value: &str, kind: &str) -> Error {
    Error::bad_value(format!("{:?} is not a {}-formatted string", value, kind))
}

/// Split off a `.ffffff` fraction of one to six digits, as microseconds
fn split_micros(value: &str) -> Option<(&str, u32)> {
    let (head, fraction) = value.split_once('.')?;
    if fraction.is_empty() || fraction.len() > 6 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let micros = format!("{:0<6}", fraction).parse().ok()?;
    Some((head, micros))
}

fn before_fraction(value: &str) -> &str {
    value.split_once('.').map_or(value, |(head, _)| head)
}

/// Parse `YYYY-MM-DD`
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| not_formatted(value, "date"))
}

/// Parse an ISO datetime
///
/// Non-exact parsing reads the first 19 characters before any fraction;
/// exact parsing requires `.ffffff` followed by `Z`.
pub fn parse_datetime(value: &str, exact: bool) -> Result<NaiveDateTime> {
    let err = || not_formatted(value, "datetime");
    if exact {
        let (head, micros) = value
            .strip_suffix('Z')
            .and_then(split_micros)
            .ok_or_else(err)?;
        let parsed = NaiveDateTime::parse_from_str(head, DATETIME_FORMAT).map_err(|_| err())?;
        return parsed.with_nanosecond(micros * 1_000).ok_or_else(err);
    }
    let head = before_fraction(value);
    let end = head.char_indices().nth(19).map_or(head.len(), |(i, _)| i);
    NaiveDateTime::parse_from_str(&head[..end], DATETIME_FORMAT).map_err(|_| err())
}

/// Parse `HH:MM:SS`, or `HH:MM:SS.ffffff` when `exact`
pub fn parse_time(value: &str, exact: bool) -> Result<NaiveTime> {
    let err = || not_formatted(value, "time");
    if exact {
        let (head, micros) = split_micros(value).ok_or_else(err)?;
        let parsed = NaiveTime::parse_from_str(head, TIME_FORMAT).map_err(|_| err())?;
        return parsed.with_nanosecond(micros * 1_000).ok_or_else(err);
    }
    NaiveTime::parse_from_str(before_fraction(value), TIME_FORMAT).map_err(|_| err())
}

fn truncate_micros<T: Timelike>(value: T) -> T {
    let nanos = value.nanosecond() / 1_000 * 1_000;
    value.with_nanosecond(nanos).unwrap_or(value)
}

fn truncate_seconds<T: Timelike>(value: T) -> T {
    value.with_nanosecond(0).unwrap_or(value)
}

fn expect_string<'a>(json: &'a JsonValue, kind: &str) -> Result<&'a str> {
    json.as_str()
        .ok_or_else(|| Error::bad_value(format!("{} is not a {}-formatted string", json, kind)))
}

fn not_an_object(value: &Value, kind: &str) -> Error {
    Error::bad_value(format!("{} is not a {} object", value, kind))
}

/// Calendar dates
#[derive(Debug, Default)]
pub struct DateProperty {
    options: PropertyOptions,
}

impl DateProperty {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Property for DateProperty {
    options_accessors!();

    fn type_name(&self) -> &'static str {
        "DateProperty"
    }

    fn wrap(&self, json: &JsonValue) -> Result<Value> {
        parse_date(expect_string(json, "date")?).map(Value::Date)
    }

    fn unwrap(&self, value: Value) -> Result<(Value, JsonValue)> {
        match value {
            Value::Date(d) => Ok((value, JsonValue::String(d.format(DATE_FORMAT).to_string()))),
            // a datetime is a date; it keeps its own ISO form
            Value::DateTime(dt) => {
                let dt = truncate_micros(dt);
                let format = if dt.nanosecond() == 0 {
                    DATETIME_FORMAT
                } else {
                    "%Y-%m-%dT%H:%M:%S%.6f"
                };
                let json = JsonValue::String(dt.format(format).to_string());
                Ok((Value::DateTime(dt), json))
            }
            other => Err(not_an_object(&other, "date")),
        }
    }
}

/// Naive datetimes, serialized with a `Z` suffix
#[derive(Debug, Default)]
pub struct DateTimeProperty {
    options: PropertyOptions,
    exact: bool,
}

impl DateTimeProperty {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep microseconds and require them on input
    pub fn exact(mut self) -> Self {
        self.exact = true;
        self
    }

    pub fn is_exact(&self) -> bool {
        self.exact
    }
}

impl Property for DateTimeProperty {
    options_accessors!();

    fn type_name(&self) -> &'static str {
        "DateTimeProperty"
    }

    fn wrap(&self, json: &JsonValue) -> Result<Value> {
        parse_datetime(expect_string(json, "datetime")?, self.exact).map(Value::DateTime)
    }

    fn unwrap(&self, value: Value) -> Result<(Value, JsonValue)> {
        let Value::DateTime(dt) = value else {
            return Err(not_an_object(&value, "datetime"));
        };
        let (dt, format) = if self.exact {
            (truncate_micros(dt), "%Y-%m-%dT%H:%M:%S%.6fZ")
        } else {
            (truncate_seconds(dt), "%Y-%m-%dT%H:%M:%SZ")
        };
        let json = JsonValue::String(dt.format(format).to_string());
        Ok((Value::DateTime(dt), json))
    }
}

/// Times of day
#[derive(Debug, Default)]
pub struct TimeProperty {
    options: PropertyOptions,
    exact: bool,
}

impl TimeProperty {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep microseconds and require them on input
    pub fn exact(mut self) -> Self {
        self.exact = true;
        self
    }
}

impl Property for TimeProperty {
    options_accessors!();

    fn type_name(&self) -> &'static str {
        "TimeProperty"
    }

    fn wrap(&self, json: &JsonValue) -> Result<Value> {
        parse_time(expect_string(json, "time")?, self.exact).map(Value::Time)
    }

    fn unwrap(&self, value: Value) -> Result<(Value, JsonValue)> {
        let Value::Time(t) = value else {
            return Err(not_an_object(&value, "time"));
        };
        let t = if self.exact {
            truncate_micros(t)
        } else {
            truncate_seconds(t)
        };
        let format = if t.nanosecond() == 0 {
            TIME_FORMAT
        } else {
            "%H:%M:%S%.6f"
        };
        Ok((Value::Time(t), JsonValue::String(t.format(format).to_string())))
    }
}
