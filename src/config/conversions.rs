//! String-to-type inference rules for undeclared fields

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::properties::{parse_date, parse_datetime, parse_time};
use crate::value::Value;

/// ISO-ish date: `YYYY-MM-DD` (separators optional)
pub static DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{4})[^0-9]?(0[1-9]|1[0-2])[^0-9]?([12][0-9]|0[1-9]|3[01])$").unwrap()
});

/// Time of day with optional seconds and fraction
pub static TIME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([01][0-9]|2[0-3])[^0-9]?([0-5][0-9])[^0-9]?([0-5][0-9])?[^0-9]?([0-9]{3,6})?$")
        .unwrap()
});

/// Date with an optional time and zone suffix
pub static DATETIME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^([0-9]{4})[^0-9]?(0[1-9]|1[0-2])[^0-9]?([12][0-9]|0[1-9]|3[01])",
        r"([^0-9]?([01][0-9]|2[0-3])[^0-9]?([0-5][0-9])[^0-9]?([0-5][0-9])?[^0-9]?([0-9]{3,6})?",
        r"([zZ]|([+-])([01][0-9]|2[0-3])[^0-9]?([0-5][0-9])?)?)?$"
    ))
    .unwrap()
});

/// Plain decimal with a fractional part
pub static DECIMAL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9]+)\.([0-9]+)$").unwrap());

/// Converter signature: raw string to a typed value
pub type Converter = fn(&str) -> Result<Value>;

/// One `(pattern, converter)` rule
///
/// Only the kind of the converted value matters: the property registered
/// for that kind in the [`TypeConfig`](super::TypeConfig) then wraps the
/// original string.
#[derive(Clone)]
pub struct StringConversion {
    pattern: Regex,
    convert: Converter,
}

impl StringConversion {
    pub fn new(pattern: Regex, convert: Converter) -> Self {
        Self { pattern, convert }
    }

    /// Compile `pattern` and pair it with `convert`
    pub fn from_pattern(pattern: &str, convert: Converter) -> Result<Self, regex::Error> {
        Ok(Self::new(Regex::new(pattern)?, convert))
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn matches(&self, value: &str) -> bool {
        self.pattern.is_match(value)
    }

    pub fn convert(&self, value: &str) -> Result<Value> {
        (self.convert)(value)
    }
}

impl fmt::Debug for StringConversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringConversion")
            .field("pattern", &self.pattern.as_str())
            .finish_non_exhaustive()
    }
}

fn convert_date(value: &str) -> Result<Value> {
    parse_date(value).map(Value::Date)
}

fn convert_time(value: &str) -> Result<Value> {
    parse_time(value, false).map(Value::Time)
}

fn convert_datetime(value: &str) -> Result<Value> {
    parse_datetime(value, false).map(Value::DateTime)
}

fn convert_decimal(value: &str) -> Result<Value> {
    Decimal::from_str(value)
        .map(Value::Decimal)
        .map_err(|e| Error::bad_value(format!("{:?} is not a decimal [{}]", value, e)))
}

/// The default rules, in match order: date, time, datetime, decimal
pub fn default_string_conversions() -> Vec<StringConversion> {
    vec![
        StringConversion::new(DATE_PATTERN.clone(), convert_date),
        StringConversion::new(TIME_PATTERN.clone(), convert_time),
        StringConversion::new(DATETIME_PATTERN.clone(), convert_datetime),
        StringConversion::new(DECIMAL_PATTERN.clone(), convert_decimal),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_match(value: &str) -> Option<usize> {
        default_string_conversions()
            .iter()
            .position(|rule| rule.matches(value))
    }

    #[test]
    fn test_date_pattern() {
        assert!(DATE_PATTERN.is_match("2014-02-04"));
        assert!(DATE_PATTERN.is_match("20140204"));
        assert!(!DATE_PATTERN.is_match("2014-13-04"));
        assert!(!DATE_PATTERN.is_match("2014-02-04T00:00:00"));
    }

    #[test]
    fn test_rule_order() {
        assert_eq!(first_match("2014-02-04"), Some(0));
        assert_eq!(first_match("01:02:03"), Some(1));
        assert_eq!(first_match("2014-01-03T01:02:03Z"), Some(2));
        assert_eq!(first_match("1.2"), Some(3));
        assert_eq!(first_match("hello"), None);
        assert_eq!(first_match("12"), None);
    }

    #[test]
    fn test_converters() {
        let rules = default_string_conversions();
        assert_eq!(
            rules[0].convert("2014-02-04").unwrap(),
            Value::Date(chrono::NaiveDate::from_ymd_opt(2014, 2, 4).unwrap())
        );
        assert_eq!(
            rules[3].convert("1.2").unwrap(),
            Value::Decimal(Decimal::from_str("1.2").unwrap())
        );
        // matches the time pattern but is not a valid time
        assert!(rules[1].convert("1234").is_err());
    }
}
