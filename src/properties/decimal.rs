//! Arbitrary precision decimals, stored canonically as strings

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value as JsonValue;

use super::{Property, PropertyOptions};
use crate::error::{Error, Result};
use crate::value::Value;

fn parse_decimal(text: &str) -> Result<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|e| Error::bad_value(format!("{:?} is not a decimal [{}]", text, e)))
}

/// Decimal numbers
///
/// Wraps decimal text or JSON numbers. Unwraps decimals, integers and floats
/// (through their shortest text form) to the decimal's exact string, so
/// `2.0` stays `"2.0"` and `3` becomes `"3"`.
#[derive(Debug, Default)]
pub struct DecimalProperty {
    options: PropertyOptions,
}

impl DecimalProperty {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Property for DecimalProperty {
    options_accessors!();

    fn type_name(&self) -> &'static str {
        "DecimalProperty"
    }

    fn wrap(&self, json: &JsonValue) -> Result<Value> {
        let decimal = match json {
            JsonValue::String(s) => parse_decimal(s)?,
            JsonValue::Number(n) => parse_decimal(&n.to_string())?,
            other => return Err(Error::bad_value(format!("{} is not a decimal", other))),
        };
        Ok(Value::Decimal(decimal))
    }

    fn unwrap(&self, value: Value) -> Result<(Value, JsonValue)> {
        let decimal = match value {
            Value::Decimal(d) => d,
            Value::Integer(i) => Decimal::from(i),
            Value::Float(f) if f.is_finite() => parse_decimal(&f.to_string())?,
            other => return Err(Error::bad_value(format!("{} is not a decimal", other))),
        };
        Ok((Value::Decimal(decimal), JsonValue::String(decimal.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_unwrap_keeps_scale() {
        let p = DecimalProperty::new();
        assert_eq!(p.unwrap(Value::Decimal(dec("2.0"))).unwrap().1, json!("2.0"));
        let (value, json) = p.unwrap(Value::Integer(3)).unwrap();
        assert_eq!(value, Value::Decimal(dec("3")));
        assert_eq!(json, json!("3"));
        assert_eq!(p.unwrap(Value::Float(5.25)).unwrap().1, json!("5.25"));
        assert!(p.unwrap(Value::from("5.25")).is_err());
    }

    #[test]
    fn test_wrap_text_and_numbers() {
        let p = DecimalProperty::new();
        assert_eq!(p.wrap(&json!("1.50")).unwrap(), Value::Decimal(dec("1.50")));
        assert_eq!(p.wrap(&json!(7)).unwrap(), Value::Decimal(dec("7")));
        assert_eq!(p.wrap(&json!(0.5)).unwrap(), Value::Decimal(dec("0.5")));
        assert!(p.wrap(&json!("abc")).unwrap_err().is_bad_value());
        assert!(p.wrap(&json!(true)).is_err());
    }
}
