//! Per-schema type configuration
//!
//! A [`TypeConfig`] answers two questions for a schema and its descendants:
//!
//! - **Which property governs a native kind?** Used to resolve container
//!   item types, to promote literal attributes, and by the catch-all
//!   property for undeclared fields.
//! - **How are untyped strings interpreted?** An ordered list of
//!   `(pattern, converter)` rules; the first matching pattern picks the
//!   target kind.
//!
//! Configs are immutable once built. Derived configs (`replace`,
//! `updated`) are new values, usually shared behind an `Arc`.

mod conversions;
mod type_config;

pub use conversions::{
    DATE_PATTERN, DATETIME_PATTERN, DECIMAL_PATTERN, StringConversion, TIME_PATTERN,
    default_string_conversions,
};
pub use type_config::{PropertyCtor, TypeConfig, TypeConfigBuilder};
