//! Per-schema behaviour switches

use serde::{Deserialize, Serialize};

/// Options that control how instances of a schema behave
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchemaOptions {
    /// Accept keys that have no declared property
    pub allow_dynamic_properties: bool,

    /// Skip the required check on assignment; it runs on `validate`/`to_json`
    pub validate_required_lazily: bool,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            allow_dynamic_properties: true,
            validate_required_lazily: false,
        }
    }
}

impl SchemaOptions {
    /// Create options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for custom options
    pub fn builder() -> SchemaOptionsBuilder {
        SchemaOptionsBuilder::default()
    }
}

/// Builder for SchemaOptions
#[derive(Debug, Default)]
pub struct SchemaOptionsBuilder {
    options: SchemaOptions,
}

impl SchemaOptionsBuilder {
    /// Allow or reject undeclared keys
    pub fn allow_dynamic_properties(mut self, allow: bool) -> Self {
        self.options.allow_dynamic_properties = allow;
        self
    }

    /// Defer the required check to explicit validation
    pub fn validate_required_lazily(mut self, lazily: bool) -> Self {
        self.options.validate_required_lazily = lazily;
        self
    }

    /// Build the options
    pub fn build(self) -> SchemaOptions {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = SchemaOptions::default();
        assert!(options.allow_dynamic_properties);
        assert!(!options.validate_required_lazily);
    }

    #[test]
    fn test_builder() {
        let options = SchemaOptions::builder()
            .allow_dynamic_properties(false)
            .validate_required_lazily(true)
            .build();
        assert!(!options.allow_dynamic_properties);
        assert!(options.validate_required_lazily);
    }

    #[test]
    fn test_serde_camel_case() {
        let options = SchemaOptions::builder().validate_required_lazily(true).build();
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"allowDynamicProperties": true, "validateRequiredLazily": true})
        );
        let parsed: SchemaOptions =
            serde_json::from_value(serde_json::json!({"allowDynamicProperties": false})).unwrap();
        assert!(!parsed.allow_dynamic_properties);
        assert!(!parsed.validate_required_lazily);
    }
}
