//! Properties: the per-field codecs between canonical JSON and typed values
//!
//! Every property implements [`Property`]:
//!
//! - `wrap(json)` decodes a canonical JSON value into a [`Value`]
//! - `unwrap(value)` returns `(typed, canonical)` for a typed value, binding
//!   plain collections into containers on the way
//! - `validate(value, required, recursive)` checks choices, custom
//!   validators and required-ness without mutating anything
//!
//! Options shared by all properties (JSON key, default, choices, ...) live in
//! [`PropertyOptions`] and are set with the builder methods of
//! [`PropertyOptionsExt`].

/// Implements the `options`/`options_mut` accessors for a struct with an
/// `options: PropertyOptions` field
macro_rules! options_accessors {
    () => {
        fn options(&self) -> &$crate::properties::PropertyOptions {
            &self.options
        }

        fn options_mut(&mut self) -> &mut $crate::properties::PropertyOptions {
            &mut self.options
        }
    };
}

mod catch_all;
mod container;
mod decimal;
mod scalar;
mod temporal;

use std::fmt;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::config::TypeConfig;
use crate::error::{Error, Result, SchemaError};
use crate::object::JsonObject;
use crate::value::{Value, ValueKind};

pub use catch_all::DefaultProperty;
pub use container::{DictProperty, ItemType, ListProperty, ObjectProperty, SetProperty};
pub use decimal::DecimalProperty;
pub use scalar::{BooleanProperty, FloatProperty, IntegerProperty, StringProperty};
pub use temporal::{
    DateProperty, DateTimeProperty, TimeProperty, parse_date, parse_datetime, parse_time,
};

/// Custom validator; returns `Err(Error::BadValue)` to reject a value
pub type Validator = Arc<dyn Fn(&Value) -> Result<()> + Send + Sync>;

/// Where a property's default comes from
#[derive(Clone)]
pub enum DefaultValue {
    /// A literal, cloned for every instance
    Value(Value),
    /// Called once per instance
    Fn(Arc<dyn Fn() -> Value + Send + Sync>),
    /// Called with the partially constructed owner
    Owner(Arc<dyn Fn(&JsonObject) -> Value + Send + Sync>),
}

impl DefaultValue {
    /// Produce the default. Owner-aware defaults yield null without an owner.
    pub fn produce(&self, owner: Option<&JsonObject>) -> Value {
        match self {
            DefaultValue::Value(value) => value.clone(),
            DefaultValue::Fn(f) => f(),
            DefaultValue::Owner(f) => owner.map(|owner| f(owner)).unwrap_or(Value::Null),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Value(value) => f.debug_tuple("Value").field(value).finish(),
            DefaultValue::Fn(_) => f.write_str("Fn(..)"),
            DefaultValue::Owner(_) => f.write_str("Owner(..)"),
        }
    }
}

/// An allowed value, with an optional display label
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub key: Value,
    pub label: Option<String>,
}

/// Options common to every property
#[derive(Clone, Default)]
pub struct PropertyOptions {
    /// Canonical JSON key; falls back to the attribute name at registration
    pub name: Option<String>,
    pub default: Option<DefaultValue>,
    pub required: bool,
    pub choices: Vec<Choice>,
    /// Drop the key from the canonical map while the value is falsy
    pub exclude_if_none: bool,
    pub validators: Vec<Validator>,
    pub verbose_name: Option<String>,
    /// Bound at registration; unbound properties use the shared default
    pub type_config: Option<Arc<TypeConfig>>,
}

impl PropertyOptions {
    fn check_choices(&self) -> Result<(), SchemaError> {
        let malformed = |reason: String| SchemaError::MalformedChoices {
            property: self.name.clone().unwrap_or_default(),
            reason,
        };
        for (i, choice) in self.choices.iter().enumerate() {
            if matches!(
                choice.key.kind(),
                Some(ValueKind::List | ValueKind::Dict | ValueKind::Set | ValueKind::Object)
            ) {
                return Err(malformed(format!("{} is not a scalar", choice.key)));
            }
            if self.choices[..i].iter().any(|c| c.key == choice.key) {
                return Err(malformed(format!("{} is listed twice", choice.key)));
            }
        }
        Ok(())
    }

    fn choice_keys(&self) -> String {
        let keys: Vec<String> = self.choices.iter().map(|c| c.key.to_string()).collect();
        format!("[{}]", keys.join(", "))
    }
}

impl fmt::Debug for PropertyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyOptions")
            .field("name", &self.name)
            .field("default", &self.default)
            .field("required", &self.required)
            .field("choices", &self.choices)
            .field("exclude_if_none", &self.exclude_if_none)
            .field("validators", &self.validators.len())
            .field("verbose_name", &self.verbose_name)
            .finish_non_exhaustive()
    }
}

/// Registration-time initialization shared by every property
pub(crate) fn init_options(
    options: &mut PropertyOptions,
    default_name: &str,
    type_config: &Arc<TypeConfig>,
) -> Result<(), SchemaError> {
    if options.name.is_none() && !default_name.is_empty() {
        options.name = Some(default_name.to_string());
    }
    if options.type_config.is_none() {
        options.type_config = Some(Arc::clone(type_config));
    }
    options.check_choices()
}

/// A field codec
///
/// Implementations must be immutable once registered; properties are shared
/// between schemas and threads behind `Arc<dyn Property>`.
pub trait Property: Send + Sync + fmt::Debug {
    fn options(&self) -> &PropertyOptions;

    fn options_mut(&mut self) -> &mut PropertyOptions;

    /// Name used in diagnostics, e.g. `"StringProperty"`
    fn type_name(&self) -> &'static str;

    /// Decode a canonical JSON value
    fn wrap(&self, json: &JsonValue) -> Result<Value>;

    /// Convert a typed value into `(typed, canonical)`
    ///
    /// Already-bound containers are returned as they are.
    fn unwrap(&self, value: Value) -> Result<(Value, JsonValue)>;

    /// Finalize the JSON key and bind the type config
    fn init_property(
        &mut self,
        default_name: &str,
        type_config: &Arc<TypeConfig>,
    ) -> Result<(), SchemaError> {
        init_options(self.options_mut(), default_name, type_config)
    }

    /// The canonical JSON key, once assigned
    fn name(&self) -> Option<&str> {
        self.options().name.as_deref()
    }

    fn type_config(&self) -> Arc<TypeConfig> {
        self.options()
            .type_config
            .clone()
            .unwrap_or_else(TypeConfig::shared_default)
    }

    /// Element property of a container property
    fn item_property(&self) -> Result<Option<Arc<dyn Property>>> {
        Ok(None)
    }

    /// True when wrapping null produces a value (object properties)
    fn wraps_null(&self) -> bool {
        false
    }

    /// True for the inference-driven catch-all property
    fn is_catch_all(&self) -> bool {
        false
    }

    /// Whether `value` counts as missing for the required check
    fn empty(&self, value: &Value) -> bool {
        value.is_null()
    }

    fn default_value(&self, owner: Option<&JsonObject>) -> Result<Value> {
        Ok(self
            .options()
            .default
            .as_ref()
            .map(|d| d.produce(owner))
            .unwrap_or_default())
    }

    /// True when the key should be left out of the canonical map
    fn exclude(&self, value: &Value) -> bool {
        self.options().exclude_if_none && !value.is_truthy()
    }

    fn validate(&self, value: &Value, required: bool, recursive: bool) -> Result<()> {
        let options = self.options();
        if !options.choices.is_empty()
            && !value.is_null()
            && !options.choices.iter().any(|c| c.key == *value)
        {
            return Err(Error::bad_value(format!(
                "{} not in choices: {}",
                value,
                options.choice_keys()
            )));
        }

        if !self.empty(value) {
            for validator in &options.validators {
                validator(value)?;
            }
        } else if required && options.required {
            return Err(Error::bad_value(format!(
                "Property {} is required.",
                self.name().unwrap_or("<unnamed>")
            )));
        }

        if recursive {
            value.validate_nested(required)?;
        }
        Ok(())
    }

    fn validate_and_wrap(&self, json: &JsonValue) -> Result<Value> {
        if json.is_null() {
            return Ok(Value::Null);
        }
        self.wrap(json)
    }

    /// Validate, then unwrap. `lazily` skips the required check.
    fn validate_and_unwrap(&self, value: Value, lazily: bool) -> Result<(Value, JsonValue)> {
        self.validate(&value, !lazily, false)?;
        if value.is_null() {
            return Ok((Value::Null, JsonValue::Null));
        }
        self.unwrap(value)
    }

    fn to_json(&self, value: &Value) -> Result<JsonValue> {
        let (_, json) = self.unwrap(value.clone())?;
        Ok(json)
    }
}

/// Builder-style option setters available on every concrete property
///
/// ```
/// use docshape::{Property, PropertyOptionsExt, StringProperty};
///
/// let property = StringProperty::new()
///     .named("first")
///     .required()
///     .choices(["Danny", "Dan"]);
/// assert_eq!(property.options().name.as_deref(), Some("first"));
/// ```
pub trait PropertyOptionsExt: Property + Sized {
    /// Use `key` as the JSON key instead of the attribute name
    fn named(mut self, key: impl Into<String>) -> Self {
        self.options_mut().name = Some(key.into());
        self
    }

    fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.options_mut().default = Some(DefaultValue::Value(value.into()));
        self
    }

    fn with_default_fn(mut self, f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.options_mut().default = Some(DefaultValue::Fn(Arc::new(f)));
        self
    }

    /// Default computed from the instance being constructed
    fn with_owner_default(
        mut self,
        f: impl Fn(&JsonObject) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.options_mut().default = Some(DefaultValue::Owner(Arc::new(f)));
        self
    }

    fn required(mut self) -> Self {
        self.options_mut().required = true;
        self
    }

    fn choices<V: Into<Value>>(mut self, choices: impl IntoIterator<Item = V>) -> Self {
        self.options_mut()
            .choices
            .extend(choices.into_iter().map(|key| Choice {
                key: key.into(),
                label: None,
            }));
        self
    }

    fn choice_labeled(mut self, key: impl Into<Value>, label: impl Into<String>) -> Self {
        self.options_mut().choices.push(Choice {
            key: key.into(),
            label: Some(label.into()),
        });
        self
    }

    fn exclude_if_none(mut self) -> Self {
        self.options_mut().exclude_if_none = true;
        self
    }

    fn validator(mut self, f: impl Fn(&Value) -> Result<()> + Send + Sync + 'static) -> Self {
        self.options_mut().validators.push(Arc::new(f));
        self
    }

    fn verbose_name(mut self, name: impl Into<String>) -> Self {
        self.options_mut().verbose_name = Some(name.into());
        self
    }

    /// Bind a type config ahead of registration
    fn with_type_config(mut self, type_config: Arc<TypeConfig>) -> Self {
        self.options_mut().type_config = Some(type_config);
        self
    }
}

impl<P: Property + Sized> PropertyOptionsExt for P {}

/// Construct a boxed property through its `Default` impl
///
/// Coerces to a [`PropertyCtor`](crate::config::PropertyCtor):
/// `boxed::<DateProperty> as PropertyCtor`.
pub fn boxed<P: Property + Default + 'static>() -> Box<dyn Property> {
    Box::new(P::default())
}
