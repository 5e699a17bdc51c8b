//! Error types for wrapping, unwrapping and schema registration

use thiserror::Error;

/// Errors detected once, while a schema is being registered
///
/// A schema that fails registration is unusable until its declaration is
/// fixed; none of these are retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// Two attributes map to the same JSON key
    #[error("You can only have one property named '{key}' (declared by '{first}' and '{second}')")]
    DuplicateKey {
        key: String,
        first: String,
        second: String,
    },

    /// The same attribute was declared twice on one builder
    #[error("Attribute '{0}' is declared more than once")]
    DuplicateAttribute(String),

    /// A container item type is not known to the type config
    #[error("Item type {item_type} not recognized (allowed: {allowed})")]
    UnrecognizedItemType { item_type: String, allowed: String },

    /// A literal attribute whose kind the type config cannot promote
    #[error("Literal attribute '{attr}' of kind {kind} cannot be promoted to a property")]
    UnrecognizedLiteral { attr: String, kind: String },

    /// Choices must be distinct scalar values
    #[error("Malformed choices for property '{property}': {reason}")]
    MalformedChoices { property: String, reason: String },

    /// An item property shared between containers was never registered
    #[error("Item property {0} is shared but was never registered; give each container its own")]
    UnboundItemProperty(String),

    /// Both `properties` and `update_properties` were given for one schema
    #[error("Schema '{0}' may either replace or update its type config, not both")]
    ConflictingTypeConfig(String),

    /// A type factory registration problem
    #[error("Type factory error: {0}")]
    Factory(String),
}

/// Errors raised while working with documents and containers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A value failed conversion or validation
    #[error("{0}")]
    BadValue(String),

    /// Declared properties can never be deleted
    #[error("Cannot delete declared property '{0}'")]
    DeleteNotAllowed(String),

    /// A raw key could not be applied as an attribute during construction
    #[error("can't set attribute corresponding to '{key}' on a {schema} while wrapping {data}")]
    WrappingAttribute {
        key: String,
        schema: String,
        data: String,
    },

    /// Attribute-style read of something that is neither declared nor dynamic
    #[error("'{schema}' object has no attribute '{attr}'")]
    NoSuchAttribute { schema: String, attr: String },

    /// Mapping-style read of an absent key
    #[error("Key not found: '{0}'")]
    NoSuchKey(String),

    /// The attribute name is owned by non-schema machinery
    #[error("can't set attribute '{attr}' on {schema}")]
    AttributeNotSettable { schema: String, attr: String },

    /// The schema does not accept undeclared properties
    #[error("{schema} does not allow dynamic property '{key}'")]
    DynamicNotAllowed { schema: String, key: String },

    /// Positional access outside a list
    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// `remove` of a value that is not present
    #[error("Value not found in container: {0}")]
    ValueNotFound(String),

    /// `pop`/`popitem` on an empty container
    #[error("Container is empty")]
    Empty,

    /// A schema-definition error surfaced at first use of a deferred type
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl Error {
    pub(crate) fn bad_value(message: impl Into<String>) -> Self {
        Error::BadValue(message.into())
    }

    /// True for conversion/validation failures
    pub fn is_bad_value(&self) -> bool {
        matches!(self, Error::BadValue(_))
    }

    /// True for the attribute-related misuse errors
    pub fn is_attribute_error(&self) -> bool {
        matches!(
            self,
            Error::WrappingAttribute { .. }
                | Error::NoSuchAttribute { .. }
                | Error::AttributeNotSettable { .. }
                | Error::DynamicNotAllowed { .. }
        )
    }
}

/// Crate-wide result alias
pub type Result<T, E = Error> = std::result::Result<T, E>;
