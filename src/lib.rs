//! docshape - typed views over JSON documents
//!
//! Provides:
//! - Schemas declared through a builder, with renamed keys, defaults,
//!   required fields, choices and inheritance
//! - Property codecs that wrap canonical JSON into typed values and unwrap
//!   typed values back into canonical JSON
//! - Containers (`JsonArray`, `JsonDict`, `JsonSet`) and documents
//!   (`JsonObject`) that keep the typed view and the canonical form in step
//!   on every mutation
//! - Per-schema type configuration, including string-to-type inference for
//!   undeclared fields
//!
//! ```
//! use docshape::{ListProperty, PropertyOptionsExt, Schema, StringProperty, ValueKind};
//! use serde_json::json;
//!
//! let user = Schema::builder("User")
//!     .property("username", StringProperty::new().required())
//!     .property("tags", ListProperty::of(ValueKind::String))
//!     .build()
//!     .unwrap();
//!
//! let mut doc = user.wrap(&json!({"username": "danny", "since": "2014-02-04"})).unwrap();
//! doc.attr_mut("tags").unwrap().as_array_mut().unwrap().append("admin").unwrap();
//! assert_eq!(
//!     doc.to_json().unwrap(),
//!     json!({"username": "danny", "tags": ["admin"], "since": "2014-02-04"})
//! );
//! ```
//!
//! # Thread safety
//!
//! [`Schema`] and [`TypeConfig`] are immutable once built and can be shared
//! across threads behind `Arc`. Documents and containers are plain owned
//! values and are not synchronized: to mutate one instance from several
//! threads, wrap it in a `Mutex` or keep it confined to one thread.

pub mod config;
pub mod containers;
pub mod error;
#[cfg(feature = "factory")]
pub mod factory;
pub mod object;
pub mod properties;
pub mod schema;
pub mod value;

// Re-export commonly used types
pub use config::{PropertyCtor, StringConversion, TypeConfig, TypeConfigBuilder};
pub use containers::{DictKey, JsonArray, JsonDict, JsonSet, ValueMut};
pub use error::{Error, Result, SchemaError};
#[cfg(feature = "factory")]
pub use factory::{TypeFactory, type_property};
pub use object::JsonObject;
pub use properties::{
    BooleanProperty, DateProperty, DateTimeProperty, DecimalProperty, DefaultProperty,
    DictProperty, FloatProperty, IntegerProperty, ItemType, ListProperty, ObjectProperty,
    Property, PropertyOptions, PropertyOptionsExt, SetProperty, StringProperty, TimeProperty,
    boxed,
};
pub use schema::{Schema, SchemaBuilder, SchemaOptions, SchemaOptionsBuilder, SchemaSeed};
pub use value::{Value, ValueKind};
