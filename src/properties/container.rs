//! Container properties: lists, dicts, sets and nested objects

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde_json::Value as JsonValue;
use tracing::trace;

use super::{DefaultProperty, Property, PropertyOptions, init_options};
use crate::config::TypeConfig;
use crate::containers::{JsonArray, JsonDict, JsonSet, compatible_wrappers};
use crate::error::{Error, Result, SchemaError};
#[cfg(feature = "factory")]
use crate::factory::TypeFactory;
use crate::object::JsonObject;
use crate::schema::Schema;
use crate::value::{Value, ValueKind};

/// Element type of a container property
#[derive(Clone, Default)]
pub enum ItemType {
    /// Untyped: elements go through the catch-all property
    #[default]
    Any,
    /// A native kind, resolved through the type config
    Kind(ValueKind),
    /// An explicit property instance, used with its own settings
    Property(Arc<dyn Property>),
    /// Instances of a schema
    Schema(Arc<Schema>),
    /// Resolved on first use; allows self and forward references
    Deferred(Arc<dyn Fn() -> ItemType + Send + Sync>),
}

impl ItemType {
    pub fn property(property: impl Property + 'static) -> Self {
        ItemType::Property(Arc::new(property))
    }

    pub fn deferred(f: impl Fn() -> ItemType + Send + Sync + 'static) -> Self {
        ItemType::Deferred(Arc::new(f))
    }

    fn is_deferred(&self) -> bool {
        matches!(self, ItemType::Deferred(_))
    }
}

impl fmt::Debug for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::Any => f.write_str("Any"),
            ItemType::Kind(kind) => write!(f, "Kind({})", kind),
            ItemType::Property(p) => write!(f, "Property({})", p.type_name()),
            ItemType::Schema(schema) => write!(f, "Schema({})", schema.name()),
            ItemType::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

impl From<ValueKind> for ItemType {
    fn from(kind: ValueKind) -> Self {
        ItemType::Kind(kind)
    }
}

impl From<Arc<Schema>> for ItemType {
    fn from(schema: Arc<Schema>) -> Self {
        ItemType::Schema(schema)
    }
}

impl From<&Arc<Schema>> for ItemType {
    fn from(schema: &Arc<Schema>) -> Self {
        ItemType::Schema(Arc::clone(schema))
    }
}

/// Register an explicit item property against the owner's type config
///
/// A property shared between several item types can only be registered
/// through its first owner; later owners accept it once it is bound.
fn init_item_property(
    property: &mut Arc<dyn Property>,
    type_config: &Arc<TypeConfig>,
) -> Result<(), SchemaError> {
    if let Some(property) = Arc::get_mut(property) {
        return property.init_property("", type_config);
    }
    if property.options().type_config.is_none() {
        return Err(SchemaError::UnboundItemProperty(
            property.type_name().to_string(),
        ));
    }
    Ok(())
}

fn resolve_item_type(
    item_type: ItemType,
    type_config: &Arc<TypeConfig>,
) -> Result<Arc<dyn Property>, SchemaError> {
    let mut property: Box<dyn Property> = match item_type {
        ItemType::Any => return Ok(Arc::new(DefaultProperty::bound(type_config))),
        ItemType::Property(mut property) => {
            init_item_property(&mut property, type_config)?;
            return Ok(property);
        }
        ItemType::Deferred(thunk) => return resolve_item_type(thunk(), type_config),
        ItemType::Kind(kind) => {
            let ctor = type_config.property_ctor(kind).ok_or_else(|| {
                SchemaError::UnrecognizedItemType {
                    item_type: kind.to_string(),
                    allowed: type_config.allowed_kinds(),
                }
            })?;
            ctor()
        }
        ItemType::Schema(schema) => Box::new(ObjectProperty::new(schema)),
    };
    property.options_mut().required = true;
    property.init_property("", type_config)?;
    Ok(Arc::from(property))
}

/// Declared item type plus its lazily resolved property
#[derive(Debug, Default)]
struct ItemSlot {
    item_type: ItemType,
    resolved: OnceCell<Arc<dyn Property>>,
}

impl ItemSlot {
    fn new(item_type: ItemType) -> Self {
        Self {
            item_type,
            resolved: OnceCell::new(),
        }
    }

    fn resolve(&self, type_config: &Arc<TypeConfig>) -> Result<Arc<dyn Property>, SchemaError> {
        let property = self.resolved.get_or_try_init(|| {
            let property = resolve_item_type(self.item_type.clone(), type_config)?;
            trace!(
                "Resolved item type {:?} to {}",
                self.item_type,
                property.type_name()
            );
            Ok::<_, SchemaError>(property)
        })?;
        Ok(Arc::clone(property))
    }

    /// Resolve eagerly so bad item types fail at registration
    fn init(&mut self, type_config: &Arc<TypeConfig>) -> Result<(), SchemaError> {
        if let ItemType::Property(property) = &mut self.item_type {
            init_item_property(property, type_config)?;
        }
        if !self.item_type.is_deferred() {
            self.resolve(type_config)?;
        }
        Ok(())
    }
}

fn not_an_instance(value: &Value, expected: &str) -> Error {
    Error::bad_value(format!("{} is not an instance of {}", value, expected))
}

/// Lists, bound to [`JsonArray`]
#[derive(Debug, Default)]
pub struct ListProperty {
    options: PropertyOptions,
    item: ItemSlot,
}

impl ListProperty {
    /// An untyped list
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(item_type: impl Into<ItemType>) -> Self {
        Self {
            options: PropertyOptions::default(),
            item: ItemSlot::new(item_type.into()),
        }
    }

    fn element(&self) -> Result<Arc<dyn Property>> {
        Ok(self.item.resolve(&self.type_config())?)
    }

    fn bind(element: Arc<dyn Property>, items: Vec<Value>) -> Result<(Value, JsonValue)> {
        let mut array = JsonArray::new(element);
        array.extend(items)?;
        let json = JsonValue::Array(array.canonical().to_vec());
        Ok((Value::JsonArray(array), json))
    }
}

impl Property for ListProperty {
    options_accessors!();

    fn type_name(&self) -> &'static str {
        "ListProperty"
    }

    fn init_property(
        &mut self,
        default_name: &str,
        type_config: &Arc<TypeConfig>,
    ) -> Result<(), SchemaError> {
        init_options(&mut self.options, default_name, type_config)?;
        let type_config = self.type_config();
        self.item.init(&type_config)
    }

    fn item_property(&self) -> Result<Option<Arc<dyn Property>>> {
        self.element().map(Some)
    }

    fn empty(&self, value: &Value) -> bool {
        !value.is_truthy()
    }

    fn default_value(&self, owner: Option<&JsonObject>) -> Result<Value> {
        Ok(match &self.options.default {
            Some(default) => default.produce(owner),
            None => Value::List(Vec::new()),
        })
    }

    fn wrap(&self, json: &JsonValue) -> Result<Value> {
        match json {
            JsonValue::Array(items) => Ok(Value::JsonArray(JsonArray::wrap(self.element()?, items)?)),
            other => Err(Error::bad_value(format!("{} is not a list", other))),
        }
    }

    fn unwrap(&self, value: Value) -> Result<(Value, JsonValue)> {
        let element = self.element()?;
        match value {
            Value::JsonArray(array) if compatible_wrappers(array.wrapper(), &element) => {
                let json = JsonValue::Array(array.canonical().to_vec());
                Ok((Value::JsonArray(array), json))
            }
            Value::JsonArray(array) => Self::bind(element, array.into_items()),
            Value::List(items) => Self::bind(element, items),
            other => Err(not_an_instance(&other, "list")),
        }
    }
}

/// String-keyed maps, bound to [`JsonDict`]
#[derive(Debug, Default)]
pub struct DictProperty {
    options: PropertyOptions,
    item: ItemSlot,
}

impl DictProperty {
    /// An untyped dict
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(item_type: impl Into<ItemType>) -> Self {
        Self {
            options: PropertyOptions::default(),
            item: ItemSlot::new(item_type.into()),
        }
    }

    fn element(&self) -> Result<Arc<dyn Property>> {
        Ok(self.item.resolve(&self.type_config())?)
    }

    fn bind<I>(element: Arc<dyn Property>, entries: I) -> Result<(Value, JsonValue)>
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut dict = JsonDict::new(element);
        dict.update(entries)?;
        let json = JsonValue::Object(dict.canonical().clone());
        Ok((Value::JsonDict(dict), json))
    }
}

impl Property for DictProperty {
    options_accessors!();

    fn type_name(&self) -> &'static str {
        "DictProperty"
    }

    fn init_property(
        &mut self,
        default_name: &str,
        type_config: &Arc<TypeConfig>,
    ) -> Result<(), SchemaError> {
        init_options(&mut self.options, default_name, type_config)?;
        let type_config = self.type_config();
        self.item.init(&type_config)
    }

    fn item_property(&self) -> Result<Option<Arc<dyn Property>>> {
        self.element().map(Some)
    }

    fn empty(&self, value: &Value) -> bool {
        !value.is_truthy()
    }

    fn default_value(&self, owner: Option<&JsonObject>) -> Result<Value> {
        Ok(match &self.options.default {
            Some(default) => default.produce(owner),
            None => Value::Map(Default::default()),
        })
    }

    fn wrap(&self, json: &JsonValue) -> Result<Value> {
        match json {
            JsonValue::Object(entries) => {
                Ok(Value::JsonDict(JsonDict::wrap(self.element()?, entries)?))
            }
            other => Err(Error::bad_value(format!("{} is not a dict", other))),
        }
    }

    fn unwrap(&self, value: Value) -> Result<(Value, JsonValue)> {
        let element = self.element()?;
        match value {
            Value::JsonDict(dict) if compatible_wrappers(dict.wrapper(), &element) => {
                let json = JsonValue::Object(dict.canonical().clone());
                Ok((Value::JsonDict(dict), json))
            }
            Value::JsonDict(dict) => Self::bind(element, dict.into_entries()),
            Value::Map(entries) => Self::bind(element, entries),
            // an object is a mapping; its entries are copied into a plain dict
            Value::Object(object) => Self::bind(element, object.entries().clone()),
            other => Err(not_an_instance(&other, "dict")),
        }
    }
}

/// Sets, bound to [`JsonSet`]
#[derive(Debug, Default)]
pub struct SetProperty {
    options: PropertyOptions,
    item: ItemSlot,
}

impl SetProperty {
    /// An untyped set
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(item_type: impl Into<ItemType>) -> Self {
        Self {
            options: PropertyOptions::default(),
            item: ItemSlot::new(item_type.into()),
        }
    }

    fn element(&self) -> Result<Arc<dyn Property>> {
        Ok(self.item.resolve(&self.type_config())?)
    }

    fn bind(element: Arc<dyn Property>, members: Vec<Value>) -> Result<(Value, JsonValue)> {
        let mut set = JsonSet::new(element);
        set.update(members)?;
        let json = JsonValue::Array(set.canonical().to_vec());
        Ok((Value::JsonSet(set), json))
    }
}

impl Property for SetProperty {
    options_accessors!();

    fn type_name(&self) -> &'static str {
        "SetProperty"
    }

    fn init_property(
        &mut self,
        default_name: &str,
        type_config: &Arc<TypeConfig>,
    ) -> Result<(), SchemaError> {
        init_options(&mut self.options, default_name, type_config)?;
        let type_config = self.type_config();
        self.item.init(&type_config)
    }

    fn item_property(&self) -> Result<Option<Arc<dyn Property>>> {
        self.element().map(Some)
    }

    fn empty(&self, value: &Value) -> bool {
        !value.is_truthy()
    }

    fn default_value(&self, owner: Option<&JsonObject>) -> Result<Value> {
        Ok(match &self.options.default {
            Some(default) => default.produce(owner),
            None => Value::Set(Vec::new()),
        })
    }

    fn wrap(&self, json: &JsonValue) -> Result<Value> {
        match json {
            JsonValue::Array(members) => Ok(Value::JsonSet(JsonSet::wrap(self.element()?, members)?)),
            other => Err(Error::bad_value(format!("{} is not a set", other))),
        }
    }

    fn unwrap(&self, value: Value) -> Result<(Value, JsonValue)> {
        let element = self.element()?;
        match value {
            Value::JsonSet(set) if compatible_wrappers(set.wrapper(), &element) => {
                let json = JsonValue::Array(set.canonical().to_vec());
                Ok((Value::JsonSet(set), json))
            }
            Value::JsonSet(set) => Self::bind(element, set.into_members()),
            Value::Set(members) => Self::bind(element, members),
            other => Err(not_an_instance(&other, "set")),
        }
    }
}

enum SchemaHandle {
    Fixed(Arc<Schema>),
    Deferred {
        thunk: Arc<dyn Fn() -> Arc<Schema> + Send + Sync>,
        resolved: OnceCell<Arc<Schema>>,
    },
    #[cfg(feature = "factory")]
    Factory(Arc<TypeFactory>),
}

impl fmt::Debug for SchemaHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaHandle::Fixed(schema) => write!(f, "Fixed({})", schema.name()),
            SchemaHandle::Deferred { resolved, .. } => match resolved.get() {
                Some(schema) => write!(f, "Deferred({})", schema.name()),
                None => f.write_str("Deferred(..)"),
            },
            #[cfg(feature = "factory")]
            SchemaHandle::Factory(factory) => write!(f, "Factory({})", factory.identifier_field()),
        }
    }
}

/// A nested document of a fixed schema
///
/// The default is a fresh instance, and wrapping null produces one too.
/// Unwrap accepts instances of the schema or of a schema extending it; a
/// plain map must be wrapped by the caller first.
#[derive(Debug)]
pub struct ObjectProperty {
    options: PropertyOptions,
    handle: SchemaHandle,
}

impl ObjectProperty {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            options: PropertyOptions::default(),
            handle: SchemaHandle::Fixed(schema),
        }
    }

    /// A nested schema that is looked up on first use
    pub fn deferred(f: impl Fn() -> Arc<Schema> + Send + Sync + 'static) -> Self {
        Self {
            options: PropertyOptions::default(),
            handle: SchemaHandle::Deferred {
                thunk: Arc::new(f),
                resolved: OnceCell::new(),
            },
        }
    }

    /// A nested document whose schema is picked by `factory` from its
    /// discriminator field
    #[cfg(feature = "factory")]
    pub fn from_factory(factory: Arc<TypeFactory>) -> Self {
        Self {
            options: PropertyOptions::default(),
            handle: SchemaHandle::Factory(factory),
        }
    }

    /// The nested schema; `None` when a factory picks it per value
    pub fn schema(&self) -> Option<&Arc<Schema>> {
        match &self.handle {
            SchemaHandle::Fixed(schema) => Some(schema),
            SchemaHandle::Deferred { thunk, resolved } => Some(resolved.get_or_init(|| thunk())),
            #[cfg(feature = "factory")]
            SchemaHandle::Factory(_) => None,
        }
    }

    fn accepts(&self, schema: &Schema) -> bool {
        match &self.handle {
            #[cfg(feature = "factory")]
            SchemaHandle::Factory(factory) => factory.accepts(schema),
            _ => self
                .schema()
                .is_some_and(|target| schema.is_subschema_of(target)),
        }
    }

    fn expected(&self) -> String {
        match self.schema() {
            Some(schema) => schema.name().to_string(),
            None => "a registered type".to_string(),
        }
    }

    fn instantiate(&self, json: &JsonValue) -> Result<JsonObject> {
        #[cfg(feature = "factory")]
        if let SchemaHandle::Factory(factory) = &self.handle {
            return factory.wrap(json);
        }
        let schema = self
            .schema()
            .ok_or_else(|| Error::bad_value("object property has no schema"))?;
        if json.is_null() {
            schema.instance()
        } else {
            schema.wrap(json)
        }
    }
}

impl Property for ObjectProperty {
    options_accessors!();

    fn type_name(&self) -> &'static str {
        "ObjectProperty"
    }

    fn wraps_null(&self) -> bool {
        true
    }

    fn empty(&self, value: &Value) -> bool {
        !value.is_truthy()
    }

    fn default_value(&self, owner: Option<&JsonObject>) -> Result<Value> {
        if let Some(default) = &self.options.default {
            return Ok(default.produce(owner));
        }
        #[cfg(feature = "factory")]
        if let SchemaHandle::Factory(factory) = &self.handle {
            return match factory.default_type() {
                Some(schema) => schema.instance().map(Value::Object),
                None => Ok(Value::Null),
            };
        }
        self.instantiate(&JsonValue::Null).map(Value::Object)
    }

    fn wrap(&self, json: &JsonValue) -> Result<Value> {
        #[cfg(feature = "factory")]
        if let (SchemaHandle::Factory(factory), JsonValue::Null) = (&self.handle, json) {
            return match factory.default_type() {
                Some(schema) => schema.instance().map(Value::Object),
                None => Ok(Value::Null),
            };
        }
        match json {
            JsonValue::Null | JsonValue::Object(_) => self.instantiate(json).map(Value::Object),
            other => Err(Error::bad_value(format!(
                "{} is not an object of {}",
                other,
                self.expected()
            ))),
        }
    }

    fn unwrap(&self, value: Value) -> Result<(Value, JsonValue)> {
        match value {
            Value::Object(object) if self.accepts(object.schema()) => {
                let json = JsonValue::Object(object.canonical().clone());
                Ok((Value::Object(object), json))
            }
            other => Err(not_an_instance(&other, &self.expected())),
        }
    }
}
