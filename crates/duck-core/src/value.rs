//! Runtime values and the [`Reflect`] object interface
//!
//! Every value flowing through shims and builders is a [`Value`]. Objects
//! are shared, reflective handles: anything implementing [`Reflect`] can be
//! stored in a property, wrapped by a shim or returned from one.

use crate::error::Result;
use crate::map::PropertyMap;
use crate::types::{ScalarKind, TypeDesc};
use chrono::{DateTime, Utc};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Shared handle to a reflective object
pub type ObjectRef = Arc<dyn Reflect>;

/// Shared handle to a property map
pub type MapRef = Arc<PropertyMap>;

/// Reflective access to an object
///
/// Names passed to these methods are exact member names of
/// [`Reflect::runtime_type`]. Case-insensitive resolution is the job of
/// the shims.
pub trait Reflect: Send + Sync + fmt::Debug {
    /// The object's own type
    fn runtime_type(&self) -> TypeDesc;

    /// Read a property
    fn get(&self, name: &str) -> Result<Value>;

    /// Write a property
    fn set(&self, name: &str, value: Value) -> Result<()>;

    /// Invoke a method
    fn invoke(&self, name: &str, args: Vec<Value>) -> Result<Value>;

    /// Downcasting support
    fn as_any(&self) -> &dyn Any;
}

/// A typed array value
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    element: TypeDesc,
    items: Vec<Value>,
}

impl Array {
    /// An empty array of the element type
    pub fn new(element: TypeDesc) -> Self {
        Self {
            element,
            items: Vec::new(),
        }
    }

    pub fn with_items(element: TypeDesc, items: Vec<Value>) -> Self {
        Self { element, items }
    }

    pub fn element(&self) -> &TypeDesc {
        &self.element
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Value> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A runtime value
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    String(String),
    Guid(Uuid),
    DateTime(DateTime<Utc>),
    Array(Array),
    Map(MapRef),
    Object(ObjectRef),
}

impl Value {
    /// Wrap a reflective object
    pub fn object(object: impl Reflect + 'static) -> Self {
        Value::Object(Arc::new(object))
    }

    /// The value's runtime type, `None` for `Null`
    pub fn runtime_type(&self) -> Option<TypeDesc> {
        let ty = match self {
            Value::Null => return None,
            Value::Bool(_) => TypeDesc::Scalar(ScalarKind::Bool),
            Value::Int(_) => TypeDesc::Scalar(ScalarKind::Int),
            Value::Long(_) => TypeDesc::Scalar(ScalarKind::Long),
            Value::Double(_) => TypeDesc::Scalar(ScalarKind::Double),
            Value::String(_) => TypeDesc::Scalar(ScalarKind::String),
            Value::Guid(_) => TypeDesc::Scalar(ScalarKind::Guid),
            Value::DateTime(_) => TypeDesc::Scalar(ScalarKind::DateTime),
            Value::Array(array) => TypeDesc::array_of(array.element().clone()),
            Value::Map(_) => TypeDesc::Map,
            Value::Object(object) => object.runtime_type(),
        };
        Some(ty)
    }

    /// Display name of the runtime type
    pub fn type_name(&self) -> String {
        self.runtime_type()
            .map(|ty| ty.to_string())
            .unwrap_or_else(|| "null".to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(l) => Some(*l),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_guid(&self) -> Option<Uuid> {
        match self {
            Value::Guid(g) => Some(*g),
            _ => None,
        }
    }

    pub fn as_date_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::DateTime(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapRef> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Downcast an object value to its concrete type
    pub fn downcast_object<T: 'static>(&self) -> Option<&T> {
        self.as_object().and_then(|o| o.as_any().downcast_ref::<T>())
    }

    /// Convert a JSON value
    ///
    /// Objects become case-sensitive property maps, arrays become `any[]`,
    /// integers become `int` when they fit and `long` otherwise.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => i32::try_from(i).map(Value::Int).unwrap_or(Value::Long(i)),
                None => Value::Double(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => Value::Array(Array::with_items(
                TypeDesc::Any,
                items.iter().map(Value::from_json).collect(),
            )),
            serde_json::Value::Object(entries) => Value::Map(Arc::new(PropertyMap::from_json_object(
                entries,
                Default::default(),
            ))),
        }
    }

    /// Convert to JSON
    ///
    /// Objects have no JSON form and are written as `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null | Value::Object(_) => serde_json::Value::Null,
            Value::Bool(b) => (*b).into(),
            Value::Int(i) => (*i).into(),
            Value::Long(l) => (*l).into(),
            Value::Double(d) => serde_json::Number::from_f64(*d)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => s.clone().into(),
            Value::Guid(g) => g.to_string().into(),
            Value::DateTime(d) => d.to_rfc3339().into(),
            Value::Array(a) => a.items().iter().map(Value::to_json).collect(),
            Value::Map(m) => m.to_json(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Guid(a), Value::Guid(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::Long(l) => write!(f, "Long({})", l),
            Value::Double(d) => write!(f, "Double({})", d),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Guid(g) => write!(f, "Guid({})", g),
            Value::DateTime(d) => write!(f, "DateTime({})", d.to_rfc3339()),
            Value::Array(a) => write!(f, "Array({}; {} items)", a.element(), a.len()),
            Value::Map(m) => write!(f, "Map({} entries)", m.len()),
            Value::Object(o) => write!(f, "Object({})", o.runtime_type()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Guid(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v)
    }
}

impl From<Array> for Value {
    fn from(v: Array) -> Self {
        Value::Array(v)
    }
}

impl From<MapRef> for Value {
    fn from(v: MapRef) -> Self {
        Value::Map(v)
    }
}

impl From<ObjectRef> for Value {
    fn from(v: ObjectRef) -> Self {
        Value::Object(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
