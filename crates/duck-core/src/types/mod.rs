//! Runtime type model
//!
//! Contracts and concrete types are described at runtime so that a value
//! can be checked against, and proxied into, a shape it was never declared
//! against.
//!
//! - [`TypeDesc`]: a type as the runtime sees it
//! - [`InterfaceContract`]: an interface shape (properties and methods)
//! - [`ClassInfo`]: a concrete type with storage and method bodies
//!
//! Contracts and classes may be forward-declared and defined later, which
//! is how self-referential and mutually recursive shapes are expressed.

pub mod assignability;
pub mod class;
pub mod contract;

pub use assignability::{default_value_for, is_assignable, value_fits};
pub use class::{
    ClassBuilder, ClassInfo, Initializer, MethodBody, MethodDef, SynthesisMarker,
    backing_field_name,
};
pub use contract::{InterfaceBuilder, InterfaceContract, MethodDecl, ParamDecl, PropertyDecl};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_IDENT: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a contract or class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeIdent(u64);

impl TypeIdent {
    pub(crate) fn next() -> Self {
        Self(NEXT_IDENT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw identity value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Scalar ("primitive") kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Bool,
    Int,
    Long,
    Double,
    String,
    Guid,
    DateTime,
}

impl ScalarKind {
    /// Display name of the kind
    pub fn name(&self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Int => "int",
            ScalarKind::Long => "long",
            ScalarKind::Double => "double",
            ScalarKind::String => "string",
            ScalarKind::Guid => "guid",
            ScalarKind::DateTime => "datetime",
        }
    }
}

/// A type as seen by the runtime
///
/// Equality is type identity: two interface (or class) descriptors are
/// equal only when they refer to the same declared type.
#[derive(Clone)]
pub enum TypeDesc {
    /// Accepts any value
    Any,
    /// A scalar kind
    Scalar(ScalarKind),
    /// An interface contract
    Interface(Arc<InterfaceContract>),
    /// A concrete type
    Class(Arc<ClassInfo>),
    /// An array of the element type
    Array(Box<TypeDesc>),
    /// A string-keyed property map
    Map,
}

impl TypeDesc {
    pub fn bool() -> Self {
        Self::Scalar(ScalarKind::Bool)
    }

    pub fn int() -> Self {
        Self::Scalar(ScalarKind::Int)
    }

    pub fn long() -> Self {
        Self::Scalar(ScalarKind::Long)
    }

    pub fn double() -> Self {
        Self::Scalar(ScalarKind::Double)
    }

    pub fn string() -> Self {
        Self::Scalar(ScalarKind::String)
    }

    pub fn guid() -> Self {
        Self::Scalar(ScalarKind::Guid)
    }

    pub fn date_time() -> Self {
        Self::Scalar(ScalarKind::DateTime)
    }

    /// Interface type for a contract
    pub fn interface(contract: &Arc<InterfaceContract>) -> Self {
        Self::Interface(Arc::clone(contract))
    }

    /// Concrete type for a class
    pub fn class(class: &Arc<ClassInfo>) -> Self {
        Self::Class(Arc::clone(class))
    }

    /// Array of the given element type
    pub fn array_of(element: TypeDesc) -> Self {
        Self::Array(Box::new(element))
    }

    /// Hashable identity key
    pub fn key(&self) -> TypeKey {
        match self {
            TypeDesc::Any => TypeKey::Any,
            TypeDesc::Scalar(kind) => TypeKey::Scalar(*kind),
            TypeDesc::Interface(contract) => TypeKey::Interface(contract.ident()),
            TypeDesc::Class(class) => TypeKey::Class(class.ident()),
            TypeDesc::Array(element) => TypeKey::Array(Box::new(element.key())),
            TypeDesc::Map => TypeKey::Map,
        }
    }

    /// Scalars are the primitive types: no nested shim is ever built for them
    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeDesc::Scalar(_))
    }

    pub fn is_interface(&self) -> bool {
        matches!(self, TypeDesc::Interface(_))
    }

    pub fn as_interface(&self) -> Option<&Arc<InterfaceContract>> {
        match self {
            TypeDesc::Interface(contract) => Some(contract),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&Arc<ClassInfo>> {
        match self {
            TypeDesc::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Whether the described type has members that can be described
    ///
    /// Forward-declared contracts and classes report `false` until defined.
    pub fn is_defined(&self) -> bool {
        match self {
            TypeDesc::Interface(contract) => contract.is_defined(),
            TypeDesc::Class(class) => class.is_defined(),
            _ => true,
        }
    }
}

impl PartialEq for TypeDesc {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for TypeDesc {}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Any => write!(f, "any"),
            TypeDesc::Scalar(kind) => write!(f, "{}", kind.name()),
            TypeDesc::Interface(contract) => write!(f, "{}", contract.name()),
            TypeDesc::Class(class) => write!(f, "{}", class.name()),
            TypeDesc::Array(element) => write!(f, "{}[]", element),
            TypeDesc::Map => write!(f, "map"),
        }
    }
}

impl fmt::Debug for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeDesc({})", self)
    }
}

/// Hashable identity of a [`TypeDesc`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Any,
    Scalar(ScalarKind),
    Interface(TypeIdent),
    Class(TypeIdent),
    Array(Box<TypeKey>),
    Map,
}

/// Declarative metadata attached to a member
///
/// Arguments are literal constants, held as JSON values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Annotation name
    pub name: String,
    /// Positional constructor arguments
    #[serde(default)]
    pub positional: Vec<serde_json::Value>,
    /// Named arguments
    #[serde(default)]
    pub named: BTreeMap<String, serde_json::Value>,
}

impl Annotation {
    /// Create an annotation with no arguments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            positional: Vec::new(),
            named: BTreeMap::new(),
        }
    }

    /// Append a positional argument
    pub fn with_arg(mut self, arg: impl Into<serde_json::Value>) -> Self {
        self.positional.push(arg.into());
        self
    }

    /// Set a named argument
    pub fn with_named(mut self, name: impl Into<String>, arg: impl Into<serde_json::Value>) -> Self {
        self.named.insert(name.into(), arg.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_identity() {
        let a = InterfaceContract::builder("IThing").build();
        let b = InterfaceContract::builder("IThing").build();

        assert_eq!(TypeDesc::interface(&a), TypeDesc::interface(&a));
        assert_ne!(TypeDesc::interface(&a), TypeDesc::interface(&b));
        assert_eq!(TypeDesc::array_of(TypeDesc::int()), TypeDesc::array_of(TypeDesc::int()));
        assert_ne!(TypeDesc::int(), TypeDesc::long());
    }

    #[test]
    fn test_display() {
        let contract = InterfaceContract::builder("IPerson").build();
        assert_eq!(TypeDesc::array_of(TypeDesc::interface(&contract)).to_string(), "IPerson[]");
        assert_eq!(TypeDesc::date_time().to_string(), "datetime");
    }

    #[test]
    fn test_annotation_roundtrip() {
        let annotation = Annotation::new("MaxLength")
            .with_arg(32)
            .with_named("ErrorMessage", "too long");

        let json = serde_json::to_string(&annotation).unwrap();
        let parsed: Annotation = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, annotation);
    }
}
