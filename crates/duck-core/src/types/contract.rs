// # Interface Contracts
//
// An interface contract is the shape being mimicked: its properties (with
// declared type, access mode and annotations), its method signatures and
// the contracts it extends.
//
// ## Usage
//
// ```rust
// use duck_core::types::{InterfaceContract, TypeDesc};
//
// let contract = InterfaceContract::builder("IPerson")
//     .read_write("Id", TypeDesc::int())
//     .read_only("Name", TypeDesc::string())
//     .build();
//
// assert_eq!(contract.properties().len(), 2);
// ```
//
// Self-referential contracts are declared first and defined afterwards:
//
// ```rust
// use duck_core::types::{InterfaceContract, TypeDesc};
//
// let node = InterfaceContract::declare("INode");
// node.define(|b| b.read_write("Next", TypeDesc::interface(&node))).unwrap();
// assert!(node.is_defined());
// ```

use super::{Annotation, TypeDesc, TypeIdent, TypeKey};
use crate::error::{Error, Result};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// A property declared on a contract or class
#[derive(Debug, Clone)]
pub struct PropertyDecl {
    /// Property name
    pub name: String,
    /// Declared type
    pub ty: TypeDesc,
    /// Has a reader
    pub readable: bool,
    /// Has a writer
    pub writable: bool,
    /// Declarative metadata
    pub annotations: Vec<Annotation>,
}

impl PropertyDecl {
    /// A readable and writable property
    pub fn read_write(name: impl Into<String>, ty: TypeDesc) -> Self {
        Self {
            name: name.into(),
            ty,
            readable: true,
            writable: true,
            annotations: Vec::new(),
        }
    }

    /// A property with a reader only
    pub fn read_only(name: impl Into<String>, ty: TypeDesc) -> Self {
        Self {
            writable: false,
            ..Self::read_write(name, ty)
        }
    }

    /// A property with a writer only
    pub fn write_only(name: impl Into<String>, ty: TypeDesc) -> Self {
        Self {
            readable: false,
            ..Self::read_write(name, ty)
        }
    }

    /// Attach an annotation
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    fn dedup_key(&self) -> (String, TypeKey) {
        (self.name.clone(), self.ty.key())
    }
}

/// A method parameter
#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub name: String,
    pub ty: TypeDesc,
}

/// A method signature
#[derive(Debug, Clone)]
pub struct MethodDecl {
    /// Method name
    pub name: String,
    /// Parameters in declared order
    pub params: Vec<ParamDecl>,
    /// Return type, `None` for no value
    pub returns: Option<TypeDesc>,
}

impl MethodDecl {
    /// A method with no parameters and no return value
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns: None,
        }
    }

    /// Append a parameter
    pub fn param(mut self, name: impl Into<String>, ty: TypeDesc) -> Self {
        self.params.push(ParamDecl {
            name: name.into(),
            ty,
        });
        self
    }

    /// Set the return type
    pub fn returns(mut self, ty: TypeDesc) -> Self {
        self.returns = Some(ty);
        self
    }

    /// Parameter types in declared order
    pub fn param_types(&self) -> Vec<TypeDesc> {
        self.params.iter().map(|p| p.ty.clone()).collect()
    }

    fn dedup_key(&self) -> (String, Vec<TypeKey>) {
        (
            self.name.clone(),
            self.params.iter().map(|p| p.ty.key()).collect(),
        )
    }
}

#[derive(Debug, Default)]
struct InterfaceMembers {
    extends: Vec<Arc<InterfaceContract>>,
    properties: Vec<PropertyDecl>,
    methods: Vec<MethodDecl>,
}

/// An interface shape that values can be made to satisfy
///
/// Members are set exactly once, either by [`InterfaceBuilder::build`] or
/// by [`InterfaceContract::define`] after a forward declaration, and are
/// immutable afterwards.
pub struct InterfaceContract {
    ident: TypeIdent,
    name: String,
    members: OnceLock<InterfaceMembers>,
}

impl InterfaceContract {
    /// Forward-declare a contract with no members yet
    pub fn declare(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            ident: TypeIdent::next(),
            name: name.into(),
            members: OnceLock::new(),
        })
    }

    /// Start building a contract
    pub fn builder(name: impl Into<String>) -> InterfaceBuilder {
        InterfaceBuilder::new(name)
    }

    /// Define the members of a forward-declared contract
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyDefined`] if the contract already has members.
    pub fn define(&self, build: impl FnOnce(InterfaceBuilder) -> InterfaceBuilder) -> Result<()> {
        let builder = build(InterfaceBuilder::new(self.name.clone()));
        self.members
            .set(builder.into_members())
            .map_err(|_| Error::AlreadyDefined(self.name.clone()))
    }

    pub fn ident(&self) -> TypeIdent {
        self.ident
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_defined(&self) -> bool {
        self.members.get().is_some()
    }

    /// Directly extended contracts
    pub fn extends(&self) -> &[Arc<InterfaceContract>] {
        self.members.get().map(|m| m.extends.as_slice()).unwrap_or(&[])
    }

    /// Properties declared directly on this contract
    pub fn properties(&self) -> &[PropertyDecl] {
        self.members
            .get()
            .map(|m| m.properties.as_slice())
            .unwrap_or(&[])
    }

    /// Methods declared directly on this contract
    pub fn methods(&self) -> &[MethodDecl] {
        self.members.get().map(|m| m.methods.as_slice()).unwrap_or(&[])
    }

    /// Own and inherited properties, deduplicated by (name, declared type)
    pub fn all_properties(&self) -> Vec<PropertyDecl> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        self.walk(&mut HashSet::new(), &mut |contract| {
            for property in contract.properties() {
                if seen.insert(property.dedup_key()) {
                    out.push(property.clone());
                }
            }
        });
        out
    }

    /// Own and inherited methods, deduplicated by (name, parameter types)
    pub fn all_methods(&self) -> Vec<MethodDecl> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        self.walk(&mut HashSet::new(), &mut |contract| {
            for method in contract.methods() {
                if seen.insert(method.dedup_key()) {
                    out.push(method.clone());
                }
            }
        });
        out
    }

    /// Whether this contract is `other` or extends it, directly or not
    pub fn extends_interface(&self, other: &InterfaceContract) -> bool {
        let mut found = false;
        self.walk(&mut HashSet::new(), &mut |contract| {
            found |= contract.ident == other.ident;
        });
        found
    }

    // Depth-first, own members before inherited ones; each contract once.
    fn walk(&self, visited: &mut HashSet<TypeIdent>, visit: &mut dyn FnMut(&InterfaceContract)) {
        if !visited.insert(self.ident) {
            return;
        }
        visit(self);
        for parent in self.extends() {
            parent.walk(visited, visit);
        }
    }
}

impl fmt::Debug for InterfaceContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceContract")
            .field("ident", &self.ident)
            .field("name", &self.name)
            .field("defined", &self.is_defined())
            .finish()
    }
}

/// Builder for [`InterfaceContract`]
#[derive(Debug)]
pub struct InterfaceBuilder {
    name: String,
    members: InterfaceMembers,
}

impl InterfaceBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: InterfaceMembers::default(),
        }
    }

    /// Inherit the members of another contract
    pub fn extends(mut self, parent: &Arc<InterfaceContract>) -> Self {
        self.members.extends.push(Arc::clone(parent));
        self
    }

    /// Add a property declaration
    pub fn property(mut self, property: PropertyDecl) -> Self {
        self.members.properties.push(property);
        self
    }

    pub fn read_write(self, name: impl Into<String>, ty: TypeDesc) -> Self {
        self.property(PropertyDecl::read_write(name, ty))
    }

    pub fn read_only(self, name: impl Into<String>, ty: TypeDesc) -> Self {
        self.property(PropertyDecl::read_only(name, ty))
    }

    /// Add a method signature
    pub fn method(mut self, method: MethodDecl) -> Self {
        self.members.methods.push(method);
        self
    }

    /// Finish the contract
    pub fn build(self) -> Arc<InterfaceContract> {
        let contract = InterfaceContract::declare(self.name.clone());
        // A freshly declared contract has no members yet.
        let _ = contract.members.set(self.into_members());
        contract
    }

    fn into_members(self) -> InterfaceMembers {
        self.members
    }
}
