// # Concrete Types
//
// A class is a concrete type: declared properties backed by per-instance
// storage, methods with bodies, the contracts it implements and an
// optional parameterless constructor.
//
// Classes produced by the type synthesizer carry a [`SynthesisMarker`].
// Instances of such classes keep their property values in backing fields
// named by [`backing_field_name`].

use super::contract::{MethodDecl, PropertyDecl};
use super::{InterfaceContract, TypeDesc, TypeIdent};
use crate::error::{Error, Result};
use crate::object::Instance;
use crate::value::Value;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Method implementation: receives the instance and the arguments
pub type MethodBody = Arc<dyn Fn(&Instance, Vec<Value>) -> Result<Value> + Send + Sync>;

/// Runs after default field initialisation in the parameterless constructor
pub type Initializer = Arc<dyn Fn(&Instance) -> Result<()> + Send + Sync>;

/// Storage slot name for a property of a synthesized type
pub fn backing_field_name(property: &str) -> String {
    format!("_{}", property)
}

/// A method signature with its body
#[derive(Clone)]
pub struct MethodDef {
    /// Signature
    pub decl: MethodDecl,
    body: MethodBody,
}

impl MethodDef {
    pub fn new(
        decl: MethodDecl,
        body: impl Fn(&Instance, Vec<Value>) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            decl,
            body: Arc::new(body),
        }
    }

    /// Run the body against an instance
    pub fn call(&self, instance: &Instance, args: Vec<Value>) -> Result<Value> {
        (self.body)(instance, args)
    }
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef").field("decl", &self.decl).finish()
    }
}

/// Marks a class as produced by the type synthesizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisMarker {
    /// Contract the class was generated for
    pub interface: TypeIdent,
}

#[derive(Default)]
struct ClassMembers {
    implements: Vec<Arc<InterfaceContract>>,
    properties: Vec<PropertyDecl>,
    methods: Vec<MethodDef>,
    default_constructible: bool,
    initializer: Option<Initializer>,
}

/// A concrete runtime type
pub struct ClassInfo {
    ident: TypeIdent,
    name: String,
    marker: Option<SynthesisMarker>,
    members: OnceLock<ClassMembers>,
}

impl ClassInfo {
    /// Forward-declare a class with no members yet
    pub fn declare(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            ident: TypeIdent::next(),
            name: name.into(),
            marker: None,
            members: OnceLock::new(),
        })
    }

    /// Start building a class
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder::new(name)
    }

    /// Define the members of a forward-declared class
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyDefined`] if the class already has members.
    pub fn define(&self, build: impl FnOnce(ClassBuilder) -> ClassBuilder) -> Result<()> {
        let builder = build(ClassBuilder::new(self.name.clone()));
        self.members
            .set(builder.members)
            .map_err(|_| Error::AlreadyDefined(self.name.clone()))
    }

    pub(crate) fn synthesized(name: String, marker: SynthesisMarker, builder: ClassBuilder) -> Arc<Self> {
        let class = Arc::new(Self {
            ident: TypeIdent::next(),
            name,
            marker: Some(marker),
            members: OnceLock::new(),
        });
        let _ = class.members.set(builder.members);
        class
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

    /// The synthesis marker, present only on generated classes
    pub fn marker(&self) -> Option<SynthesisMarker> {
        self.marker
    }

    pub fn is_synthesized(&self) -> bool {
        self.marker.is_some()
    }

    pub fn implements(&self) -> &[Arc<InterfaceContract>] {
        self.members
            .get()
            .map(|m| m.implements.as_slice())
            .unwrap_or(&[])
    }

    pub fn properties(&self) -> &[PropertyDecl] {
        self.members
            .get()
            .map(|m| m.properties.as_slice())
            .unwrap_or(&[])
    }

    pub fn methods(&self) -> &[MethodDef] {
        self.members.get().map(|m| m.methods.as_slice()).unwrap_or(&[])
    }

    /// Property by exact name
    pub fn property(&self, name: &str) -> Option<&PropertyDecl> {
        self.properties().iter().find(|p| p.name == name)
    }

    /// Method by exact name
    pub fn method(&self, name: &str) -> Option<&MethodDef> {
        self.methods().iter().find(|m| m.decl.name == name)
    }

    /// Whether any implemented contract is, or extends, `contract`
    pub fn implements_interface(&self, contract: &InterfaceContract) -> bool {
        self.implements()
            .iter()
            .any(|implemented| implemented.extends_interface(contract))
    }

    pub fn has_default_constructor(&self) -> bool {
        self.members
            .get()
            .is_some_and(|m| m.default_constructible)
    }

    /// Run the parameterless constructor
    ///
    /// # Errors
    ///
    /// [`Error::Construction`] if the class has no parameterless
    /// constructor or its initializer fails.
    pub fn construct(self: &Arc<Self>) -> Result<Instance> {
        let members = self
            .members
            .get()
            .filter(|m| m.default_constructible)
            .ok_or_else(|| Error::construction(&self.name, "no parameterless constructor"))?;

        let instance = Instance::new(Arc::clone(self));
        if let Some(initializer) = &members.initializer {
            initializer(&instance)
                .map_err(|e| Error::construction(&self.name, e.to_string()))?;
        }
        Ok(instance)
    }
}

impl fmt::Debug for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInfo")
            .field("ident", &self.ident)
            .field("name", &self.name)
            .field("synthesized", &self.is_synthesized())
            .finish()
    }
}

/// Builder for [`ClassInfo`]
pub struct ClassBuilder {
    name: String,
    members: ClassMembers,
}

impl ClassBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: ClassMembers {
                default_constructible: true,
                ..ClassMembers::default()
            },
        }
    }

    /// Declare an implemented contract
    pub fn implements(mut self, contract: &Arc<InterfaceContract>) -> Self {
        self.members.implements.push(Arc::clone(contract));
        self
    }

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

    pub fn write_only(self, name: impl Into<String>, ty: TypeDesc) -> Self {
        self.property(PropertyDecl::write_only(name, ty))
    }

    /// Add a method with its body
    pub fn method(
        mut self,
        decl: MethodDecl,
        body: impl Fn(&Instance, Vec<Value>) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.members.methods.push(MethodDef::new(decl, body));
        self
    }

    /// Remove the parameterless constructor
    pub fn without_default_constructor(mut self) -> Self {
        self.members.default_constructible = false;
        self
    }

    /// Run `init` after fields are defaulted in the parameterless constructor
    pub fn initializer(
        mut self,
        init: impl Fn(&Instance) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.members.initializer = Some(Arc::new(init));
        self
    }

    /// Finish the class
    pub fn build(self) -> Arc<ClassInfo> {
        let class = ClassInfo::declare(self.name);
        let _ = class.members.set(self.members);
        class
    }
}

impl fmt::Debug for ClassBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassBuilder").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Reflect;

    #[test]
    fn test_construct_runs_initializer() {
        let class = ClassInfo::builder("Counter")
            .read_write("Count", TypeDesc::int())
            .initializer(|instance| {
                instance.set_field("Count", 7);
                Ok(())
            })
            .build();

        let instance = class.construct().unwrap();
        assert_eq!(instance.get("Count").unwrap(), Value::Int(7));
    }

    #[test]
    fn test_construct_without_default_constructor() {
        let class = ClassInfo::builder("Service")
            .without_default_constructor()
            .build();

        assert!(!class.has_default_constructor());
        assert!(matches!(class.construct(), Err(Error::Construction { .. })));
    }

    #[test]
    fn test_failing_initializer_is_construction_error() {
        let class = ClassInfo::builder("Fragile")
            .initializer(|_| Err(Error::Other("boom".to_string())))
            .build();

        let err = class.construct().unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_implements_through_inheritance() {
        let base = InterfaceContract::builder("IBase").build();
        let derived = InterfaceContract::builder("IDerived").extends(&base).build();
        let class = ClassInfo::builder("Impl").implements(&derived).build();

        assert!(class.implements_interface(&base));
        assert!(class.implements_interface(&derived));
    }
}
