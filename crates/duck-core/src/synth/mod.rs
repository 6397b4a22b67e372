// # Type Synthesizer
//
// Builds, once per contract, a concrete class implementing that contract.
//
// ## Generated Types
//
// - Every contract property, own or inherited, becomes a read/write
//   property, even when the contract declares it read-only
// - Annotations on contract members are copied verbatim
// - Contract methods become members whose body reports `NotSupported`
// - The class carries a `SynthesisMarker`, which is how shims recognise
//   standalone instances
//
// ## Construction Paths
//
// - `GeneratedType::create()`: standalone instance, one backing field per
//   property
// - `GeneratedType::wrap(target)`: instance forwarding every member access
//   to `target` by name

use crate::error::{Error, Result};
use crate::object::Instance;
use crate::types::{
    ClassInfo, InterfaceContract, PropertyDecl, SynthesisMarker, TypeDesc, TypeIdent,
};
use crate::value::ObjectRef;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A class synthesized for one contract
#[derive(Debug)]
pub struct GeneratedType {
    contract: Arc<InterfaceContract>,
    class: Arc<ClassInfo>,
}

impl GeneratedType {
    /// Contract the type implements
    pub fn contract(&self) -> &Arc<InterfaceContract> {
        &self.contract
    }

    /// The generated class
    pub fn class(&self) -> &Arc<ClassInfo> {
        &self.class
    }

    /// The generated class as a type
    pub fn type_desc(&self) -> TypeDesc {
        TypeDesc::Class(Arc::clone(&self.class))
    }

    /// Create a standalone instance with every property at its default
    pub fn create(&self) -> Instance {
        Instance::new(Arc::clone(&self.class))
    }

    /// Create a standalone instance behind a shared handle
    pub fn create_ref(&self) -> ObjectRef {
        Arc::new(self.create())
    }

    /// Create an instance that forwards member access to `target`
    pub fn wrap(&self, target: ObjectRef) -> Instance {
        Instance::wrapping(Arc::clone(&self.class), target)
    }

    fn generate(contract: &Arc<InterfaceContract>) -> Result<Self> {
        let properties = contract.all_properties();
        // Same-named properties would share one backing field.
        for (index, property) in properties.iter().enumerate() {
            if let Some(earlier) = properties[..index].iter().find(|p| p.name == property.name) {
                return Err(Error::invalid_input(format!(
                    "contract {} has property {} as both {} and {}",
                    contract.name(),
                    property.name,
                    earlier.ty,
                    property.ty
                )));
            }
        }

        let mut builder = ClassInfo::builder(generated_name(contract)).implements(contract);
        for property in properties {
            builder = builder.property(PropertyDecl {
                readable: true,
                writable: true,
                ..property
            });
        }

        for method in contract.all_methods() {
            let name = method.name.clone();
            let owner = contract.name().to_string();
            builder = builder.method(method, move |_, _| {
                Err(Error::not_supported(format!(
                    "{}.{} has no body on a synthesized instance",
                    owner, name
                )))
            });
        }

        let marker = SynthesisMarker {
            interface: contract.ident(),
        };
        let class = ClassInfo::synthesized(generated_name(contract), marker, builder);

        Ok(Self {
            contract: Arc::clone(contract),
            class,
        })
    }
}

fn generated_name(contract: &InterfaceContract) -> String {
    format!("Duck<{}>", contract.name())
}

/// Generated-type cache
///
/// Keyed by contract identity: a contract gets at most one generated type
/// per synthesizer. Population is check-under-lock-check.
#[derive(Debug, Default)]
pub struct TypeSynthesizer {
    generated: RwLock<HashMap<TypeIdent, Arc<GeneratedType>>>,
}

impl TypeSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synthesize (or reuse) the type implementing `ty`
    ///
    /// # Errors
    ///
    /// - [`Error::NotAnInterface`] if `ty` is not an interface
    /// - [`Error::InvalidInput`] if the contract is declared but not defined,
    ///   or inherits one property name with two different types
    pub fn synthesize(&self, ty: &TypeDesc) -> Result<Arc<GeneratedType>> {
        match ty {
            TypeDesc::Interface(contract) => self.synthesize_contract(contract),
            other => Err(Error::NotAnInterface(other.to_string())),
        }
    }

    /// Synthesize (or reuse) the type implementing `contract`
    pub fn synthesize_contract(
        &self,
        contract: &Arc<InterfaceContract>,
    ) -> Result<Arc<GeneratedType>> {
        if !contract.is_defined() {
            return Err(Error::invalid_input(format!(
                "contract {} is declared but not defined",
                contract.name()
            )));
        }

        if let Some(found) = self.generated.read().get(&contract.ident()) {
            return Ok(Arc::clone(found));
        }

        let mut generated = self.generated.write();
        if let Some(found) = generated.get(&contract.ident()) {
            return Ok(Arc::clone(found));
        }

        let created = Arc::new(GeneratedType::generate(contract)?);
        debug!(
            "Synthesized {} with {} properties",
            created.class().name(),
            created.class().properties().len()
        );
        generated.insert(contract.ident(), Arc::clone(&created));
        Ok(created)
    }

    /// Whether a type was already generated for `contract`
    pub fn contains(&self, contract: &InterfaceContract) -> bool {
        self.generated.read().contains_key(&contract.ident())
    }

    /// Number of generated types
    pub fn len(&self) -> usize {
        self.generated.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.generated.read().is_empty()
    }
}
