//! Graph builder
//!
//! Materialises a fully populated instance of an interface contract:
//!
//! - interface-typed members are built recursively, or reused
//! - concrete members with a parameterless constructor are constructed,
//!   best effort
//! - array members get an empty array of their element type
//! - everything else stays at its default
//!
//! Each build call runs in its own session. The session remembers which
//! instance was built for which contract, so a contract that refers back to
//! itself (directly or through others) resolves to the instance already in
//! progress instead of recursing. An instance of any earlier-built type
//! that is assignable to the requested contract is reused as well.

use crate::config::BuilderConfig;
use crate::error::Result;
use crate::runtime::DuckRuntime;
use crate::synth::GeneratedType;
use crate::types::{InterfaceContract, TypeDesc, TypeIdent, is_assignable};
use crate::value::{Array, ObjectRef, Reflect, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// A contract known at compile time
///
/// Implementations should hand out the same contract on every call, for
/// example from a `OnceLock`, so that repeated builds share one generated
/// type.
pub trait DuckContract {
    fn contract() -> Arc<InterfaceContract>;
}

/// Builds object graphs satisfying interface contracts
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    runtime: Arc<DuckRuntime>,
}

impl GraphBuilder {
    pub fn new(runtime: Arc<DuckRuntime>) -> Self {
        Self { runtime }
    }

    /// Build an instance of `T`'s contract
    pub fn build<T: DuckContract>(&self) -> Result<ObjectRef> {
        self.build_contract(&T::contract())
    }

    /// Build an instance of `contract`
    ///
    /// # Errors
    ///
    /// Only synthesis failures, such as a contract that was declared but
    /// never defined. Construction failures of concrete members are not
    /// errors; those members are left unset.
    pub fn build_contract(&self, contract: &Arc<InterfaceContract>) -> Result<ObjectRef> {
        let mut session = BuildSession {
            runtime: &self.runtime,
            config: &self.runtime.config().builder,
            identity: HashMap::new(),
            built: Vec::new(),
            in_progress: HashSet::new(),
        };
        session.build_interface(contract, 0)
    }
}

struct BuildSession<'a> {
    runtime: &'a Arc<DuckRuntime>,
    config: &'a BuilderConfig,
    /// Requested contract → instance built for it
    identity: HashMap<TypeIdent, ObjectRef>,
    built: Vec<ObjectRef>,
    in_progress: HashSet<TypeIdent>,
}

impl BuildSession<'_> {
    fn build_interface(&mut self, contract: &Arc<InterfaceContract>, depth: usize) -> Result<ObjectRef> {
        if let Some(existing) = self.identity.get(&contract.ident()) {
            if self.in_progress.contains(&contract.ident()) {
                trace!("Cycle through {} closed at depth {}", contract.name(), depth);
            }
            return Ok(Arc::clone(existing));
        }

        let target = TypeDesc::interface(contract);
        if let Some(existing) = self
            .built
            .iter()
            .find(|instance| is_assignable(&instance.runtime_type(), &target))
            .cloned()
        {
            debug!("Reusing {} for {}", existing.runtime_type(), contract.name());
            self.identity.insert(contract.ident(), Arc::clone(&existing));
            return Ok(existing);
        }

        let generated = self.runtime.synthesize(contract)?;
        let instance = generated.create_ref();
        self.identity.insert(contract.ident(), Arc::clone(&instance));
        self.built.push(Arc::clone(&instance));

        self.in_progress.insert(contract.ident());
        let populated = self.populate(&generated, &instance, depth);
        self.in_progress.remove(&contract.ident());
        populated?;

        Ok(instance)
    }

    fn populate(&mut self, generated: &GeneratedType, instance: &ObjectRef, depth: usize) -> Result<()> {
        for property in generated.class().properties() {
            if !property.writable {
                continue;
            }

            match &property.ty {
                TypeDesc::Interface(nested) => {
                    if depth + 1 > self.config.max_depth {
                        warn!(
                            "Leaving {}.{} unset: max depth {} reached",
                            generated.class().name(),
                            property.name,
                            self.config.max_depth
                        );
                        continue;
                    }
                    let value = self.build_interface(nested, depth + 1)?;
                    instance.set(&property.name, Value::Object(value))?;
                }
                TypeDesc::Class(class) if self.config.populate_concrete => {
                    if !class.has_default_constructor() {
                        continue;
                    }
                    match class.construct() {
                        Ok(constructed) => instance.set(&property.name, Value::object(constructed))?,
                        Err(e) => debug!("Leaving {}.{} unset: {}", generated.class().name(), property.name, e),
                    }
                }
                TypeDesc::Array(element) if self.config.populate_arrays => {
                    instance.set(&property.name, Value::Array(Array::new((**element).clone())))?;
                }
                _ => {}
            }
        }
        Ok(())
    }
}
