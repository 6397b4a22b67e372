// # Duck Runtime
//
// The registry object every shim and builder hangs off. It owns the
// descriptor cache, the generated-type cache, the converter registry and
// the configuration; nothing in this crate keeps global state.
//
// ## Read Policy
//
// `coerce` decides how a value is made to fit a target type. The first
// rule that applies wins:
//
// 1. `Null` becomes the target's default
// 2. An assignable value passes through unchanged
// 3. A shim whose wrapped source is assignable is unwrapped
// 4. A registered converter is applied; if it yields nothing, the
//    target's default
// 5. A primitive target gets its default
// 6. An interface target gets a nested shim over an object or map
// 7. An array target gets element-wise coercion of an array
// 8. Anything else gets the target's default
//
// Data mismatches never produce an error.

use crate::builder::GraphBuilder;
use crate::config::DuckConfig;
use crate::descriptors::{DescriptorCache, TypeDescription};
use crate::error::{Error, Result};
use crate::registry::ConverterRegistry;
use crate::shim::{ConversionOutcome, MapShim, Shim};
use crate::synth::{GeneratedType, TypeSynthesizer};
use crate::traits::ConverterLocator;
use crate::types::{InterfaceContract, TypeDesc, default_value_for, is_assignable, value_fits};
use crate::value::{Array, MapRef, ObjectRef, Value};
use std::sync::Arc;
use tracing::trace;

/// Runtime registry for duck typing
#[derive(Debug)]
pub struct DuckRuntime {
    config: DuckConfig,
    descriptors: DescriptorCache,
    synthesizer: TypeSynthesizer,
    converters: ConverterRegistry,
}

impl DuckRuntime {
    /// Create a runtime
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the configuration does not validate.
    pub fn new(config: DuckConfig) -> Result<Arc<Self>> {
        config.validate()?;
        Ok(Arc::new(Self {
            config,
            descriptors: DescriptorCache::new(),
            synthesizer: TypeSynthesizer::new(),
            converters: ConverterRegistry::new(),
        }))
    }

    /// Create a runtime with the default configuration
    pub fn with_defaults() -> Arc<Self> {
        Arc::new(Self {
            config: DuckConfig::default(),
            descriptors: DescriptorCache::new(),
            synthesizer: TypeSynthesizer::new(),
            converters: ConverterRegistry::new(),
        })
    }

    pub fn config(&self) -> &DuckConfig {
        &self.config
    }

    pub fn descriptors(&self) -> &DescriptorCache {
        &self.descriptors
    }

    pub fn synthesizer(&self) -> &TypeSynthesizer {
        &self.synthesizer
    }

    /// Converter registry; plugin crates register into it
    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    /// Cached member description of a type
    pub fn describe(&self, ty: &TypeDesc) -> Arc<TypeDescription> {
        self.descriptors.describe(ty)
    }

    /// Generated type implementing `contract`
    pub fn synthesize(&self, contract: &Arc<InterfaceContract>) -> Result<Arc<GeneratedType>> {
        self.synthesizer.synthesize_contract(contract)
    }

    /// Shim presenting `wrapped` as `contract`
    pub fn shim(
        self: &Arc<Self>,
        wrapped: ObjectRef,
        contract: &Arc<InterfaceContract>,
        fuzzy: bool,
    ) -> Arc<Shim> {
        Arc::new(Shim::new(self, wrapped, contract, fuzzy))
    }

    /// Shim presenting a property map as `contract`
    pub fn map_shim(self: &Arc<Self>, map: MapRef, contract: &Arc<InterfaceContract>) -> Arc<MapShim> {
        Arc::new(MapShim::new(self, map, contract))
    }

    /// Graph builder using this runtime's caches and configuration
    pub fn builder(self: &Arc<Self>) -> GraphBuilder {
        GraphBuilder::new(Arc::clone(self))
    }

    /// Make `value` fit `target`
    ///
    /// See the module documentation for the order in which rules apply.
    pub fn coerce(self: &Arc<Self>, value: Value, target: &TypeDesc, fuzzy: bool) -> ConversionOutcome {
        let Some(source) = value.runtime_type() else {
            return ConversionOutcome::Defaulted(default_value_for(target));
        };

        if is_assignable(&source, target) {
            return ConversionOutcome::Matched(value);
        }

        if let Some(inner) = unwrap_shim(&value) {
            if !inner.is_null() && value_fits(&inner, target) {
                return ConversionOutcome::Matched(inner);
            }
        }

        if let Some(converter) = self.converters.find_converter(&source, target) {
            return match converter.convert(&value, target) {
                Some(converted) => ConversionOutcome::Converted(converted),
                None => {
                    trace!("{} yielded nothing for {:?}", converter.name(), value);
                    ConversionOutcome::Defaulted(default_value_for(target))
                }
            };
        }

        match (target, value) {
            (TypeDesc::Interface(contract), Value::Object(object)) => {
                let any = object.as_any();
                let nested = if let Some(map_shim) = any.downcast_ref::<MapShim>() {
                    Value::object(MapShim::new(self, Arc::clone(map_shim.map()), contract))
                } else if let Some(shim) = any.downcast_ref::<Shim>() {
                    Value::object(Shim::new(self, Arc::clone(shim.wrapped()), contract, fuzzy))
                } else {
                    Value::object(Shim::new(self, Arc::clone(&object), contract, fuzzy))
                };
                ConversionOutcome::Proxied(nested)
            }
            (TypeDesc::Interface(contract), Value::Map(map)) => {
                ConversionOutcome::Proxied(Value::object(MapShim::new(self, map, contract)))
            }
            (TypeDesc::Array(element), Value::Array(array)) => {
                let items = array
                    .into_items()
                    .into_iter()
                    .map(|item| self.coerce(item, element, fuzzy).into_value())
                    .collect();
                ConversionOutcome::Converted(Value::Array(Array::with_items((**element).clone(), items)))
            }
            _ => {
                trace!("No safe value of {} for {}; using default", source, target);
                ConversionOutcome::Defaulted(default_value_for(target))
            }
        }
    }

    /// Every reason `value` cannot be presented as `contract`
    ///
    /// Empty when the value can be ducked. Maps satisfy any contract, since
    /// missing entries read as defaults.
    pub fn duck_errors(&self, value: &Value, contract: &Arc<InterfaceContract>, fuzzy: bool) -> Vec<String> {
        let target = TypeDesc::interface(contract);
        let object = match value {
            Value::Null => return vec!["value is null".to_string()],
            Value::Map(_) => return Vec::new(),
            Value::Object(object) => object,
            other => return vec![format!("{} has no members", other.type_name())],
        };
        if value_fits(value, &target) || object.as_any().is::<MapShim>() {
            return Vec::new();
        }

        let mimicked = self.describe(&target);
        let source = self.describe(&object.runtime_type());
        let mut errors = Vec::new();

        for property in mimicked.properties() {
            let Some(found) = source.property(&property.name, fuzzy) else {
                errors.push(format!("missing property {}", property.name));
                continue;
            };
            if property.readable && !found.readable {
                errors.push(format!("property {} is write-only", found.name));
            }
            if property.writable && !found.writable {
                errors.push(format!("property {} is read-only", found.name));
            }
            if property.readable && found.readable && !self.can_coerce_type(&found.ty, &property.ty) {
                errors.push(format!(
                    "property {} is {}, expected {}",
                    found.name, found.ty, property.ty
                ));
            }
        }

        for method in mimicked.methods() {
            let Some(found) = source.method(&method.name, fuzzy) else {
                errors.push(format!("missing method {}", method.name));
                continue;
            };
            if found.params.len() != method.params.len() {
                errors.push(format!(
                    "method {} takes {} argument(s), expected {}",
                    found.name,
                    found.params.len(),
                    method.params.len()
                ));
            } else if !params_compatible(&method.params, &found.params, fuzzy) {
                errors.push(format!("method {} has incompatible parameter types", found.name));
            }
        }

        errors
    }

    /// Present `value` as `contract` using the configured matching mode
    ///
    /// A value that already satisfies the contract is returned as is; a
    /// compatible one comes back wrapped in a shim.
    ///
    /// # Errors
    ///
    /// [`Error::DuckTypeMismatch`] listing every incompatibility found.
    pub fn duck_as(self: &Arc<Self>, value: Value, contract: &Arc<InterfaceContract>) -> Result<Value> {
        self.duck_as_with(value, contract, self.config.default_fuzzy)
    }

    /// [`Self::duck_as`] with case-insensitive member matching
    pub fn fuzzy_duck_as(self: &Arc<Self>, value: Value, contract: &Arc<InterfaceContract>) -> Result<Value> {
        self.duck_as_with(value, contract, true)
    }

    fn duck_as_with(self: &Arc<Self>, value: Value, contract: &Arc<InterfaceContract>, fuzzy: bool) -> Result<Value> {
        if !value.is_null() && value_fits(&value, &TypeDesc::interface(contract)) {
            return Ok(value);
        }

        let errors = self.duck_errors(&value, contract, fuzzy);
        if !errors.is_empty() {
            return Err(Error::DuckTypeMismatch {
                type_name: value.type_name(),
                contract: contract.name().to_string(),
                errors,
            });
        }

        match value {
            Value::Map(map) => Ok(Value::Object(self.map_shim(map, contract))),
            Value::Object(object) => match object.as_any().downcast_ref::<MapShim>() {
                Some(map_shim) => Ok(Value::Object(self.map_shim(Arc::clone(map_shim.map()), contract))),
                None => Ok(Value::Object(self.shim(object, contract, fuzzy))),
            },
            other => Err(Error::invalid_input(format!("cannot duck {}", other.type_name()))),
        }
    }

    /// Whether a value of `from` can be made to fit `to` without defaulting
    fn can_coerce_type(&self, from: &TypeDesc, to: &TypeDesc) -> bool {
        if is_assignable(from, to) || matches!(from, TypeDesc::Any) {
            return true;
        }
        if self.converters.find_converter(from, to).is_some() {
            return true;
        }
        match (from, to) {
            (TypeDesc::Interface(_) | TypeDesc::Class(_) | TypeDesc::Map, TypeDesc::Interface(_)) => true,
            (TypeDesc::Array(a), TypeDesc::Array(b)) => self.can_coerce_type(a, b),
            _ => false,
        }
    }
}

/// The source behind an object or map shim
fn unwrap_shim(value: &Value) -> Option<Value> {
    let object = value.as_object()?;
    if let Some(shim) = object.as_any().downcast_ref::<Shim>() {
        return Some(Value::Object(Arc::clone(shim.wrapped())));
    }
    object
        .as_any()
        .downcast_ref::<MapShim>()
        .map(|shim| Value::Map(Arc::clone(shim.map())))
}

/// Parameter lists match in order, or under fuzzy matching as a multiset
fn params_compatible(wanted: &[TypeDesc], found: &[TypeDesc], fuzzy: bool) -> bool {
    if wanted.iter().zip(found).all(|(w, f)| is_assignable(w, f)) {
        return true;
    }
    if !fuzzy {
        return false;
    }
    let mut remaining: Vec<&TypeDesc> = found.iter().collect();
    wanted.iter().all(|w| match remaining.iter().position(|f| is_assignable(w, f)) {
        Some(index) => {
            remaining.swap_remove(index);
            true
        }
        None => false,
    })
}
