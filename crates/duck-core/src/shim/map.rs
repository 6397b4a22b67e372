// # Map Shim
//
// Presents a [`PropertyMap`] as an interface contract. Map entries carry no
// access modes, so only members missing from the contract itself raise an
// error; a missing entry reads as the member type's default.
//
// ## Matching Mode
//
// The mode is inferred from the map rather than supplied. A key whose
// upper- and lower-case forms both find the same entry is evidence of a
// case-insensitive map, and the shim matches fuzzily. Keys that could show
// that evidence and do not switch it to exact matching. A map with no such
// keys at all (empty, or numeric keys only) is matched fuzzily.
//
// ## Nested Shims
//
// Interface-typed members are materialised when the shim is built: a
// missing or null entry gets an empty nested map, using the parent's key
// comparison, and a nested shim is cached for it. A contract already being
// materialised further up is left for the first read, which does the same
// thing lazily. The nested cache stays locked while an entry is filled, so
// concurrent first reads share one nested map.

use super::ConversionOutcome;
use crate::descriptors::{PropertyDescriptor, TypeDescription};
use crate::error::{Error, Result};
use crate::map::PropertyMap;
use crate::runtime::DuckRuntime;
use crate::types::{InterfaceContract, TypeDesc, TypeIdent, value_fits};
use crate::value::{MapRef, Reflect, Value};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Proxy presenting a property map as an interface contract
pub struct MapShim {
    runtime: Arc<DuckRuntime>,
    map: MapRef,
    contract: Arc<InterfaceContract>,
    fuzzy: bool,
    mimicked: Arc<TypeDescription>,
    nested: Mutex<HashMap<String, Value>>,
}

impl MapShim {
    /// Wrap `map` as `contract`
    pub fn new(runtime: &Arc<DuckRuntime>, map: MapRef, contract: &Arc<InterfaceContract>) -> Self {
        Self::materialise(runtime, map, contract, &mut Vec::new())
    }

    fn materialise(
        runtime: &Arc<DuckRuntime>,
        map: MapRef,
        contract: &Arc<InterfaceContract>,
        path: &mut Vec<TypeIdent>,
    ) -> Self {
        let shim = Self {
            runtime: Arc::clone(runtime),
            fuzzy: detect_fuzzy(&map),
            mimicked: runtime.describe(&TypeDesc::interface(contract)),
            map,
            contract: Arc::clone(contract),
            nested: Mutex::new(HashMap::new()),
        };

        path.push(contract.ident());
        {
            let mut cache = shim.nested.lock();
            for property in shim.mimicked.properties() {
                if let TypeDesc::Interface(nested) = &property.ty {
                    if !path.contains(&nested.ident()) {
                        shim.nested_value(&mut cache, property, nested, path);
                    }
                }
            }
        }
        path.pop();

        shim
    }

    /// The backing map
    pub fn map(&self) -> &MapRef {
        &self.map
    }

    pub fn contract(&self) -> &Arc<InterfaceContract> {
        &self.contract
    }

    /// Whether members are matched ignoring case
    pub fn is_fuzzy(&self) -> bool {
        self.fuzzy
    }

    /// Number of nested shims currently cached
    pub fn nested_count(&self) -> usize {
        self.nested.lock().len()
    }

    pub fn get_property_value(&self, name: &str) -> Result<Value> {
        self.resolve_property(name).map(ConversionOutcome::into_value)
    }

    /// Read an entry as the contract declares it
    pub fn resolve_property(&self, name: &str) -> Result<ConversionOutcome> {
        let property = self.mimicked_property(name)?;
        let mut cache = self.nested.lock();
        if let Some(cached) = cache.get(&property.name) {
            return Ok(ConversionOutcome::Proxied(cached.clone()));
        }

        if let TypeDesc::Interface(nested) = &property.ty {
            let mut path = vec![self.contract.ident()];
            if let Some(value) = self.nested_value(&mut cache, property, nested, &mut path) {
                return Ok(ConversionOutcome::Proxied(value));
            }
        }
        drop(cache);

        let raw = self
            .map
            .resolve(&property.name, self.fuzzy)
            .map(|(_, value)| value)
            .unwrap_or_default();
        Ok(self.runtime.coerce(raw, &property.ty, self.fuzzy))
    }

    pub fn set_property_value(&self, name: &str, value: Value) -> Result<()> {
        self.assign_property(name, value).map(|_| ())
    }

    /// Write an entry, reporting how the stored value was obtained
    ///
    /// Interface members store maps and objects as given, with map shims
    /// unwrapped to their map; a stored value that does not already fit
    /// is read back through a nested shim, reported as `Proxied`.
    /// Everything else is coerced to the member type. An existing entry
    /// keeps its key spelling.
    pub fn assign_property(&self, name: &str, value: Value) -> Result<ConversionOutcome> {
        let property = self.mimicked_property(name)?;
        let key = self
            .map
            .resolve(&property.name, self.fuzzy)
            .map(|(key, _)| key)
            .unwrap_or_else(|| property.name.clone());

        let mut cache = self.nested.lock();
        cache.remove(&property.name);

        let (contract, stored) = match (property.ty.as_interface(), value) {
            (Some(contract), Value::Object(object)) => {
                let stored = match object.as_any().downcast_ref::<MapShim>() {
                    Some(shim) => Value::Map(Arc::clone(shim.map())),
                    None => Value::Object(object),
                };
                (contract, stored)
            }
            (Some(contract), Value::Map(map)) => (contract, Value::Map(map)),
            (_, other) => {
                let outcome = self.runtime.coerce(other, &property.ty, self.fuzzy);
                self.map.insert(key, outcome.value().clone());
                return Ok(outcome);
            }
        };

        self.map.insert(key, stored.clone());
        if value_fits(&stored, &property.ty) {
            return Ok(ConversionOutcome::Matched(stored));
        }
        let mut path = vec![self.contract.ident()];
        Ok(match self.nested_value(&mut cache, property, contract, &mut path) {
            Some(proxy) => ConversionOutcome::Proxied(proxy),
            None => ConversionOutcome::Matched(stored),
        })
    }

    /// Maps carry no method bodies
    pub fn call_through(&self, name: &str, _args: Vec<Value>) -> Result<Value> {
        Err(Error::not_supported(format!(
            "{} is backed by a map and has no body for {}",
            self.contract.name(),
            name
        )))
    }

    fn mimicked_property(&self, name: &str) -> Result<&PropertyDescriptor> {
        self.mimicked
            .property(name, self.fuzzy)
            .ok_or_else(|| Error::property_not_found(self.contract.name(), name))
    }

    /// Build and cache the nested shim for an interface-typed member
    ///
    /// `None` when the entry holds a scalar or array, which no nested shim
    /// can present.
    fn nested_value(
        &self,
        cache: &mut HashMap<String, Value>,
        property: &PropertyDescriptor,
        contract: &Arc<InterfaceContract>,
        path: &mut Vec<TypeIdent>,
    ) -> Option<Value> {
        let (key, raw) = self
            .map
            .resolve(&property.name, self.fuzzy)
            .unwrap_or_else(|| (property.name.clone(), Value::Null));

        let nested = match raw {
            Value::Null => {
                let empty = PropertyMap::with_comparison(self.map.comparison()).shared();
                self.map.insert(key, Value::Map(Arc::clone(&empty)));
                Value::object(Self::materialise(&self.runtime, empty, contract, path))
            }
            Value::Map(map) => Value::object(Self::materialise(&self.runtime, map, contract, path)),
            Value::Object(object) => match object.as_any().downcast_ref::<MapShim>() {
                Some(shim) => Value::object(Self::materialise(
                    &self.runtime,
                    Arc::clone(shim.map()),
                    contract,
                    path,
                )),
                None => self
                    .runtime
                    .coerce(Value::Object(object), &TypeDesc::interface(contract), self.fuzzy)
                    .into_value(),
            },
            _ => return None,
        };

        cache.insert(property.name.clone(), nested.clone());
        Some(nested)
    }
}

/// Infer the matching mode of a map from its keys
pub fn detect_fuzzy(map: &PropertyMap) -> bool {
    let mut saw_cased_key = false;
    for key in map.keys() {
        let upper = key.to_uppercase();
        let lower = key.to_lowercase();
        if upper == lower {
            continue;
        }
        saw_cased_key = true;

        let upper_entry = map.entry_key(&upper);
        if upper_entry.is_some() && upper_entry == map.entry_key(&lower) {
            return true;
        }
    }
    !saw_cased_key
}

impl Reflect for MapShim {
    fn runtime_type(&self) -> TypeDesc {
        TypeDesc::interface(&self.contract)
    }

    fn get(&self, name: &str) -> Result<Value> {
        self.get_property_value(name)
    }

    fn set(&self, name: &str, value: Value) -> Result<()> {
        self.set_property_value(name, value)
    }

    fn invoke(&self, name: &str, args: Vec<Value>) -> Result<Value> {
        self.call_through(name, args)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for MapShim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapShim")
            .field("contract", &self.contract.name())
            .field("entries", &self.map.len())
            .field("fuzzy", &self.fuzzy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_fuzzy() {
        assert!(detect_fuzzy(&PropertyMap::new()));
        assert!(detect_fuzzy(&PropertyMap::new().with("1", 1)));
        assert!(!detect_fuzzy(&PropertyMap::new().with("Name", "Bob")));
        assert!(detect_fuzzy(&PropertyMap::case_insensitive().with("Name", "Bob")));
    }

    #[test]
    fn test_cycle_materialised_lazily() {
        let runtime = DuckRuntime::with_defaults();
        let node = InterfaceContract::declare("INode");
        node.define(|b| {
            b.read_write("Value", TypeDesc::int())
                .read_write("Next", TypeDesc::interface(&node))
        })
        .unwrap();

        let map = PropertyMap::new().shared();
        let shim = MapShim::new(&runtime, Arc::clone(&map), &node);
        assert_eq!(shim.nested_count(), 0);
        assert!(map.is_empty());

        let next = shim.get_property_value("Next").unwrap();
        assert!(map.get("Next").unwrap().as_map().is_some());
        assert_eq!(next, shim.get_property_value("Next").unwrap());

        next.as_object().unwrap().set("Value", Value::Int(2)).unwrap();
        let stored = map.get("Next").unwrap();
        assert_eq!(stored.as_map().unwrap().get("Value"), Some(Value::Int(2)));
    }

    #[test]
    fn test_call_through_not_supported() {
        let runtime = DuckRuntime::with_defaults();
        let contract = InterfaceContract::builder("IEmpty").build();
        let shim = MapShim::new(&runtime, PropertyMap::new().shared(), &contract);
        assert!(matches!(
            shim.call_through("Run", vec![]),
            Err(Error::NotSupported(_))
        ));
    }
}
