// # Object Shim
//
// Presents an object as an interface contract it was never declared
// against. Member names are resolved first on the contract, then on the
// wrapped object's own type, exactly or ignoring case.
//
// ## Standalone Instances
//
// A wrapped object carrying the synthesis marker, with no delegate of its
// own, is a standalone instance: reads and writes go straight to its
// `_<Property>` backing fields and call-through is not supported.
//
// ## Nested Shims
//
// Interface-typed members whose value does not already satisfy the member
// type are wrapped in a nested shim on first read. The nested shim is
// cached per property, so repeated reads return the same shim and writes
// made through it stay visible. Writing the property drops the cache entry.

use super::ConversionOutcome;
use crate::descriptors::{PropertyDescriptor, TypeDescription};
use crate::error::{Error, Result};
use crate::object::Instance;
use crate::runtime::DuckRuntime;
use crate::types::{InterfaceContract, TypeDesc, backing_field_name, value_fits};
use crate::value::{ObjectRef, Reflect, Value};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Proxy presenting an object as an interface contract
pub struct Shim {
    runtime: Arc<DuckRuntime>,
    wrapped: ObjectRef,
    contract: Arc<InterfaceContract>,
    fuzzy: bool,
    standalone: bool,
    mimicked: Arc<TypeDescription>,
    source: Arc<TypeDescription>,
    nested: Mutex<HashMap<String, Value>>,
}

impl Shim {
    /// Wrap `wrapped` as `contract`
    ///
    /// With `fuzzy` set, member names are matched ignoring case.
    pub fn new(
        runtime: &Arc<DuckRuntime>,
        wrapped: ObjectRef,
        contract: &Arc<InterfaceContract>,
        fuzzy: bool,
    ) -> Self {
        let standalone = wrapped
            .as_any()
            .downcast_ref::<Instance>()
            .is_some_and(Instance::is_standalone);
        let mimicked = runtime.describe(&TypeDesc::interface(contract));
        let source = runtime.describe(&wrapped.runtime_type());

        Self {
            runtime: Arc::clone(runtime),
            wrapped,
            contract: Arc::clone(contract),
            fuzzy,
            standalone,
            mimicked,
            source,
            nested: Mutex::new(HashMap::new()),
        }
    }

    pub fn wrapped(&self) -> &ObjectRef {
        &self.wrapped
    }

    pub fn contract(&self) -> &Arc<InterfaceContract> {
        &self.contract
    }

    pub fn is_fuzzy(&self) -> bool {
        self.fuzzy
    }

    /// Whether the wrapped object is a standalone synthesized instance
    pub fn wraps_standalone(&self) -> bool {
        self.standalone
    }

    /// Read a property as the contract declares it
    pub fn get_property_value(&self, name: &str) -> Result<Value> {
        self.resolve_property(name).map(ConversionOutcome::into_value)
    }

    /// Read a property, reporting how the value was obtained
    pub fn resolve_property(&self, name: &str) -> Result<ConversionOutcome> {
        if self.standalone {
            return self
                .read_backing_field(name)
                .map(ConversionOutcome::Matched);
        }

        let mimicked = self.mimicked_property(name)?;
        if let Some(cached) = self.nested.lock().get(&mimicked.name) {
            return Ok(ConversionOutcome::Proxied(cached.clone()));
        }

        let source = self.source_property(&mimicked.name)?;
        if !source.readable {
            return Err(Error::write_only(self.source.type_name(), &source.name));
        }

        let raw = self.wrapped.get(&source.name)?;
        match self.runtime.coerce(raw, &mimicked.ty, self.fuzzy) {
            // A concurrent first read may have cached its shim already; keep that one.
            ConversionOutcome::Proxied(nested) => {
                let mut cache = self.nested.lock();
                let kept = cache.entry(mimicked.name.clone()).or_insert(nested);
                Ok(ConversionOutcome::Proxied(kept.clone()))
            }
            other => Ok(other),
        }
    }

    /// Write a property through to the wrapped object
    pub fn set_property_value(&self, name: &str, value: Value) -> Result<()> {
        self.assign_property(name, value).map(|_| ())
    }

    /// Write a property, reporting how the stored value was obtained
    ///
    /// The value is coerced to the wrapped member's type. When that needs a
    /// nested proxy, the proxy itself is what gets written.
    pub fn assign_property(&self, name: &str, value: Value) -> Result<ConversionOutcome> {
        if self.standalone {
            return self.write_backing_field(name, value);
        }

        let mimicked = self.mimicked_property(name)?;
        let source = self.source_property(&mimicked.name)?;
        if !source.writable {
            return Err(Error::read_only(self.source.type_name(), &source.name));
        }

        let outcome = self.runtime.coerce(value, &source.ty, self.fuzzy);
        self.wrapped.set(&source.name, outcome.value().clone())?;
        self.nested.lock().remove(&mimicked.name);
        Ok(outcome)
    }

    /// Invoke a method on the wrapped object
    ///
    /// Under fuzzy matching, arguments that do not fit the parameters in
    /// the order given are reordered by type. Exact matching passes them
    /// through as given.
    pub fn call_through(&self, name: &str, args: Vec<Value>) -> Result<Value> {
        if self.standalone {
            return Err(Error::not_supported(format!(
                "{} is a standalone {} with no body for {}",
                self.wrapped.runtime_type(),
                self.contract.name(),
                name
            )));
        }

        let method = self
            .source
            .method(name, self.fuzzy)
            .ok_or_else(|| Error::method_not_found(self.source.type_name(), name))?;

        let args = if self.fuzzy && !fits_positionally(&args, &method.params) {
            reorder_arguments(&method.name, &method.params, args)?
        } else {
            args
        };

        let result = self.wrapped.invoke(&method.name, args)?;
        match self.mimicked.method(name, self.fuzzy).and_then(|m| m.returns.as_ref()) {
            Some(returns) => Ok(self.runtime.coerce(result, returns, self.fuzzy).into_value()),
            None => Ok(result),
        }
    }

    fn mimicked_property(&self, name: &str) -> Result<&PropertyDescriptor> {
        self.mimicked
            .property(name, self.fuzzy)
            .ok_or_else(|| Error::property_not_found(self.contract.name(), name))
    }

    fn source_property(&self, name: &str) -> Result<&PropertyDescriptor> {
        self.source
            .property(name, self.fuzzy)
            .ok_or_else(|| Error::property_not_found(self.source.type_name(), name))
    }

    fn standalone_instance(&self) -> Result<&Instance> {
        self.wrapped
            .as_any()
            .downcast_ref::<Instance>()
            .ok_or_else(|| Error::Other("standalone shim over a foreign object".to_string()))
    }

    // Property names on a standalone instance resolve against its own class.
    fn backing_field(&self, name: &str) -> (String, Option<TypeDesc>) {
        match self.source.property(name, self.fuzzy) {
            Some(property) => (backing_field_name(&property.name), Some(property.ty.clone())),
            None => (backing_field_name(name), None),
        }
    }

    fn read_backing_field(&self, name: &str) -> Result<Value> {
        let instance = self.standalone_instance()?;
        let (field, _) = self.backing_field(name);
        instance
            .field(&field)
            .ok_or_else(|| Error::backing_field_not_found(instance.class().name(), name))
    }

    fn write_backing_field(&self, name: &str, value: Value) -> Result<ConversionOutcome> {
        let instance = self.standalone_instance()?;
        let (field, ty) = self.backing_field(name);
        if !instance.has_field(&field) {
            return Err(Error::backing_field_not_found(instance.class().name(), name));
        }

        let outcome = match ty {
            Some(ty) => self.runtime.coerce(value, &ty, self.fuzzy),
            None => ConversionOutcome::Matched(value),
        };
        instance.set_field(field, outcome.value().clone());
        Ok(outcome)
    }
}

fn fits_positionally(args: &[Value], params: &[TypeDesc]) -> bool {
    args.len() == params.len() && args.iter().zip(params).all(|(arg, ty)| value_fits(arg, ty))
}

/// Match each parameter, in declared order, with the one remaining
/// argument whose type fits it
fn reorder_arguments(method: &str, params: &[TypeDesc], args: Vec<Value>) -> Result<Vec<Value>> {
    if args.len() != params.len() {
        return Err(Error::ParameterCountMismatch {
            method: method.to_string(),
            expected: params.len(),
            actual: args.len(),
        });
    }

    let distinct = params
        .iter()
        .enumerate()
        .all(|(i, ty)| !params[..i].contains(ty));
    if !distinct {
        return Err(Error::AmbiguousParameterOrder {
            method: method.to_string(),
        });
    }

    let mut remaining: Vec<Option<Value>> = args.into_iter().map(Some).collect();
    params
        .iter()
        .map(|ty| {
            remaining
                .iter_mut()
                .find(|slot| slot.as_ref().is_some_and(|arg| value_fits(arg, ty)))
                .and_then(Option::take)
                .ok_or_else(|| {
                    Error::argument_mismatch(method, format!("no argument fits parameter of type {}", ty))
                })
        })
        .collect()
}

impl Reflect for Shim {
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

impl fmt::Debug for Shim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shim")
            .field("contract", &self.contract.name())
            .field("wrapped", &self.source.type_name())
            .field("fuzzy", &self.fuzzy)
            .field("standalone", &self.standalone)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClassInfo, MethodDecl};

    fn address_contract() -> Arc<InterfaceContract> {
        InterfaceContract::builder("IAddress")
            .read_write("City", TypeDesc::string())
            .build()
    }

    fn person_contract(address: &Arc<InterfaceContract>) -> Arc<InterfaceContract> {
        InterfaceContract::builder("IPerson")
            .read_write("Name", TypeDesc::string())
            .read_write("Home", TypeDesc::interface(address))
            .build()
    }

    struct Classes {
        place: Arc<ClassInfo>,
        person: Arc<ClassInfo>,
    }

    fn classes() -> Classes {
        let place = ClassInfo::builder("Place")
            .read_write("City", TypeDesc::string())
            .build();
        let person = ClassInfo::builder("Person")
            .read_write("Name", TypeDesc::string())
            .read_write("Home", TypeDesc::class(&place))
            .build();
        Classes { place, person }
    }

    fn person_with_home(classes: &Classes, city: &str) -> (ObjectRef, ObjectRef) {
        let home = Instance::new(Arc::clone(&classes.place)).into_ref();
        home.set("City", Value::from(city)).unwrap();
        let someone = Instance::new(Arc::clone(&classes.person)).into_ref();
        someone.set("Home", Value::Object(Arc::clone(&home))).unwrap();
        (someone, home)
    }

    #[test]
    fn test_nested_shim_is_cached() {
        let runtime = DuckRuntime::with_defaults();
        let address = address_contract();
        let (someone, home) = person_with_home(&classes(), "Oslo");
        let shim = Shim::new(&runtime, someone, &person_contract(&address), false);

        let first = shim.resolve_property("Home").unwrap();
        assert!(first.is_proxied());
        let second = shim.get_property_value("Home").unwrap();
        assert_eq!(first.value(), &second);

        second.as_object().unwrap().set("City", Value::from("Bergen")).unwrap();
        assert_eq!(home.get("City").unwrap(), Value::from("Bergen"));
    }

    #[test]
    fn test_concurrent_first_reads_share_nested_shim() {
        let runtime = DuckRuntime::with_defaults();
        let address = address_contract();
        let (someone, _) = person_with_home(&classes(), "Oslo");
        let shim = Arc::new(Shim::new(&runtime, someone, &person_contract(&address), false));
        let barrier = Arc::new(std::sync::Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shim = Arc::clone(&shim);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    shim.get_property_value("Home").unwrap()
                })
            })
            .collect();
        let reads: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(reads.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(reads[0], shim.get_property_value("Home").unwrap());
    }

    #[test]
    fn test_set_unwraps_and_invalidates() {
        let runtime = DuckRuntime::with_defaults();
        let address = address_contract();
        let classes = classes();
        let (someone, _) = person_with_home(&classes, "Oslo");
        let (_, other_home) = person_with_home(&classes, "Lima");
        let shim = Shim::new(&runtime, Arc::clone(&someone), &person_contract(&address), false);

        let before = shim.get_property_value("Home").unwrap();
        let replacement = Value::Object(runtime.shim(Arc::clone(&other_home), &address, false));
        let outcome = shim.assign_property("Home", replacement).unwrap();

        assert_eq!(outcome, ConversionOutcome::Matched(Value::Object(Arc::clone(&other_home))));
        assert_eq!(someone.get("Home").unwrap(), Value::Object(other_home));
        assert_ne!(shim.get_property_value("Home").unwrap(), before);
    }

    #[test]
    fn test_write_only_and_read_only_members() {
        let runtime = DuckRuntime::with_defaults();
        let contract = InterfaceContract::builder("ISecret")
            .read_write("Pin", TypeDesc::int())
            .read_write("Id", TypeDesc::int())
            .build();
        let class = ClassInfo::builder("Vault")
            .write_only("Pin", TypeDesc::int())
            .read_only("Id", TypeDesc::int())
            .build();
        let shim = Shim::new(&runtime, Instance::new(class).into_ref(), &contract, false);

        assert!(matches!(
            shim.get_property_value("Pin"),
            Err(Error::WriteOnlyProperty { .. })
        ));
        assert!(matches!(
            shim.set_property_value("Id", Value::Int(1)),
            Err(Error::ReadOnlyProperty { .. })
        ));
        assert!(matches!(
            shim.get_property_value("Missing"),
            Err(Error::PropertyNotFound { .. })
        ));
    }

    #[test]
    fn test_standalone_reads_backing_fields() {
        let runtime = DuckRuntime::with_defaults();
        let contract = address_contract();
        let generated = runtime.synthesize(&contract).unwrap();
        let instance = generated.create();
        instance.set_field("_City", "Paris");
        let instance = instance.into_ref();

        let shim = Shim::new(&runtime, Arc::clone(&instance), &contract, true);
        assert!(shim.wraps_standalone());
        assert_eq!(shim.get_property_value("city").unwrap(), Value::from("Paris"));

        shim.set_property_value("City", Value::from("Rome")).unwrap();
        assert_eq!(instance.get("City").unwrap(), Value::from("Rome"));

        assert!(matches!(
            shim.call_through("Anything", vec![]),
            Err(Error::NotSupported(_))
        ));
    }

    #[test]
    fn test_missing_backing_field() {
        let runtime = DuckRuntime::with_defaults();
        let contract = address_contract();
        let generated = runtime.synthesize(&contract).unwrap();
        let instance = generated.create();
        instance.remove_field("_City");

        let shim = Shim::new(&runtime, instance.into_ref(), &contract, false);
        assert!(matches!(
            shim.get_property_value("City"),
            Err(Error::BackingFieldNotFound { .. })
        ));
    }

    #[test]
    fn test_reorder_requires_distinct_types() {
        let runtime = DuckRuntime::with_defaults();
        let contract = InterfaceContract::builder("IPair")
            .method(
                MethodDecl::new("Join")
                    .param("a", TypeDesc::string())
                    .param("b", TypeDesc::string()),
            )
            .build();
        let class = ClassInfo::builder("Pair")
            .method(
                MethodDecl::new("Join")
                    .param("a", TypeDesc::string())
                    .param("b", TypeDesc::string()),
                |_, _| Ok(Value::Null),
            )
            .build();
        let shim = Shim::new(&runtime, Instance::new(class).into_ref(), &contract, true);

        assert!(matches!(
            shim.call_through("join", vec![Value::Int(1), Value::from("x")]),
            Err(Error::AmbiguousParameterOrder { .. })
        ));
        assert!(matches!(
            shim.call_through("join", vec![Value::from("x")]),
            Err(Error::ParameterCountMismatch { .. })
        ));
    }

    #[test]
    fn test_call_through_coerces_declared_return() {
        let runtime = DuckRuntime::with_defaults();
        let contract = InterfaceContract::builder("ICounter")
            .method(MethodDecl::new("Count").returns(TypeDesc::long()))
            .build();
        let class = ClassInfo::builder("Counter")
            .method(MethodDecl::new("Count").returns(TypeDesc::int()), |_, _| {
                Ok(Value::Int(4))
            })
            .build();
        let shim = Shim::new(&runtime, Instance::new(class).into_ref(), &contract, false);

        // No int->long converter is registered in this runtime.
        assert_eq!(shim.call_through("Count", vec![]).unwrap(), Value::Long(0));
    }
}
