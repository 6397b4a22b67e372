// # Class Instances
//
// An [`Instance`] is an object of a [`ClassInfo`]: one storage slot per
// declared property, method bodies from the class. Instances of
// synthesized classes are either standalone (their own backing fields)
// or wrap another object and delegate every member access to it.

use crate::error::{Error, Result};
use crate::types::{ClassInfo, TypeDesc, backing_field_name, default_value_for, value_fits};
use crate::value::{ObjectRef, Reflect, Value};
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// An object of a runtime class
pub struct Instance {
    class: Arc<ClassInfo>,
    fields: RwLock<HashMap<String, Value>>,
    delegate: Option<ObjectRef>,
}

impl Instance {
    /// Create an instance with every property at its default value
    pub fn new(class: Arc<ClassInfo>) -> Self {
        let synthesized = class.is_synthesized();
        let fields = class
            .properties()
            .iter()
            .map(|p| {
                let key = if synthesized {
                    backing_field_name(&p.name)
                } else {
                    p.name.clone()
                };
                (key, default_value_for(&p.ty))
            })
            .collect();

        Self {
            class,
            fields: RwLock::new(fields),
            delegate: None,
        }
    }

    /// Create an instance that forwards member access to `target`
    pub(crate) fn wrapping(class: Arc<ClassInfo>, target: ObjectRef) -> Self {
        Self {
            class,
            fields: RwLock::new(HashMap::new()),
            delegate: Some(target),
        }
    }

    pub fn class(&self) -> &Arc<ClassInfo> {
        &self.class
    }

    /// Whether this is a synthesized instance owning its own storage
    pub fn is_standalone(&self) -> bool {
        self.class.is_synthesized() && self.delegate.is_none()
    }

    /// The object member access is forwarded to, if any
    pub fn delegate(&self) -> Option<&ObjectRef> {
        self.delegate.as_ref()
    }

    /// Read a storage slot, bypassing access modes
    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields.read().get(name).cloned()
    }

    /// Write a storage slot, bypassing access modes
    pub fn set_field(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.write().insert(name.into(), value.into());
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.read().contains_key(name)
    }

    pub fn remove_field(&self, name: &str) -> Option<Value> {
        self.fields.write().remove(name)
    }

    /// Share as an object handle
    pub fn into_ref(self) -> ObjectRef {
        Arc::new(self)
    }

    fn storage_key(&self, property: &str) -> String {
        if self.class.is_synthesized() {
            backing_field_name(property)
        } else {
            property.to_string()
        }
    }
}

impl Reflect for Instance {
    fn runtime_type(&self) -> TypeDesc {
        TypeDesc::Class(Arc::clone(&self.class))
    }

    fn get(&self, name: &str) -> Result<Value> {
        if let Some(target) = &self.delegate {
            return target.get(name);
        }

        let property = self
            .class
            .property(name)
            .ok_or_else(|| Error::property_not_found(self.class.name(), name))?;
        if !property.readable {
            return Err(Error::write_only(self.class.name(), name));
        }

        Ok(self
            .field(&self.storage_key(name))
            .unwrap_or_else(|| default_value_for(&property.ty)))
    }

    fn set(&self, name: &str, value: Value) -> Result<()> {
        if let Some(target) = &self.delegate {
            return target.set(name, value);
        }

        let property = self
            .class
            .property(name)
            .ok_or_else(|| Error::property_not_found(self.class.name(), name))?;
        if !property.writable {
            return Err(Error::read_only(self.class.name(), name));
        }

        let value = if value.is_null() {
            default_value_for(&property.ty)
        } else if value_fits(&value, &property.ty) {
            value
        } else {
            return Err(Error::invalid_input(format!(
                "cannot store {} in {}.{} of type {}",
                value.type_name(),
                self.class.name(),
                name,
                property.ty
            )));
        };

        self.set_field(self.storage_key(name), value);
        Ok(())
    }

    fn invoke(&self, name: &str, args: Vec<Value>) -> Result<Value> {
        if let Some(target) = &self.delegate {
            return target.invoke(name, args);
        }

        let method = self
            .class
            .method(name)
            .ok_or_else(|| Error::method_not_found(self.class.name(), name))?;

        let params = &method.decl.params;
        if params.len() != args.len() {
            return Err(Error::ParameterCountMismatch {
                method: name.to_string(),
                expected: params.len(),
                actual: args.len(),
            });
        }
        for (index, (param, arg)) in params.iter().zip(&args).enumerate() {
            if !value_fits(arg, &param.ty) {
                return Err(Error::argument_mismatch(
                    name,
                    format!(
                        "argument {} ({}) is {}, expected {}",
                        index,
                        param.name,
                        arg.type_name(),
                        param.ty
                    ),
                ));
            }
        }

        method.call(self, args)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class.name())
            .field("standalone", &self.is_standalone())
            .field("fields", &self.fields.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MethodDecl;

    fn person_class() -> Arc<ClassInfo> {
        ClassInfo::builder("Person")
            .read_write("Name", TypeDesc::string())
            .read_only("Id", TypeDesc::int())
            .write_only("Secret", TypeDesc::string())
            .method(
                MethodDecl::new("Greet")
                    .param("greeting", TypeDesc::string())
                    .returns(TypeDesc::string()),
                |me, args| {
                    let name = me.get("Name")?;
                    Ok(Value::from(format!(
                        "{}, {}",
                        args[0].as_str().unwrap_or_default(),
                        name.as_str().unwrap_or_default()
                    )))
                },
            )
            .build()
    }

    #[test]
    fn test_defaults_on_creation() {
        let person = Instance::new(person_class());
        assert_eq!(person.get("Id").unwrap(), Value::Int(0));
        assert_eq!(person.get("Name").unwrap(), Value::Null);
    }

    #[test]
    fn test_access_modes() {
        let person = Instance::new(person_class());

        assert!(matches!(
            person.set("Id", Value::Int(1)),
            Err(Error::ReadOnlyProperty { .. })
        ));
        assert!(matches!(
            person.get("Secret"),
            Err(Error::WriteOnlyProperty { .. })
        ));
        assert!(matches!(
            person.get("Missing"),
            Err(Error::PropertyNotFound { .. })
        ));

        person.set_field("Id", 5);
        assert_eq!(person.get("Id").unwrap(), Value::Int(5));
    }

    #[test]
    fn test_set_rejects_wrong_type() {
        let person = Instance::new(person_class());
        assert!(matches!(
            person.set("Name", Value::Int(3)),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_invoke_checks_arguments() {
        let person = Instance::new(person_class());
        person.set("Name", Value::from("Bob")).unwrap();

        let greeting = person.invoke("Greet", vec![Value::from("Hi")]).unwrap();
        assert_eq!(greeting, Value::from("Hi, Bob"));

        assert!(matches!(
            person.invoke("Greet", vec![Value::Int(1)]),
            Err(Error::ArgumentMismatch { .. })
        ));
        assert!(matches!(
            person.invoke("Greet", vec![]),
            Err(Error::ParameterCountMismatch { expected: 1, actual: 0, .. })
        ));
        assert!(matches!(
            person.invoke("Wave", vec![]),
            Err(Error::MethodNotFound { .. })
        ));
    }
}
