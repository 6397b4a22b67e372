//! Member descriptor caches
//!
//! A [`TypeDescription`] indexes the readable/writable members and the
//! methods of one type. Lookups go through a single case-folded index; the
//! `fuzzy` flag decides whether a case-insensitive hit is acceptable when
//! no exact-case member exists.
//!
//! [`DescriptorCache`] builds each description once and hands out shared
//! copies afterwards.

use crate::types::{Annotation, TypeDesc, TypeKey};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A readable and/or writable member
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    pub name: String,
    pub ty: TypeDesc,
    pub readable: bool,
    pub writable: bool,
    pub annotations: Vec<Annotation>,
}

/// A callable member
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    pub name: String,
    pub params: Vec<TypeDesc>,
    pub returns: Option<TypeDesc>,
}

/// Indexed members of one type
#[derive(Debug, Default)]
pub struct TypeDescription {
    type_name: String,
    properties: Vec<PropertyDescriptor>,
    methods: Vec<MethodDescriptor>,
    property_index: HashMap<String, Vec<usize>>,
    method_index: HashMap<String, Vec<usize>>,
}

impl TypeDescription {
    /// Describe a type
    ///
    /// Interfaces contribute their own and inherited members, classes their
    /// declared members. Members repeated with the same (name, declared
    /// type) are kept once. Every other type has no members.
    pub fn describe(ty: &TypeDesc) -> Self {
        let mut description = Self {
            type_name: ty.to_string(),
            ..Self::default()
        };

        match ty {
            TypeDesc::Interface(contract) => {
                for property in contract.all_properties() {
                    description.add_property(PropertyDescriptor {
                        name: property.name,
                        ty: property.ty,
                        readable: property.readable,
                        writable: property.writable,
                        annotations: property.annotations,
                    });
                }
                for method in contract.all_methods() {
                    description.add_method(MethodDescriptor {
                        params: method.param_types(),
                        name: method.name,
                        returns: method.returns,
                    });
                }
            }
            TypeDesc::Class(class) => {
                for property in class.properties() {
                    description.add_property(PropertyDescriptor {
                        name: property.name.clone(),
                        ty: property.ty.clone(),
                        readable: property.readable,
                        writable: property.writable,
                        annotations: property.annotations.clone(),
                    });
                }
                for method in class.methods() {
                    description.add_method(MethodDescriptor {
                        name: method.decl.name.clone(),
                        params: method.decl.param_types(),
                        returns: method.decl.returns.clone(),
                    });
                }
            }
            _ => {}
        }

        description
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    /// Find a property by name
    ///
    /// An exact-case match always wins. With `fuzzy` set, a member whose
    /// name differs only by case is accepted otherwise.
    pub fn property(&self, name: &str, fuzzy: bool) -> Option<&PropertyDescriptor> {
        lookup(&self.property_index, &self.properties, name, fuzzy, |p| p.name.as_str())
    }

    /// Find a method by name, with the same rules as [`Self::property`]
    pub fn method(&self, name: &str, fuzzy: bool) -> Option<&MethodDescriptor> {
        lookup(&self.method_index, &self.methods, name, fuzzy, |m| m.name.as_str())
    }

    fn add_property(&mut self, property: PropertyDescriptor) {
        let duplicate = self
            .properties
            .iter()
            .any(|p| p.name == property.name && p.ty == property.ty);
        if duplicate {
            return;
        }
        self.property_index
            .entry(fold_case(&property.name))
            .or_default()
            .push(self.properties.len());
        self.properties.push(property);
    }

    fn add_method(&mut self, method: MethodDescriptor) {
        let duplicate = self
            .methods
            .iter()
            .any(|m| m.name == method.name && m.params == method.params);
        if duplicate {
            return;
        }
        self.method_index
            .entry(fold_case(&method.name))
            .or_default()
            .push(self.methods.len());
        self.methods.push(method);
    }
}

fn lookup<'a, T>(
    index: &HashMap<String, Vec<usize>>,
    items: &'a [T],
    name: &str,
    fuzzy: bool,
    name_of: impl Fn(&T) -> &str,
) -> Option<&'a T> {
    let candidates = index.get(&fold_case(name))?;
    let exact = candidates
        .iter()
        .map(|&i| &items[i])
        .find(|item| name_of(item) == name);

    match exact {
        Some(item) => Some(item),
        None if fuzzy => candidates.first().map(|&i| &items[i]),
        None => None,
    }
}

pub(crate) fn fold_case(name: &str) -> String {
    name.to_lowercase()
}

/// Process-wide (per runtime) cache of type descriptions
///
/// ## Thread Safety
///
/// Population is check-under-lock-check: a miss takes the write lock and
/// looks again before building, so two threads never build the same entry
/// and nobody observes a partially built one. Hits only take the read lock.
#[derive(Debug, Default)]
pub struct DescriptorCache {
    entries: RwLock<HashMap<TypeKey, Arc<TypeDescription>>>,
}

impl DescriptorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Description of `ty`, built on first request
    ///
    /// Forward-declared types that are not defined yet are described but
    /// not cached.
    pub fn describe(&self, ty: &TypeDesc) -> Arc<TypeDescription> {
        if !ty.is_defined() {
            return Arc::new(TypeDescription::describe(ty));
        }

        let key = ty.key();
        if let Some(found) = self.entries.read().get(&key) {
            return Arc::clone(found);
        }

        let mut entries = self.entries.write();
        if let Some(found) = entries.get(&key) {
            return Arc::clone(found);
        }

        let description = Arc::new(TypeDescription::describe(ty));
        debug!(
            "Described {}: {} properties, {} methods",
            description.type_name(),
            description.properties().len(),
            description.methods().len()
        );
        entries.insert(key, Arc::clone(&description));
        description
    }

    /// Number of cached descriptions
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every cached description
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
