//! Plugin-based converter registry
//!
//! The registry is the runtime's [`ConverterLocator`]. Converters are
//! registered at runtime, typically by plugin crates, instead of being
//! hard-wired into the shims.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use duck_core::registry::ConverterRegistry;
//!
//! let registry = ConverterRegistry::new();
//! registry.register_converter(MyConverter);
//!
//! let converter = registry.find_converter(&TypeDesc::string(), &TypeDesc::guid());
//! ```
//!
//! ## Registration
//!
//! Plugin crates expose a `register` function:
//!
//! ```rust,ignore
//! // In the duck-converters crate
//! pub fn register(registry: &ConverterRegistry) {
//!     registry.register_converter(StringToGuid);
//! }
//! ```

use crate::traits::{Converter, ConverterLocator};
use crate::types::TypeDesc;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Converter registry
///
/// Lookups scan converters from the most recently registered backwards, so
/// a later registration overrides an earlier one for the same type pair.
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// lookups and exclusive registration.
#[derive(Default)]
pub struct ConverterRegistry {
    converters: RwLock<Vec<Arc<dyn Converter>>>,
}

impl ConverterRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a converter
    ///
    /// # Example
    ///
    /// ```rust
    /// # use duck_core::registry::ConverterRegistry;
    /// # use duck_core::traits::FnConverter;
    /// # use duck_core::types::ScalarKind;
    /// let registry = ConverterRegistry::new();
    /// registry.register_converter(FnConverter::scalar(
    ///     "bool->string",
    ///     ScalarKind::Bool,
    ///     ScalarKind::String,
    ///     |v| v.as_bool().map(|b| b.to_string().into()),
    /// ));
    /// assert!(registry.has_converter_named("bool->string"));
    /// ```
    pub fn register_converter(&self, converter: impl Converter + 'static) {
        self.register_shared(Arc::new(converter));
    }

    /// Register an already shared converter
    pub fn register_shared(&self, converter: Arc<dyn Converter>) {
        debug!("Registered converter {}", converter.name());
        self.converters.write().push(converter);
    }

    /// List all registered converter names, in registration order
    pub fn list_converters(&self) -> Vec<String> {
        self.converters
            .read()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    /// Check if a converter with this name is registered
    pub fn has_converter_named(&self, name: &str) -> bool {
        self.converters.read().iter().any(|c| c.name() == name)
    }

    /// Check if any converter handles `from` → `to`
    pub fn has_converter(&self, from: &TypeDesc, to: &TypeDesc) -> bool {
        self.find_converter(from, to).is_some()
    }

    pub fn len(&self) -> usize {
        self.converters.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.read().is_empty()
    }
}

impl ConverterLocator for ConverterRegistry {
    fn find_converter(&self, from: &TypeDesc, to: &TypeDesc) -> Option<Arc<dyn Converter>> {
        self.converters
            .read()
            .iter()
            .rev()
            .find(|c| c.can_convert(from, to))
            .cloned()
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("converters", &self.list_converters())
            .finish()
    }
}
