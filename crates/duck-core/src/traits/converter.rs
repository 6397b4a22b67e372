// # Converter Traits
//
// Defines how values are converted when a source value's type does not
// match the type a shim needs to produce.
//
// ## Contract
//
// - A converter is found by (source type, target type)
// - Once found, conversion is expected to succeed; a converter that cannot
//   make sense of a particular value returns `None` and the caller falls
//   back to the target type's default
// - Conversion never raises an error
//
// ## Usage
//
// ```rust,ignore
// use duck_core::traits::{ConverterLocator, FnConverter};
// use duck_core::types::{ScalarKind, TypeDesc};
//
// let registry = duck_core::ConverterRegistry::new();
// registry.register_converter(FnConverter::scalar(
//     "int->long",
//     ScalarKind::Int,
//     ScalarKind::Long,
//     |v| v.as_int().map(|i| (i as i64).into()),
// ));
//
// let converter = registry.find_converter(&TypeDesc::int(), &TypeDesc::long());
// assert!(converter.is_some());
// ```

use crate::types::{ScalarKind, TypeDesc};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Produces a value of a target type from a value of a source type
pub trait Converter: Send + Sync {
    /// Name used in logs and listings
    fn name(&self) -> &str;

    /// Whether this converter handles `from` → `to`
    fn can_convert(&self, from: &TypeDesc, to: &TypeDesc) -> bool;

    /// Convert `value` to `to`
    ///
    /// # Returns
    ///
    /// - `Some(Value)`: The converted value, of type `to`
    /// - `None`: This particular value has no sensible conversion
    fn convert(&self, value: &Value, to: &TypeDesc) -> Option<Value>;
}

/// Finds converters by type pair
///
/// This is the only conversion seam the shims use. "No converter" is the
/// only failure mode.
pub trait ConverterLocator: Send + Sync {
    /// Find a converter from `from` to `to`
    fn find_converter(&self, from: &TypeDesc, to: &TypeDesc) -> Option<Arc<dyn Converter>>;
}

type ConvertFn = dyn Fn(&Value) -> Option<Value> + Send + Sync;

/// Converter for one scalar pair backed by a closure
pub struct FnConverter {
    name: String,
    from: ScalarKind,
    to: ScalarKind,
    convert: Box<ConvertFn>,
}

impl FnConverter {
    /// Create a converter for `from` → `to`
    pub fn scalar(
        name: impl Into<String>,
        from: ScalarKind,
        to: ScalarKind,
        convert: impl Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            from,
            to,
            convert: Box::new(convert),
        }
    }
}

impl Converter for FnConverter {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_convert(&self, from: &TypeDesc, to: &TypeDesc) -> bool {
        matches!(from, TypeDesc::Scalar(kind) if *kind == self.from)
            && matches!(to, TypeDesc::Scalar(kind) if *kind == self.to)
    }

    fn convert(&self, value: &Value, _to: &TypeDesc) -> Option<Value> {
        (self.convert)(value)
    }
}

impl fmt::Debug for FnConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnConverter")
            .field("name", &self.name)
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}
