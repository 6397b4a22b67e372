//! Assignability and default values
//!
//! `source ~> target` holds when a value of `source` can be stored in a
//! slot of `target` unchanged. There are no implicit numeric widenings:
//! an `int` is not assignable to a `long` slot. Widening is the job of a
//! registered converter.

use super::{ScalarKind, TypeDesc};
use crate::value::Value;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Check if `source` is assignable to `target`
pub fn is_assignable(source: &TypeDesc, target: &TypeDesc) -> bool {
    match (source, target) {
        (_, TypeDesc::Any) => true,
        (TypeDesc::Scalar(a), TypeDesc::Scalar(b)) => a == b,
        (TypeDesc::Interface(s), TypeDesc::Interface(t)) => s.extends_interface(t),
        (TypeDesc::Class(c), TypeDesc::Interface(t)) => c.implements_interface(t),
        (TypeDesc::Class(a), TypeDesc::Class(b)) => a.ident() == b.ident(),
        (TypeDesc::Array(a), TypeDesc::Array(b)) => is_assignable(a, b),
        (TypeDesc::Map, TypeDesc::Map) => true,
        _ => false,
    }
}

/// Check if a value can be stored in a slot of `target` unchanged
///
/// `Null` fits every non-primitive slot and the `string` slot.
pub fn value_fits(value: &Value, target: &TypeDesc) -> bool {
    match value.runtime_type() {
        Some(source) => is_assignable(&source, target),
        None => !target.is_primitive() || matches!(target, TypeDesc::Scalar(ScalarKind::String)),
    }
}

/// The default value of a type
///
/// Numeric kinds default to zero, `bool` to `false`, `guid` to the nil
/// guid and `datetime` to the Unix epoch. Strings, arrays, maps and
/// objects default to `Null`.
pub fn default_value_for(ty: &TypeDesc) -> Value {
    match ty {
        TypeDesc::Scalar(kind) => match kind {
            ScalarKind::Bool => Value::Bool(false),
            ScalarKind::Int => Value::Int(0),
            ScalarKind::Long => Value::Long(0),
            ScalarKind::Double => Value::Double(0.0),
            ScalarKind::String => Value::Null,
            ScalarKind::Guid => Value::Guid(Uuid::nil()),
            ScalarKind::DateTime => Value::DateTime(DateTime::<Utc>::default()),
        },
        _ => Value::Null,
    }
}
