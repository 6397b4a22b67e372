// # Standard Converters
//
// This crate provides the standard value converters for the duck-typing
// runtime. Shims look converters up whenever a value's type differs from
// the type a member declares.
//
// ## Converters
//
// - **Parsing**: string → guid, int, long, double, bool, datetime (RFC 3339)
// - **Widening**: int → long, int → double, long → double
// - **Formatting**: any scalar → string
//
// Every converter yields nothing for a value it cannot make sense of (an
// unparseable string, say); the shim then falls back to the member type's
// default.
//
// ## Usage
//
// ```rust,ignore
// let runtime = duck_core::DuckRuntime::with_defaults();
// duck_converters::register(runtime.converters());
// ```

use chrono::{DateTime, Utc};
use duck_core::registry::ConverterRegistry;
use duck_core::traits::{Converter, FnConverter};
use duck_core::types::{ScalarKind, TypeDesc};
use duck_core::Value;
use tracing::debug;
use uuid::Uuid;

/// Parses guid strings, hyphenated or not
#[derive(Debug, Clone, Copy, Default)]
pub struct StringToGuid;

impl Converter for StringToGuid {
    fn name(&self) -> &str {
        "string->guid"
    }

    fn can_convert(&self, from: &TypeDesc, to: &TypeDesc) -> bool {
        *from == TypeDesc::string() && *to == TypeDesc::guid()
    }

    fn convert(&self, value: &Value, _to: &TypeDesc) -> Option<Value> {
        let text = value.as_str()?.trim();
        Uuid::parse_str(text).ok().map(Value::Guid)
    }
}

/// Parses RFC 3339 timestamps into UTC
#[derive(Debug, Clone, Copy, Default)]
pub struct StringToDateTime;

impl Converter for StringToDateTime {
    fn name(&self) -> &str {
        "string->datetime"
    }

    fn can_convert(&self, from: &TypeDesc, to: &TypeDesc) -> bool {
        *from == TypeDesc::string() && *to == TypeDesc::date_time()
    }

    fn convert(&self, value: &Value, _to: &TypeDesc) -> Option<Value> {
        let parsed = DateTime::parse_from_rfc3339(value.as_str()?.trim()).ok()?;
        Some(Value::DateTime(parsed.with_timezone(&Utc)))
    }
}

/// Formats any non-string scalar as a string
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarToString;

impl Converter for ScalarToString {
    fn name(&self) -> &str {
        "scalar->string"
    }

    fn can_convert(&self, from: &TypeDesc, to: &TypeDesc) -> bool {
        matches!(from, TypeDesc::Scalar(kind) if *kind != ScalarKind::String)
            && *to == TypeDesc::string()
    }

    fn convert(&self, value: &Value, _to: &TypeDesc) -> Option<Value> {
        let text = match value {
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Long(l) => l.to_string(),
            Value::Double(d) => d.to_string(),
            Value::Guid(g) => g.to_string(),
            Value::DateTime(d) => d.to_rfc3339(),
            _ => return None,
        };
        Some(Value::String(text))
    }
}

fn parse_int() -> FnConverter {
    FnConverter::scalar("string->int", ScalarKind::String, ScalarKind::Int, |v| {
        v.as_str()?.trim().parse::<i32>().ok().map(Value::Int)
    })
}

fn parse_long() -> FnConverter {
    FnConverter::scalar("string->long", ScalarKind::String, ScalarKind::Long, |v| {
        v.as_str()?.trim().parse::<i64>().ok().map(Value::Long)
    })
}

fn parse_double() -> FnConverter {
    FnConverter::scalar("string->double", ScalarKind::String, ScalarKind::Double, |v| {
        v.as_str()?.trim().parse::<f64>().ok().map(Value::Double)
    })
}

fn parse_bool() -> FnConverter {
    FnConverter::scalar("string->bool", ScalarKind::String, ScalarKind::Bool, |v| {
        let text = v.as_str()?.trim();
        if text.eq_ignore_ascii_case("true") {
            Some(Value::Bool(true))
        } else if text.eq_ignore_ascii_case("false") {
            Some(Value::Bool(false))
        } else {
            None
        }
    })
}

fn widen_int_to_long() -> FnConverter {
    FnConverter::scalar("int->long", ScalarKind::Int, ScalarKind::Long, |v| {
        v.as_int().map(|i| Value::Long(i64::from(i)))
    })
}

fn widen_int_to_double() -> FnConverter {
    FnConverter::scalar("int->double", ScalarKind::Int, ScalarKind::Double, |v| {
        v.as_int().map(|i| Value::Double(f64::from(i)))
    })
}

fn widen_long_to_double() -> FnConverter {
    FnConverter::scalar("long->double", ScalarKind::Long, ScalarKind::Double, |v| {
        v.as_long().map(|l| Value::Double(l as f64))
    })
}

/// Register the standard converters with the registry
///
/// This should be called during application initialization.
///
/// # Example
///
/// ```rust
/// use duck_core::registry::ConverterRegistry;
///
/// let registry = ConverterRegistry::new();
/// duck_converters::register(&registry);
/// assert!(registry.has_converter_named("string->guid"));
/// ```
pub fn register(registry: &ConverterRegistry) {
    registry.register_converter(StringToGuid);
    registry.register_converter(StringToDateTime);
    registry.register_converter(ScalarToString);
    registry.register_converter(parse_int());
    registry.register_converter(parse_long());
    registry.register_converter(parse_double());
    registry.register_converter(parse_bool());
    registry.register_converter(widen_int_to_long());
    registry.register_converter(widen_int_to_double());
    registry.register_converter(widen_long_to_double());
    debug!("Registered {} standard converters", registry.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use duck_core::traits::ConverterLocator;

    fn convert(registry: &ConverterRegistry, value: Value, to: TypeDesc) -> Option<Value> {
        let from = value.runtime_type()?;
        registry.find_converter(&from, &to)?.convert(&value, &to)
    }

    #[test]
    fn test_register_all() {
        let registry = ConverterRegistry::new();
        register(&registry);

        assert_eq!(registry.len(), 10);
        assert!(registry.has_converter(&TypeDesc::string(), &TypeDesc::guid()));
        assert!(registry.has_converter(&TypeDesc::int(), &TypeDesc::long()));
        assert!(!registry.has_converter(&TypeDesc::long(), &TypeDesc::int()));
    }

    #[test]
    fn test_guid_parsing() {
        let registry = ConverterRegistry::new();
        register(&registry);
        let id = Uuid::new_v4();

        assert_eq!(
            convert(&registry, Value::from(id.simple().to_string()), TypeDesc::guid()),
            Some(Value::Guid(id))
        );
        assert_eq!(convert(&registry, Value::from("nope"), TypeDesc::guid()), None);
    }

    #[test]
    fn test_datetime_parsing() {
        let registry = ConverterRegistry::new();
        register(&registry);

        let converted = convert(&registry, Value::from("2024-03-01T12:00:00+02:00"), TypeDesc::date_time())
            .unwrap();
        assert_eq!(
            converted.as_date_time().unwrap().to_rfc3339(),
            "2024-03-01T10:00:00+00:00"
        );
    }

    #[test]
    fn test_numeric_parsing_and_widening() {
        let registry = ConverterRegistry::new();
        register(&registry);

        assert_eq!(convert(&registry, Value::from(" 42 "), TypeDesc::int()), Some(Value::Int(42)));
        assert_eq!(convert(&registry, Value::from("4.5"), TypeDesc::int()), None);
        assert_eq!(convert(&registry, Value::from("TRUE"), TypeDesc::bool()), Some(Value::Bool(true)));
        assert_eq!(convert(&registry, Value::Int(7), TypeDesc::long()), Some(Value::Long(7)));
        assert_eq!(convert(&registry, Value::Long(3), TypeDesc::double()), Some(Value::Double(3.0)));
    }

    #[test]
    fn test_scalar_formatting() {
        let registry = ConverterRegistry::new();
        register(&registry);

        assert_eq!(convert(&registry, Value::Int(7), TypeDesc::string()), Some(Value::from("7")));
        assert_eq!(convert(&registry, Value::Bool(false), TypeDesc::string()), Some(Value::from("false")));
    }
}
