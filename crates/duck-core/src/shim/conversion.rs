use crate::value::Value;

/// How a value was made to fit a target type
///
/// Shim accessors return the bare value; the `resolve_*`/`assign_*`
/// variants return this so callers can tell which path was taken.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionOutcome {
    /// Already of an assignable type, passed through unchanged
    Matched(Value),
    /// Produced by a registered converter
    Converted(Value),
    /// Wrapped in a nested shim for an interface target
    Proxied(Value),
    /// No safe value existed; the target type's default
    Defaulted(Value),
}

impl ConversionOutcome {
    pub fn value(&self) -> &Value {
        match self {
            Self::Matched(v) | Self::Converted(v) | Self::Proxied(v) | Self::Defaulted(v) => v,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Self::Matched(v) | Self::Converted(v) | Self::Proxied(v) | Self::Defaulted(v) => v,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched(_))
    }

    pub fn is_converted(&self) -> bool {
        matches!(self, Self::Converted(_))
    }

    pub fn is_proxied(&self) -> bool {
        matches!(self, Self::Proxied(_))
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, Self::Defaulted(_))
    }
}
