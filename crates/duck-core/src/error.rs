//! Error types for the duck-typing runtime
//!
//! Structural mismatches (a missing member, a member with the wrong access
//! mode, an unsound argument reordering) are surfaced as errors. Data
//! mismatches between a value and a property type are never errors: they
//! degrade to the target type's default value.

use thiserror::Error;

/// Result type alias for runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the duck-typing runtime
#[derive(Error, Debug)]
pub enum Error {
    /// Requested member is absent after exact/fuzzy resolution
    #[error("Property not found: {type_name}.{property}")]
    PropertyNotFound {
        /// Type the lookup was made against
        type_name: String,
        /// Requested property name
        property: String,
    },

    /// The wrapped member exists but has no reader
    #[error("Property {type_name}.{property} is write-only")]
    WriteOnlyProperty {
        /// Type declaring the member
        type_name: String,
        /// Property name
        property: String,
    },

    /// The wrapped member exists but has no writer
    #[error("Property {type_name}.{property} is read-only")]
    ReadOnlyProperty {
        /// Type declaring the member
        type_name: String,
        /// Property name
        property: String,
    },

    /// Requested method is absent on the wrapped type
    #[error("Method not found: {type_name}.{method}")]
    MethodNotFound {
        /// Type the lookup was made against
        type_name: String,
        /// Requested method name
        method: String,
    },

    /// Argument count does not match the method's arity
    #[error("Method {method} expects {expected} argument(s), got {actual}")]
    ParameterCountMismatch {
        /// Method name
        method: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        actual: usize,
    },

    /// Arguments cannot be reordered because parameter types repeat
    #[error("Cannot reorder arguments for {method}: parameter types are not distinct")]
    AmbiguousParameterOrder {
        /// Method name
        method: String,
    },

    /// A standalone instance is missing the storage slot for a property
    #[error("Backing field for {type_name}.{property} not found")]
    BackingFieldNotFound {
        /// Generated type name
        type_name: String,
        /// Property name
        property: String,
    },

    /// Type synthesis was requested for something that is not an interface
    #[error("{0} is not an interface")]
    NotAnInterface(String),

    /// Operation has no meaning for this kind of source
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// Arguments do not fit the method's parameters
    #[error("Argument mismatch calling {method}: {message}")]
    ArgumentMismatch {
        /// Method name
        method: String,
        /// What did not fit
        message: String,
    },

    /// A value cannot satisfy a contract
    #[error("Cannot duck {type_name} as {contract}: {}", .errors.join("; "))]
    DuckTypeMismatch {
        /// Runtime type of the value
        type_name: String,
        /// Contract that was requested
        contract: String,
        /// Every incompatibility found
        errors: Vec<String>,
    },

    /// A concrete type could not be constructed
    #[error("Construction of {type_name} failed: {message}")]
    Construction {
        /// Type being constructed
        type_name: String,
        /// Failure description
        message: String,
    },

    /// A forward-declared type was defined twice
    #[error("Type {0} is already defined")]
    AlreadyDefined(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a "property not found" error
    pub fn property_not_found(type_name: impl Into<String>, property: impl Into<String>) -> Self {
        Self::PropertyNotFound {
            type_name: type_name.into(),
            property: property.into(),
        }
    }

    /// Create a "write-only property" error
    pub fn write_only(type_name: impl Into<String>, property: impl Into<String>) -> Self {
        Self::WriteOnlyProperty {
            type_name: type_name.into(),
            property: property.into(),
        }
    }

    /// Create a "read-only property" error
    pub fn read_only(type_name: impl Into<String>, property: impl Into<String>) -> Self {
        Self::ReadOnlyProperty {
            type_name: type_name.into(),
            property: property.into(),
        }
    }

    /// Create a "method not found" error
    pub fn method_not_found(type_name: impl Into<String>, method: impl Into<String>) -> Self {
        Self::MethodNotFound {
            type_name: type_name.into(),
            method: method.into(),
        }
    }

    /// Create a "backing field not found" error
    pub fn backing_field_not_found(
        type_name: impl Into<String>,
        property: impl Into<String>,
    ) -> Self {
        Self::BackingFieldNotFound {
            type_name: type_name.into(),
            property: property.into(),
        }
    }

    /// Create an argument mismatch error
    pub fn argument_mismatch(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ArgumentMismatch {
            method: method.into(),
            message: message.into(),
        }
    }

    /// Create a construction error
    pub fn construction(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Construction {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Create a "not supported" error
    pub fn not_supported(msg: impl Into<String>) -> Self {
        Self::NotSupported(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this error reports a member missing from a type
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::PropertyNotFound { .. }
                | Self::MethodNotFound { .. }
                | Self::BackingFieldNotFound { .. }
        )
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
