// # duck-core
//
// Core library for the duck-typing runtime.
//
// ## Architecture Overview
//
// This library lets arbitrary values be treated as implementing an
// interface contract they were never declared against:
// - **types**: Runtime type model (contracts, classes, assignability)
// - **TypeSynthesizer**: Generates, once per contract, a class implementing it
// - **Shim** / **MapShim**: Proxies mediating reads, writes and calls between
//   a contract and an object or a property map
// - **GraphBuilder**: Builds whole object graphs satisfying nested contracts
// - **ConverterRegistry**: Plugin-based registry of value converters
// - **DuckRuntime**: Registry object owning the caches, converters and config
//
// ## Design Principles
//
// 1. **Explicit Registry**: All caches hang off a `DuckRuntime`; no globals
// 2. **Plugin-Based**: Converters are registered at runtime, not hard-coded
// 3. **Structural Errors Only**: Missing members are errors; data mismatches
//    degrade to the target type's default value
// 4. **Populate Once**: Descriptor and generated-type caches are filled under
//    check-lock-check and never mutated afterwards

pub mod builder;
pub mod config;
pub mod descriptors;
pub mod error;
pub mod map;
pub mod object;
pub mod registry;
pub mod runtime;
pub mod shim;
pub mod synth;
pub mod traits;
pub mod types;
pub mod value;

// Re-export core types for convenience
pub use builder::{DuckContract, GraphBuilder};
pub use config::{BuilderConfig, DuckConfig};
pub use descriptors::{DescriptorCache, TypeDescription};
pub use error::{Error, Result};
pub use map::{KeyComparison, PropertyMap};
pub use object::Instance;
pub use registry::ConverterRegistry;
pub use runtime::DuckRuntime;
pub use shim::{ConversionOutcome, MapShim, Shim};
pub use synth::{GeneratedType, TypeSynthesizer};
pub use traits::{Converter, ConverterLocator};
pub use types::{ClassInfo, InterfaceContract, TypeDesc};
pub use value::{Array, MapRef, ObjectRef, Reflect, Value};
