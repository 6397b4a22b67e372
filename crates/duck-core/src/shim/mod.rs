//! Shims: proxies presenting a source as an interface contract
//!
//! - [`Shim`]: backed by an object, or by a standalone synthesized instance
//! - [`MapShim`]: backed by a [`PropertyMap`](crate::map::PropertyMap)
//!
//! Both implement [`Reflect`](crate::value::Reflect) with the contract as
//! their runtime type, so a shim can be stored anywhere the contract is
//! expected and can itself be wrapped again.

pub mod conversion;
pub mod map;
pub mod object;

pub use conversion::ConversionOutcome;
pub use map::{MapShim, detect_fuzzy};
pub use object::Shim;
