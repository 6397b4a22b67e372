//! Core traits for the duck-typing runtime
//!
//! This module defines the seams that external collaborators plug into.
//!
//! - [`Converter`]: Produce a value of one type from a value of another
//! - [`ConverterLocator`]: Find a converter for a pair of types

pub mod converter;

pub use converter::{Converter, ConverterLocator, FnConverter};
