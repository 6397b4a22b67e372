//! Runtime Contract Test: Type Synthesis
//!
//! This test verifies the classes generated for contracts.
//!
//! Constraints verified:
//! - Only interfaces can be synthesized
//! - One generated type per contract, even under concurrent first use
//! - Read-only contract members are writable on generated types
//! - Member annotations are copied onto generated members
//!
//! If this test fails, generated types do not match their contracts.

mod common;

use common::*;
use duck_core::types::{Annotation, TypeDesc};
use duck_core::{DuckRuntime, Error, Reflect, Value};
use std::sync::Arc;
use std::thread;

#[test]
fn non_interface_is_rejected() {
    let runtime = DuckRuntime::with_defaults();

    let err = runtime
        .synthesizer()
        .synthesize(&TypeDesc::array_of(TypeDesc::int()))
        .unwrap_err();

    assert!(matches!(err, Error::NotAnInterface(ref name) if name == "int[]"));
}

#[test]
fn annotations_copied_to_generated_members() {
    let runtime = DuckRuntime::with_defaults();
    let generated = runtime.synthesize(&annotated_contract()).unwrap();

    let email = generated.class().property("Email").unwrap();
    assert_eq!(email.annotations.len(), 2);
    assert_eq!(email.annotations[0], Annotation::new("Required"));
    assert_eq!(
        email.annotations[1],
        Annotation::new("MaxLength")
            .with_arg(64)
            .with_named("ErrorMessage", "email too long")
    );

    let age = generated.class().property("Age").unwrap();
    assert!(age.annotations.is_empty());
}

#[test]
fn annotations_visible_through_descriptors() {
    let runtime = DuckRuntime::with_defaults();
    let generated = runtime.synthesize(&annotated_contract()).unwrap();

    let description = runtime.describe(&generated.type_desc());
    let email = description.property("email", true).unwrap();
    assert_eq!(email.annotations[1].positional, vec![serde_json::json!(64)]);
}

#[test]
fn read_only_members_are_settable() {
    let runtime = DuckRuntime::with_defaults();
    let generated = runtime.synthesize(&annotated_contract()).unwrap();
    let instance = generated.create_ref();

    instance.set("Email", Value::from("ada@example.com")).unwrap();

    assert_eq!(instance.get("Email").unwrap(), Value::from("ada@example.com"));
}

#[test]
fn concurrent_first_use_generates_once() {
    let runtime = DuckRuntime::with_defaults();
    let contract = annotated_contract();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let runtime = Arc::clone(&runtime);
            let contract = Arc::clone(&contract);
            thread::spawn(move || runtime.synthesize(&contract).unwrap())
        })
        .collect();
    let generated: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(generated.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    assert_eq!(runtime.synthesizer().len(), 1);
}
