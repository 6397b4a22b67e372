//! Runtime Contract Test: Member Name Resolution
//!
//! This test verifies how object shims resolve member names.
//!
//! Constraints verified:
//! - Fuzzy shims resolve names ignoring case
//! - Exact shims require the exact spelling
//! - A value set with the member's exact type reads back unchanged
//!
//! If this test fails, shims expose the wrong members.

mod common;

use common::*;
use duck_core::{DuckRuntime, Error, Reflect, Value};

#[test]
fn fuzzy_shim_reads_differently_cased_member() {
    let runtime = DuckRuntime::with_defaults();
    let shim = runtime.shim(person("Ada"), &lower_case_person_contract(), true);

    assert_eq!(shim.get_property_value("name").unwrap(), Value::from("Ada"));
    assert_eq!(shim.get_property_value("NAME").unwrap(), Value::from("Ada"));
}

#[test]
fn exact_shim_rejects_differently_cased_member() {
    let runtime = DuckRuntime::with_defaults();
    let shim = runtime.shim(person("Ada"), &lower_case_person_contract(), false);

    let err = shim.get_property_value("name").unwrap_err();
    assert!(matches!(err, Error::PropertyNotFound { .. }));
}

#[test]
fn member_absent_from_wrapped_type_is_not_found() {
    let runtime = DuckRuntime::with_defaults();
    let shim = runtime.shim(person("Ada"), &identified_contract(), true);

    let err = shim.get_property_value("Id").unwrap_err();
    assert!(matches!(err, Error::PropertyNotFound { .. }));
    assert!(err.is_not_found());
}

#[test]
fn set_then_get_returns_same_value() {
    let runtime = DuckRuntime::with_defaults();
    let wrapped = person("Ada");
    let shim = runtime.shim(wrapped.clone(), &lower_case_person_contract(), true);

    shim.set_property_value("name", Value::from("Grace")).unwrap();

    assert_eq!(shim.get_property_value("name").unwrap(), Value::from("Grace"));
    assert_eq!(wrapped.get("Name").unwrap(), Value::from("Grace"));
}

#[test]
fn setting_null_writes_default() {
    let runtime = DuckRuntime::with_defaults();
    let wrapped = person("Ada");
    let shim = runtime.shim(wrapped.clone(), &lower_case_person_contract(), true);

    let outcome = shim.assign_property("name", Value::Null).unwrap();

    assert!(outcome.is_defaulted());
    assert!(wrapped.get("Name").unwrap().is_null());
}
