//! Fixtures and common utilities for runtime contract tests
//!
//! Classes here stand in for the "plain objects" a caller would wrap: they
//! are declared without any knowledge of the contracts the tests duck them
//! as.

#![allow(dead_code)]

use duck_core::traits::FnConverter;
use duck_core::types::{Annotation, ClassInfo, InterfaceContract, MethodDecl, PropertyDecl, ScalarKind, TypeDesc};
use duck_core::{DuckContract, DuckRuntime, Instance, ObjectRef, Reflect, Value};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

/// Contract with primitive read/write members only
pub struct Profile;

impl DuckContract for Profile {
    fn contract() -> Arc<InterfaceContract> {
        static CONTRACT: OnceLock<Arc<InterfaceContract>> = OnceLock::new();
        Arc::clone(CONTRACT.get_or_init(|| {
            InterfaceContract::builder("IProfile")
                .read_write("Id", TypeDesc::int())
                .read_write("Score", TypeDesc::long())
                .read_write("Ratio", TypeDesc::double())
                .read_write("Active", TypeDesc::bool())
                .read_write("Nickname", TypeDesc::string())
                .read_write("Token", TypeDesc::guid())
                .build()
        }))
    }
}

/// Contract with nested and self-referencing members
pub struct Department;

impl DuckContract for Department {
    fn contract() -> Arc<InterfaceContract> {
        static CONTRACT: OnceLock<Arc<InterfaceContract>> = OnceLock::new();
        Arc::clone(CONTRACT.get_or_init(|| {
            let department = InterfaceContract::declare("IDepartment");
            let employee = InterfaceContract::builder("IEmployee")
                .read_write("Name", TypeDesc::string())
                .read_write("Department", TypeDesc::interface(&department))
                .build();
            department
                .define(|b| {
                    b.read_write("Title", TypeDesc::string())
                        .read_write("Head", TypeDesc::interface(&employee))
                        .read_write("Staff", TypeDesc::array_of(TypeDesc::interface(&employee)))
                })
                .expect("fresh declaration");
            department
        }))
    }
}

/// `IPerson { name: string }`, declared in lower case
pub fn lower_case_person_contract() -> Arc<InterfaceContract> {
    InterfaceContract::builder("IPerson")
        .read_write("name", TypeDesc::string())
        .build()
}

/// `IIdentified { Id: int }`
pub fn identified_contract() -> Arc<InterfaceContract> {
    InterfaceContract::builder("IIdentified")
        .read_write("Id", TypeDesc::int())
        .build()
}

/// `IKeyed { Id: guid }`
pub fn keyed_contract() -> Arc<InterfaceContract> {
    InterfaceContract::builder("IKeyed")
        .read_write("Id", TypeDesc::guid())
        .build()
}

/// Contract whose members carry annotations
pub fn annotated_contract() -> Arc<InterfaceContract> {
    InterfaceContract::builder("IAnnotated")
        .property(
            PropertyDecl::read_only("Email", TypeDesc::string())
                .with_annotation(Annotation::new("Required"))
                .with_annotation(
                    Annotation::new("MaxLength")
                        .with_arg(64)
                        .with_named("ErrorMessage", "email too long"),
                ),
        )
        .read_write("Age", TypeDesc::int())
        .build()
}

/// `Person { Name: string }` instance
pub fn person(name: &str) -> ObjectRef {
    let class = ClassInfo::builder("Person")
        .read_write("Name", TypeDesc::string())
        .build();
    let person = Instance::new(class).into_ref();
    person.set("Name", Value::from(name)).expect("Name is writable");
    person
}

/// `Record { Id: string }` instance
pub fn record_with_string_id(id: &str) -> ObjectRef {
    let class = ClassInfo::builder("Record")
        .read_write("Id", TypeDesc::string())
        .build();
    let record = Instance::new(class).into_ref();
    record.set("Id", Value::from(id)).expect("Id is writable");
    record
}

/// Arguments a [`Cow`] observed on its last `Moo`
#[derive(Debug, Default)]
pub struct MooLog {
    pub calls: AtomicUsize,
    pub last: Mutex<Option<(i32, String)>>,
}

impl MooLog {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last(&self) -> Option<(i32, String)> {
        self.last.lock().clone()
    }
}

/// A cow with `Moo(count: int, pitch: string) -> string`
pub struct Cow {
    pub object: ObjectRef,
    pub log: Arc<MooLog>,
}

impl Cow {
    pub fn new() -> Self {
        let log = Arc::new(MooLog::default());
        let observed = Arc::clone(&log);
        let class = ClassInfo::builder("Cow")
            .method(moo_signature(), move |_, args| {
                let count = args[0].as_int().unwrap_or_default();
                let pitch = args[1].as_str().unwrap_or_default().to_string();
                observed.calls.fetch_add(1, Ordering::SeqCst);
                *observed.last.lock() = Some((count, pitch.clone()));
                Ok(Value::from(format!("{} x {}", count, pitch)))
            })
            .build();

        Self {
            object: Instance::new(class).into_ref(),
            log,
        }
    }
}

pub fn moo_signature() -> MethodDecl {
    MethodDecl::new("Moo")
        .param("count", TypeDesc::int())
        .param("pitch", TypeDesc::string())
        .returns(TypeDesc::string())
}

/// `ICow { Moo(count: int, pitch: string) -> string }`
pub fn cow_contract() -> Arc<InterfaceContract> {
    InterfaceContract::builder("ICow").method(moo_signature()).build()
}

/// Register a string → guid converter
pub fn register_guid_parser(runtime: &DuckRuntime) {
    runtime.converters().register_converter(FnConverter::scalar(
        "string->guid",
        ScalarKind::String,
        ScalarKind::Guid,
        |value| value.as_str().and_then(|s| Uuid::parse_str(s).ok()).map(Value::Guid),
    ));
}
