//! Minimal embedding example for duck-core
//!
//! This example wraps a plain object, a JSON document and a built object
//! graph behind the same contract, using the standard converters.

use duck_core::types::{ClassInfo, InterfaceContract, MethodDecl, TypeDesc};
use duck_core::{DuckRuntime, Instance, KeyComparison, PropertyMap, Reflect, Value};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    println!("=== Embedded duck-core Example ===\n");

    println!("1. Creating runtime...");
    let runtime = DuckRuntime::with_defaults();
    duck_converters::register(runtime.converters());
    info!("Converters: {:?}", runtime.converters().list_converters());

    let greet = MethodDecl::new("Greet")
        .param("times", TypeDesc::int())
        .param("greeting", TypeDesc::string())
        .returns(TypeDesc::string());
    let contract = InterfaceContract::builder("IMember")
        .read_write("Name", TypeDesc::string())
        .read_write("Id", TypeDesc::guid())
        .read_write("Age", TypeDesc::long())
        .method(greet.clone())
        .build();

    // A class that knows nothing about IMember
    println!("\n2. Wrapping a plain object...");
    let class = ClassInfo::builder("User")
        .read_write("name", TypeDesc::string())
        .read_write("id", TypeDesc::string())
        .read_write("age", TypeDesc::int())
        .method(greet, |instance, args| {
            let name = instance.get("name")?;
            Ok(Value::from(format!(
                "{} x {}, {}",
                args[0].as_int().unwrap_or_default(),
                args[1].as_str().unwrap_or_default(),
                name.as_str().unwrap_or_default()
            )))
        })
        .build();
    let user = Instance::new(class).into_ref();
    user.set("name", Value::from("Ada"))?;
    user.set("id", Value::from("67e55044-10b1-426f-9247-bb680e5fe0c8"))?;
    user.set("age", Value::Int(36))?;

    let shim = runtime.shim(user, &contract, true);
    println!("   Name  = {:?}", shim.get_property_value("Name")?);
    println!("   Id    = {:?}", shim.get_property_value("Id")?);
    println!("   Age   = {:?}", shim.get_property_value("Age")?);
    println!(
        "   Greet = {:?}",
        shim.call_through("greet", vec![Value::from("hello"), Value::Int(2)])?
    );

    println!("\n3. Wrapping a JSON document...");
    let document = r#"{ "NAME": "Grace", "Id": "not a guid", "age": 85 }"#;
    let map = PropertyMap::from_json_str(document, KeyComparison::IgnoreCase)?;
    let ducked = runtime.fuzzy_duck_as(Value::Map(map), &contract)?;
    if let Some(object) = ducked.as_object() {
        println!("   Name = {:?}", object.get("Name")?);
        println!("   Id   = {:?} (defaulted)", object.get("Id")?);
        println!("   Age  = {:?}", object.get("Age")?);
    }

    println!("\n4. Building a standalone object graph...");
    let built = runtime.builder().build_contract(&contract)?;
    built.set("Name", Value::from("Linus"))?;
    println!("   Built {} with Name = {:?}", built.runtime_type(), built.get("Name")?);

    let errors = runtime.duck_errors(&Value::Int(1), &contract, false);
    println!("\n5. Why an int is not an IMember: {:?}", errors);

    println!("\n=== Embedding Successful ===");
    Ok(())
}
