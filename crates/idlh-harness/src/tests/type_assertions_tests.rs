use super::*;
use idlh_host::{MemoryRealm, PromiseState};
use serde_json::json;

use crate::config::AddOptions;
use crate::runner::{TestResult, TestRunner, TestStatus};

fn registry(value: serde_json::Value) -> IdlArray {
    let mut idl = IdlArray::new();
    idl.add_idls(idlh_ast::from_value(value).unwrap(), &AddOptions::default())
        .unwrap();
    idl
}

fn check(idl: &IdlArray, realm: &mut MemoryRealm, value: Value, ty: &IdlType) -> TestResult {
    let mut runner = TestRunner::new(realm);
    runner.test("type", |ctx| idl.assert_type_is(ctx, &value, ty));
    runner.into_report().results.remove(0)
}

fn passes(idl: &IdlArray, value: Value, ty: &IdlType) -> bool {
    let mut realm = MemoryRealm::window();
    check(idl, &mut realm, value, ty).passed()
}

fn named(name: &str) -> IdlType {
    IdlType::named(name)
}

#[test]
fn test_integer_ranges() {
    let idl = IdlArray::new();
    assert!(passes(&idl, Value::Number(127.0), &named("byte")));
    assert!(!passes(&idl, Value::Number(128.0), &named("byte")));
    assert!(!passes(&idl, Value::Number(-1.0), &named("octet")));
    assert!(!passes(&idl, Value::Number(1.5), &named("long")));
    assert!(passes(&idl, Value::Number(4_294_967_295.0), &named("unsigned long")));
    assert!(!passes(&idl, Value::String("1".into()), &named("short")));
}

#[test]
fn test_float_must_survive_fround_and_be_finite() {
    let idl = IdlArray::new();
    assert!(passes(&idl, Value::Number(1.5), &named("float")));
    assert!(!passes(&idl, Value::Number(1e40), &named("float")));
    assert!(!passes(&idl, Value::Number(0.1), &named("float")), "0.1 is not a float32 value");
    assert!(!passes(&idl, Value::Number(f64::INFINITY), &named("float")));
    assert!(passes(&idl, Value::Number(f64::INFINITY), &named("unrestricted float")));
}

#[test]
fn test_double_rejects_nan() {
    let idl = IdlArray::new();
    assert!(passes(&idl, Value::Number(0.1), &named("double")));
    assert!(!passes(&idl, Value::Number(f64::NAN), &named("double")));
    assert!(passes(&idl, Value::Number(f64::NAN), &named("unrestricted double")));
}

#[test]
fn test_unsigned_long_long_must_be_positive() {
    let idl = IdlArray::new();
    assert!(passes(&idl, Value::Number(0.0), &named("unsigned long long")));
    assert!(!passes(&idl, Value::Number(-1.0), &named("unsigned long long")));
}

#[test]
fn test_strings() {
    let idl = IdlArray::new();
    assert!(passes(&idl, Value::String("héllo".into()), &named("USVString")));
    assert!(passes(&idl, Value::String("plain".into()), &named("ByteString")));
    assert!(!passes(&idl, Value::String("héllo".into()), &named("ByteString")));
    assert!(!passes(&idl, Value::Number(1.0), &named("DOMString")));
}

#[test]
fn test_any_undefined_and_boolean() {
    let idl = IdlArray::new();
    assert!(passes(&idl, Value::Null, &named("any")));
    assert!(passes(&idl, Value::Undefined, &named("undefined")));
    assert!(!passes(&idl, Value::Null, &named("undefined")));
    assert!(passes(&idl, Value::Bool(false), &named("boolean")));
}

#[test]
fn test_nullable_accepts_null() {
    let idl = IdlArray::new();
    assert!(passes(&idl, Value::Null, &named("long").nullable()));
    assert!(!passes(&idl, Value::Null, &named("long")));
}

#[test]
fn test_union_takes_the_first_matching_member() {
    let idl = IdlArray::new();
    let ty = IdlType::union_of(vec![named("long"), named("DOMString")]);
    assert!(passes(&idl, Value::String("5".into()), &ty));
    assert!(passes(&idl, Value::Number(5.0), &ty));

    let mut realm = MemoryRealm::window();
    let result = check(&idl, &mut realm, Value::Bool(true), &ty);
    assert_eq!(
        result.message.as_deref(),
        Some("assert_true: Attribute has value true which doesn't match any of the types in the union expected true got false")
    );
}

#[test]
fn test_sequence_checks_the_first_element() {
    let idl = IdlArray::new();
    let mut realm = MemoryRealm::window();
    let numbers = Value::Object(realm.create_array(vec![Value::Number(1.0), Value::String("x".into())]));
    let strings = Value::Object(realm.create_array(vec![Value::String("x".into())]));
    let empty = Value::Object(realm.create_array(Vec::new()));
    let ty = IdlType::generic("sequence", vec![named("long")]);

    assert!(check(&idl, &mut realm, numbers, &ty).passed());
    assert!(!check(&idl, &mut realm, strings, &ty).passed());
    assert!(check(&idl, &mut realm, empty, &ty).passed());
    assert!(!check(&idl, &mut realm, Value::Number(1.0), &ty).passed());
}

#[test]
fn test_frozen_array_must_be_frozen() {
    let idl = IdlArray::new();
    let mut realm = MemoryRealm::window();
    let loose = realm.create_array(vec![Value::Number(1.0)]);
    let frozen = realm.create_array(vec![Value::Number(1.0)]);
    realm.freeze(frozen);
    let ty = IdlType::generic("FrozenArray", vec![named("long")]);

    let result = check(&idl, &mut realm, Value::Object(loose), &ty);
    assert_eq!(
        result.message.as_deref(),
        Some("assert_true: Value should be frozen expected true got false")
    );
    assert!(check(&idl, &mut realm, Value::Object(frozen), &ty).passed());
}

#[test]
fn test_promise_needs_a_then_property() {
    let idl = IdlArray::new();
    let mut realm = MemoryRealm::window();
    let promise = realm.create_promise(PromiseState::Pending);
    let ty = IdlType::generic("Promise", vec![named("undefined")]);
    assert!(check(&idl, &mut realm, promise, &ty).passed());
    assert!(!check(&idl, &mut realm, Value::Null, &ty).passed());
}

#[test]
fn test_typedefs_and_enums_resolve_through_the_registry() {
    let idl = registry(json!([
        { "type": "typedef", "name": "Millis", "idlType": { "idlType": "unsigned long" } },
        { "type": "enum", "name": "Mode", "values": [{ "value": "open" }] }
    ]));
    assert!(passes(&idl, Value::Number(3.0), &named("Millis")));
    assert!(!passes(&idl, Value::Number(-3.0), &named("Millis")));
    assert!(passes(&idl, Value::String("closed".into()), &named("Mode")));
    assert!(!passes(&idl, Value::Number(1.0), &named("Mode")));
}

#[test]
fn test_interface_values_use_instanceof() {
    let idl = registry(json!([{ "type": "interface", "name": "Node", "members": [] }]));
    let mut realm = MemoryRealm::window();
    let node = realm.define_interface("Node", None);
    let instance = realm.create_platform_object(&node);
    let plain = realm.create_plain_object();

    assert!(check(&idl, &mut realm, Value::Object(instance), &named("Node")).passed());
    let result = check(&idl, &mut realm, Value::Object(plain), &named("Node"));
    assert_eq!(result.message.as_deref(), Some("assert_true: instanceof Node expected true got false"));
    assert!(!check(&idl, &mut realm, Value::Number(1.0), &named("Node")).passed());
}

#[test]
fn test_platform_types_outside_the_registry() {
    let idl = IdlArray::new();
    let mut realm = MemoryRealm::window();
    let error = realm.type_error("boom").0;
    assert!(check(&idl, &mut realm, error, &named("TypeError")).passed());

    let result = check(&idl, &mut realm, Value::Null, &named("NoSuchThing"));
    assert_eq!(result.status, TestStatus::Error);
    assert_eq!(result.message.as_deref(), Some("IdlHarnessError: Unrecognized type NoSuchThing"));
}

#[test]
fn test_namespace_is_not_a_value_type() {
    let idl = registry(json!([{ "type": "namespace", "name": "CSS", "members": [] }]));
    let mut realm = MemoryRealm::window();
    let result = check(&idl, &mut realm, Value::Null, &named("CSS"));
    assert_eq!(result.status, TestStatus::Error);
}
