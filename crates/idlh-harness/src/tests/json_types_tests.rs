use super::*;
use serde_json::json;

use crate::config::AddOptions;

fn registry(value: serde_json::Value) -> IdlArray {
    let mut idl = IdlArray::new();
    idl.add_idls(idlh_ast::from_value(value).unwrap(), &AddOptions::default())
        .unwrap();
    idl
}

fn named(name: &str) -> IdlType {
    IdlType::named(name)
}

fn field(name: &str, type_name: &str) -> serde_json::Value {
    json!({ "type": "field", "name": name, "idlType": { "idlType": type_name } })
}

fn to_json() -> serde_json::Value {
    json!({ "type": "operation", "name": "toJSON", "idlType": { "idlType": "object" } })
}

#[test]
fn test_primitives_and_non_json_names() {
    let idl = IdlArray::new();
    for name in ["long", "double", "boolean", "DOMString", "object"] {
        assert!(idl.is_json_type(&named(name)).unwrap(), "{name}");
    }
    for name in ["any", "ArrayBuffer", "Error", "Float32Array"] {
        assert!(!idl.is_json_type(&named(name)).unwrap(), "{name}");
    }
}

#[test]
fn test_generics() {
    let idl = IdlArray::new();
    assert!(!idl.is_json_type(&IdlType::generic("Promise", vec![named("long")])).unwrap());
    assert!(idl.is_json_type(&IdlType::generic("sequence", vec![named("long")])).unwrap());
    assert!(!idl.is_json_type(&IdlType::generic("FrozenArray", vec![named("any")])).unwrap());
    let record = IdlType::generic("record", vec![named("DOMString"), named("ArrayBuffer")]);
    assert!(!idl.is_json_type(&record).unwrap());
    assert!(matches!(
        idl.is_json_type(&IdlType::generic("Weird", vec![named("long")])),
        Err(HarnessError::UnexpectedType(_))
    ));
}

#[test]
fn test_union_needs_every_member() {
    let idl = IdlArray::new();
    assert!(idl.is_json_type(&IdlType::union_of(vec![named("long"), named("DOMString")])).unwrap());
    assert!(!idl.is_json_type(&IdlType::union_of(vec![named("long"), named("any")])).unwrap());
}

#[test]
fn test_unknown_name_is_an_error() {
    let idl = IdlArray::new();
    assert!(matches!(idl.is_json_type(&named("Mystery")), Err(HarnessError::TypeNotFound(_))));
}

#[test]
fn test_dictionary_members_including_inherited() {
    let idl = registry(json!([
        { "type": "dictionary", "name": "Base", "members": [field("blob", "ArrayBuffer")] },
        { "type": "dictionary", "name": "Plain", "members": [field("n", "long")] },
        { "type": "dictionary", "name": "Derived", "inheritance": "Base", "members": [field("n", "long")] },
        { "type": "dictionary", "name": "Override", "inheritance": "Base", "members": [field("blob", "long")] }
    ]));
    assert!(idl.is_json_type(&named("Plain")).unwrap());
    assert!(!idl.is_json_type(&named("Derived")).unwrap());
    assert!(idl.is_json_type(&named("Override")).unwrap(), "derived member replaces the base one");
}

#[test]
fn test_typedef_enum_and_callback() {
    let idl = registry(json!([
        { "type": "typedef", "name": "Nums", "idlType": { "generic": "sequence", "idlType": [{ "idlType": "long" }] } },
        { "type": "enum", "name": "Mode", "values": ["a"] },
        { "type": "callback", "name": "Cb", "idlType": { "idlType": "undefined" }, "arguments": [] }
    ]));
    assert!(idl.is_json_type(&named("Nums")).unwrap());
    assert!(idl.is_json_type(&named("Mode")).unwrap());
    assert!(!idl.is_json_type(&named("Cb")).unwrap());
}

#[test]
fn test_interface_is_json_with_to_json_on_itself_a_base_or_a_mixin() {
    let idl = registry(json!([
        { "type": "interface", "name": "Serializable", "members": [to_json()] },
        { "type": "interface", "name": "Child", "inheritance": "Serializable", "members": [] },
        { "type": "interface", "name": "Opaque", "members": [] },
        { "type": "interface mixin", "name": "Mixed", "members": [to_json()] },
        { "type": "interface", "name": "Host", "members": [] },
        { "type": "includes", "target": "Host", "includes": "Mixed" }
    ]));
    assert!(idl.is_json_type(&named("Serializable")).unwrap());
    assert!(idl.is_json_type(&named("Child")).unwrap());
    assert!(!idl.is_json_type(&named("Opaque")).unwrap());
    assert!(idl.is_json_type(&named("Host")).unwrap(), "pending includes are consulted");
}

#[test]
fn test_missing_mixin_is_an_error() {
    let idl = registry(json!([
        { "type": "interface", "name": "Host", "members": [] },
        { "type": "includes", "target": "Host", "includes": "Gone" }
    ]));
    assert!(matches!(
        idl.is_json_type(&named("Host")),
        Err(HarnessError::InterfaceNotFound { .. })
    ));
}
