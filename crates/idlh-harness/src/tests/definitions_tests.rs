use super::*;
use serde_json::json;

fn decl(value: serde_json::Value) -> Declaration {
    let mut decls = idlh_ast::from_value(json!([value])).unwrap();
    decls.remove(0)
}

fn interface(value: serde_json::Value) -> IdlInterface {
    match Definition::from_declaration(decl(value), false) {
        Some(Definition::Interface(interface)) => interface,
        other => panic!("expected an interface, got {other:?}"),
    }
}

fn ty(name: &str) -> serde_json::Value {
    json!({ "idlType": name })
}

#[test]
fn test_interface_level_unforgeable_applies_to_regular_members() {
    let interface = interface(json!({
        "type": "interface",
        "name": "Location",
        "extAttrs": [{ "name": "LegacyUnforgeable" }],
        "members": [
            { "type": "attribute", "name": "href", "idlType": ty("USVString") },
            { "type": "operation", "name": "reload", "idlType": ty("undefined"), "arguments": [] },
            { "type": "operation", "name": "make", "special": "static", "idlType": ty("Location") },
            { "type": "const", "name": "C", "idlType": ty("short"), "value": { "type": "number", "value": "1" } }
        ]
    }));
    let unforgeable: Vec<bool> = interface.members.iter().map(|m| m.is_unforgeable()).collect();
    assert_eq!(unforgeable, [true, true, false, false]);
}

#[test]
fn test_constructor_length_takes_shortest_overload() {
    let interface = interface(json!({
        "type": "interface",
        "name": "Blob",
        "members": [
            { "type": "constructor", "arguments": [
                { "name": "parts", "idlType": ty("any") },
                { "name": "options", "idlType": ty("any"), "optional": true }
            ] },
            { "type": "constructor", "arguments": [
                { "name": "a", "idlType": ty("any") },
                { "name": "b", "idlType": ty("any") }
            ] }
        ]
    }));
    assert!(interface.has_constructor());
    assert_eq!(interface.constructor_overloads().len(), 2);
    assert_eq!(interface.constructor_length(), 1);
}

#[test]
fn test_legacy_constructor_attribute_counts_as_constructor() {
    let interface = interface(json!({
        "type": "interface",
        "name": "Old",
        "extAttrs": [{ "name": "Constructor", "arguments": [{ "name": "x", "idlType": ty("long") }] }],
        "members": []
    }));
    assert!(interface.has_constructor());
    assert_eq!(interface.constructor_length(), 1);
}

#[test]
fn test_qualified_name_uses_legacy_namespace() {
    let interface = interface(json!({
        "type": "interface",
        "name": "Module",
        "extAttrs": [{ "name": "LegacyNamespace", "rhs": { "type": "identifier", "value": "WebAssembly" } }],
        "members": []
    }));
    assert_eq!(interface.legacy_namespace(), Some("WebAssembly"));
    assert_eq!(interface.qualified_name(), "WebAssembly.Module");
}

#[test]
fn test_to_json_detection() {
    let regular = interface(json!({
        "type": "interface",
        "name": "A",
        "members": [{ "type": "operation", "name": "toJSON", "idlType": ty("object"),
                      "extAttrs": [{ "name": "Default" }] }]
    }));
    assert!(regular.has_to_json_regular_operation());
    assert!(regular.has_default_to_json_regular_operation());

    let custom = interface(json!({
        "type": "interface",
        "name": "B",
        "members": [{ "type": "operation", "name": "toJSON", "idlType": ty("object") }]
    }));
    assert!(custom.has_to_json_regular_operation());
    assert!(!custom.has_default_to_json_regular_operation());
}

#[test]
fn test_expected_typeof() {
    let all = interface(json!({ "type": "interface", "name": "HTMLAllCollection", "members": [] }));
    assert_eq!(all.expected_typeof(), "undefined");

    let callable = interface(json!({
        "type": "interface",
        "name": "Callable",
        "members": [{ "type": "operation", "name": "", "special": "legacycaller", "idlType": ty("any") }]
    }));
    assert_eq!(callable.expected_typeof(), "function");

    let plain = interface(json!({ "type": "interface", "name": "Plain", "members": [] }));
    assert_eq!(plain.expected_typeof(), "object");
}

#[test]
fn test_callback_interface_without_constants() {
    let listener = match Definition::from_declaration(
        decl(json!({
            "type": "callback interface",
            "name": "EventListener",
            "members": [{ "type": "operation", "name": "handleEvent", "idlType": ty("undefined") }]
        })),
        false,
    ) {
        Some(definition) => definition,
        None => panic!("callback interface should be registrable"),
    };
    assert_eq!(listener.kind_str(), "callback interface");
    let listener = listener.as_interface().unwrap();
    assert!(listener.is_callback_without_constants());
}

#[test]
fn test_non_registrable_kinds() {
    let includes = decl(json!({ "type": "includes", "target": "A", "includes": "M" }));
    assert!(Definition::from_declaration(includes, false).is_none());
    let unknown = decl(json!({ "type": "implements", "name": "X" }));
    assert!(Definition::from_declaration(unknown, false).is_none());
}

#[test]
fn test_partials_only_extend_matching_kinds() {
    let dictionary = Definition::from_declaration(
        decl(json!({ "type": "dictionary", "name": "D", "members": [] })),
        false,
    )
    .unwrap();
    assert!(dictionary.accepts_partial(&DeclarationKind::Dictionary));
    assert!(!dictionary.accepts_partial(&DeclarationKind::Interface));
    assert!(!dictionary.is_tested());
}

#[test]
fn test_absorb_appends_members_with_their_own_flag() {
    let mut definition = Definition::Interface(interface(json!({
        "type": "interface",
        "name": "Node",
        "members": [{ "type": "attribute", "name": "nodeType", "idlType": ty("unsigned short") }]
    })));
    let extra = Member {
        kind: idlh_ast::MemberKind::Attribute,
        name: "isConnected".to_string(),
        ..Member::default()
    };
    definition.absorb(vec![ExtAttr::new("SecureContext")], vec![(extra, true)]);

    let node = definition.as_interface().unwrap();
    assert_eq!(node.members.len(), 2);
    assert!(!node.members[0].is_untested());
    assert!(node.members[1].is_untested());
    assert!(node.has_extended_attribute(names::SECURE_CONTEXT));
    assert_eq!(definition.member_decls().len(), 2);
}

#[test]
fn test_namespace_operation_overloads() {
    let namespace = match Definition::from_declaration(
        decl(json!({
            "type": "namespace",
            "name": "console",
            "members": [
                { "type": "operation", "name": "log", "idlType": ty("undefined"),
                  "arguments": [{ "name": "data", "idlType": ty("any"), "variadic": true }] },
                { "type": "operation", "name": "count", "idlType": ty("undefined"),
                  "arguments": [{ "name": "label", "idlType": ty("DOMString") }] }
            ]
        })),
        true,
    ) {
        Some(Definition::Namespace(namespace)) => namespace,
        other => panic!("expected a namespace, got {other:?}"),
    };
    assert!(namespace.untested);
    assert_eq!(min_overload_length(namespace.operation_overloads("log")), 0);
    assert_eq!(min_overload_length(namespace.operation_overloads("count")), 1);
    assert_eq!(namespace.operation_overloads("missing").count(), 0);
}
