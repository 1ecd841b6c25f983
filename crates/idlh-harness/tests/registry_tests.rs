//! Registration, merging and dependency handling through the public API.

use idlh_common::GlobalScope;
use idlh_harness::{AddOptions, Definition, HarnessConfig, HarnessError, IdlArray, TestRunner, TestStatus};
use idlh_host::MemoryRealm;
use serde_json::{Value as Json, json};

fn decls(value: Json) -> Vec<idlh_ast::Declaration> {
    idlh_ast::from_value(value).unwrap()
}

fn interface(name: &str, base: Option<&str>) -> Json {
    json!({ "type": "interface", "name": name, "inheritance": base, "members": [] })
}

fn attribute(name: &str) -> Json {
    json!({ "type": "attribute", "name": name, "idlType": { "idlType": "long" } })
}

const NODE_IDL: &str = r#"[
    { "type": "interface", "name": "Node", "members": [
        { "type": "attribute", "name": "nodeName", "readonly": true, "idlType": { "idlType": "DOMString" } }
    ] },
    { "type": "dictionary", "name": "GetRootNodeOptions", "members": [
        { "type": "field", "name": "composed", "idlType": { "idlType": "boolean" } }
    ] },
    { "type": "enum", "name": "ShadowRootMode", "values": [{ "type": "enum-value", "value": "open" }] }
]"#;

// -----------------------------------------------------------------------------
// Registration
// -----------------------------------------------------------------------------

#[test]
fn test_json_registration() {
    let mut idl = IdlArray::new();
    idl.add_idls_json(NODE_IDL, &AddOptions::default()).unwrap();

    assert!(idl.contains("Node"));
    assert!(idl.contains("GetRootNodeOptions"));
    assert!(matches!(idl.get("ShadowRootMode"), Some(Definition::Enum(_))));
    assert_eq!(idl.definitions().count(), 3);
    let node = idl.interface("Node").unwrap();
    assert!(!node.untested);
    assert_eq!(node.members.len(), 1);
}

#[test]
fn test_duplicate_registration_is_rejected() {
    let mut idl = IdlArray::new();
    idl.add_idls_json(NODE_IDL, &AddOptions::default()).unwrap();
    let err = idl.add_idls_json(NODE_IDL, &AddOptions::default()).unwrap_err();
    assert_eq!(err.to_string(), "Duplicate identifier Node");

    idl.assert_throws("Duplicate identifier Node", |idl| {
        idl.add_untested_idls_json(NODE_IDL, &AddOptions::default())
    })
    .unwrap();
}

#[test]
fn test_malformed_json_is_an_ast_error() {
    let mut idl = IdlArray::new();
    let err = idl.add_idls_json("[{", &AddOptions::default()).unwrap_err();
    assert!(matches!(err, HarnessError::Ast(_)));
    assert_eq!(idl.definitions().count(), 0);
}

#[test]
fn test_only_and_except_filters() {
    let mut idl = IdlArray::new();
    idl.add_idls_json(NODE_IDL, &AddOptions::only(["Node"])).unwrap();
    assert!(idl.contains("Node"));
    assert!(!idl.contains("ShadowRootMode"));

    let mut idl = IdlArray::new();
    idl.add_idls_json(NODE_IDL, &AddOptions::except(["Node"])).unwrap();
    assert!(!idl.contains("Node"));
    assert!(idl.contains("ShadowRootMode"));

    let both = AddOptions {
        only: Some(vec!["Node".to_string()]),
        except: Some(vec!["Node".to_string()]),
    };
    let err = IdlArray::new().add_idls_json(NODE_IDL, &both).unwrap_err();
    assert_eq!(err.to_string(), "The only and except options can't be used together.");
}

#[test]
fn test_prevent_multiple_testing_needs_a_known_interface() {
    let mut idl = IdlArray::new();
    idl.add_idls_json(NODE_IDL, &AddOptions::default()).unwrap();
    idl.prevent_multiple_testing("Node").unwrap();
    assert!(idl.interface("Node").unwrap().prevent_multiple_testing);
    assert!(matches!(
        idl.prevent_multiple_testing("EventTarget"),
        Err(HarnessError::TypeNotFound(_))
    ));
}

#[test]
fn test_config_from_json() {
    let config = HarnessConfig::from_json(r#"{ "subset": ["Node"] }"#).unwrap();
    assert!(config.should_run("Node"));
    assert!(!config.should_run("Element"));
    assert!(HarnessConfig::from_json(r#"{ "unknown": true }"#).is_err());
}

// -----------------------------------------------------------------------------
// Merging during test()
// -----------------------------------------------------------------------------

#[test]
fn test_partials_merge_once_across_runs() {
    let mut idl = IdlArray::new();
    idl.add_idls(
        decls(json!([
            { "type": "interface", "name": "Window", "members": [attribute("name")] },
            { "type": "interface", "name": "Window", "partial": true, "members": [attribute("status"), attribute("opener")] }
        ])),
        &AddOptions::default(),
    )
    .unwrap();
    assert_eq!(idl.pending_partials(), 1);

    let mut realm = MemoryRealm::window();
    for _ in 0..2 {
        let mut runner = TestRunner::new(&mut realm);
        idl.test(&mut runner).unwrap();
        assert_eq!(idl.pending_partials(), 0);
        assert_eq!(idl.interface("Window").unwrap().members.len(), 3);
    }
}

#[test]
fn test_untested_partial_emits_no_setup_check() {
    let mut idl = IdlArray::new();
    idl.add_idls(decls(json!([interface("Node", None)])), &AddOptions::default())
        .unwrap();
    idl.add_untested_idls(
        decls(json!([{ "type": "interface", "name": "Node", "partial": true, "members": [attribute("extra")] }])),
        &AddOptions::default(),
    )
    .unwrap();

    let mut realm = MemoryRealm::window();
    let mut runner = TestRunner::new(&mut realm);
    idl.test(&mut runner).unwrap();
    let report = runner.into_report();
    assert!(!report.contains("Partial interface Node: original interface defined"));
    assert!(idl.interface("Node").unwrap().members[0].is_untested());
}

#[test]
fn test_duplicate_partial_members_fail_a_check() {
    let mut idl = IdlArray::new();
    idl.add_idls(
        decls(json!([
            { "type": "interface", "name": "Node", "members": [attribute("x")] },
            { "type": "interface", "name": "Node", "partial": true, "members": [attribute("x")] }
        ])),
        &AddOptions::default(),
    )
    .unwrap();

    let mut realm = MemoryRealm::window();
    let mut runner = TestRunner::new(&mut realm);
    idl.test(&mut runner).unwrap();
    let report = runner.into_report();
    assert!(report.passed("Partial interface Node: original interface defined"));
    let result = report.get("Partial interface Node: member names are unique").unwrap();
    assert_eq!(result.status, TestStatus::Fail);
}

#[test]
fn test_circular_inheritance_aborts_the_run() {
    let mut idl = IdlArray::new();
    idl.add_idls(decls(json!([interface("A", Some("B")), interface("B", Some("A"))])), &AddOptions::default())
        .unwrap();

    let mut realm = MemoryRealm::window();
    let mut runner = TestRunner::new(&mut realm);
    let err = idl.test(&mut runner).unwrap_err();
    assert_eq!(err.to_string(), "A has a circular dependency: A,B,A");
}

#[test]
fn test_undefined_base_aborts_the_run() {
    let mut idl = IdlArray::new();
    idl.add_idls(decls(json!([interface("Element", Some("Node"))])), &AddOptions::default())
        .unwrap();

    let mut realm = MemoryRealm::window();
    let mut runner = TestRunner::new(&mut realm);
    let err = idl.test(&mut runner).unwrap_err();
    assert_eq!(err.to_string(), "Element inherits Node, but Node is undefined.");
}

// -----------------------------------------------------------------------------
// Exposure
// -----------------------------------------------------------------------------

#[test]
fn test_worker_exposure_reaches_dedicated_workers() {
    let exposed = json!([{ "name": "Exposed", "rhs": { "type": "identifier", "value": "Worker" } }]);
    let mut idl = IdlArray::new();
    idl.add_idls(
        decls(json!([{ "type": "interface", "name": "WorkerLocation", "extAttrs": exposed, "members": [] }])),
        &AddOptions::default(),
    )
    .unwrap();

    let mut realm = MemoryRealm::new(Some(GlobalScope::DedicatedWorker));
    let mut runner = TestRunner::new(&mut realm);
    idl.test(&mut runner).unwrap();
    assert!(idl.interface("WorkerLocation").unwrap().exposed);
    // Exposed interfaces get the full set of interface object checks.
    assert!(runner.report().contains("WorkerLocation interface object length"));
}

// -----------------------------------------------------------------------------
// Dependencies
// -----------------------------------------------------------------------------

#[test]
fn test_dependency_closure_follows_inheritance() {
    let mut idl = IdlArray::new();
    idl.add_idls(decls(json!([interface("A", Some("B"))])), &AddOptions::default())
        .unwrap();
    idl.add_dependency_idls(
        decls(json!([
            interface("C", Some("D")),
            interface("Unrelated", None),
            interface("B", Some("C")),
            interface("D", None)
        ])),
        &AddOptions::default(),
    )
    .unwrap();

    for name in ["B", "C", "D"] {
        let interface = idl.interface(name).unwrap_or_else(|| panic!("{name} should be registered"));
        assert!(interface.untested, "{name} is a dependency");
    }
    assert!(!idl.contains("Unrelated"));
    let stack: Vec<&str> = idl.inheritance_stack("A").unwrap().iter().map(|d| d.name()).collect();
    assert_eq!(stack, ["A", "B", "C", "D"]);
}

#[test]
fn test_dependencies_through_member_types() {
    let mut idl = IdlArray::new();
    idl.add_idls(
        decls(json!([{ "type": "interface", "name": "Request", "members": [
            { "type": "attribute", "name": "headers", "readonly": true, "idlType": { "idlType": "Headers" } }
        ] }])),
        &AddOptions::default(),
    )
    .unwrap();
    idl.add_dependency_idls(
        decls(json!([
            interface("Headers", None),
            interface("Request", None),
            interface("Response", None)
        ])),
        &AddOptions::default(),
    )
    .unwrap();

    assert!(idl.interface("Headers").unwrap().untested);
    assert!(!idl.interface("Request").unwrap().untested, "already registered names are kept");
    assert!(!idl.contains("Response"));
}
