use super::*;
use idlh_host::MemoryRealm;
use serde_json::json;

use crate::runner::TestStatus;

fn decls(value: serde_json::Value) -> Vec<Declaration> {
    idlh_ast::from_value(value).unwrap()
}

fn ty(name: &str) -> serde_json::Value {
    json!({ "idlType": name })
}

fn attribute(name: &str, type_name: &str) -> serde_json::Value {
    json!({ "type": "attribute", "name": name, "idlType": ty(type_name) })
}

fn interface(name: &str, base: Option<&str>, members: serde_json::Value) -> serde_json::Value {
    json!({ "type": "interface", "name": name, "inheritance": base, "members": members })
}

fn registry(value: serde_json::Value) -> IdlArray {
    let mut idl = IdlArray::new();
    idl.add_idls(decls(value), &AddOptions::default()).unwrap();
    idl
}

// -----------------------------------------------------------------------------
// Registration
// -----------------------------------------------------------------------------

#[test]
fn test_duplicate_identifier() {
    let mut idl = registry(json!([interface("A", None, json!([]))]));
    let err = idl
        .add_idls(decls(json!([interface("A", None, json!([]))])), &AddOptions::default())
        .unwrap_err();
    assert_eq!(err.to_string(), "Duplicate identifier A");
}

#[test]
fn test_only_and_except_together_is_rejected() {
    let mut idl = IdlArray::new();
    let options = AddOptions {
        only: Some(vec!["A".into()]),
        except: Some(vec!["B".into()]),
    };
    let err = idl.add_idls(Vec::new(), &options).unwrap_err();
    assert_eq!(err.to_string(), "The only and except options can't be used together.");
}

#[test]
fn test_options_filter_registration() {
    let mut idl = IdlArray::new();
    let batch = json!([interface("A", None, json!([])), interface("B", None, json!([]))]);
    idl.add_idls(decls(batch.clone()), &AddOptions::only(["A"])).unwrap();
    assert!(idl.contains("A"));
    assert!(!idl.contains("B"));

    let mut idl = IdlArray::new();
    idl.add_idls(decls(batch), &AddOptions::except(["A"])).unwrap();
    assert!(!idl.contains("A"));
    assert!(idl.contains("B"));
}

#[test]
fn test_unsupported_declaration() {
    let mut idl = IdlArray::new();
    let err = idl
        .add_idls(decls(json!([{ "type": "implements", "name": "X" }])), &AddOptions::default())
        .unwrap_err();
    assert_eq!(err.to_string(), "X: implements not yet supported");
}

#[test]
fn test_partials_and_includes_are_queued() {
    let idl = registry(json!([
        { "type": "interface", "name": "A", "partial": true, "members": [] },
        { "type": "includes", "target": "A", "includes": "M" }
    ]));
    assert_eq!(idl.pending_partials(), 1);
    assert_eq!(idl.pending_includes(), 1);
    assert!(!idl.contains("A"));
    assert_eq!(idl.mixins_of("A").collect::<Vec<_>>(), ["M"]);
}

#[test]
fn test_prevent_multiple_testing_requires_an_interface() {
    let mut idl = registry(json!([interface("A", None, json!([]))]));
    idl.prevent_multiple_testing("A").unwrap();
    assert!(idl.interface("A").unwrap().prevent_multiple_testing);
    assert!(matches!(idl.prevent_multiple_testing("B"), Err(HarnessError::TypeNotFound(_))));
}

#[test]
fn test_assert_throws_compares_messages() {
    let mut idl = IdlArray::new();
    let duplicate = decls(json!([interface("A", None, json!([])), interface("A", None, json!([]))]));
    idl.assert_throws("Duplicate identifier A", |idl| idl.add_idls(duplicate, &AddOptions::default()))
        .unwrap();

    let err = idl.assert_throws("anything", |_| Ok(())).unwrap_err();
    assert!(matches!(err, HarnessError::DidNotThrow));
}

// -----------------------------------------------------------------------------
// Inheritance
// -----------------------------------------------------------------------------

#[test]
fn test_inheritance_stack_is_most_derived_first() {
    let idl = registry(json!([
        interface("C", Some("B"), json!([])),
        interface("B", Some("A"), json!([])),
        interface("A", None, json!([]))
    ]));
    let names: Vec<&str> = idl.inheritance_stack("C").unwrap().iter().map(|d| d.name()).collect();
    assert_eq!(names, ["C", "B", "A"]);
}

#[test]
fn test_circular_inheritance_is_reported() {
    let idl = registry(json!([interface("A", Some("B"), json!([])), interface("B", Some("A"), json!([]))]));
    let err = idl.inheritance_stack("A").unwrap_err();
    assert_eq!(err.to_string(), "A has a circular dependency: A,B,A");
}

#[test]
fn test_check_inheritance_errors() {
    let idl = registry(json!([interface("A", Some("Missing"), json!([]))]));
    assert_eq!(
        idl.check_inheritance().unwrap_err().to_string(),
        "A inherits Missing, but Missing is undefined."
    );

    let idl = registry(json!([
        interface("A", Some("D"), json!([])),
        { "type": "dictionary", "name": "D", "members": [] }
    ]));
    assert_eq!(
        idl.check_inheritance().unwrap_err().to_string(),
        "A inherits D, but D is not an interface."
    );
}

// -----------------------------------------------------------------------------
// Merges
// -----------------------------------------------------------------------------

#[test]
fn test_partial_members_are_merged_once() {
    let mut idl = registry(json!([
        interface("A", None, json!([attribute("a", "long")])),
        { "type": "interface", "name": "A", "partial": true, "members": [attribute("b", "long"), attribute("c", "long")] }
    ]));
    let mut realm = MemoryRealm::window();
    let mut runner = TestRunner::new(&mut realm);
    idl.merge_partials(&mut runner);
    idl.merge_partials(&mut runner);

    assert_eq!(idl.interface("A").unwrap().members.len(), 3);
    let report = runner.into_report();
    assert!(report.passed("Partial interface A: original interface defined"));
    assert!(report.passed("Partial interface A: member names are unique"));
}

#[test]
fn test_partial_without_original_fails_its_check() {
    let mut idl = registry(json!([
        { "type": "interface", "name": "Ghost", "partial": true, "members": [] }
    ]));
    let mut realm = MemoryRealm::window();
    let mut runner = TestRunner::new(&mut realm);
    idl.merge_partials(&mut runner);
    let result = runner.report().get("Partial interface Ghost: original interface defined").unwrap();
    assert_eq!(result.status, TestStatus::Fail);
}

#[test]
fn test_second_tested_partial_gets_a_counter() {
    let mut idl = registry(json!([
        interface("A", None, json!([])),
        { "type": "interface", "name": "A", "partial": true, "members": [attribute("x", "long")] },
        { "type": "interface", "name": "A", "partial": true, "members": [attribute("x", "long")] }
    ]));
    let mut realm = MemoryRealm::window();
    let mut runner = TestRunner::new(&mut realm);
    idl.merge_partials(&mut runner);
    let report = runner.into_report();
    assert!(report.passed("Partial interface A[2]: original interface defined"));
    let duplicate = report.get("Partial interface A[2]: member names are unique").unwrap();
    assert_eq!(
        duplicate.message.as_deref(),
        Some("assert_true: Duplicate member names: [x] expected true got false")
    );
}

#[test]
fn test_partial_exposure_must_be_a_subset() {
    let mut idl = registry(json!([
        interface("A", None, json!([])),
        { "type": "interface", "name": "A", "partial": true, "members": [],
          "extAttrs": [{ "name": "Exposed", "rhs": { "type": "identifier", "value": "Worker" } }] }
    ]));
    let mut realm = MemoryRealm::window();
    let mut runner = TestRunner::new(&mut realm);
    idl.merge_partials(&mut runner);
    let result = runner.report().get("Partial interface A: valid exposure set").unwrap();
    assert_eq!(result.status, TestStatus::Error);
    assert!(result.message.as_deref().unwrap().contains("exposed to 'DedicatedWorker'"));
}

#[test]
fn test_partial_exposure_is_copied_to_members() {
    let mut idl = registry(json!([
        { "type": "interface", "name": "A", "members": [],
          "extAttrs": [{ "name": "Exposed", "rhs": { "type": "identifier-list", "value": ["Window", "Worker"] } }] },
        { "type": "interface", "name": "A", "partial": true,
          "extAttrs": [{ "name": "Exposed", "rhs": { "type": "identifier", "value": "Window" } }],
          "members": [
              attribute("plain", "long"),
              { "type": "attribute", "name": "own", "idlType": ty("long"),
                "extAttrs": [{ "name": "Exposed", "rhs": { "type": "identifier", "value": "Worker" } }] }
          ] }
    ]));
    let mut realm = MemoryRealm::window();
    let mut runner = TestRunner::new(&mut realm);
    idl.merge_partials(&mut runner);

    let a = idl.interface("A").unwrap();
    let exposure = |member: &IdlMember| ExposureSet::from_ext_attrs(&member.name, &member.ext_attrs, None).unwrap();
    assert_eq!(exposure(&a.members[0]), ExposureSet::window());
    assert!(exposure(&a.members[1]).contains("SharedWorker"));
    assert_eq!(a.ext_attrs.len(), 1, "partial [Exposed] is not added to the interface");
}

#[test]
fn test_mixin_members_are_merged_into_target() {
    let mut idl = registry(json!([
        interface("Document", None, json!([attribute("URL", "USVString")])),
        { "type": "interface mixin", "name": "ParentNode", "members": [attribute("children", "HTMLCollection")] },
        { "type": "includes", "target": "Document", "includes": "ParentNode" }
    ]));
    let mut realm = MemoryRealm::window();
    let mut runner = TestRunner::new(&mut realm);
    idl.merge_mixins(&mut runner);

    let document = idl.interface("Document").unwrap();
    let names: Vec<&str> = document.members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["URL", "children"]);
    assert_eq!(idl.pending_includes(), 0);
    assert_eq!(idl.mixins_of("Document").collect::<Vec<_>>(), ["ParentNode"]);
    assert!(runner.report().all_passed());
}

#[test]
fn test_includes_with_missing_mixin_fails() {
    let mut idl = registry(json!([
        interface("Document", None, json!([])),
        { "type": "includes", "target": "Document", "includes": "Nope" }
    ]));
    let mut realm = MemoryRealm::window();
    let mut runner = TestRunner::new(&mut realm);
    idl.merge_mixins(&mut runner);
    let report = runner.into_report();
    assert!(report.passed("Document includes Nope: target interface defined"));
    assert!(!report.passed("Document includes Nope: mixin defined"));
}

#[test]
fn test_pair_iterable_gets_synthesized_operations() {
    let mut idl = registry(json!([
        interface("Headers", None, json!([
            { "type": "iterable", "idlType": [ty("ByteString"), ty("ByteString")] }
        ])),
        interface("List", None, json!([
            { "type": "iterable", "idlType": [ty("long")] }
        ]))
    ]));
    idl.add_iteration_members();
    idl.add_iteration_members();

    let names: Vec<&str> = idl.interface("Headers").unwrap().members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["", "entries", "keys", "values", "forEach"]);
    assert_eq!(idl.interface("List").unwrap().members.len(), 1);
}

#[test]
fn test_compute_exposure_needs_a_known_global() {
    let mut idl = registry(json!([interface("A", None, json!([]))]));
    assert!(matches!(idl.compute_exposure(None), Err(HarnessError::UnexpectedGlobalObject)));
    idl.compute_exposure(Some(GlobalScope::DedicatedWorker)).unwrap();
    assert!(!idl.interface("A").unwrap().exposed);
    idl.compute_exposure(Some(GlobalScope::Window)).unwrap();
    assert!(idl.interface("A").unwrap().exposed);
}

// -----------------------------------------------------------------------------
// Dependencies
// -----------------------------------------------------------------------------

#[test]
fn test_referenced_type_names_walks_generics_and_unions() {
    let ty = IdlType::union_of(vec![
        IdlType::generic("sequence", vec![IdlType::named("Node")]),
        IdlType::generic("record", vec![IdlType::named("DOMString"), IdlType::named("Blob")]),
    ]);
    assert_eq!(dependencies::referenced_type_names(&ty), ["Node", "DOMString", "Blob"]);
}

#[test]
fn test_dependency_closure_follows_inheritance() {
    let mut idl = registry(json!([interface("A", Some("B"), json!([]))]));
    let batch = json!([
        interface("D", None, json!([])),
        interface("C", Some("D"), json!([])),
        interface("B", Some("C"), json!([])),
        interface("Unrelated", None, json!([]))
    ]);
    idl.add_dependency_idls(decls(batch), &AddOptions::default()).unwrap();

    for name in ["B", "C", "D"] {
        let dependency = idl.interface(name).unwrap();
        assert!(dependency.untested, "{name} is registered untested");
    }
    assert!(!idl.contains("Unrelated"));
    assert!(!idl.interface("A").unwrap().untested);
}

#[test]
fn test_dependency_closure_follows_attribute_types_and_typedefs() {
    let mut idl = registry(json!([interface("A", None, json!([attribute("init", "HeadersInit")]))]));
    let batch = json!([
        { "type": "typedef", "name": "HeadersInit", "idlType": ty("Headers") },
        interface("Headers", None, json!([]))
    ]);
    idl.add_dependency_idls(decls(batch), &AddOptions::default()).unwrap();
    assert!(idl.contains("HeadersInit"));
    assert!(idl.contains("Headers"));
}

#[test]
fn test_dependency_batch_skips_already_registered_names() {
    let mut idl = registry(json!([interface("A", Some("B"), json!([])), interface("B", None, json!([]))]));
    let batch = json!([interface("B", None, json!([attribute("extra", "long")]))]);
    idl.add_dependency_idls(decls(batch), &AddOptions::default()).unwrap();
    assert!(idl.interface("B").unwrap().members.is_empty());
}
