use super::*;
use std::cell::Cell;
use std::rc::Rc;

use idlh_host::{MemoryRealm, PropertyDescriptor, PropertyKey, Value};

use crate::error::HarnessError;

#[test]
fn test_pass_fail_and_error_statuses() {
    let mut realm = MemoryRealm::window();
    let mut runner = TestRunner::new(&mut realm);
    runner.test("passes", |_| Ok(()));
    runner.test("fails", |ctx| ctx.assert_true(false, "nope"));
    runner.test("errors", |_| Err(HarnessError::UnexpectedType("x".into()).into()));

    let report = runner.into_report();
    assert_eq!(report.len(), 3);
    assert!(report.passed("passes"));
    assert_eq!(report.get("fails").unwrap().status, TestStatus::Fail);
    assert_eq!(
        report.get("fails").unwrap().message.as_deref(),
        Some("assert_true: nope expected true got false")
    );
    assert_eq!(report.get("errors").unwrap().status, TestStatus::Error);
    assert_eq!(report.count(TestStatus::Pass), 1);
    assert!(!report.all_passed());
}

#[test]
fn test_failure_does_not_stop_later_checks() {
    let mut realm = MemoryRealm::window();
    let mut runner = TestRunner::new(&mut realm);
    runner.test("first", |ctx| ctx.assert_unreached("boom"));
    runner.test("second", |_| Ok(()));
    assert!(runner.report().passed("second"));
    assert_eq!(runner.report().failures().count(), 1);
}

#[test]
fn test_uncaught_exception_is_rendered_through_the_realm() {
    let mut realm = MemoryRealm::window();
    let error = realm.type_error("bad receiver");
    let mut runner = TestRunner::new(&mut realm);
    runner.test("throws", move |_| Err(error.into()));
    let result = runner.report().get("throws").unwrap();
    assert_eq!(result.status, TestStatus::Fail);
    assert!(result.message.as_deref().unwrap().starts_with("uncaught exception: "));
}

#[test]
fn test_cleanups_run_in_reverse_even_on_failure() {
    let mut realm = MemoryRealm::window();
    let global = realm.global();
    let order = Rc::new(Cell::new(0u32));
    let mut runner = TestRunner::new(&mut realm);
    let first = Rc::clone(&order);
    let second = Rc::clone(&order);
    runner.test("with cleanups", move |ctx| {
        ctx.add_cleanup(move |_| {
            assert_eq!(first.get(), 1, "registered first, runs last");
            first.set(2);
        });
        ctx.add_cleanup(move |realm| {
            second.set(1);
            let _ = realm.delete_property(global, &PropertyKey::from("scratch"));
        });
        ctx.assert_false(true, "fails after registering cleanups")
    });
    assert_eq!(order.get(), 2);
    assert!(!runner.report().passed("with cleanups"));
}

#[test]
fn test_subset_skips_unselected_keys() {
    let mut realm = MemoryRealm::window();
    let config = HarnessConfig::default().with_subset(["Node"]);
    let mut runner = TestRunner::with_config(&mut realm, config);
    runner.subset_test("Node", "Node interface: selected", |_| Ok(()));
    runner.subset_test("Element", "Element interface: skipped", |_| Ok(()));
    assert!(runner.report().contains("Node interface: selected"));
    assert!(!runner.report().contains("Element interface: skipped"));
}

#[test]
fn test_deferred_rejection_is_settled_after_jobs_run() {
    let mut realm = MemoryRealm::window();
    let reason = realm.type_error("rejected").0;
    let rejected = realm.create_queued_promise(PromiseState::Rejected(reason));
    let fulfilled = realm.create_promise(PromiseState::Fulfilled(Value::Undefined));
    let mut runner = TestRunner::new(&mut realm);

    runner.test("rejects", |ctx| {
        ctx.expect_rejection(rejected, "queued");
        Ok(())
    });
    runner.test("fulfils", |ctx| {
        ctx.expect_rejection(fulfilled, "settled");
        Ok(())
    });

    assert!(runner.report().passed("rejects"));
    let message = runner.report().get("fulfils").unwrap().message.clone();
    assert_eq!(
        message.as_deref(),
        Some("promise_rejects_js: settled fulfilled, expected a rejection")
    );
}

#[test]
fn test_assert_throws_js_requires_a_type_error() {
    let mut realm = MemoryRealm::window();
    let mut runner = TestRunner::new(&mut realm);
    runner.test("type error", |ctx| {
        ctx.assert_throws_js("call", |realm| {
            let global = realm.global();
            realm.call(&Value::Object(global), &Value::Undefined, &[])
        })
    });
    runner.test("no throw", |ctx| ctx.assert_throws_js("noop", |_| Ok(Value::Undefined)));
    assert!(runner.report().passed("type error"), "calling a non-callable throws a TypeError");
    assert_eq!(
        runner.report().get("no throw").unwrap().message.as_deref(),
        Some("assert_throws_js: noop function did not throw")
    );
}

#[test]
fn test_own_property_and_inherits_assertions() {
    let mut realm = MemoryRealm::window();
    let parent = realm.create_plain_object();
    realm.define_property(parent, PropertyKey::from("inherited"), PropertyDescriptor::data(Value::Bool(true)));
    let child = realm.create_object(Some(parent));
    realm.define_property(child, PropertyKey::from("own"), PropertyDescriptor::data(Value::Number(1.0)));

    let mut runner = TestRunner::new(&mut realm);
    runner.test("own", |ctx| ctx.assert_own_property(child, "own", "child").map(|_| ()));
    runner.test("inherits", |ctx| ctx.assert_inherits(child, "inherited", "child"));
    runner.test("own is not inherited", |ctx| ctx.assert_inherits(child, "own", "child"));
    runner.test("missing", |ctx| ctx.assert_no_own_property(child, "inherited", "child"));

    let report = runner.into_report();
    assert!(report.passed("own"));
    assert!(report.passed("inherits"));
    assert!(!report.passed("own is not inherited"));
    assert!(report.passed("missing"));
}

#[test]
fn test_format_value() {
    let mut realm = MemoryRealm::window();
    assert_eq!(format_value(&mut realm, &Value::Number(-0.0)), "-0");
    assert_eq!(format_value(&mut realm, &Value::Number(1.5)), "1.5");
    assert_eq!(format_value(&mut realm, &Value::String("x".into())), "\"x\"");
    assert_eq!(format_value(&mut realm, &Value::Null), "null");
    let object = realm.create_plain_object();
    assert_eq!(format_value(&mut realm, &Value::Object(object)), "object \"[object Object]\"");
}

#[test]
fn test_report_serializes_statuses_uppercase() {
    let mut realm = MemoryRealm::window();
    let mut runner = TestRunner::new(&mut realm);
    runner.test("ok", |_| Ok(()));
    let json = runner.report().to_json().unwrap();
    assert!(json.contains("\"status\": \"PASS\""), "{json}");
    assert!(!json.contains("message"));
}
