//! Check execution.
//!
//! Generated checks are closures run immediately against the realm. Each
//! produces one [`TestResult`]: a failure in one check never stops the
//! next. Promise-typed expectations are collected while the body runs and
//! settled once it returns, after draining the realm's job queue.

mod context;
mod report;

pub use context::{Cleanup, DeferredCheck, TestContext, format_value};
pub use report::{TestReport, TestResult, TestStatus};

use idlh_host::{PromiseState, Realm, RealmExt, Thrown};
use tracing::{debug, trace};

use crate::config::HarnessConfig;
use crate::error::{CheckResult, Failure};

pub struct TestRunner<'r> {
    realm: &'r mut dyn Realm,
    config: HarnessConfig,
    report: TestReport,
}

impl<'r> TestRunner<'r> {
    pub fn new(realm: &'r mut dyn Realm) -> Self {
        Self::with_config(realm, HarnessConfig::default())
    }

    pub fn with_config(realm: &'r mut dyn Realm, config: HarnessConfig) -> Self {
        Self {
            realm,
            config,
            report: TestReport::default(),
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn realm(&mut self) -> &mut dyn Realm {
        &mut *self.realm
    }

    pub fn report(&self) -> &TestReport {
        &self.report
    }

    pub fn into_report(self) -> TestReport {
        self.report
    }

    /// Run checks keyed by `key` only when the configured subset selects it.
    pub fn subset_test<F>(&mut self, key: &str, name: impl Into<String>, body: F)
    where
        F: FnOnce(&mut TestContext<'_>) -> CheckResult,
    {
        if !self.config.should_run(key) {
            trace!(key, "check skipped by subset");
            return;
        }
        self.test(name, body);
    }

    pub fn test<F>(&mut self, name: impl Into<String>, body: F)
    where
        F: FnOnce(&mut TestContext<'_>) -> CheckResult,
    {
        let name = name.into();
        let mut ctx = TestContext::new(&mut *self.realm);
        let outcome = body(&mut ctx).and_then(|()| settle_deferred(&mut ctx));
        let TestContext { cleanups, .. } = ctx;
        for cleanup in cleanups.into_iter().rev() {
            cleanup(&mut *self.realm);
        }

        let result = match outcome {
            Ok(()) => TestResult {
                name,
                status: TestStatus::Pass,
                message: None,
            },
            Err(failure) => {
                let status = match failure {
                    Failure::Harness(_) => TestStatus::Error,
                    Failure::Assertion(_) | Failure::Thrown(_) => TestStatus::Fail,
                };
                let message = self.describe(failure);
                debug!(%name, ?status, %message, "check failed");
                TestResult {
                    name,
                    status,
                    message: Some(message),
                }
            }
        };
        trace!(name = %result.name, status = ?result.status, "check finished");
        self.report.push(result);
    }

    fn describe(&mut self, failure: Failure) -> String {
        match failure {
            Failure::Thrown(Thrown(value)) => {
                format!("uncaught exception: {}", format_value(&mut *self.realm, &value))
            }
            other => other.to_string(),
        }
    }
}

/// Drain the job queue and check every deferred expectation.
fn settle_deferred(ctx: &mut TestContext<'_>) -> CheckResult {
    if ctx.deferred.is_empty() {
        return Ok(());
    }
    ctx.realm().run_jobs();
    let deferred = std::mem::take(&mut ctx.deferred);
    for check in deferred {
        let DeferredCheck::RejectsWithTypeError {
            promise,
            description,
        } = check;
        let realm = ctx.realm();
        let message = match realm.promise_state(&promise) {
            Some(PromiseState::Rejected(reason)) if realm.is_type_error(&reason) => continue,
            Some(PromiseState::Rejected(reason)) => format!(
                "promise_rejects_js: {description} rejected with {} which is not a TypeError",
                format_value(realm, &reason)
            ),
            Some(PromiseState::Fulfilled(_)) => {
                format!("promise_rejects_js: {description} fulfilled, expected a rejection")
            }
            Some(PromiseState::Pending) => {
                format!("promise_rejects_js: {description} never settled")
            }
            None => format!("promise_rejects_js: {description} is not a promise"),
        };
        return Err(Failure::assertion(message));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/runner_tests.rs"]
mod tests;
