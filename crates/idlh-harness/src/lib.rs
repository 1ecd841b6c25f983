//! WebIDL conformance harness.
//!
//! Feed parsed IDL into an [`IdlArray`], register instance expressions with
//! [`IdlArray::add_objects`], then call [`IdlArray::test`] with a
//! [`TestRunner`] bound to the [`Realm`](idlh_host::Realm) under test. Every
//! generated check lands in the runner's [`TestReport`] under the same name
//! the browser conformance suites use ("Node interface: attribute nodeType",
//! "Math namespace: ...").
//!
//! - `registry`: `IdlArray`, partial and mixin merging, dependency closure
//! - `definitions` / `member`: registered definitions and their members
//! - `exposure`: `[Exposed]` resolution against the current global
//! - `interface` / `namespace`: the generated binding checks
//! - `type_assertions` / `json_types` / `suitable`: value-level helpers
//! - `runner`: check execution, cleanups and the report

pub mod config;
pub mod definitions;
pub mod error;
pub mod exposure;
mod interface;
mod json_types;
pub mod member;
pub mod names;
mod namespace;
mod registry;
pub mod runner;
mod suitable;
pub mod tracing_config;
mod type_assertions;

pub use config::{AddOptions, HarnessConfig, SUBSET_ENV};
pub use definitions::{
    Definition, IdlCallback, IdlDictionary, IdlEnum, IdlInterface, IdlNamespace, IdlTypedef,
    InterfaceKind,
};
pub use error::{AssertionError, CheckResult, Failure, HarnessError, HarnessResult};
pub use exposure::{ExposureSet, GlobalNames};
pub use member::IdlMember;
pub use registry::IdlArray;
pub use runner::{TestContext, TestReport, TestResult, TestRunner, TestStatus};
pub use suitable::create_suitable_object;
pub use tracing_config::init_tracing;
