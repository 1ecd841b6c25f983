//! Checks generated for an interface.
//!
//! [`test`] covers the interface object, the interface prototype object and
//! every member. [`test_object`] checks one live instance against the
//! interface and everything it inherits from.
//!
//! Module layout:
//! - `self_checks`: interface object, prototype object, legacy extras
//! - `immutable_prototype`: the six `[[SetPrototypeOf]]` checks
//! - `member_checks`: constants, attributes, operations, stringifiers,
//!   iterable/maplike/setlike declarations
//! - `object_checks`: instances registered through `add_objects`
//! - `to_json`: `toJSON` and the default `toJSON` attribute map

mod immutable_prototype;
mod member_checks;
mod object_checks;
mod self_checks;
mod to_json;

use idlh_common::GlobalScope;
use idlh_host::{ObjectId, PropertyDescriptor, Value};
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::definitions::IdlInterface;
use crate::error::{CheckResult, HarnessResult};
use crate::exposure::ExposureSet;
use crate::member::IdlMember;
use crate::registry::IdlArray;
use crate::runner::{TestContext, TestRunner};

/// Emit every check for `interface`.
///
/// Mixins and `[LegacyNoInterfaceObject]` interfaces have nothing to look
/// at without an instance. An interface that is not exposed only gets an
/// absence check.
pub(crate) fn test(registry: &IdlArray, interface: &IdlInterface, runner: &mut TestRunner<'_>) -> HarnessResult<()> {
    if interface.is_mixin() || !interface.has_interface_object() {
        return Ok(());
    }
    let tester = InterfaceTester::new(registry, interface, runner.realm().global_scope());
    if !interface.exposed {
        let name = interface.name.as_str();
        runner.subset_test(name, format!("{name} interface: existence and properties of interface object"), |ctx| {
            let present = ctx.global_has(name)?;
            ctx.assert_false(present, &format!("{name} in self"))
        });
        return Ok(());
    }
    debug!(interface = %interface.name, untested = interface.untested, "testing interface");
    if !interface.untested {
        tester.test_self(runner)?;
    }
    // Members run even for an untested interface: a tested partial can add
    // tested members to it.
    tester.test_members(runner)
}

/// Emit the checks for one object expression registered against `interface`.
pub(crate) fn test_object(
    registry: &IdlArray,
    interface: &IdlInterface,
    expression: &str,
    runner: &mut TestRunner<'_>,
    tested_once: &mut FxHashSet<String>,
) -> HarnessResult<()> {
    let tester = InterfaceTester::new(registry, interface, runner.realm().global_scope());
    tester.test_object(expression, runner, tested_once)
}

/// One interface together with the registry it resolves names against.
#[derive(Clone, Copy)]
pub(crate) struct InterfaceTester<'a> {
    registry: &'a IdlArray,
    interface: &'a IdlInterface,
    scope: Option<GlobalScope>,
}

impl<'a> InterfaceTester<'a> {
    fn new(registry: &'a IdlArray, interface: &'a IdlInterface, scope: Option<GlobalScope>) -> Self {
        Self {
            registry,
            interface,
            scope,
        }
    }

    fn name(&self) -> &'a str {
        &self.interface.name
    }

    /// Same tester, for an inherited interface.
    fn for_interface(&self, interface: &'a IdlInterface) -> Self {
        Self { interface, ..*self }
    }

    fn member_exposed(&self, member: &IdlMember) -> HarnessResult<bool> {
        ExposureSet::from_ext_attrs(&member.name, &member.ext_attrs, Some(&self.interface.exposure))?
            .exposed_in(self.scope)
    }

    /// Operations sharing a name with `member`, for `length` expectations.
    fn overload_length(&self, member: &IdlMember) -> usize {
        crate::member::min_overload_length(self.interface.operation_overloads(&member.name))
    }

    /// Whether `String(obj)` may call something other than
    /// `Object.prototype.toString`.
    fn has_stringifier(&self) -> bool {
        let mut current = Some(self.interface);
        let mut depth = 0;
        while let Some(interface) = current {
            // DOMException inherits toString from Error.prototype.
            if interface.name == "DOMException" || interface.members.iter().any(|m| m.is_stringifier()) {
                return true;
            }
            depth += 1;
            if depth > idlh_common::limits::MAX_INHERITANCE_DEPTH {
                return false;
            }
            current = interface.base.as_deref().and_then(|base| self.registry.interface(base));
        }
        false
    }

    // -------------------------------------------------------------------------
    // Objects under test
    // -------------------------------------------------------------------------

    /// `self`, or the `[LegacyNamespace]` object holding the interface object.
    fn interface_object_owner(&self, ctx: &mut TestContext<'_>) -> CheckResult<(ObjectId, String)> {
        let global = ctx.global();
        let Some(namespace) = self.interface.legacy_namespace() else {
            return Ok((global, "self".to_string()));
        };
        let value = ctx.get(global, namespace)?;
        let owner = ctx.assert_object(&value, &format!("namespace object {namespace}"))?;
        Ok((owner, namespace.to_string()))
    }

    /// The interface object's own property on its owner.
    fn interface_object_property(&self, ctx: &mut TestContext<'_>) -> CheckResult<PropertyDescriptor> {
        let (owner, owner_name) = self.interface_object_owner(ctx)?;
        let name = self.name();
        ctx.assert_own_property(owner, name, &format!("{owner_name} does not have own property \"{name}\""))
    }

    fn interface_object(&self, ctx: &mut TestContext<'_>) -> CheckResult<ObjectId> {
        self.interface_object_property(ctx)?;
        let (owner, _) = self.interface_object_owner(ctx)?;
        let value = ctx.get(owner, self.name())?;
        ctx.assert_object(&value, &format!("interface object {}", self.name()))
    }

    /// Callback interfaces must not have a `prototype` property at all.
    fn assert_no_prototype_property(&self, ctx: &mut TestContext<'_>, interface_object: ObjectId) -> CheckResult {
        let present = ctx.has(interface_object, "prototype")?;
        ctx.assert_false(present, &format!("{} should not have a \"prototype\" property", self.name()))
    }

    /// `X.prototype`, after checking it is an own property of `X`.
    fn prototype_object(&self, ctx: &mut TestContext<'_>, interface_object: ObjectId) -> CheckResult<ObjectId> {
        let name = self.name();
        ctx.assert_own_property(
            interface_object,
            "prototype",
            &format!("interface \"{name}\" does not have own property \"prototype\""),
        )?;
        let value = ctx.get(interface_object, "prototype")?;
        ctx.assert_object(&value, &format!("{name}.prototype"))
    }

    /// The interface prototype object, or `None` when the interface has no
    /// prototype to check (callback interfaces).
    fn member_holder_prototype(&self, ctx: &mut TestContext<'_>) -> CheckResult<Option<ObjectId>> {
        let interface_object = self.interface_object(ctx)?;
        if self.interface.is_callback() {
            self.assert_no_prototype_property(ctx, interface_object)?;
            return Ok(None);
        }
        self.prototype_object(ctx, interface_object).map(Some)
    }
}

// =============================================================================
// Shared assertions
// =============================================================================

fn should(expected: bool, what: &str) -> String {
    if expected {
        format!("should be {what}")
    } else {
        format!("should not be {what}")
    }
}

/// Expected attributes of a data property.
#[derive(Clone, Copy, Debug)]
pub(crate) struct DataShape {
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

impl DataShape {
    /// Global interface bindings and built-in methods.
    pub const HIDDEN: Self = Self {
        writable: true,
        enumerable: false,
        configurable: true,
    };
    /// Function `length` and `name`.
    pub const READONLY_HIDDEN: Self = Self {
        writable: false,
        enumerable: false,
        configurable: true,
    };
    pub const FROZEN: Self = Self {
        writable: false,
        enumerable: false,
        configurable: false,
    };
}

/// `desc` is a data property shaped like `shape`. Messages are prefixed with
/// `subject`.
pub(crate) fn assert_data_shape(
    ctx: &mut TestContext<'_>,
    desc: &PropertyDescriptor,
    subject: &str,
    shape: DataShape,
) -> CheckResult {
    ctx.assert_false(desc.getter().is_some(), &format!("{subject} should not have a getter"))?;
    ctx.assert_false(desc.setter().is_some(), &format!("{subject} should not have a setter"))?;
    ctx.assert_true(
        desc.writable() == Some(shape.writable),
        &format!("{subject} {}", should(shape.writable, "writable")),
    )?;
    ctx.assert_true(
        desc.enumerable() == shape.enumerable,
        &format!("{subject} {}", should(shape.enumerable, "enumerable")),
    )?;
    ctx.assert_true(
        desc.configurable() == shape.configurable,
        &format!("{subject} {}", should(shape.configurable, "configurable")),
    )
}

/// Data property of a regular operation: writable and configurable unless
/// unforgeable, always enumerable.
pub(crate) fn assert_operation_shape(ctx: &mut TestContext<'_>, desc: &PropertyDescriptor, unforgeable: bool) -> CheckResult {
    ctx.assert_false(desc.getter().is_some(), "property should not have a getter")?;
    ctx.assert_false(desc.setter().is_some(), "property should not have a setter")?;
    ctx.assert_true(
        desc.writable() == Some(!unforgeable),
        "property should be writable if and only if not unforgeable",
    )?;
    ctx.assert_true(desc.enumerable(), "property should be enumerable")?;
    ctx.assert_true(
        desc.configurable() == !unforgeable,
        "property should be configurable if and only if not unforgeable",
    )
}

/// `function.length === expected`
pub(crate) fn assert_function_length(
    ctx: &mut TestContext<'_>,
    function: ObjectId,
    expected: usize,
    description: &str,
) -> CheckResult {
    let length = ctx.get(function, "length")?;
    ctx.assert_equals(&length, &Value::Number(expected as f64), description)
}

/// `function.name === expected`
pub(crate) fn assert_function_name(
    ctx: &mut TestContext<'_>,
    function: ObjectId,
    expected: &str,
    description: &str,
) -> CheckResult {
    let name = ctx.get(function, "name")?;
    ctx.assert_equals(&name, &Value::String(expected.to_string()), description)
}

/// A fresh `{}` from the realm under test.
pub(crate) fn plain_object(ctx: &mut TestContext<'_>) -> Value {
    let prototype = ctx.intrinsic(idlh_host::Intrinsic::ObjectPrototype);
    Value::Object(ctx.realm().create_object(Some(prototype)))
}

#[cfg(test)]
#[path = "../tests/interface_tests.rs"]
mod tests;
