//! Checks on live instances registered through `add_objects`.

use idlh_ast::MemberKind;
use idlh_common::limits::MAX_INHERITANCE_DEPTH;
use idlh_host::{ObjectId, PropertyKey, Thrown, Value};
use rustc_hash::FxHashSet;
use tracing::debug;

use super::InterfaceTester;
use super::member_checks::constant_value;
use crate::error::{CheckResult, Failure, HarnessError, HarnessResult};
use crate::member::IdlMember;
use crate::runner::{TestContext, TestRunner};
use crate::suitable::create_suitable_object;

/// An object expression, evaluated once and shared by every check on it.
pub(super) struct Evaluated<'e> {
    pub expression: &'e str,
    result: Result<Value, Thrown>,
    expected_typeof: &'static str,
}

impl Evaluated<'_> {
    /// The value, failing when evaluation threw or `typeof` is wrong.
    pub(super) fn value(&self, ctx: &mut TestContext<'_>) -> CheckResult<Value> {
        let value = self.evaluated(ctx)?;
        ctx.assert_typeof(&value, self.expected_typeof, "wrong typeof object")?;
        Ok(value)
    }

    pub(super) fn object(&self, ctx: &mut TestContext<'_>) -> CheckResult<ObjectId> {
        let value = self.value(ctx)?;
        ctx.assert_object(&value, self.expression)
    }

    /// The value, failing only when evaluation threw.
    fn evaluated(&self, ctx: &mut TestContext<'_>) -> CheckResult<Value> {
        match &self.result {
            Ok(value) => Ok(value.clone()),
            Err(Thrown(error)) => {
                let shown = ctx.format(error);
                Err(Failure::assertion(format!(
                    "assert_equals: Unexpected exception when evaluating object expected null but got {shown}"
                )))
            }
        }
    }
}

impl InterfaceTester<'_> {
    pub(super) fn test_object(
        &self,
        expression: &str,
        runner: &mut TestRunner<'_>,
        tested_once: &mut FxHashSet<String>,
    ) -> HarnessResult<()> {
        let name = self.name();
        let evaluated = Evaluated {
            expression,
            result: runner.realm().evaluate(expression),
            expected_typeof: self.interface.expected_typeof(),
        };
        debug!(interface = %name, %expression, threw = evaluated.result.is_err(), "testing object");

        if self.interface.is_callback() {
            runner.subset_test(name, format!("{name} interface: {expression} must be a callback object"), |ctx| {
                let value = evaluated.evaluated(ctx)?;
                let kind = ctx.type_of(&value);
                ctx.assert_in_array(kind, &["object", "function"], "wrong typeof object")
            });
            return Ok(());
        }

        self.test_primary_interface_of(runner, &evaluated);

        let mut current = self.interface;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            if current.prevent_multiple_testing && tested_once.contains(&current.name) {
                return Ok(());
            }
            tested_once.insert(current.name.clone());
            self.for_interface(current).test_interface_of(runner, &evaluated)?;
            let Some(base) = &current.base else {
                return Ok(());
            };
            current = self.registry.interface(base).ok_or_else(|| HarnessError::InterfaceNotFound {
                interface: base.clone(),
                name: name.to_string(),
            })?;
        }
        Err(HarnessError::Internal(format!(
            "inheritance chain of {name} is deeper than {MAX_INHERITANCE_DEPTH}"
        )))
    }

    /// Prototype and class string of an object whose primary interface is
    /// this one.
    fn test_primary_interface_of(&self, runner: &mut TestRunner<'_>, evaluated: &Evaluated<'_>) {
        // Only the object itself is checked here.
        if self.interface.untested {
            return;
        }
        let name = self.name();
        let expression = evaluated.expression;

        if self.interface.is_global() {
            self.test_immutable_prototype(runner, "global platform object", |ctx: &mut TestContext<'_>| {
                evaluated.object(ctx)
            });
        }

        if self.interface.has_interface_object() {
            runner.subset_test(name, format!("{name} must be primary interface of {expression}"), |ctx| {
                let object = evaluated.object(ctx)?;
                let interface_object = self.interface_object(ctx)?;
                let prototype = self.prototype_object(ctx, interface_object)?;
                let actual = ctx.prototype_of(object)?;
                ctx.assert_same_object(
                    actual,
                    Some(prototype),
                    &format!("{expression}'s prototype is not {name}.prototype"),
                )
            });
        }

        runner.subset_test(name, format!("Stringification of {expression}"), |ctx| {
            let value = evaluated.value(ctx)?;
            let qualified = self.interface.qualified_name();
            ctx.assert_class_string(&value, &qualified, &format!("class string of {expression}"))?;
            if !self.has_stringifier() {
                let string = ctx.to_string(&value)?;
                ctx.assert_str_equals(&string, &format!("[object {qualified}]"), &format!("String({expression})"))?;
            }
            Ok(())
        });
    }

    /// Member checks on an object implementing this interface, directly or
    /// through inheritance.
    fn test_interface_of(&self, runner: &mut TestRunner<'_>, evaluated: &Evaluated<'_>) -> HarnessResult<()> {
        let name = self.name();
        let expression = evaluated.expression;
        let mut reported_unexposed = FxHashSet::default();

        for member in &self.interface.members {
            if member.is_untested() {
                continue;
            }
            let property = member.name.as_str();
            if !self.member_exposed(member)? {
                if reported_unexposed.insert(property) {
                    runner.subset_test(
                        name,
                        format!("{name} interface: {expression} must not have property \"{property}\""),
                        |ctx| {
                            let value = evaluated.evaluated(ctx)?;
                            let object = ctx.assert_object(&value, expression)?;
                            let present = ctx.has(object, property)?;
                            ctx.assert_false(present, &format!("{expression} has property \"{property}\""))
                        },
                    );
                }
                continue;
            }

            let named = !property.is_empty();
            let own_label = format!("{name} interface: {expression} must have own property \"{property}\"");
            if member.kind == MemberKind::Attribute && member.is_unforgeable() {
                runner.subset_test(name, own_label, |ctx| {
                    let object = evaluated.object(ctx)?;
                    self.assert_attribute(ctx, object, member)
                });
            } else if member.kind == MemberKind::Operation && named && member.is_unforgeable() {
                runner.subset_test(name, own_label, |ctx| {
                    let object = evaluated.object(ctx)?;
                    ctx.assert_own_property(object, property, "Doesn't have the unforgeable operation property")?;
                    self.assert_operation(ctx, object, member)
                });
            } else if named
                && matches!(member.kind, MemberKind::Const | MemberKind::Attribute | MemberKind::Operation)
            {
                let described = if member.is_operation() {
                    member.signature()
                } else {
                    property.to_string()
                };
                runner.subset_test(
                    name,
                    format!("{name} interface: {expression} must inherit property \"{described}\" with the proper type"),
                    |ctx| self.check_inherited_member(ctx, evaluated, member),
                );
            }

            if member.is_operation() && named && !member.arguments.is_empty() {
                runner.subset_test(
                    name,
                    format!(
                        "{name} interface: calling {} on {expression} with too few arguments must throw TypeError",
                        member.signature()
                    ),
                    |ctx| self.check_too_few_arguments(ctx, evaluated, member),
                );
            }

            if member.is_to_json_regular_operation() {
                self.test_to_json_operation(runner, evaluated, member);
            }
        }
        Ok(())
    }

    fn check_inherited_member(
        &self,
        ctx: &mut TestContext<'_>,
        evaluated: &Evaluated<'_>,
        member: &IdlMember,
    ) -> CheckResult {
        let object = evaluated.object(ctx)?;
        if member.is_static() {
            return Ok(());
        }
        let property = member.name.as_str();
        if self.interface.is_global() {
            ctx.assert_own_property(object, property, property)?;
        } else {
            ctx.assert_inherits(object, property, property)?;
        }

        match member.kind {
            MemberKind::Const => {
                let value = ctx.get(object, property)?;
                ctx.assert_equals(&value, &constant_value(member.value.as_ref()), "property has wrong value")
            }
            MemberKind::Attribute => {
                // Getters may legitimately throw; only a returned value is
                // checked against the declared type.
                let key = PropertyKey::from(property);
                let Ok(value) = ctx.realm().get(object, &key) else {
                    return Ok(());
                };
                match member.idl_type() {
                    Some(ty) => self.registry.assert_type_is(ctx, &value, ty),
                    None => Ok(()),
                }
            }
            MemberKind::Operation => {
                let value = ctx.get(object, property)?;
                ctx.assert_typeof(&value, "function", property)
            }
            _ => Ok(()),
        }
    }

    fn check_too_few_arguments(
        &self,
        ctx: &mut TestContext<'_>,
        evaluated: &Evaluated<'_>,
        member: &IdlMember,
    ) -> CheckResult {
        let receiver = evaluated.value(ctx)?;
        let object = ctx.assert_object(&receiver, evaluated.expression)?;
        let property = member.name.as_str();

        let function = if member.is_static() {
            let constructor = ctx.get(object, "constructor")?;
            let constructor = ctx.assert_object(&constructor, "constructor")?;
            ctx.assert_own_property(
                constructor,
                property,
                "interface object must have static operation as own property",
            )?;
            ctx.get(constructor, property)?
        } else {
            if self.interface.is_global() || member.is_unforgeable() {
                ctx.assert_own_property(object, property, property)?;
            } else {
                ctx.assert_inherits(object, property, property)?;
            }
            ctx.get(object, property)?
        };

        let promise = member.returns_promise();
        let mut args = Vec::new();
        for i in 0..self.overload_length(member) {
            ctx.throw_or_reject(promise, &format!("Called with {i} arguments"), |realm| {
                realm.call(&function, &receiver, &args)
            })?;
            if let Some(argument) = member.arguments.get(i) {
                let value = create_suitable_object(ctx.realm(), &argument.idl_type);
                args.push(value);
            }
        }
        Ok(())
    }
}
