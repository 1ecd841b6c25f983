//! `toJSON` checks.
//!
//! A `[Default]` `toJSON` collects the JSON-typed attributes of every
//! interface in the inheritance chain, base first. Mixin members are
//! already merged into their targets by the time checks run.

use idlh_ast::IdlType;
use idlh_host::Value;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use super::InterfaceTester;
use super::object_checks::Evaluated;
use crate::definitions::Definition;
use crate::error::{CheckResult, HarnessResult};
use crate::member::IdlMember;
use crate::names;
use crate::runner::{TestContext, TestRunner};

/// Attribute name to declared type, in output order.
pub(crate) type JsonAttributes = IndexMap<String, IdlType, FxBuildHasher>;

impl InterfaceTester<'_> {
    /// The attributes a default `toJSON` serializes, or `None` when the
    /// closest `toJSON` in the chain is not a default one.
    pub(crate) fn default_to_json_attributes(&self) -> HarnessResult<Option<JsonAttributes>> {
        let mut attributes = JsonAttributes::default();
        let mut is_default = false;
        for definition in self.registry.inheritance_stack(self.name())?.into_iter().rev() {
            let Definition::Interface(interface) = definition else {
                continue;
            };
            if interface.has_default_to_json_regular_operation() {
                is_default = true;
                for member in &interface.members {
                    if member.is_static() || !member.is_attribute() {
                        continue;
                    }
                    let Some(ty) = member.idl_type() else {
                        continue;
                    };
                    if self.registry.is_json_type(ty)? {
                        attributes.insert(member.name.clone(), ty.clone());
                    }
                }
            } else if interface.has_to_json_regular_operation() {
                is_default = false;
            }
        }
        Ok(is_default.then_some(attributes))
    }

    pub(super) fn test_to_json_operation(
        &self,
        runner: &mut TestRunner<'_>,
        evaluated: &Evaluated<'_>,
        member: &IdlMember,
    ) {
        let name = self.name();
        let expression = evaluated.expression;
        if member.has_extended_attribute(names::DEFAULT) {
            runner.subset_test(
                name,
                format!("{name} interface: default toJSON operation on {expression}"),
                |ctx| self.check_default_to_json(ctx, evaluated),
            );
        } else {
            runner.subset_test(name, format!("{name} interface: toJSON operation on {expression}"), |ctx| {
                let Some(ty) = member.idl_type() else {
                    return Ok(());
                };
                let is_json = self.registry.is_json_type(ty)?;
                ctx.assert_true(
                    is_json,
                    &format!("{ty} is not an appropriate return value for the toJSON operation of {expression}"),
                )?;
                let json = call_to_json(ctx, evaluated)?;
                self.registry.assert_type_is(ctx, &json, ty)
            });
        }
    }

    fn check_default_to_json(&self, ctx: &mut TestContext<'_>, evaluated: &Evaluated<'_>) -> CheckResult {
        let attributes = self.default_to_json_attributes()?.unwrap_or_default();
        let json = call_to_json(ctx, evaluated)?;
        let json = ctx.assert_object(&json, "toJSON() result")?;
        let name = self.name();
        for (key, ty) in &attributes {
            let present = ctx.has(json, key)?;
            ctx.assert_true(
                present,
                &format!("property \"{key}\" should be present in the output of {name}.prototype.toJSON()"),
            )?;
            let desc = ctx.assert_own_property(json, key.as_str(), key)?;
            ctx.assert_true(desc.writable() == Some(true), &format!("property {key} should be writable"))?;
            ctx.assert_true(desc.configurable(), &format!("property {key} should be configurable"))?;
            ctx.assert_true(desc.enumerable(), &format!("property {key} should be enumerable"))?;
            let value = ctx.get(json, key)?;
            self.registry.assert_type_is(ctx, &value, ty)?;
        }
        Ok(())
    }
}

/// `obj.toJSON()`
fn call_to_json(ctx: &mut TestContext<'_>, evaluated: &Evaluated<'_>) -> CheckResult<Value> {
    let receiver = evaluated.value(ctx)?;
    let object = ctx.assert_object(&receiver, evaluated.expression)?;
    let to_json = ctx.get(object, "toJSON")?;
    ctx.call(&to_json, &receiver, &[])
}
