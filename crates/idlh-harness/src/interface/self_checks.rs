//! Interface object and interface prototype object checks.

use idlh_ast::{ExtAttr, Special};
use idlh_common::GlobalScope;
use idlh_host::{Intrinsic, ObjectId, PropertyKey, Value, WellKnownSymbol};

use super::{DataShape, InterfaceTester, assert_data_shape, assert_function_length, assert_function_name};
use crate::error::{CheckResult, HarnessError, HarnessResult};
use crate::member::min_overload_length;
use crate::names;
use crate::runner::{TestContext, TestRunner};
use crate::suitable::create_suitable_object;

impl InterfaceTester<'_> {
    pub(super) fn test_self(&self, runner: &mut TestRunner<'_>) -> HarnessResult<()> {
        let interface = self.interface;
        let name = self.name();

        let this = *self;
        runner.subset_test(name, format!("{name} interface: existence and properties of interface object"), move |ctx| {
            this.check_interface_object(ctx)
        });

        if !interface.is_callback() {
            runner.subset_test(name, format!("{name} interface object length"), move |ctx| {
                let interface_object = this.interface_object(ctx)?;
                let desc = ctx.assert_own_property(interface_object, "length", &format!("{name}.length"))?;
                assert_data_shape(ctx, &desc, &format!("{name}.length"), DataShape::READONLY_HIDDEN)?;
                let expected = this.interface.constructor_length();
                assert_function_length(ctx, interface_object, expected, &format!("wrong value for {name}.length"))
            });
        }

        if !interface.is_callback() || interface.has_constants() {
            runner.subset_test(name, format!("{name} interface object name"), move |ctx| {
                let interface_object = this.interface_object(ctx)?;
                let desc = ctx.assert_own_property(interface_object, "name", &format!("{name}.name"))?;
                assert_data_shape(ctx, &desc, &format!("{name}.name"), DataShape::READONLY_HIDDEN)?;
                assert_function_name(ctx, interface_object, name, &format!("wrong value for {name}.name"))
            });
        }

        if interface.has_extended_attribute(names::LEGACY_WINDOW_ALIAS) {
            let aliases = self.legacy_window_aliases()?;
            runner.subset_test(name, format!("{name} interface: legacy window alias"), move |ctx| {
                this.check_legacy_window_aliases(ctx, &aliases)
            });
        }

        if let Some(factory) = self.legacy_factory_function()? {
            self.test_legacy_factory_function(runner, factory);
        }

        runner.subset_test(
            name,
            format!("{name} interface: existence and properties of interface prototype object"),
            move |ctx| this.check_prototype_object(ctx),
        );

        if interface.is_global() {
            self.test_immutable_prototype(runner, "interface prototype object", move |ctx: &mut TestContext<'_>| {
                let interface_object = this.interface_object(ctx)?;
                this.prototype_object(ctx, interface_object)
            });
        }

        runner.subset_test(
            name,
            format!("{name} interface: existence and properties of interface prototype object's \"constructor\" property"),
            move |ctx| this.check_constructor_property(ctx),
        );

        runner.subset_test(
            name,
            format!("{name} interface: existence and properties of interface prototype object's @@unscopables property"),
            move |ctx| this.check_unscopables(ctx),
        );
        Ok(())
    }

    fn check_interface_object(&self, ctx: &mut TestContext<'_>) -> CheckResult {
        let interface = self.interface;
        if interface.is_callback_without_constants() {
            return Ok(());
        }
        let desc = self.interface_object_property(ctx)?;
        let shown = format!("self's property \"{}\"", self.name());
        assert_data_shape(ctx, &desc, &shown, DataShape::HIDDEN)?;
        let interface_object = self.interface_object(ctx)?;
        let prototype = ctx.prototype_of(interface_object)?;
        let function_prototype = ctx.intrinsic(Intrinsic::FunctionPrototype);

        if interface.is_callback() {
            return ctx.assert_same_object(
                prototype,
                Some(function_prototype),
                &format!("prototype of {shown} is not Function.prototype"),
            );
        }

        ctx.assert_class_string(
            &Value::Object(interface_object),
            "Function",
            &format!("class string of {}", self.name()),
        )?;

        match &interface.base {
            Some(base) => {
                let parent = self
                    .registry
                    .interface(base)
                    .ok_or_else(|| HarnessError::InterfaceNotFound {
                        interface: base.clone(),
                        name: self.name().to_string(),
                    })?;
                if parent.has_interface_object() {
                    let parent_object = self.for_interface(parent).interface_object(ctx)?;
                    ctx.assert_same_object(
                        prototype,
                        Some(parent_object),
                        &format!("prototype of {} is not {base}", self.name()),
                    )?;
                }
            }
            None => ctx.assert_same_object(
                prototype,
                Some(function_prototype),
                &format!("prototype of {shown} is not Function.prototype"),
            )?,
        }

        if !interface.has_constructor() {
            let callee = Value::Object(interface_object);
            let call_target = callee.clone();
            ctx.assert_throws_js("interface object didn't throw TypeError when called as a function", |realm| {
                realm.call(&call_target, &Value::Undefined, &[])
            })?;
            ctx.assert_throws_js("interface object didn't throw TypeError when called as a constructor", |realm| {
                realm.construct(&callee, &[])
            })?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // [LegacyWindowAlias]
    // -------------------------------------------------------------------------

    /// Alias names, after validating where the attribute may appear.
    fn legacy_window_aliases(&self) -> HarnessResult<Vec<String>> {
        let name = self.name();
        let attrs: Vec<&ExtAttr> = self
            .interface
            .ext_attrs
            .iter()
            .filter(|attr| names::LEGACY_WINDOW_ALIAS.contains(&attr.name.as_str()))
            .collect();
        if attrs.len() > 1 {
            return Err(HarnessError::InvalidIdl(format!(
                "multiple LegacyWindowAlias extended attributes on {name}"
            )));
        }
        if self.interface.is_callback() {
            return Err(HarnessError::InvalidIdl(format!(
                "LegacyWindowAlias extended attribute on non-interface {name}"
            )));
        }
        if !self.interface.exposure.contains("Window") {
            return Err(HarnessError::InvalidIdl(format!(
                "LegacyWindowAlias extended attribute on {name} which is not exposed in Window"
            )));
        }
        let aliases: Vec<String> = attrs
            .first()
            .map(|attr| attr.rhs_values().into_iter().map(str::to_string).collect())
            .unwrap_or_default();
        if aliases.is_empty() {
            return Err(HarnessError::InvalidIdl(format!(
                "LegacyWindowAlias extended attribute on {name} without identifier"
            )));
        }
        Ok(aliases)
    }

    fn check_legacy_window_aliases(&self, ctx: &mut TestContext<'_>, aliases: &[String]) -> CheckResult {
        let global = ctx.global();
        if self.scope != Some(GlobalScope::Window) {
            for alias in aliases {
                let present = ctx.has(global, alias)?;
                ctx.assert_false(present, &format!("{alias} should not exist"))?;
            }
            return Ok(());
        }
        let interface_object = Value::Object(self.interface_object(ctx)?);
        let qualified = self.interface.qualified_name();
        for alias in aliases {
            let present = ctx.has(global, alias)?;
            ctx.assert_true(present, &format!("{alias} should exist"))?;
            let value = ctx.get(global, alias)?;
            ctx.assert_equals(
                &value,
                &interface_object,
                &format!("self.{alias} should be the same value as self.{qualified}"),
            )?;
            let desc = ctx.assert_own_property(global, alias.as_str(), alias)?;
            let described = desc.value().cloned().unwrap_or_default();
            ctx.assert_equals(&described, &interface_object, &format!("wrong value in {alias} property descriptor"))?;
            assert_data_shape(ctx, &desc, alias, DataShape::HIDDEN)?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // [LegacyFactoryFunction]
    // -------------------------------------------------------------------------

    fn legacy_factory_function(&self) -> HarnessResult<Option<&ExtAttr>> {
        let mut factories = self
            .interface
            .ext_attrs
            .iter()
            .filter(|attr| names::FACTORY_FUNCTION.contains(&attr.name.as_str()));
        let Some(first) = factories.next() else {
            return Ok(None);
        };
        if factories.next().is_some() {
            return Err(HarnessError::Internal(
                "missing support for multiple LegacyFactoryFunction extended attributes".to_string(),
            ));
        }
        if first.rhs_identifier().is_none() {
            return Err(HarnessError::InvalidIdl(format!(
                "LegacyFactoryFunction extended attribute on {} without identifier",
                self.name()
            )));
        }
        Ok(Some(first))
    }

    fn test_legacy_factory_function(&self, runner: &mut TestRunner<'_>, factory: &ExtAttr) {
        let name = self.name();
        let this = *self;
        let Some(factory_name) = factory.rhs_identifier() else {
            return;
        };
        let min_length = min_overload_length([factory.arguments.as_slice()]);
        let arguments = factory.arguments.clone();

        runner.subset_test(name, format!("{name} interface: named constructor"), move |ctx| {
            let global = ctx.global();
            let desc = ctx.assert_own_property(global, factory_name, factory_name)?;
            let value = ctx.get(global, factory_name)?;
            let described = desc.value().cloned().unwrap_or_default();
            ctx.assert_equals(&described, &value, &format!("wrong value in {factory_name} property descriptor"))?;
            assert_data_shape(ctx, &desc, factory_name, DataShape::HIDDEN)
        });

        runner.subset_test(name, format!("{name} interface: named constructor object"), move |ctx| {
            let value = ctx.global_get(factory_name)?;
            ctx.assert_typeof(&value, "function", &format!("type of value in {factory_name} property descriptor"))?;
            let interface_object = Value::Object(this.interface_object(ctx)?);
            ctx.assert_not_equals(
                &value,
                &interface_object,
                &format!("wrong value in {factory_name} property descriptor"),
            )?;
            let factory_object = ctx.assert_object(&value, factory_name)?;
            let prototype = ctx.prototype_of(factory_object)?;
            let function_prototype = ctx.intrinsic(Intrinsic::FunctionPrototype);
            ctx.assert_same_object(
                prototype,
                Some(function_prototype),
                &format!("wrong value for {factory_name}'s prototype"),
            )
        });

        runner.subset_test(name, format!("{name} interface: named constructor prototype property"), move |ctx| {
            let interface_object = this.interface_object(ctx)?;
            let expected = Value::Object(this.prototype_object(ctx, interface_object)?);
            let value = ctx.global_get(factory_name)?;
            let factory_object = ctx.assert_object(&value, factory_name)?;
            let desc = ctx.assert_own_property(factory_object, "prototype", &format!("{factory_name}.prototype"))?;
            let described = desc.value().cloned().unwrap_or_default();
            ctx.assert_equals(&described, &expected, &format!("wrong value for {factory_name}.prototype"))?;
            assert_data_shape(ctx, &desc, "prototype", DataShape::FROZEN)
        });

        runner.subset_test(name, format!("{name} interface: named constructor name"), move |ctx| {
            let value = ctx.global_get(factory_name)?;
            let factory_object = ctx.assert_object(&value, factory_name)?;
            let desc = ctx.assert_own_property(factory_object, "name", &format!("{factory_name}.name"))?;
            let described = desc.value().cloned().unwrap_or_default();
            ctx.assert_equals(
                &described,
                &Value::String(factory_name.to_string()),
                &format!("wrong value for {factory_name}.name"),
            )?;
            assert_data_shape(ctx, &desc, "name", DataShape::READONLY_HIDDEN)
        });

        runner.subset_test(name, format!("{name} interface: named constructor length"), move |ctx| {
            let value = ctx.global_get(factory_name)?;
            let factory_object = ctx.assert_object(&value, factory_name)?;
            let desc = ctx.assert_own_property(factory_object, "length", &format!("{factory_name}.length"))?;
            let described = desc.value().cloned().unwrap_or_default();
            ctx.assert_equals(
                &described,
                &Value::Number(min_length as f64),
                &format!("wrong value for {factory_name}.length"),
            )?;
            assert_data_shape(ctx, &desc, "length", DataShape::READONLY_HIDDEN)
        });

        runner.subset_test(name, format!("{name} interface: named constructor without 'new'"), move |ctx| {
            let value = ctx.global_get(factory_name)?;
            ctx.assert_throws_js(&format!("{factory_name} called without 'new'"), |realm| {
                let args: Vec<Value> = arguments
                    .iter()
                    .map(|arg| create_suitable_object(realm, &arg.idl_type))
                    .collect();
                realm.call(&value, &Value::Undefined, &args)
            })
        });
    }

    // -------------------------------------------------------------------------
    // Interface prototype object
    // -------------------------------------------------------------------------

    fn check_prototype_object(&self, ctx: &mut TestContext<'_>) -> CheckResult {
        let interface = self.interface;
        let name = self.name();
        if interface.is_callback_without_constants() {
            return Ok(());
        }
        let interface_object = self.interface_object(ctx)?;
        if interface.is_callback() {
            return self.assert_no_prototype_property(ctx, interface_object);
        }
        let desc = ctx.assert_own_property(
            interface_object,
            "prototype",
            &format!("interface \"{name}\" does not have own property \"prototype\""),
        )?;
        assert_data_shape(ctx, &desc, &format!("{name}.prototype"), DataShape::FROZEN)?;
        let prototype = self.prototype_object(ctx, interface_object)?;
        let parent = ctx.prototype_of(prototype)?;

        // A [Global] interface with named properties inherits from its named
        // properties object.
        if interface.is_global() && self.supports_named_properties() {
            let expected = format!("{name}Properties");
            let parent = parent.map_or(Value::Null, Value::Object);
            return ctx.assert_class_string(
                &parent,
                &expected,
                &format!("Class name for prototype of {name}.prototype is not \"{expected}\""),
            );
        }

        let (inherited_name, inherited_object) = match &interface.base {
            Some(base) => {
                let base_interface = self
                    .registry
                    .interface(base)
                    .ok_or_else(|| HarnessError::InterfaceNotFound {
                        interface: base.clone(),
                        name: name.to_string(),
                    })?;
                if base_interface.has_interface_object() {
                    let object = self.for_interface(base_interface).interface_object(ctx)?;
                    (base.clone(), Some(Value::Object(object)))
                } else {
                    (base.clone(), None)
                }
            }
            None if name == "DOMException" => ("Error".to_string(), Some(ctx.global_get("Error")?)),
            None => ("Object".to_string(), Some(ctx.global_get("Object")?)),
        };

        let Some(inherited_object) = inherited_object else {
            // Without an interface object the parent prototype is only
            // reachable from here, so only its class string can be checked.
            let expected = format!("{inherited_name}Prototype");
            let parent = parent.map_or(Value::Null, Value::Object);
            return ctx.assert_class_string(
                &parent,
                &expected,
                &format!("Class name for prototype of {name}.prototype is not \"{expected}\""),
            );
        };
        ctx.assert_not_equals(
            &inherited_object,
            &Value::Undefined,
            &format!("should inherit from {inherited_name}, but there is no such property"),
        )?;
        let inherited = ctx.assert_object(&inherited_object, &inherited_name)?;
        ctx.assert_own_property(
            inherited,
            "prototype",
            &format!("should inherit from {inherited_name}, but that object has no \"prototype\" property"),
        )?;
        let expected = ctx.get(inherited, "prototype")?;
        ctx.assert_equals(
            &parent.map_or(Value::Null, Value::Object),
            &expected,
            &format!("prototype of {name}.prototype is not {inherited_name}.prototype"),
        )
    }

    /// A named getter (`getter T (DOMString name)`).
    fn supports_named_properties(&self) -> bool {
        self.interface.members.iter().any(|member| {
            member.special == Special::Getter
                && member
                    .arguments
                    .first()
                    .and_then(|arg| arg.idl_type.name())
                    .is_some_and(|ty| ty == "DOMString")
        })
    }

    fn check_constructor_property(&self, ctx: &mut TestContext<'_>) -> CheckResult {
        let name = self.name();
        let Some(prototype) = self.checked_prototype(ctx)? else {
            return Ok(());
        };
        let desc = ctx.assert_own_property(
            prototype,
            "constructor",
            &format!("{name}.prototype does not have own property \"constructor\""),
        )?;
        assert_data_shape(ctx, &desc, &format!("{name}.prototype.constructor"), DataShape::HIDDEN)?;
        let constructor = ctx.get(prototype, "constructor")?;
        let interface_object = Value::Object(self.interface_object(ctx)?);
        ctx.assert_equals(
            &constructor,
            &interface_object,
            &format!("{name}.prototype.constructor is not the same object as {name}"),
        )
    }

    fn check_unscopables(&self, ctx: &mut TestContext<'_>) -> CheckResult {
        let name = self.name();
        let Some(prototype) = self.checked_prototype(ctx)? else {
            return Ok(());
        };
        let expected = self.interface.unscopable_names();
        let key = WellKnownSymbol::Unscopables.key();
        let subject = format!("{name}.prototype[Symbol.unscopables]");
        if expected.is_empty() {
            let present = ctx.own_property(prototype, &key)?.is_some();
            return ctx.assert_false(present, &format!("{name}.prototype should not have @@unscopables"));
        }

        let desc = ctx.assert_own_property(
            prototype,
            key.clone(),
            &format!("{name}.prototype should have an @@unscopables property"),
        )?;
        assert_data_shape(
            ctx,
            &desc,
            &subject,
            DataShape {
                writable: false,
                enumerable: false,
                configurable: true,
            },
        )?;
        let value = desc.value().cloned().unwrap_or_default();
        let through_get = ctx.get_key(prototype, &key)?;
        ctx.assert_equals(&value, &through_get, &format!("{subject} should be in the descriptor"))?;
        ctx.assert_typeof(&value, "object", &format!("{subject} should be an object"))?;
        let unscopables = ctx.assert_object(&value, &subject)?;
        let unscopables_prototype = ctx.prototype_of(unscopables)?;
        ctx.assert_same_object(unscopables_prototype, None, &format!("{subject} should have a null prototype"))?;

        let keys = ctx.realm().own_property_keys(unscopables)?;
        let symbols = keys.iter().filter(|key| key.is_symbol()).count();
        ctx.assert_equals(
            &Value::Number(symbols as f64),
            &Value::Number(0.0),
            &format!("{subject} should have the right number of symbol-named properties"),
        )?;
        // Missing entries are caught by the per-member checks.
        for key in keys.iter().filter_map(PropertyKey::as_str) {
            ctx.assert_true(
                expected.contains(&key),
                &format!("{subject} has unexpected property \"{key}\""),
            )?;
        }
        Ok(())
    }

    /// The prototype object for checks that skip callback interfaces.
    fn checked_prototype(&self, ctx: &mut TestContext<'_>) -> CheckResult<Option<ObjectId>> {
        if self.interface.is_callback_without_constants() {
            return Ok(None);
        }
        self.member_holder_prototype(ctx)
    }
}
