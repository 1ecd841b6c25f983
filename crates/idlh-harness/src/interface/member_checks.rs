//! Checks for the properties each interface member creates.

use idlh_ast::{ConstKind, ConstValue, MemberKind};
use idlh_host::{Intrinsic, ObjectId, PropertyDescriptor, PropertyKey, Value, WellKnownSymbol};
use rustc_hash::FxHashSet;
use tracing::trace;

use super::{
    DataShape, InterfaceTester, assert_data_shape, assert_function_length, assert_function_name,
    assert_operation_shape, plain_object,
};
use crate::error::{CheckResult, HarnessResult};
use crate::member::IdlMember;
use crate::runner::{TestContext, TestRunner};
use crate::suitable::create_suitable_object;

// Method names and lengths added by iteration declarations.
const PAIR_ITERABLE_METHODS: &[(&str, usize)] = &[("entries", 0), ("keys", 0), ("values", 0), ("forEach", 1)];
const VALUE_ITERABLE_METHODS: &[&str] = &["entries", "keys", "values", "forEach"];
const ASYNC_VALUE_METHODS: &[(&str, usize)] = &[("values", 0)];
const ASYNC_PAIR_METHODS: &[(&str, usize)] = &[("entries", 0), ("keys", 0), ("values", 0)];
const READONLY_MAPLIKE_METHODS: &[(&str, usize)] =
    &[("entries", 0), ("keys", 0), ("values", 0), ("forEach", 1), ("get", 1), ("has", 1)];
const MAPLIKE_MUTATORS: &[(&str, usize)] = &[("set", 2), ("delete", 1), ("clear", 0)];
const READONLY_SETLIKE_METHODS: &[(&str, usize)] =
    &[("entries", 0), ("keys", 0), ("values", 0), ("forEach", 1), ("has", 1)];
const SETLIKE_MUTATORS: &[(&str, usize)] = &[("add", 1), ("delete", 1), ("clear", 0)];

/// The script value of a constant's literal.
pub(crate) fn constant_value(value: Option<&ConstValue>) -> Value {
    let Some(value) = value else {
        return Value::Undefined;
    };
    match value.kind {
        ConstKind::Number | ConstKind::Infinity | ConstKind::NaN => {
            value.as_number().map_or(Value::Undefined, Value::Number)
        }
        ConstKind::Boolean => value.value.as_bool().map_or(Value::Undefined, Value::Bool),
        ConstKind::Null => Value::Null,
        ConstKind::String => value
            .value
            .as_str()
            .map_or(Value::Undefined, |s| Value::String(s.to_string())),
        ConstKind::Other => Value::Undefined,
    }
}

impl InterfaceTester<'_> {
    pub(super) fn test_members(&self, runner: &mut TestRunner<'_>) -> HarnessResult<()> {
        let mut exposed_names = FxHashSet::default();
        for member in &self.interface.members {
            if self.member_exposed(member)? {
                exposed_names.insert(member.name.as_str());
            }
        }

        let mut reported_unexposed = FxHashSet::default();
        for member in &self.interface.members {
            if member.is_untested() {
                continue;
            }
            if !self.member_exposed(member)? {
                // Overloads exposed elsewhere keep the property alive.
                if !exposed_names.contains(member.name.as_str()) && reported_unexposed.insert(member.name.as_str()) {
                    self.test_unexposed_member(runner, member);
                }
                continue;
            }
            trace!(interface = %self.name(), member = %member.name, kind = member.kind.as_str(), "member checks");
            match member.kind {
                MemberKind::Const => self.test_member_const(runner, member),
                MemberKind::Attribute => {
                    // Unforgeable attributes live on instances and are
                    // checked through add_objects.
                    if !member.is_unforgeable() {
                        self.test_member_attribute(runner, member);
                    }
                    if member.is_stringifier() {
                        self.test_member_stringifier(runner, member);
                    }
                }
                MemberKind::Operation => {
                    if !member.name.is_empty() {
                        if !member.is_unforgeable() {
                            self.test_member_operation(runner, member);
                        }
                    } else if member.is_stringifier() {
                        self.test_member_stringifier(runner, member);
                    }
                }
                MemberKind::Iterable if member.is_async => self.test_member_async_iterable(runner, member),
                MemberKind::Iterable => self.test_member_iterable(runner, member),
                MemberKind::Maplike | MemberKind::Setlike => self.test_member_collection(runner, member),
                _ => {}
            }
        }
        Ok(())
    }

    fn test_unexposed_member(&self, runner: &mut TestRunner<'_>, member: &IdlMember) {
        let name = self.name();
        let this = *self;
        let property = member.name.as_str();
        runner.subset_test(name, format!("{name} interface: member {property}"), move |ctx| {
            let interface_object = this.interface_object(ctx)?;
            let on_interface_object = ctx.has(interface_object, property)?;
            ctx.assert_false(
                on_interface_object,
                &format!("The interface object must not have a property \"{property}\""),
            )?;
            if this.interface.is_callback() {
                return Ok(());
            }
            let prototype = this.prototype_object(ctx, interface_object)?;
            let on_prototype = ctx.has(prototype, property)?;
            ctx.assert_false(
                on_prototype,
                &format!("The prototype object must not have a property \"{property}\""),
            )
        });
    }

    // -------------------------------------------------------------------------
    // Constants
    // -------------------------------------------------------------------------

    fn test_member_const(&self, runner: &mut TestRunner<'_>, member: &IdlMember) {
        let name = self.name();
        let this = *self;
        runner.subset_test(
            name,
            format!("{name} interface: constant {} on interface object", member.name),
            move |ctx| {
                let interface_object = this.interface_object(ctx)?;
                assert_constant(ctx, interface_object, member)
            },
        );
        runner.subset_test(
            name,
            format!("{name} interface: constant {} on interface prototype object", member.name),
            move |ctx| {
                let Some(prototype) = this.member_holder_prototype(ctx)? else {
                    return Ok(());
                };
                assert_constant(ctx, prototype, member)
            },
        );
    }

    // -------------------------------------------------------------------------
    // Attributes
    // -------------------------------------------------------------------------

    fn test_member_attribute(&self, runner: &mut TestRunner<'_>, member: &IdlMember) {
        let name = self.name();
        let this = *self;
        runner.subset_test(name, format!("{name} interface: attribute {}", member.name), move |ctx| {
            this.check_attribute(ctx, member)
        });
    }

    fn check_attribute(&self, ctx: &mut TestContext<'_>, member: &IdlMember) -> CheckResult {
        if self.interface.is_callback_without_constants() {
            return Ok(());
        }
        let interface_object = self.interface_object(ctx)?;
        let Some(prototype) = self.member_holder_prototype(ctx)? else {
            return Ok(());
        };
        let attribute = member.name.as_str();

        if member.is_static() {
            ctx.assert_own_property(
                interface_object,
                attribute,
                &format!("The interface object must have a property \"{attribute}\""),
            )?;
            return Ok(());
        }

        self.assert_unscopable(ctx, prototype, member)?;

        if self.interface.is_global() {
            let global = ctx.global();
            let desc = ctx.assert_own_property(
                global,
                attribute,
                &format!("The global object must have a property \"{attribute}\""),
            )?;
            let on_prototype = ctx.has(prototype, attribute)?;
            ctx.assert_false(
                on_prototype,
                &format!("The prototype object should not have a property \"{attribute}\""),
            )?;
            let getter = desc.getter().unwrap_or_default();
            ctx.assert_typeof(&getter, "function", &format!("\"{attribute}\" must have a getter"))?;

            // The get may legitimately throw; only compare when it does not.
            let key = PropertyKey::from(attribute);
            if let Ok(value) = ctx.realm().get(global, &key) {
                let direct = ctx.call(&getter, &Value::Undefined, &[])?;
                ctx.assert_equals(&value, &direct, "Gets on a global should not require an explicit this")?;
            }
            return self.assert_attribute(ctx, global, member);
        }

        let present = ctx.has(prototype, attribute)?;
        ctx.assert_true(present, &format!("The prototype object must have a property \"{attribute}\""))?;
        let key = PropertyKey::from(attribute);
        if member.is_lenient_this() {
            let value = ctx.get(prototype, attribute)?;
            ctx.assert_equals(
                &value,
                &Value::Undefined,
                "getting property on prototype object must return undefined",
            )?;
        } else {
            ctx.throw_or_reject(
                member.returns_promise(),
                "getting property on prototype object must throw TypeError",
                |realm| realm.get(prototype, &key),
            )?;
        }
        self.assert_attribute(ctx, prototype, member)
    }

    /// The accessor property an attribute creates on `holder`.
    pub(super) fn assert_attribute(&self, ctx: &mut TestContext<'_>, holder: ObjectId, member: &IdlMember) -> CheckResult {
        let attribute = member.name.as_str();
        let desc = ctx.assert_own_property(holder, attribute, attribute)?;
        ctx.assert_false(
            desc.value().is_some(),
            "property descriptor should not have a \"value\" field",
        )?;
        ctx.assert_false(
            desc.writable().is_some(),
            "property descriptor should not have a \"writable\" field",
        )?;
        ctx.assert_true(desc.enumerable(), "property should be enumerable")?;
        if member.is_unforgeable() {
            ctx.assert_false(desc.configurable(), "[LegacyUnforgeable] property must not be configurable")?;
        } else {
            ctx.assert_true(desc.configurable(), "property must be configurable")?;
        }

        let getter = desc.getter().unwrap_or_default();
        let getter_object = ctx.assert_function(&getter, "getter must be Function")?;
        if !member.is_static() {
            let receiver = plain_object(ctx);
            if member.is_lenient_this() {
                let value = ctx.call(&getter, &receiver, &[])?;
                ctx.assert_equals(
                    &value,
                    &Value::Undefined,
                    "calling getter on wrong object type must return undefined",
                )?;
            } else {
                let promise = member.returns_promise();
                let description = if promise {
                    "calling getter on wrong object type must reject the return promise with TypeError"
                } else {
                    "calling getter on wrong object type must throw TypeError"
                };
                ctx.throw_or_reject(promise, description, |realm| realm.call(&getter, &receiver, &[]))?;
            }
        }
        assert_function_length(ctx, getter_object, 0, "getter length must be 0")?;
        assert_function_name(
            ctx,
            getter_object,
            &format!("get {attribute}"),
            &format!("getter must have the name 'get {attribute}'"),
        )?;

        let setter = desc.setter().unwrap_or_default();
        if member.readonly && !member.has_setter_despite_readonly() {
            return ctx.assert_equals(&setter, &Value::Undefined, "setter must be undefined for readonly attributes");
        }
        let setter_object = ctx.assert_function(
            &setter,
            "setter must be function for PutForwards, Replaceable, or non-readonly attributes",
        )?;
        if !member.is_static() {
            let receiver = plain_object(ctx);
            if member.is_lenient_this() {
                let value = ctx.call(&setter, &receiver, &[])?;
                ctx.assert_equals(
                    &value,
                    &Value::Undefined,
                    "calling setter on wrong object type must return undefined",
                )?;
            } else {
                ctx.assert_throws_js("calling setter on wrong object type must throw TypeError", |realm| {
                    realm.call(&setter, &receiver, &[])
                })?;
            }
        }
        assert_function_length(ctx, setter_object, 1, "setter length must be 1")?;
        assert_function_name(
            ctx,
            setter_object,
            &format!("set {attribute}"),
            &format!("The attribute setter must have the name 'set {attribute}'"),
        )
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    fn test_member_operation(&self, runner: &mut TestRunner<'_>, member: &IdlMember) {
        let name = self.name();
        let this = *self;
        runner.subset_test(name, format!("{name} interface: operation {}", member.signature()), move |ctx| {
            this.check_operation(ctx, member)
        });
    }

    fn check_operation(&self, ctx: &mut TestContext<'_>, member: &IdlMember) -> CheckResult {
        if self.interface.is_callback_without_constants() {
            return Ok(());
        }
        let interface_object = self.interface_object(ctx)?;
        let Some(prototype) = self.member_holder_prototype(ctx)? else {
            return Ok(());
        };
        let operation = member.name.as_str();
        let holder = if member.is_static() {
            ctx.assert_own_property(interface_object, operation, "interface object missing static operation")?;
            interface_object
        } else if self.interface.is_global() {
            let global = ctx.global();
            ctx.assert_own_property(global, operation, "global object missing non-static operation")?;
            global
        } else {
            ctx.assert_own_property(prototype, operation, "interface prototype object missing non-static operation")?;
            prototype
        };
        self.assert_unscopable(ctx, prototype, member)?;
        self.assert_operation(ctx, holder, member)
    }

    /// The function property an operation creates on `holder`.
    pub(super) fn assert_operation(&self, ctx: &mut TestContext<'_>, holder: ObjectId, member: &IdlMember) -> CheckResult {
        let operation = member.name.as_str();
        let desc = ctx.assert_own_property(holder, operation, operation)?;
        assert_operation_shape(ctx, &desc, member.is_unforgeable())?;
        let function = ctx.get(holder, operation)?;
        ctx.assert_typeof(&function, "function", "property must be a function")?;
        let function_object = ctx.assert_object(&function, operation)?;
        assert_function_length(ctx, function_object, self.overload_length(member), "property has wrong .length")?;

        if member.is_static() {
            return Ok(());
        }
        let args: Vec<Value> = member
            .arguments
            .iter()
            .map(|arg| create_suitable_object(ctx.realm(), &arg.idl_type))
            .collect();
        let promise = member.returns_promise();

        // Anything reachable from the global has implicit-this behavior.
        if !self.interface.is_global() {
            let global = ctx.global();
            let on_global = ctx.get(global, operation)?;
            if !function.same_value(&on_global) {
                ctx.throw_or_reject(
                    promise,
                    "calling operation with this = null didn't throw TypeError",
                    |realm| realm.call(&function, &Value::Null, &args),
                )?;
            }
        }
        let receiver = plain_object(ctx);
        ctx.throw_or_reject(
            promise,
            "calling operation with this = {} didn't throw TypeError",
            |realm| realm.call(&function, &receiver, &args),
        )
    }

    /// `[Unscopable]` members must be listed in `@@unscopables` as `true`.
    fn assert_unscopable(&self, ctx: &mut TestContext<'_>, prototype: ObjectId, member: &IdlMember) -> CheckResult {
        if !member.is_unscopable() {
            return Ok(());
        }
        let subject = format!("{}.prototype[Symbol.unscopables].{}", self.name(), member.name);
        let unscopables = ctx.get_key(prototype, &WellKnownSymbol::Unscopables.key())?;
        let unscopables = ctx.assert_object(&unscopables, &format!("{subject} must exist"))?;
        let Some(desc) = ctx.own_property(unscopables, &PropertyKey::from(member.name.as_str()))? else {
            return ctx.assert_unreached(&format!("{subject} must exist"));
        };
        ctx.assert_false(desc.getter().is_some(), &format!("{subject} must have no getter"))?;
        ctx.assert_false(desc.setter().is_some(), &format!("{subject} must have no setter"))?;
        ctx.assert_true(desc.writable() == Some(true), &format!("{subject} must be writable"))?;
        ctx.assert_true(desc.enumerable(), &format!("{subject} must be enumerable"))?;
        ctx.assert_true(desc.configurable(), &format!("{subject} must be configurable"))?;
        let value = desc.value().cloned().unwrap_or_default();
        ctx.assert_equals(&value, &Value::Bool(true), &format!("{subject} must have the value `true`"))
    }

    // -------------------------------------------------------------------------
    // Stringifiers
    // -------------------------------------------------------------------------

    fn test_member_stringifier(&self, runner: &mut TestRunner<'_>, member: &IdlMember) {
        let name = self.name();
        let this = *self;
        runner.subset_test(name, format!("{name} interface: stringifier"), move |ctx| {
            if this.interface.is_callback_without_constants() {
                return Ok(());
            }
            let Some(prototype) = this.member_holder_prototype(ctx)? else {
                return Ok(());
            };
            let desc = ctx.assert_own_property(
                prototype,
                "toString",
                "interface prototype object missing non-static operation",
            )?;
            assert_operation_shape(ctx, &desc, member.is_unforgeable())?;
            let function = ctx.get(prototype, "toString")?;
            let function_object = ctx.assert_function(&function, "property must be a function")?;
            assert_function_length(ctx, function_object, 0, "property has wrong .length")?;
            ctx.assert_throws_js("calling stringifier with this = null didn't throw TypeError", |realm| {
                realm.call(&function, &Value::Null, &[])
            })?;
            let receiver = plain_object(ctx);
            ctx.assert_throws_js("calling stringifier with this = {} didn't throw TypeError", |realm| {
                realm.call(&function, &receiver, &[])
            })
        });
    }

    // -------------------------------------------------------------------------
    // iterable, async iterable, maplike, setlike
    // -------------------------------------------------------------------------

    fn declaration_label(&self, keyword: &str, member: &IdlMember) -> String {
        let types: Vec<String> = member.idl_type.iter().map(ToString::to_string).collect();
        format!("{} interface: {keyword}<{}>", self.name(), types.join(", "))
    }

    fn test_member_iterable(&self, runner: &mut TestRunner<'_>, member: &IdlMember) {
        let this = *self;
        let pair = member.idl_type.len() == 2;
        runner.subset_test(self.name(), self.declaration_label("iterable", member), move |ctx| {
            let Some(prototype) = this.member_holder_prototype(ctx)? else {
                return Ok(());
            };
            let iterator = assert_iterator_property(
                ctx,
                prototype,
                WellKnownSymbol::Iterator,
                if pair { "entries" } else { "values" },
            )?;
            if pair {
                let entries = ctx.get(prototype, "entries")?;
                ctx.assert_equals(&entries, &iterator, "entries method should be the same as @@iterator method")?;
                return assert_methods(ctx, prototype, PAIR_ITERABLE_METHODS, false);
            }

            let array_prototype = ctx.intrinsic(Intrinsic::ArrayPrototype);
            let array_iterator = ctx.get_key(array_prototype, &WellKnownSymbol::Iterator.key())?;
            ctx.assert_equals(
                &iterator,
                &array_iterator,
                "@@iterator method should be the same as Array prototype's",
            )?;
            for method in VALUE_ITERABLE_METHODS {
                let ours = ctx.get(prototype, method)?;
                let arrays = ctx.get(array_prototype, method)?;
                ctx.assert_equals(
                    &ours,
                    &arrays,
                    &format!("{method} method should be the same as Array prototype's"),
                )?;
            }
            Ok(())
        });
    }

    fn test_member_async_iterable(&self, runner: &mut TestRunner<'_>, member: &IdlMember) {
        let this = *self;
        let pair = member.idl_type.len() == 2;
        runner.subset_test(self.name(), self.declaration_label("async iterable", member), move |ctx| {
            let Some(prototype) = this.member_holder_prototype(ctx)? else {
                return Ok(());
            };
            let target = if pair { "entries" } else { "values" };
            let iterator = assert_iterator_property(ctx, prototype, WellKnownSymbol::AsyncIterator, target)?;
            let method = ctx.get(prototype, target)?;
            ctx.assert_equals(
                &method,
                &iterator,
                &format!("{target} method should be the same as @@asyncIterator method"),
            )?;
            let methods = if pair { ASYNC_PAIR_METHODS } else { ASYNC_VALUE_METHODS };
            assert_methods(ctx, prototype, methods, false)
        });
    }

    fn test_member_collection(&self, runner: &mut TestRunner<'_>, member: &IdlMember) {
        let this = *self;
        let maplike = member.kind == MemberKind::Maplike;
        let (keyword, readonly_methods, mutators, iterator_target) = if maplike {
            ("maplike", READONLY_MAPLIKE_METHODS, MAPLIKE_MUTATORS, "entries")
        } else {
            ("setlike", READONLY_SETLIKE_METHODS, SETLIKE_MUTATORS, "values")
        };
        let readonly = member.readonly;
        runner.subset_test(self.name(), self.declaration_label(keyword, member), move |ctx| {
            let Some(prototype) = this.member_holder_prototype(ctx)? else {
                return Ok(());
            };
            assert_methods(ctx, prototype, readonly_methods, true)?;
            if readonly {
                for (method, _) in mutators {
                    let present = ctx.has(prototype, method)?;
                    ctx.assert_false(present, &format!("readonly {keyword} should not have a \"{method}\" method"))?;
                }
            } else {
                assert_methods(ctx, prototype, mutators, true)?;
            }

            let iterator = assert_iterator_property(ctx, prototype, WellKnownSymbol::Iterator, iterator_target)?;
            let target = ctx.get(prototype, iterator_target)?;
            ctx.assert_equals(
                &target,
                &iterator,
                &format!("{iterator_target} method should be the same as @@iterator method"),
            )?;

            let desc = ctx.assert_own_property(prototype, "size", "size")?;
            ctx.assert_true(desc.is_accessor(), "size should be an accessor property")?;
            ctx.assert_true(desc.enumerable(), "size should be enumerable")?;
            ctx.assert_true(desc.configurable(), "size should be configurable")?;
            let getter = desc.getter().unwrap_or_default();
            let getter_object = ctx.assert_function(&getter, "size getter must be Function")?;
            ctx.assert_equals(
                &desc.setter().unwrap_or_default(),
                &Value::Undefined,
                "size setter must be undefined",
            )?;
            assert_function_length(ctx, getter_object, 0, "size getter length must be 0")?;
            assert_function_name(ctx, getter_object, "get size", "size getter must have the name 'get size'")
        });
    }
}

/// A constant's data property on the interface object or prototype.
fn assert_constant(ctx: &mut TestContext<'_>, holder: ObjectId, member: &IdlMember) -> CheckResult {
    let constant = member.name.as_str();
    let desc = ctx.assert_own_property(holder, constant, constant)?;
    let value = ctx.get(holder, constant)?;
    ctx.assert_equals(&value, &constant_value(member.value.as_ref()), "property has wrong value")?;
    assert_data_shape(
        ctx,
        &desc,
        "property",
        DataShape {
            writable: false,
            enumerable: true,
            configurable: false,
        },
    )
}

/// `@@iterator` / `@@asyncIterator`: a hidden method named `name` with no
/// required arguments. Returns the function.
fn assert_iterator_property(
    ctx: &mut TestContext<'_>,
    prototype: ObjectId,
    symbol: WellKnownSymbol,
    name: &str,
) -> CheckResult<Value> {
    let key = symbol.key();
    let label = format!("{key}");
    let desc = ctx.assert_own_property(prototype, key, &label)?;
    assert_data_shape(ctx, &desc, &format!("{label} property"), DataShape::HIDDEN)?;
    let function = desc.value().cloned().unwrap_or_default();
    let function_object = ctx.assert_function(&function, &format!("{label} property should be a function"))?;
    assert_function_length(ctx, function_object, 0, &format!("{label} function object length should be 0"))?;
    assert_function_name(
        ctx,
        function_object,
        name,
        &format!("{label} function object should have the right name"),
    )?;
    Ok(function)
}

/// Each method is a writable, configurable function with the given length
/// and name. Maplike and setlike methods are also enumerable.
fn assert_methods(
    ctx: &mut TestContext<'_>,
    prototype: ObjectId,
    methods: &[(&str, usize)],
    enumerable: bool,
) -> CheckResult {
    for &(method, length) in methods {
        let desc = ctx.assert_own_property(prototype, method, &format!("{method} method"))?;
        ctx.assert_false(desc.is_accessor(), &format!("{method} should be a data property"))?;
        ctx.assert_true(desc.writable() == Some(true), &format!("{method} should be writable"))?;
        ctx.assert_true(desc.configurable(), &format!("{method} should be configurable"))?;
        if enumerable {
            ctx.assert_true(desc.enumerable(), &format!("{method} should be enumerable"))?;
        }
        let function = descriptor_value(&desc);
        let function_object = ctx.assert_function(&function, &format!("{method} should be a function"))?;
        assert_function_length(ctx, function_object, length, &format!("{method} function object length should be {length}"))?;
        assert_function_name(
            ctx,
            function_object,
            method,
            &format!("{method} function object should have the right name"),
        )?;
    }
    Ok(())
}

fn descriptor_value(desc: &PropertyDescriptor) -> Value {
    desc.value().cloned().unwrap_or_default()
}
