//! Checks generated for a namespace.

use idlh_ast::MemberKind;
use idlh_host::{Intrinsic, ObjectId, PropertyKey, Value};
use tracing::debug;

use crate::definitions::IdlNamespace;
use crate::error::{CheckResult, HarnessError, HarnessResult};
use crate::interface::{DataShape, assert_data_shape, assert_operation_shape};
use crate::member::{IdlMember, min_overload_length};
use crate::names;
use crate::runner::{TestContext, TestRunner};

/// Emit every check for `namespace`. A namespace that is not exposed only
/// gets an absence check; its members cannot be reached.
pub(crate) fn test(namespace: &IdlNamespace, runner: &mut TestRunner<'_>) -> HarnessResult<()> {
    for member in &namespace.members {
        if !matches!(member.kind, MemberKind::Attribute | MemberKind::Operation) {
            return Err(HarnessError::InvalidNamespaceMember {
                name: member.name.clone(),
                kind: member.kind.as_str().to_string(),
            });
        }
    }

    let name = namespace.name.as_str();
    if !namespace.exposed {
        if !namespace.untested {
            runner.subset_test(name, format!("{name} namespace: existence and properties of namespace object"), |ctx| {
                let present = ctx.global_has(name)?;
                ctx.assert_false(present, &format!("{name} namespace should not exist"))
            });
        }
        return Ok(());
    }

    debug!(namespace = %name, untested = namespace.untested, "testing namespace");
    if !namespace.untested {
        test_self(namespace, runner);
    }
    for member in namespace.members.iter().filter(|m| !m.is_untested()) {
        if member.is_operation() {
            test_member_operation(namespace, member, runner);
        } else {
            test_member_attribute(namespace, member, runner);
        }
    }
    Ok(())
}

fn namespace_object(ctx: &mut TestContext<'_>, name: &str) -> CheckResult<ObjectId> {
    let value = ctx.global_get(name)?;
    ctx.assert_object(&value, &format!("{name} namespace object"))
}

fn test_self(namespace: &IdlNamespace, runner: &mut TestRunner<'_>) {
    let name = namespace.name.as_str();

    runner.subset_test(name, format!("{name} namespace: extended attributes"), |ctx| {
        let applicable = namespace
            .ext_attrs
            .iter()
            .all(|attr| names::NAMESPACE_ATTRIBUTES.contains(&attr.name.as_str()));
        ctx.assert_true(
            applicable,
            "Only the [Exposed] and [SecureContext] extended attributes are applicable to namespaces",
        )?;
        let exposed = namespace.ext_attrs.iter().any(|attr| names::EXPOSED.contains(&attr.name.as_str()));
        ctx.assert_true(exposed, "Namespaces must be annotated with the [Exposed] extended attribute")
    });

    runner.subset_test(name, format!("{name} namespace: property descriptor"), |ctx| {
        let global = ctx.global();
        let desc = ctx.assert_own_property(global, name, name)?;
        let expected = ctx.global_get(name)?;
        let described = desc.value().cloned().unwrap_or_default();
        ctx.assert_equals(&described, &expected, &format!("wrong value for {name} namespace object"))?;
        assert_data_shape(ctx, &desc, "namespace object", DataShape::HIDDEN)
    });

    runner.subset_test(name, format!("{name} namespace: [[Extensible]] is true"), |ctx| {
        let object = namespace_object(ctx, name)?;
        let extensible = ctx.is_extensible(object);
        ctx.assert_true(extensible, &format!("{name} should be extensible"))
    });

    runner.subset_test(name, format!("{name} namespace: [[Prototype]] is Object.prototype"), |ctx| {
        let object = namespace_object(ctx, name)?;
        let object_prototype = ctx.intrinsic(Intrinsic::ObjectPrototype);
        let prototype = ctx.prototype_of(object)?;
        if name != "console" {
            return ctx.assert_same_object(prototype, Some(object_prototype), "prototype of namespace object");
        }
        // console has an empty intermediate prototype object.
        let Some(intermediate) = prototype else {
            return ctx.assert_unreached("console should have a prototype object");
        };
        let keys = ctx.realm().own_property_keys(intermediate)?;
        ctx.assert_equals(
            &Value::Number(keys.len() as f64),
            &Value::Number(0.0),
            "console's prototype should have no own properties",
        )?;
        let grandparent = ctx.prototype_of(intermediate)?;
        ctx.assert_same_object(grandparent, Some(object_prototype), "prototype of console's prototype")
    });

    runner.subset_test(name, format!("{name} namespace: typeof is \"object\""), |ctx| {
        let value = ctx.global_get(name)?;
        ctx.assert_typeof(&value, "object", &format!("typeof {name}"))
    });

    for property in ["length", "name"] {
        runner.subset_test(name, format!("{name} namespace: has no {property} property"), |ctx| {
            let object = namespace_object(ctx, name)?;
            let desc = ctx.own_property(object, &PropertyKey::from(property))?;
            ctx.assert_true(desc.is_none(), &format!("{property} property must be undefined"))
        });
    }
}

fn test_member_operation(namespace: &IdlNamespace, member: &IdlMember, runner: &mut TestRunner<'_>) {
    let name = namespace.name.as_str();
    let operation = member.name.as_str();
    runner.subset_test(
        name,
        format!("{name} namespace: operation {}", member.variadic_signature()),
        |ctx| {
            let object = namespace_object(ctx, name)?;
            let desc = ctx.assert_own_property(
                object,
                operation,
                &format!("namespace object missing operation \"{operation}\""),
            )?;
            assert_operation_shape(ctx, &desc, member.is_unforgeable())?;
            let function = ctx.get(object, operation)?;
            let function = ctx.assert_function(&function, "property must be a function")?;
            let length = ctx.get(function, "length")?;
            let expected = min_overload_length(namespace.operation_overloads(operation));
            ctx.assert_equals(&length, &Value::Number(expected as f64), "operation has wrong .length")
        },
    );
}

fn test_member_attribute(namespace: &IdlNamespace, member: &IdlMember, runner: &mut TestRunner<'_>) {
    let name = namespace.name.as_str();
    let attribute = member.name.as_str();
    runner.subset_test(name, format!("{name} namespace: attribute {attribute}"), |ctx| {
        let object = namespace_object(ctx, name)?;
        let desc = ctx.assert_own_property(
            object,
            attribute,
            &format!("{name} does not have property \"{attribute}\""),
        )?;
        let setter = desc.setter().unwrap_or_default();
        ctx.assert_equals(&setter, &Value::Undefined, "setter must be undefined for namespace members")
    });
}
