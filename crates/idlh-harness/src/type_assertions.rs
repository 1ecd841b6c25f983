//! Checking live values against declared IDL types.
//!
//! Used for attribute values and `toJSON` results. Failures are assertion
//! failures; an IDL type the registry cannot resolve is a harness error.

use idlh_ast::IdlType;
use idlh_common::limits::MAX_TYPE_NESTING_DEPTH;
use idlh_host::{Value, number_to_string};

use crate::definitions::Definition;
use crate::error::{CheckResult, Failure, HarnessError};
use crate::registry::IdlArray;
use crate::runner::TestContext;

/// `Math.fround`
fn fround(n: f64) -> f64 {
    f64::from(n as f32)
}

/// Integer types with their inclusive ranges.
const INTEGER_RANGES: &[(&str, f64, f64)] = &[
    ("byte", -128.0, 127.0),
    ("octet", 0.0, 255.0),
    ("short", -32768.0, 32767.0),
    ("unsigned short", 0.0, 65535.0),
    ("long", -2_147_483_648.0, 2_147_483_647.0),
    ("unsigned long", 0.0, 4_294_967_295.0),
];

fn assert_integer(ctx: &mut TestContext<'_>, value: &Value, name: &str, min: f64, max: f64) -> CheckResult {
    ctx.assert_typeof(value, "number", name)?;
    let n = value.as_number().unwrap_or(f64::NAN);
    ctx.assert_equals(value, &Value::Number(n.floor()), "should be an integer")?;
    ctx.assert_true(
        min <= n && n <= max,
        &format!("{name} {} should be in range [{min}, {max}]", number_to_string(n)),
    )
}

fn assert_finite(ctx: &mut TestContext<'_>, value: &Value, name: &str) -> CheckResult {
    for disallowed in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
        ctx.assert_not_equals(value, &Value::Number(disallowed), name)?;
    }
    Ok(())
}

fn assert_fround_identity(ctx: &mut TestContext<'_>, value: &Value, name: &str) -> CheckResult {
    ctx.assert_typeof(value, "number", name)?;
    let n = value.as_number().unwrap_or(f64::NAN);
    ctx.assert_equals(
        value,
        &Value::Number(fround(n)),
        &format!("{name} rounded to 32-bit float should be itself"),
    )
}

/// `value[0]` when `value` is a non-empty array-like.
fn first_element(ctx: &mut TestContext<'_>, value: &Value) -> CheckResult<Option<Value>> {
    let Some(array) = value.as_object() else {
        return Ok(None);
    };
    let length = ctx.get(array, "length")?.as_number().unwrap_or(0.0);
    if length < 1.0 {
        return Ok(None);
    }
    Ok(Some(ctx.get(array, "0")?))
}

impl IdlArray {
    /// Assert that `value` is a valid value of `ty`.
    ///
    /// Unions accept the first member type that matches; only assertion
    /// failures move on to the next member.
    pub fn assert_type_is(&self, ctx: &mut TestContext<'_>, value: &Value, ty: &IdlType) -> CheckResult {
        self.check_type(ctx, value, ty, 0)
    }

    fn check_type(&self, ctx: &mut TestContext<'_>, value: &Value, ty: &IdlType, depth: u32) -> CheckResult {
        if depth > MAX_TYPE_NESTING_DEPTH {
            return Err(HarnessError::Internal(format!("type {ty} nests too deeply")).into());
        }
        if ty.nullable && matches!(value, Value::Null) {
            return Ok(());
        }

        if ty.union {
            for member in ty.arguments() {
                match self.check_type(ctx, value, member, depth + 1) {
                    Ok(()) => return Ok(()),
                    Err(Failure::Assertion(_)) => {}
                    Err(other) => return Err(other),
                }
            }
            let shown = ctx.format(value);
            return ctx.assert_true(
                false,
                &format!("Attribute has value {shown} which doesn't match any of the types in the union"),
            );
        }

        if !ty.generic.is_empty() {
            return self.check_generic(ctx, value, ty, depth);
        }

        let Some(name) = ty.name() else {
            return Err(HarnessError::UnexpectedType(ty.to_string()).into());
        };
        if name == "any" {
            return Ok(());
        }
        if let Some(&(_, min, max)) = INTEGER_RANGES.iter().find(|(n, ..)| *n == name) {
            return assert_integer(ctx, value, name, min, max);
        }
        match name {
            "undefined" | "void" => ctx.assert_equals(value, &Value::Undefined, name),
            "boolean" => ctx.assert_typeof(value, "boolean", name),
            "long long" | "unrestricted double" => ctx.assert_typeof(value, "number", name),
            "unsigned long long" | "DOMTimeStamp" => {
                ctx.assert_typeof(value, "number", name)?;
                let positive = value.as_number().is_some_and(|n| n >= 0.0);
                ctx.assert_true(positive, "unsigned long long should be positive")
            }
            "float" => {
                assert_fround_identity(ctx, value, name)?;
                assert_finite(ctx, value, name)
            }
            "unrestricted float" => assert_fround_identity(ctx, value, name),
            "double" | "DOMHighResTimeStamp" => {
                ctx.assert_typeof(value, "number", name)?;
                assert_finite(ctx, value, name)
            }
            // Host strings are always well formed, so USVString needs no
            // surrogate check.
            "DOMString" | "USVString" => ctx.assert_typeof(value, "string", name),
            "ByteString" => {
                ctx.assert_typeof(value, "string", name)?;
                let ascii = value.as_str().is_some_and(|s| s.chars().all(|c| u32::from(c) <= 0x7F));
                let shown = ctx.format(value);
                ctx.assert_true(ascii, &format!("ByteString {shown} should only contain code points up to U+007F"))
            }
            "object" => {
                let kind = ctx.type_of(value);
                ctx.assert_in_array(kind, &["object", "function"], "wrong type: not object or function")
            }
            _ => self.check_named(ctx, value, name, depth),
        }
    }

    fn check_generic(&self, ctx: &mut TestContext<'_>, value: &Value, ty: &IdlType, depth: u32) -> CheckResult {
        let element = ty.arguments().first();
        match ty.generic.as_str() {
            "sequence" | "ObservableArray" => {
                ctx.assert_true(ctx.is_array(value), "should be an Array")?;
            }
            "FrozenArray" => {
                ctx.assert_true(ctx.is_array(value), "Value should be array")?;
                let frozen = value.as_object().is_some_and(|o| ctx.is_frozen(o));
                ctx.assert_true(frozen, "Value should be frozen")?;
            }
            "Promise" => {
                let has_then = match value.as_object() {
                    Some(object) => ctx.has(object, "then")?,
                    None => false,
                };
                // Fulfillment values are not checked.
                return ctx.assert_true(has_then, "Attribute with a Promise type should have a then property");
            }
            "record" => return ctx.assert_typeof(value, "object", "record"),
            _ => return Err(HarnessError::UnexpectedType(ty.to_string()).into()),
        }
        let Some(element_type) = element else {
            return Err(HarnessError::UnexpectedType(ty.to_string()).into());
        };
        match first_element(ctx, value)? {
            Some(first) => self.check_type(ctx, &first, element_type, depth + 1),
            None => Ok(()),
        }
    }

    fn check_named(&self, ctx: &mut TestContext<'_>, value: &Value, name: &str, depth: u32) -> CheckResult {
        let Some(definition) = self.members.get(name) else {
            if name == "Function" {
                return ctx.assert_typeof(value, "function", name);
            }
            // Platform types declared elsewhere (ArrayBuffer, Error, ...) are
            // checked with instanceof when the global exposes them.
            if !ctx.global_has(name)? {
                return Err(HarnessError::UnrecognizedType(name.to_string()).into());
            }
            let constructor = ctx.global_get(name)?;
            let matches = value.as_object().is_some() && ctx.instance_of(value, &constructor)?;
            return ctx.assert_true(matches, &format!("instanceof {name}"));
        };
        match definition {
            Definition::Typedef(typedef) => self.check_type(ctx, value, &typedef.idl_type, depth + 1),
            Definition::Interface(interface) | Definition::Mixin(interface) => {
                let kind = ctx.type_of(value);
                ctx.assert_in_array(kind, &["object", "function"], "wrong type: not object or function")?;
                if interface.is_callback() || interface.is_mixin() || !interface.has_interface_object() {
                    return Ok(());
                }
                if value.as_object().is_some() && ctx.global_has(name)? {
                    let constructor = ctx.global_get(name)?;
                    let matches = ctx.instance_of(value, &constructor)?;
                    ctx.assert_true(matches, &format!("instanceof {name}"))?;
                }
                Ok(())
            }
            Definition::Enum(_) => ctx.assert_typeof(value, "string", name),
            Definition::Dictionary(_) => Ok(()),
            Definition::Callback(_) => ctx.assert_typeof(value, "function", name),
            Definition::Namespace(_) => Err(HarnessError::NotAnInterfaceOrDictionary(name.to_string()).into()),
        }
    }
}

#[cfg(test)]
#[path = "tests/type_assertions_tests.rs"]
mod tests;
