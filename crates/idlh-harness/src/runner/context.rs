//! The handle a check body works through.
//!
//! [`TestContext`] wraps the realm and offers the assertion primitives.
//! Failed assertions come back as `Err(Failure::Assertion)` so bodies can
//! use `?` and stop at the first failure, the way a thrown assertion ends a
//! test in script.

use idlh_host::{
    Intrinsic, ObjectId, PropertyDescriptor, PropertyKey, Realm, RealmExt, Thrown, Value,
    number_to_string,
};

use crate::error::{CheckResult, Failure};

/// Undo work a check did to the realm. Runs whether the check passed or not.
pub type Cleanup = Box<dyn FnOnce(&mut dyn Realm)>;

/// Work the runner finishes after the synchronous body returned.
#[derive(Clone, Debug, PartialEq)]
pub enum DeferredCheck {
    /// `promise` must end up rejected with a `TypeError`.
    RejectsWithTypeError { promise: Value, description: String },
}

pub struct TestContext<'a> {
    realm: &'a mut dyn Realm,
    pub(crate) cleanups: Vec<Cleanup>,
    pub(crate) deferred: Vec<DeferredCheck>,
}

/// Render a value for assertion messages: strings quoted, objects by
/// `typeof` and string conversion.
pub fn format_value(realm: &mut dyn Realm, value: &Value) -> String {
    match value {
        Value::Undefined => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) if *n == 0.0 && n.is_sign_negative() => "-0".to_string(),
        Value::Number(n) => number_to_string(*n),
        Value::String(s) => format!("\"{s}\""),
        Value::Symbol(_) => "symbol".to_string(),
        Value::Object(_) => {
            let kind = realm.type_of(value);
            let shown = match realm.to_string(value) {
                Ok(text) => text,
                Err(_) => realm
                    .class_string(value)
                    .unwrap_or_else(|_| "[object]".to_string()),
            };
            format!("{kind} \"{shown}\"")
        }
    }
}

fn fail<T>(message: String) -> CheckResult<T> {
    Err(Failure::assertion(message))
}

impl<'a> TestContext<'a> {
    pub(crate) fn new(realm: &'a mut dyn Realm) -> Self {
        Self {
            realm,
            cleanups: Vec::new(),
            deferred: Vec::new(),
        }
    }

    pub fn realm(&mut self) -> &mut dyn Realm {
        &mut *self.realm
    }

    pub fn add_cleanup(&mut self, cleanup: impl FnOnce(&mut dyn Realm) + 'static) {
        self.cleanups.push(Box::new(cleanup));
    }

    pub fn defer(&mut self, check: DeferredCheck) {
        self.deferred.push(check);
    }

    pub fn expect_rejection(&mut self, promise: Value, description: impl Into<String>) {
        self.defer(DeferredCheck::RejectsWithTypeError {
            promise,
            description: description.into(),
        });
    }

    // -------------------------------------------------------------------------
    // Reflection
    // -------------------------------------------------------------------------

    pub fn format(&mut self, value: &Value) -> String {
        format_value(&mut *self.realm, value)
    }

    pub fn type_of(&self, value: &Value) -> &'static str {
        self.realm.type_of(value)
    }

    pub fn global(&self) -> ObjectId {
        self.realm.global()
    }

    pub fn intrinsic(&self, which: Intrinsic) -> ObjectId {
        self.realm.intrinsic(which)
    }

    pub fn get(&mut self, object: ObjectId, name: &str) -> CheckResult<Value> {
        Ok(self.realm.get_named(object, name)?)
    }

    pub fn get_key(&mut self, object: ObjectId, key: &PropertyKey) -> CheckResult<Value> {
        Ok(self.realm.get(object, key)?)
    }

    pub fn has(&mut self, object: ObjectId, name: &str) -> CheckResult<bool> {
        Ok(self.realm.has_named(object, name)?)
    }

    pub fn own_property(
        &mut self,
        object: ObjectId,
        key: &PropertyKey,
    ) -> CheckResult<Option<PropertyDescriptor>> {
        Ok(self.realm.get_own_property(object, key)?)
    }

    pub fn prototype_of(&mut self, object: ObjectId) -> CheckResult<Option<ObjectId>> {
        Ok(self.realm.get_prototype_of(object)?)
    }

    pub fn global_get(&mut self, name: &str) -> CheckResult<Value> {
        Ok(self.realm.global_get(name)?)
    }

    pub fn global_has(&mut self, name: &str) -> CheckResult<bool> {
        Ok(self.realm.global_has(name)?)
    }

    pub fn call(&mut self, callee: &Value, this: &Value, args: &[Value]) -> CheckResult<Value> {
        Ok(self.realm.call(callee, this, args)?)
    }

    pub fn construct(&mut self, callee: &Value, args: &[Value]) -> CheckResult<Value> {
        Ok(self.realm.construct(callee, args)?)
    }

    pub fn instance_of(&mut self, value: &Value, constructor: &Value) -> CheckResult<bool> {
        Ok(self.realm.instance_of(value, constructor)?)
    }

    pub fn is_array(&self, value: &Value) -> bool {
        self.realm.is_array(value)
    }

    pub fn is_frozen(&self, object: ObjectId) -> bool {
        self.realm.is_frozen(object)
    }

    pub fn is_extensible(&self, object: ObjectId) -> bool {
        self.realm.is_extensible(object)
    }

    pub fn class_string(&mut self, value: &Value) -> CheckResult<String> {
        Ok(self.realm.class_string(value)?)
    }

    pub fn to_string(&mut self, value: &Value) -> CheckResult<String> {
        Ok(self.realm.to_string(value)?)
    }

    // -------------------------------------------------------------------------
    // Assertions
    // -------------------------------------------------------------------------

    pub fn assert_true(&mut self, condition: bool, description: &str) -> CheckResult {
        if condition {
            return Ok(());
        }
        fail(format!("assert_true: {description} expected true got false"))
    }

    pub fn assert_false(&mut self, condition: bool, description: &str) -> CheckResult {
        if !condition {
            return Ok(());
        }
        fail(format!("assert_false: {description} expected false got true"))
    }

    /// `Object.is` comparison.
    pub fn assert_equals(&mut self, actual: &Value, expected: &Value, description: &str) -> CheckResult {
        if actual.same_value(expected) {
            return Ok(());
        }
        let actual = self.format(actual);
        let expected = self.format(expected);
        fail(format!("assert_equals: {description} expected {expected} but got {actual}"))
    }

    pub fn assert_not_equals(&mut self, actual: &Value, unexpected: &Value, description: &str) -> CheckResult {
        if !actual.same_value(unexpected) {
            return Ok(());
        }
        let shown = self.format(actual);
        fail(format!("assert_not_equals: {description} got disallowed value {shown}"))
    }

    pub fn assert_str_equals(&mut self, actual: &str, expected: &str, description: &str) -> CheckResult {
        if actual == expected {
            return Ok(());
        }
        fail(format!(
            "assert_equals: {description} expected \"{expected}\" but got \"{actual}\""
        ))
    }

    pub fn assert_same_object(
        &mut self,
        actual: Option<ObjectId>,
        expected: Option<ObjectId>,
        description: &str,
    ) -> CheckResult {
        let actual = actual.map_or(Value::Null, Value::Object);
        let expected = expected.map_or(Value::Null, Value::Object);
        self.assert_equals(&actual, &expected, description)
    }

    pub fn assert_typeof(&mut self, value: &Value, expected: &str, description: &str) -> CheckResult {
        let actual = self.realm.type_of(value);
        if actual == expected {
            return Ok(());
        }
        fail(format!(
            "assert_equals: {description} expected \"{expected}\" but got \"{actual}\""
        ))
    }

    /// The value as an object, failing unless `typeof` is `"object"` or
    /// `"function"`.
    pub fn assert_object(&mut self, value: &Value, description: &str) -> CheckResult<ObjectId> {
        match value.as_object() {
            Some(object) => Ok(object),
            None => {
                let shown = self.format(value);
                fail(format!("{description}: expected an object but got {shown}"))
            }
        }
    }

    pub fn assert_function(&mut self, value: &Value, description: &str) -> CheckResult<ObjectId> {
        self.assert_typeof(value, "function", description)?;
        self.assert_object(value, description)
    }

    pub fn assert_own_property(
        &mut self,
        object: ObjectId,
        key: impl Into<PropertyKey>,
        description: &str,
    ) -> CheckResult<PropertyDescriptor> {
        let key = key.into();
        match self.own_property(object, &key)? {
            Some(desc) => Ok(desc),
            None => fail(format!(
                "assert_own_property: {description} expected property \"{key}\" missing"
            )),
        }
    }

    pub fn assert_no_own_property(
        &mut self,
        object: ObjectId,
        key: impl Into<PropertyKey>,
        description: &str,
    ) -> CheckResult {
        let key = key.into();
        if self.own_property(object, &key)?.is_none() {
            return Ok(());
        }
        fail(format!(
            "assert_false: {description} unexpected own property \"{key}\""
        ))
    }

    /// Present through the prototype chain but not as an own property.
    pub fn assert_inherits(&mut self, object: ObjectId, name: &str, description: &str) -> CheckResult {
        if self.own_property(object, &PropertyKey::from(name))?.is_some() {
            return fail(format!(
                "assert_inherits: {description} property \"{name}\" found on object expected in prototype chain"
            ));
        }
        if !self.has(object, name)? {
            return fail(format!(
                "assert_inherits: {description} property \"{name}\" not found in prototype chain"
            ));
        }
        Ok(())
    }

    /// `Object.prototype.toString.call(value) === "[object " + class + "]"`
    pub fn assert_class_string(&mut self, value: &Value, class: &str, description: &str) -> CheckResult {
        let actual = self.class_string(value)?;
        let expected = format!("[object {class}]");
        if actual == expected {
            return Ok(());
        }
        fail(format!(
            "assert_class_string: {description} expected \"{expected}\" but got \"{actual}\""
        ))
    }

    /// `f` must throw a `TypeError` from the realm under test.
    pub fn assert_throws_js<F>(&mut self, description: &str, f: F) -> CheckResult
    where
        F: FnOnce(&mut dyn Realm) -> Result<Value, Thrown>,
    {
        match f(&mut *self.realm) {
            Ok(_) => fail(format!(
                "assert_throws_js: {description} function did not throw"
            )),
            Err(Thrown(error)) => {
                if self.realm.is_type_error(&error) {
                    return Ok(());
                }
                let shown = self.format(&error);
                fail(format!(
                    "assert_throws_js: {description} threw {shown} which is not a TypeError"
                ))
            }
        }
    }

    /// Expect a `TypeError`: thrown synchronously, or for Promise-returning
    /// members, as a rejection settled after the body returns.
    pub fn throw_or_reject<F>(&mut self, promise: bool, description: &str, f: F) -> CheckResult
    where
        F: FnOnce(&mut dyn Realm) -> Result<Value, Thrown>,
    {
        if !promise {
            return self.assert_throws_js(description, f);
        }
        match f(&mut *self.realm) {
            Ok(value) => {
                if self.realm.promise_state(&value).is_none() {
                    let shown = self.format(&value);
                    return fail(format!("{description}: expected a promise but got {shown}"));
                }
                self.expect_rejection(value, description);
                Ok(())
            }
            Err(Thrown(error)) => {
                let shown = self.format(&error);
                fail(format!(
                    "{description}: should not throw {shown} but return a rejected promise"
                ))
            }
        }
    }

    pub fn assert_in_array(&mut self, actual: &str, expected: &[&str], description: &str) -> CheckResult {
        if expected.contains(&actual) {
            return Ok(());
        }
        fail(format!(
            "assert_in_array: {description} value \"{actual}\" not in array [{}]",
            expected.join(", ")
        ))
    }

    pub fn assert_unreached(&mut self, description: &str) -> CheckResult {
        fail(format!("assert_unreached: {description} Reached unreachable code"))
    }
}
