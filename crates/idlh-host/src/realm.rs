//! The `Realm` trait: ECMAScript reflection primitives the harness relies on.
//!
//! Every method mirrors one abstract operation or built-in:
//!
//! | method                | ECMAScript                                     |
//! |-----------------------|------------------------------------------------|
//! | `get_own_property`    | `Object.getOwnPropertyDescriptor(o, k)`        |
//! | `own_property_keys`   | `Reflect.ownKeys(o)`                           |
//! | `has_property`        | `k in o`                                       |
//! | `get`                 | `o[k]`                                         |
//! | `get_prototype_of`    | `Object.getPrototypeOf(o)`                     |
//! | `set_prototype_of`    | `Object.setPrototypeOf` / `__proto__` / `Reflect.setPrototypeOf` |
//! | `call` / `construct`  | `f.call(this, ...args)` / `new f(...args)`     |
//! | `type_of`             | `typeof v`                                     |
//! | `class_string`        | `Object.prototype.toString.call(v)`            |
//! | `to_string`           | `String(v)`                                    |
//! | `instance_of`         | `v instanceof c`                               |
//!
//! Abrupt completions surface as `Err(Thrown)`.

use idlh_common::GlobalScope;

use crate::value::{ObjectId, PromiseState, PropertyDescriptor, PropertyKey, Thrown, Value};

/// Intrinsic objects the harness compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intrinsic {
    /// `%Object.prototype%`
    ObjectPrototype,
    /// `%Function.prototype%`
    FunctionPrototype,
    /// `%Array.prototype%`
    ArrayPrototype,
    /// `%Error.prototype%`
    ErrorPrototype,
    /// `%TypeError%`
    TypeError,
}

/// The three ways script can attempt to change an object's `[[Prototype]]`.
///
/// Only `Reflect` reports failure as `false`; the other two throw a
/// `TypeError` when `[[SetPrototypeOf]]` returns false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrototypeMutation {
    /// `Object.setPrototypeOf(o, p)`
    ObjectSetPrototypeOf,
    /// `o.__proto__ = p` (the `Object.prototype.__proto__` setter)
    ProtoAccessor,
    /// `Reflect.setPrototypeOf(o, p)`
    Reflect,
}

pub trait Realm {
    /// Kind of the global object, or `None` when the host cannot tell.
    fn global_scope(&self) -> Option<GlobalScope>;

    /// The global object (`self`).
    fn global(&self) -> ObjectId;

    fn intrinsic(&self, which: Intrinsic) -> ObjectId;

    fn type_of(&self, value: &Value) -> &'static str;

    /// `Array.isArray(v)`
    fn is_array(&self, value: &Value) -> bool;

    /// `Object.isFrozen(o)`
    fn is_frozen(&self, object: ObjectId) -> bool;

    /// `Object.isExtensible(o)`
    fn is_extensible(&self, object: ObjectId) -> bool;

    fn get_own_property(
        &mut self,
        object: ObjectId,
        key: &PropertyKey,
    ) -> Result<Option<PropertyDescriptor>, Thrown>;

    fn own_property_keys(&mut self, object: ObjectId) -> Result<Vec<PropertyKey>, Thrown>;

    fn has_property(&mut self, object: ObjectId, key: &PropertyKey) -> Result<bool, Thrown>;

    fn get(&mut self, object: ObjectId, key: &PropertyKey) -> Result<Value, Thrown>;

    fn get_prototype_of(&mut self, object: ObjectId) -> Result<Option<ObjectId>, Thrown>;

    /// Attempt a prototype change through `via`. Returns the boolean result of
    /// `[[SetPrototypeOf]]` for `Reflect`, `true` for the throwing paths.
    fn set_prototype_of(
        &mut self,
        object: ObjectId,
        prototype: Option<ObjectId>,
        via: PrototypeMutation,
    ) -> Result<bool, Thrown>;

    fn call(&mut self, callee: &Value, this: &Value, args: &[Value]) -> Result<Value, Thrown>;

    fn construct(&mut self, callee: &Value, args: &[Value]) -> Result<Value, Thrown>;

    fn instance_of(&mut self, value: &Value, constructor: &Value) -> Result<bool, Thrown>;

    /// `Object.prototype.toString.call(v)`, e.g. `"[object Function]"`.
    fn class_string(&mut self, value: &Value) -> Result<String, Thrown>;

    /// `String(v)`
    fn to_string(&mut self, value: &Value) -> Result<String, Thrown>;

    /// `Object.create(proto)`
    fn create_object(&mut self, prototype: Option<ObjectId>) -> ObjectId;

    fn create_data_property(
        &mut self,
        object: ObjectId,
        key: PropertyKey,
        value: Value,
    ) -> Result<bool, Thrown>;

    /// `delete o[k]`
    fn delete_property(&mut self, object: ObjectId, key: &PropertyKey) -> Result<bool, Thrown>;

    /// Evaluate an object expression registered through `add_objects`.
    fn evaluate(&mut self, source: &str) -> Result<Value, Thrown>;

    /// Drain pending promise jobs.
    fn run_jobs(&mut self);

    /// State of a promise; `None` if `value` is not a promise.
    fn promise_state(&self, value: &Value) -> Option<PromiseState>;
}

/// String-keyed conveniences over [`Realm`].
pub trait RealmExt: Realm {
    fn get_named(&mut self, object: ObjectId, name: &str) -> Result<Value, Thrown> {
        self.get(object, &PropertyKey::from(name))
    }

    fn get_own_named(
        &mut self,
        object: ObjectId,
        name: &str,
    ) -> Result<Option<PropertyDescriptor>, Thrown> {
        self.get_own_property(object, &PropertyKey::from(name))
    }

    fn has_named(&mut self, object: ObjectId, name: &str) -> Result<bool, Thrown> {
        self.has_property(object, &PropertyKey::from(name))
    }

    /// `self[name]`
    fn global_get(&mut self, name: &str) -> Result<Value, Thrown> {
        let global = self.global();
        self.get_named(global, name)
    }

    /// `name in self`
    fn global_has(&mut self, name: &str) -> Result<bool, Thrown> {
        let global = self.global();
        self.has_named(global, name)
    }

    fn intrinsic_value(&self, which: Intrinsic) -> Value {
        Value::Object(self.intrinsic(which))
    }

    /// Whether `value` is an object inheriting from `%TypeError.prototype%`.
    fn is_type_error(&mut self, value: &Value) -> bool {
        let constructor = self.intrinsic_value(Intrinsic::TypeError);
        self.instance_of(value, &constructor).unwrap_or(false)
    }
}

impl<R: Realm + ?Sized> RealmExt for R {}
