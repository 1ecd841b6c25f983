//! In-memory ECMAScript object heap.
//!
//! `MemoryRealm` implements just enough of the ECMAScript object model for
//! the harness: ordinary objects with ordered property tables, callable
//! objects backed by Rust closures, arrays, errors, promises, and the
//! immutable-prototype and `[[IsHTMLDDA]]` slots WebIDL platform objects can
//! carry. There is no parser: expressions passed to [`Realm::evaluate`] are
//! either pre-bound with [`MemoryRealm::bind_expression`] or resolved as
//! dotted property paths from the global object (`self.document.body`),
//! optionally prefixed with `new` (`new Foo()`).

pub mod bindings;

use std::collections::VecDeque;
use std::rc::Rc;

use idlh_common::GlobalScope;
use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::realm::{Intrinsic, PrototypeMutation, Realm};
use crate::value::{
    ObjectId, PromiseState, PropertyDescriptor, PropertyKey, SymbolId, Thrown, Value,
    WellKnownSymbol, number_to_string,
};

/// Native behaviour of a callable object: `(realm, this, arguments)`.
pub type NativeFn = Rc<dyn Fn(&mut MemoryRealm, &Value, &[Value]) -> Result<Value, Thrown>>;

/// Box a closure as a [`NativeFn`].
pub fn native<F>(f: F) -> NativeFn
where
    F: Fn(&mut MemoryRealm, &Value, &[Value]) -> Result<Value, Thrown> + 'static,
{
    Rc::new(f)
}

#[derive(Clone, Default)]
pub(crate) struct FunctionData {
    call: Option<NativeFn>,
    construct: Option<NativeFn>,
}

#[derive(Clone)]
enum ObjectKind {
    Ordinary,
    Array,
    Error,
    Function(FunctionData),
    Promise(PromiseState),
}

struct ObjectData {
    prototype: Option<ObjectId>,
    properties: IndexMap<PropertyKey, PropertyDescriptor, FxBuildHasher>,
    kind: ObjectKind,
    extensible: bool,
    immutable_prototype: bool,
    /// Interfaces this platform object implements.
    brands: FxHashSet<String>,
    /// `[[IsHTMLDDA]]` (`document.all`).
    html_dda: bool,
}

impl ObjectData {
    fn new(prototype: Option<ObjectId>, kind: ObjectKind) -> Self {
        Self {
            prototype,
            properties: IndexMap::default(),
            kind,
            extensible: true,
            immutable_prototype: false,
            brands: FxHashSet::default(),
            html_dda: false,
        }
    }

    fn is_callable(&self) -> bool {
        matches!(&self.kind, ObjectKind::Function(data) if data.call.is_some() || data.construct.is_some())
    }
}

#[derive(Clone, Copy)]
struct Intrinsics {
    object: ObjectId,
    object_prototype: ObjectId,
    function_prototype: ObjectId,
    array_prototype: ObjectId,
    error_prototype: ObjectId,
    type_error: ObjectId,
    type_error_prototype: ObjectId,
    promise_prototype: ObjectId,
}

/// Names that evaluate to the global object itself.
const GLOBAL_ALIASES: [&str; 3] = ["self", "globalThis", "window"];

pub struct MemoryRealm {
    objects: Vec<ObjectData>,
    scope: Option<GlobalScope>,
    global: ObjectId,
    intrinsics: Intrinsics,
    expressions: FxHashMap<String, Result<Value, Thrown>>,
    jobs: VecDeque<(ObjectId, PromiseState)>,
    next_symbol: u32,
    /// `[LegacyUnforgeable]` members copied onto every new instance.
    unforgeables: FxHashMap<String, Vec<(PropertyKey, PropertyDescriptor)>>,
}

impl MemoryRealm {
    /// A realm whose global object reports `scope` (or no known scope).
    pub fn new(scope: Option<GlobalScope>) -> Self {
        let placeholder = ObjectId(0);
        let mut realm = Self {
            objects: Vec::new(),
            scope,
            global: placeholder,
            intrinsics: Intrinsics {
                object: placeholder,
                object_prototype: placeholder,
                function_prototype: placeholder,
                array_prototype: placeholder,
                error_prototype: placeholder,
                type_error: placeholder,
                type_error_prototype: placeholder,
                promise_prototype: placeholder,
            },
            expressions: FxHashMap::default(),
            jobs: VecDeque::new(),
            next_symbol: SymbolId::FIRST_USER,
            unforgeables: FxHashMap::default(),
        };
        realm.bootstrap();
        realm
    }

    /// A realm representing a document's `Window`.
    pub fn window() -> Self {
        Self::new(Some(GlobalScope::Window))
    }

    fn bootstrap(&mut self) {
        let object_prototype = self.alloc(None, ObjectKind::Ordinary);
        let function_prototype = self.alloc(
            Some(object_prototype),
            ObjectKind::Function(FunctionData {
                call: Some(native(|_, _, _| Ok(Value::Undefined))),
                construct: None,
            }),
        );
        self.intrinsics.object_prototype = object_prototype;
        self.intrinsics.function_prototype = function_prototype;

        let to_string = self.create_native_function("toString", 0, |realm, this, _| {
            Ok(Value::String(realm.class_string(this)?))
        });
        self.define_own(object_prototype, "toString", PropertyDescriptor::hidden(to_string.into()));

        let object = self.create_function(
            "Object",
            1,
            Some(native(|realm, _, args| realm.to_object(args.first()))),
            Some(native(|realm, _, args| realm.to_object(args.first()))),
        );
        self.link_constructor(object, object_prototype);
        self.intrinsics.object = object;

        // Error, TypeError
        let error_prototype = self.alloc(Some(object_prototype), ObjectKind::Ordinary);
        self.define_own(error_prototype, "name", PropertyDescriptor::hidden("Error".into()));
        self.define_own(error_prototype, "message", PropertyDescriptor::hidden("".into()));
        let error_to_string = self.create_native_function("toString", 0, |realm, this, _| {
            let Some(object) = this.as_object() else {
                return Err(realm.type_error("Error.prototype.toString called on non-object"));
            };
            let name = realm.get(object, &PropertyKey::from("name"))?;
            let message = realm.get(object, &PropertyKey::from("message"))?;
            let name = realm.to_string(&name)?;
            let message = realm.to_string(&message)?;
            Ok(Value::String(match (name.is_empty(), message.is_empty()) {
                (_, true) => name,
                (true, false) => message,
                (false, false) => format!("{name}: {message}"),
            }))
        });
        self.define_own(error_prototype, "toString", PropertyDescriptor::hidden(error_to_string.into()));
        self.intrinsics.error_prototype = error_prototype;
        let error = self.create_error_constructor("Error", error_prototype, None);

        let type_error_prototype = self.alloc(Some(error_prototype), ObjectKind::Ordinary);
        self.define_own(type_error_prototype, "name", PropertyDescriptor::hidden("TypeError".into()));
        self.define_own(type_error_prototype, "message", PropertyDescriptor::hidden("".into()));
        self.intrinsics.type_error_prototype = type_error_prototype;
        let type_error = self.create_error_constructor("TypeError", type_error_prototype, Some(error));
        self.intrinsics.type_error = type_error;

        // Array.prototype with the iteration methods value iterables reuse.
        let array_prototype = self.alloc(Some(object_prototype), ObjectKind::Array);
        self.define_own(array_prototype, "length", PropertyDescriptor::Data {
            value: Value::Number(0.0),
            writable: true,
            enumerable: false,
            configurable: false,
        });
        for (name, length) in [("entries", 0), ("keys", 0), ("values", 0), ("forEach", 1)] {
            let method = self.create_native_function(name, length, |_, _, _| Ok(Value::Undefined));
            self.define_own(array_prototype, name, PropertyDescriptor::hidden(method.into()));
        }
        if let Some(values) = self.own_data_value(array_prototype, &PropertyKey::from("values")) {
            self.define_property(
                array_prototype,
                WellKnownSymbol::Iterator.key(),
                PropertyDescriptor::hidden(values),
            );
        }
        self.intrinsics.array_prototype = array_prototype;

        let promise_prototype = self.alloc(Some(object_prototype), ObjectKind::Ordinary);
        let then = self.create_native_function("then", 2, |_, _, _| Ok(Value::Undefined));
        self.define_own(promise_prototype, "then", PropertyDescriptor::hidden(then.into()));
        self.define_property(
            promise_prototype,
            WellKnownSymbol::ToStringTag.key(),
            PropertyDescriptor::readonly_hidden("Promise".into()),
        );
        self.intrinsics.promise_prototype = promise_prototype;

        let global = self.alloc(Some(object_prototype), ObjectKind::Ordinary);
        self.global = global;
        for (name, value) in [("Object", object), ("Error", error), ("TypeError", type_error)] {
            self.define_own(global, name, PropertyDescriptor::hidden(value.into()));
        }
        for alias in GLOBAL_ALIASES {
            self.define_own(global, alias, PropertyDescriptor::hidden(global.into()));
        }
        debug!(objects = self.objects.len(), "memory realm bootstrapped");
    }

    fn create_error_constructor(
        &mut self,
        name: &str,
        prototype: ObjectId,
        parent: Option<ObjectId>,
    ) -> ObjectId {
        let make = native(move |realm, _, args| {
            let message = match args.first() {
                Some(value) if !value.is_undefined() => Some(realm.to_string(value)?),
                _ => None,
            };
            Ok(Value::Object(realm.create_error(prototype, message.as_deref())))
        });
        let constructor = self.create_function(name, 1, Some(make.clone()), Some(make));
        if let Some(parent) = parent {
            self.slot_mut(constructor).prototype = Some(parent);
        }
        self.link_constructor(constructor, prototype);
        constructor
    }

    /// `F.prototype = P` (non-writable) and `P.constructor = F`.
    fn link_constructor(&mut self, constructor: ObjectId, prototype: ObjectId) {
        self.define_own(constructor, "prototype", PropertyDescriptor::Data {
            value: prototype.into(),
            writable: false,
            enumerable: false,
            configurable: false,
        });
        self.define_own(prototype, "constructor", PropertyDescriptor::hidden(constructor.into()));
    }

    // -----------------------------------------------------------------------
    // Heap primitives
    // -----------------------------------------------------------------------

    fn alloc(&mut self, prototype: Option<ObjectId>, kind: ObjectKind) -> ObjectId {
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(ObjectData::new(prototype, kind));
        id
    }

    fn slot(&self, id: ObjectId) -> Option<&ObjectData> {
        self.objects.get(id.0 as usize)
    }

    /// Handles are only minted by this realm; an out-of-range id is a bug in
    /// the embedder, and writes to it go to a scratch slot.
    fn slot_mut(&mut self, id: ObjectId) -> &mut ObjectData {
        let index = id.0 as usize;
        if index >= self.objects.len() {
            self.objects.push(ObjectData::new(None, ObjectKind::Ordinary));
            let last = self.objects.len() - 1;
            return &mut self.objects[last];
        }
        &mut self.objects[index]
    }

    /// Index of a live object, or a `TypeError` for a foreign handle.
    fn live(&mut self, id: ObjectId) -> Result<usize, Thrown> {
        let index = id.0 as usize;
        if index < self.objects.len() {
            Ok(index)
        } else {
            Err(self.type_error("invalid object handle"))
        }
    }

    fn own_data_value(&self, object: ObjectId, key: &PropertyKey) -> Option<Value> {
        self.slot(object)?
            .properties
            .get(key)
            .and_then(PropertyDescriptor::value)
            .cloned()
    }

    /// Define or replace an own property without any validation.
    pub fn define_property(&mut self, object: ObjectId, key: PropertyKey, desc: PropertyDescriptor) {
        self.slot_mut(object).properties.insert(key, desc);
    }

    fn define_own(&mut self, object: ObjectId, name: &str, desc: PropertyDescriptor) {
        self.define_property(object, PropertyKey::from(name), desc);
    }

    /// Allocate a fresh, unique symbol.
    pub fn create_symbol(&mut self) -> SymbolId {
        let id = SymbolId(self.next_symbol);
        self.next_symbol += 1;
        id
    }

    /// A callable (and optionally constructible) function object with own
    /// `length` and `name` properties.
    pub fn create_function(
        &mut self,
        name: &str,
        length: u32,
        call: Option<NativeFn>,
        construct: Option<NativeFn>,
    ) -> ObjectId {
        let function_prototype = self.intrinsics.function_prototype;
        let function = self.alloc(
            Some(function_prototype),
            ObjectKind::Function(FunctionData { call, construct }),
        );
        self.define_own(function, "length", PropertyDescriptor::readonly_hidden(Value::Number(f64::from(length))));
        self.define_own(function, "name", PropertyDescriptor::readonly_hidden(name.into()));
        function
    }

    pub fn create_native_function<F>(&mut self, name: &str, length: u32, f: F) -> ObjectId
    where
        F: Fn(&mut Self, &Value, &[Value]) -> Result<Value, Thrown> + 'static,
    {
        self.create_function(name, length, Some(Rc::new(f)), None)
    }

    /// Replace the `[[Construct]]` behaviour of a function object.
    pub fn set_construct(&mut self, function: ObjectId, construct: Option<NativeFn>) {
        if let ObjectKind::Function(data) = &mut self.slot_mut(function).kind {
            data.construct = construct;
        }
    }

    pub fn create_array(&mut self, values: Vec<Value>) -> ObjectId {
        let prototype = self.intrinsics.array_prototype;
        let array = self.alloc(Some(prototype), ObjectKind::Array);
        let length = values.len();
        for (index, value) in values.into_iter().enumerate() {
            self.define_property(array, PropertyKey::String(index.to_string()), PropertyDescriptor::data(value));
        }
        self.define_own(array, "length", PropertyDescriptor::Data {
            value: Value::Number(length as f64),
            writable: true,
            enumerable: false,
            configurable: false,
        });
        array
    }

    /// A plain `{}` inheriting from `Object.prototype`.
    pub fn create_plain_object(&mut self) -> ObjectId {
        let prototype = self.intrinsics.object_prototype;
        self.alloc(Some(prototype), ObjectKind::Ordinary)
    }

    /// `Object.freeze(o)`
    pub fn freeze(&mut self, object: ObjectId) {
        let data = self.slot_mut(object);
        data.extensible = false;
        for desc in data.properties.values_mut() {
            match desc {
                PropertyDescriptor::Data {
                    writable,
                    configurable,
                    ..
                } => {
                    *writable = false;
                    *configurable = false;
                }
                PropertyDescriptor::Accessor { configurable, .. } => *configurable = false,
            }
        }
    }

    /// `Object.preventExtensions(o)`
    pub fn prevent_extensions(&mut self, object: ObjectId) {
        self.slot_mut(object).extensible = false;
    }

    /// Give `object` the immutable prototype exotic `[[SetPrototypeOf]]`.
    pub fn mark_immutable_prototype(&mut self, object: ObjectId) {
        self.slot_mut(object).immutable_prototype = true;
    }

    /// Give `object` the `[[IsHTMLDDA]]` slot: `typeof` reports `"undefined"`.
    pub fn mark_html_dda(&mut self, object: ObjectId) {
        self.slot_mut(object).html_dda = true;
    }

    pub fn add_brand(&mut self, object: ObjectId, interface: &str) {
        self.slot_mut(object).brands.insert(interface.to_string());
    }

    /// Whether `this` is a platform object implementing `interface`. A
    /// nullish receiver stands for the global object.
    pub fn implements(&self, this: &Value, interface: &str) -> bool {
        let object = match this {
            Value::Object(id) => *id,
            Value::Undefined | Value::Null => self.global,
            _ => return false,
        };
        self.slot(object)
            .is_some_and(|data| data.brands.contains(interface))
    }

    pub fn set_global_scope(&mut self, scope: Option<GlobalScope>) {
        self.scope = scope;
    }

    // -----------------------------------------------------------------------
    // Errors and promises
    // -----------------------------------------------------------------------

    fn create_error(&mut self, prototype: ObjectId, message: Option<&str>) -> ObjectId {
        let error = self.alloc(Some(prototype), ObjectKind::Error);
        if let Some(message) = message {
            self.define_own(error, "message", PropertyDescriptor::hidden(message.into()));
        }
        error
    }

    /// A fresh `TypeError` wrapped as a thrown exception.
    pub fn type_error(&mut self, message: &str) -> Thrown {
        let prototype = self.intrinsics.type_error_prototype;
        Thrown(Value::Object(self.create_error(prototype, Some(message))))
    }

    /// A fresh plain `Error` with the given `name`.
    pub fn error(&mut self, name: &str, message: &str) -> Thrown {
        let prototype = self.intrinsics.error_prototype;
        let error = self.create_error(prototype, Some(message));
        self.define_own(error, "name", PropertyDescriptor::hidden(name.into()));
        Thrown(Value::Object(error))
    }

    /// A promise already in `state`.
    pub fn create_promise(&mut self, state: PromiseState) -> Value {
        let prototype = self.intrinsics.promise_prototype;
        Value::Object(self.alloc(Some(prototype), ObjectKind::Promise(state)))
    }

    /// A pending promise that settles to `state` on the next `run_jobs`.
    pub fn create_queued_promise(&mut self, state: PromiseState) -> Value {
        let prototype = self.intrinsics.promise_prototype;
        let promise = self.alloc(Some(prototype), ObjectKind::Promise(PromiseState::Pending));
        self.jobs.push_back((promise, state));
        Value::Object(promise)
    }

    // -----------------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------------

    /// Make `source` evaluate to `value`.
    pub fn bind_expression(&mut self, source: &str, value: Value) {
        self.expressions.insert(source.trim().to_string(), Ok(value));
    }

    /// Make `source` throw `error` when evaluated.
    pub fn bind_throwing_expression(&mut self, source: &str, error: Thrown) {
        self.expressions.insert(source.trim().to_string(), Err(error));
    }

    fn evaluate_path(&mut self, path: &str) -> Result<Value, Thrown> {
        let mut segments = path.split('.').map(str::trim);
        let head = segments.next().unwrap_or_default();
        let global = self.global;
        let mut current = if GLOBAL_ALIASES.contains(&head) {
            Value::Object(global)
        } else if self.has_property(global, &PropertyKey::from(head))? {
            self.get(global, &PropertyKey::from(head))?
        } else {
            return Err(self.error("ReferenceError", &format!("{head} is not defined")));
        };
        for segment in segments {
            let Some(object) = current.as_object() else {
                let shown = self.to_string(&current).unwrap_or_default();
                return Err(self.type_error(&format!("Cannot read properties of {shown} (reading '{segment}')")));
            };
            current = self.get(object, &PropertyKey::from(segment))?;
        }
        Ok(current)
    }

    fn to_object(&mut self, value: Option<&Value>) -> Result<Value, Thrown> {
        match value {
            Some(Value::Object(id)) => Ok(Value::Object(*id)),
            _ => Ok(Value::Object(self.create_plain_object())),
        }
    }

    fn is_callable(&self, value: &Value) -> bool {
        value
            .as_object()
            .and_then(|id| self.slot(id))
            .is_some_and(ObjectData::is_callable)
    }

    fn function_data(&self, value: &Value) -> Option<FunctionData> {
        match &self.slot(value.as_object()?)?.kind {
            ObjectKind::Function(data) => Some(data.clone()),
            _ => None,
        }
    }

    fn ordinary_set_prototype_of(&mut self, object: ObjectId, prototype: Option<ObjectId>) -> bool {
        let Some(data) = self.slot(object) else {
            return false;
        };
        if data.prototype == prototype {
            return true;
        }
        if data.immutable_prototype || !data.extensible {
            return false;
        }
        // Reject cycles.
        let mut cursor = prototype;
        while let Some(current) = cursor {
            if current == object {
                return false;
            }
            cursor = self.slot(current).and_then(|data| data.prototype);
        }
        self.slot_mut(object).prototype = prototype;
        true
    }
}

impl Default for MemoryRealm {
    fn default() -> Self {
        Self::window()
    }
}

impl Realm for MemoryRealm {
    fn global_scope(&self) -> Option<GlobalScope> {
        self.scope
    }

    fn global(&self) -> ObjectId {
        self.global
    }

    fn intrinsic(&self, which: Intrinsic) -> ObjectId {
        match which {
            Intrinsic::ObjectPrototype => self.intrinsics.object_prototype,
            Intrinsic::FunctionPrototype => self.intrinsics.function_prototype,
            Intrinsic::ArrayPrototype => self.intrinsics.array_prototype,
            Intrinsic::ErrorPrototype => self.intrinsics.error_prototype,
            Intrinsic::TypeError => self.intrinsics.type_error,
        }
    }

    fn type_of(&self, value: &Value) -> &'static str {
        match value {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Object(id) => match self.slot(*id) {
                Some(data) if data.html_dda => "undefined",
                Some(data) if data.is_callable() => "function",
                _ => "object",
            },
        }
    }

    fn is_array(&self, value: &Value) -> bool {
        value
            .as_object()
            .and_then(|id| self.slot(id))
            .is_some_and(|data| matches!(data.kind, ObjectKind::Array))
    }

    fn is_frozen(&self, object: ObjectId) -> bool {
        self.slot(object).is_some_and(|data| {
            !data.extensible
                && data.properties.values().all(|desc| {
                    !desc.configurable() && desc.writable() != Some(true)
                })
        })
    }

    fn is_extensible(&self, object: ObjectId) -> bool {
        self.slot(object).is_some_and(|data| data.extensible)
    }

    fn get_own_property(
        &mut self,
        object: ObjectId,
        key: &PropertyKey,
    ) -> Result<Option<PropertyDescriptor>, Thrown> {
        let index = self.live(object)?;
        Ok(self.objects[index].properties.get(key).cloned())
    }

    fn own_property_keys(&mut self, object: ObjectId) -> Result<Vec<PropertyKey>, Thrown> {
        let index = self.live(object)?;
        let data = &self.objects[index];
        let mut indices: SmallVec<[(u32, PropertyKey); 8]> = SmallVec::new();
        let mut strings = Vec::new();
        let mut symbols = Vec::new();
        for key in data.properties.keys() {
            match key {
                PropertyKey::String(s) => match s.parse::<u32>() {
                    Ok(index) if index.to_string() == *s => indices.push((index, key.clone())),
                    _ => strings.push(key.clone()),
                },
                PropertyKey::Symbol(_) => symbols.push(key.clone()),
            }
        }
        indices.sort_by_key(|(index, _)| *index);
        Ok(indices
            .into_iter()
            .map(|(_, key)| key)
            .chain(strings)
            .chain(symbols)
            .collect())
    }

    fn has_property(&mut self, object: ObjectId, key: &PropertyKey) -> Result<bool, Thrown> {
        let mut cursor = Some(object);
        while let Some(current) = cursor {
            let index = self.live(current)?;
            let data = &self.objects[index];
            if data.properties.contains_key(key) {
                return Ok(true);
            }
            cursor = data.prototype;
        }
        Ok(false)
    }

    fn get(&mut self, object: ObjectId, key: &PropertyKey) -> Result<Value, Thrown> {
        let mut cursor = Some(object);
        while let Some(current) = cursor {
            let index = self.live(current)?;
            let data = &self.objects[index];
            let getter = match data.properties.get(key) {
                Some(PropertyDescriptor::Data { value, .. }) => return Ok(value.clone()),
                Some(PropertyDescriptor::Accessor { get, .. }) => *get,
                None => {
                    cursor = data.prototype;
                    continue;
                }
            };
            return match getter {
                Some(getter) => self.call(&Value::Object(getter), &Value::Object(object), &[]),
                None => Ok(Value::Undefined),
            };
        }
        Ok(Value::Undefined)
    }

    fn get_prototype_of(&mut self, object: ObjectId) -> Result<Option<ObjectId>, Thrown> {
        let index = self.live(object)?;
        Ok(self.objects[index].prototype)
    }

    fn set_prototype_of(
        &mut self,
        object: ObjectId,
        prototype: Option<ObjectId>,
        via: PrototypeMutation,
    ) -> Result<bool, Thrown> {
        self.live(object)?;
        let changed = self.ordinary_set_prototype_of(object, prototype);
        trace!(?object, ?via, changed, "[[SetPrototypeOf]]");
        match via {
            PrototypeMutation::Reflect => Ok(changed),
            PrototypeMutation::ObjectSetPrototypeOf | PrototypeMutation::ProtoAccessor if changed => Ok(true),
            PrototypeMutation::ObjectSetPrototypeOf => {
                Err(self.type_error("Object.setPrototypeOf: [[SetPrototypeOf]] returned false"))
            }
            PrototypeMutation::ProtoAccessor => {
                Err(self.type_error("Object.prototype.__proto__: [[SetPrototypeOf]] returned false"))
            }
        }
    }

    fn call(&mut self, callee: &Value, this: &Value, args: &[Value]) -> Result<Value, Thrown> {
        match self.function_data(callee).and_then(|data| data.call) {
            Some(f) => f(self, this, args),
            None => {
                let shown = self.type_of(callee);
                Err(self.type_error(&format!("{shown} is not a function")))
            }
        }
    }

    fn construct(&mut self, callee: &Value, args: &[Value]) -> Result<Value, Thrown> {
        match self.function_data(callee).and_then(|data| data.construct) {
            Some(f) => f(self, &Value::Undefined, args),
            None => Err(self.type_error("not a constructor")),
        }
    }

    fn instance_of(&mut self, value: &Value, constructor: &Value) -> Result<bool, Thrown> {
        let Some(constructor_object) = constructor.as_object().filter(|_| self.is_callable(constructor)) else {
            return Err(self.type_error("Right-hand side of 'instanceof' is not callable"));
        };
        let Some(object) = value.as_object() else {
            return Ok(false);
        };
        let Some(prototype) = self.get(constructor_object, &PropertyKey::from("prototype"))?.as_object() else {
            return Err(self.type_error("Function has non-object prototype in instanceof check"));
        };
        let mut cursor = self.get_prototype_of(object)?;
        while let Some(current) = cursor {
            if current == prototype {
                return Ok(true);
            }
            cursor = self.get_prototype_of(current)?;
        }
        Ok(false)
    }

    fn class_string(&mut self, value: &Value) -> Result<String, Thrown> {
        let object = match value {
            Value::Undefined => return Ok("[object Undefined]".to_string()),
            Value::Null => return Ok("[object Null]".to_string()),
            Value::Bool(_) => return Ok("[object Boolean]".to_string()),
            Value::Number(_) => return Ok("[object Number]".to_string()),
            Value::String(_) => return Ok("[object String]".to_string()),
            Value::Symbol(_) => return Ok("[object Symbol]".to_string()),
            Value::Object(id) => *id,
        };
        let index = self.live(object)?;
        let builtin = match &self.objects[index].kind {
            ObjectKind::Array => "Array",
            ObjectKind::Error => "Error",
            ObjectKind::Function(_) if self.is_callable(value) => "Function",
            _ => "Object",
        };
        let tag = self.get(object, &WellKnownSymbol::ToStringTag.key())?;
        Ok(format!("[object {}]", tag.as_str().unwrap_or(builtin)))
    }

    fn to_string(&mut self, value: &Value) -> Result<String, Thrown> {
        match value {
            Value::Undefined => Ok("undefined".to_string()),
            Value::Null => Ok("null".to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Number(n) => Ok(number_to_string(*n)),
            Value::String(s) => Ok(s.clone()),
            Value::Symbol(_) => Err(self.type_error("Cannot convert a Symbol value to a string")),
            Value::Object(id) => {
                let method = self.get(*id, &PropertyKey::from("toString"))?;
                if self.is_callable(&method) {
                    let result = self.call(&method, value, &[])?;
                    if result.as_object().is_none() {
                        return self.to_string(&result);
                    }
                }
                Err(self.type_error("Cannot convert object to primitive value"))
            }
        }
    }

    fn create_object(&mut self, prototype: Option<ObjectId>) -> ObjectId {
        self.alloc(prototype, ObjectKind::Ordinary)
    }

    fn create_data_property(
        &mut self,
        object: ObjectId,
        key: PropertyKey,
        value: Value,
    ) -> Result<bool, Thrown> {
        let index = self.live(object)?;
        let data = &self.objects[index];
        match data.properties.get(&key) {
            Some(existing) if !existing.configurable() => return Ok(false),
            None if !data.extensible => return Ok(false),
            _ => {}
        }
        self.define_property(object, key, PropertyDescriptor::data(value));
        Ok(true)
    }

    fn delete_property(&mut self, object: ObjectId, key: &PropertyKey) -> Result<bool, Thrown> {
        let index = self.live(object)?;
        let configurable = match self.objects[index].properties.get(key) {
            None => return Ok(true),
            Some(desc) => desc.configurable(),
        };
        if configurable {
            self.slot_mut(object).properties.shift_remove(key);
        }
        Ok(configurable)
    }

    fn evaluate(&mut self, source: &str) -> Result<Value, Thrown> {
        let source = source.trim();
        if let Some(bound) = self.expressions.get(source) {
            return bound.clone();
        }
        if let Some(constructor) = source
            .strip_prefix("new ")
            .and_then(|rest| rest.strip_suffix("()"))
        {
            let callee = self.evaluate_path(constructor)?;
            return self.construct(&callee, &[]);
        }
        self.evaluate_path(source)
    }

    fn run_jobs(&mut self) {
        while let Some((promise, state)) = self.jobs.pop_front() {
            if let ObjectKind::Promise(current) = &mut self.slot_mut(promise).kind {
                *current = state;
            }
        }
    }

    fn promise_state(&self, value: &Value) -> Option<PromiseState> {
        match &self.slot(value.as_object()?)?.kind {
            ObjectKind::Promise(state) => Some(state.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "../tests/memory_tests.rs"]
mod tests;
