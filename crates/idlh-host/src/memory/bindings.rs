//! WebIDL binding helpers for [`MemoryRealm`].
//!
//! These build the objects a conforming binding layer would create for an
//! interface: the interface object, the interface prototype object, brand
//! checked accessors and operations, constants, iteration methods and the
//! legacy extras (`[LegacyFactoryFunction]`, `[LegacyWindowAlias]`,
//! `[LegacyUnforgeable]`, `[Global]`). Tests use them to stand up a binding
//! and then break individual pieces to see the harness catch it.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use super::{MemoryRealm, ObjectKind, native};
use crate::realm::Realm;
use crate::value::{ObjectId, PromiseState, PropertyDescriptor, PropertyKey, Thrown, Value, WellKnownSymbol};

/// Objects making up one interface binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceBinding {
    pub name: String,
    pub interface_object: ObjectId,
    pub prototype: ObjectId,
    /// The interface and every inherited interface, most derived first.
    pub ancestry: Vec<String>,
    /// Set by [`MemoryRealm::install_global`]: regular members live on the
    /// global object.
    pub global: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AttributeOptions {
    pub readonly: bool,
    pub is_static: bool,
    /// `[LegacyLenientThis]`: a bad receiver makes the getter return undefined.
    pub lenient_this: bool,
    /// `[LegacyLenientSetter]`, `[Replaceable]` or `[PutForwards]`.
    pub has_setter_anyway: bool,
    /// The attribute is Promise-typed: brand failures reject.
    pub promise: bool,
    pub unforgeable: bool,
}

#[derive(Debug, Clone, Default)]
pub struct OperationOptions {
    /// Number of required arguments, i.e. the function's `length`.
    pub length: u32,
    pub is_static: bool,
    pub promise: bool,
    pub unforgeable: bool,
    /// Returned (or fulfilled) on success.
    pub result: Value,
}

/// Shape of an `iterable<…>`, `maplike<…>` or `setlike<…>` declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationKind {
    ValueIterable,
    PairIterable,
    AsyncValueIterable,
    AsyncPairIterable,
    Maplike { readonly: bool },
    Setlike { readonly: bool },
}

// Method name and `length` tables for iteration declarations.
const PAIR_ITERABLE_METHODS: &[(&str, u32)] = &[("entries", 0), ("keys", 0), ("values", 0), ("forEach", 1)];
const ASYNC_VALUE_METHODS: &[(&str, u32)] = &[("values", 0)];
const ASYNC_PAIR_METHODS: &[(&str, u32)] = &[("entries", 0), ("keys", 0), ("values", 0)];
const READONLY_MAPLIKE_METHODS: &[(&str, u32)] =
    &[("entries", 0), ("keys", 0), ("values", 0), ("forEach", 1), ("get", 1), ("has", 1)];
const MAPLIKE_METHODS: &[(&str, u32)] = &[
    ("entries", 0),
    ("keys", 0),
    ("values", 0),
    ("forEach", 1),
    ("get", 1),
    ("has", 1),
    ("set", 2),
    ("delete", 1),
    ("clear", 0),
];
const READONLY_SETLIKE_METHODS: &[(&str, u32)] =
    &[("entries", 0), ("keys", 0), ("values", 0), ("forEach", 1), ("has", 1)];
const SETLIKE_METHODS: &[(&str, u32)] = &[
    ("entries", 0),
    ("keys", 0),
    ("values", 0),
    ("forEach", 1),
    ("has", 1),
    ("add", 1),
    ("delete", 1),
    ("clear", 0),
];

/// Brand check failure: a thrown `TypeError`, or a rejected promise for
/// Promise-returning members.
fn brand_failure(realm: &mut MemoryRealm, message: &str, promise: bool) -> Result<Value, Thrown> {
    let error = realm.type_error(message);
    if promise {
        Ok(realm.create_promise(PromiseState::Rejected(error.0)))
    } else {
        Err(error)
    }
}

impl MemoryRealm {
    /// Create the interface object and interface prototype object for
    /// `name` and expose the interface object on the global.
    ///
    /// The interface object throws when called and, until
    /// [`define_constructor`](Self::define_constructor) is used, when
    /// constructed.
    pub fn define_interface(&mut self, name: &str, parent: Option<&InterfaceBinding>) -> InterfaceBinding {
        let message = format!("Illegal constructor: {name}");
        let call_message = message.clone();
        let interface_object = self.create_function(
            name,
            0,
            Some(native(move |realm, _, _| Err(realm.type_error(&call_message)))),
            Some(native(move |realm, _, _| Err(realm.type_error(&message)))),
        );
        let parent_object = parent.map_or(self.intrinsics.function_prototype, |p| p.interface_object);
        self.slot_mut(interface_object).prototype = Some(parent_object);

        let parent_prototype = parent.map_or(self.intrinsics.object_prototype, |p| p.prototype);
        let prototype = self.create_object(Some(parent_prototype));
        self.define_property(
            prototype,
            WellKnownSymbol::ToStringTag.key(),
            PropertyDescriptor::readonly_hidden(name.into()),
        );
        self.define_property(interface_object, "prototype".into(), PropertyDescriptor::Data {
            value: prototype.into(),
            writable: false,
            enumerable: false,
            configurable: false,
        });
        self.define_property(prototype, "constructor".into(), PropertyDescriptor::hidden(interface_object.into()));

        let global = self.global;
        self.define_property(global, name.into(), PropertyDescriptor::hidden(interface_object.into()));

        let mut ancestry = vec![name.to_string()];
        if let Some(parent) = parent {
            ancestry.extend(parent.ancestry.iter().cloned());
        }
        trace!(name, "defined interface binding");
        InterfaceBinding {
            name: name.to_string(),
            interface_object,
            prototype,
            ancestry,
            global: false,
        }
    }

    /// `[LegacyNoInterfaceObject]`: remove the global property.
    pub fn hide_interface_object(&mut self, binding: &InterfaceBinding) {
        let global = self.global;
        let _ = self.delete_property(global, &PropertyKey::from(binding.name.as_str()));
    }

    /// A legacy callback interface object carrying only constants.
    pub fn define_callback_interface(&mut self, name: &str) -> ObjectId {
        let message = format!("Illegal invocation: {name}");
        let object = self.create_native_function(name, 0, move |realm, _, _| Err(realm.type_error(&message)));
        let global = self.global;
        self.define_property(global, name.into(), PropertyDescriptor::hidden(object.into()));
        object
    }

    /// Give the interface a constructor operation with `length` required
    /// arguments.
    pub fn define_constructor(&mut self, binding: &InterfaceBinding, length: u32) {
        let construct_binding = binding.clone();
        self.set_construct(
            binding.interface_object,
            Some(native(move |realm, _, args| {
                if args.len() < length as usize {
                    let message = format!(
                        "Failed to construct '{}': {length} argument(s) required, but only {} present.",
                        construct_binding.name,
                        args.len()
                    );
                    return Err(realm.type_error(&message));
                }
                Ok(Value::Object(realm.create_platform_object(&construct_binding)))
            })),
        );
        self.define_property(
            binding.interface_object,
            "length".into(),
            PropertyDescriptor::readonly_hidden(Value::Number(f64::from(length))),
        );
    }

    /// A new object implementing the interface, with its unforgeable members.
    pub fn create_platform_object(&mut self, binding: &InterfaceBinding) -> ObjectId {
        let object = self.create_object(Some(binding.prototype));
        for interface in &binding.ancestry {
            self.add_brand(object, interface);
        }
        self.install_unforgeables(object, &binding.ancestry);
        object
    }

    fn install_unforgeables(&mut self, object: ObjectId, ancestry: &[String]) {
        let properties: Vec<_> = ancestry
            .iter()
            .filter_map(|interface| self.unforgeables.get(interface))
            .flatten()
            .cloned()
            .collect();
        for (key, desc) in properties {
            self.define_property(object, key, desc);
        }
    }

    /// Turn the global object into the instance of a `[Global]` interface.
    pub fn install_global(&mut self, binding: &mut InterfaceBinding) {
        let global = self.global;
        self.slot_mut(global).prototype = Some(binding.prototype);
        for interface in &binding.ancestry {
            self.add_brand(global, interface);
        }
        self.install_unforgeables(global, &binding.ancestry);
        self.mark_immutable_prototype(global);
        self.mark_immutable_prototype(binding.prototype);
        binding.global = true;
    }

    /// Where a non-static, forgeable member of `binding` lives.
    fn member_holder(&self, binding: &InterfaceBinding, is_static: bool) -> ObjectId {
        if is_static {
            binding.interface_object
        } else if binding.global {
            self.global
        } else {
            binding.prototype
        }
    }

    /// Record an unforgeable property; it lands on instances created later
    /// and on the global when the interface is already installed there.
    fn add_unforgeable(&mut self, binding: &InterfaceBinding, key: PropertyKey, desc: PropertyDescriptor) {
        self.unforgeables
            .entry(binding.name.clone())
            .or_default()
            .push((key.clone(), desc.clone()));
        if binding.global {
            let global = self.global;
            self.define_property(global, key, desc);
        }
    }

    /// A brand checked accessor property for an attribute of `binding`.
    /// Returns the getter.
    pub fn define_attribute(
        &mut self,
        binding: &InterfaceBinding,
        name: &str,
        value: Value,
        options: AttributeOptions,
    ) -> ObjectId {
        let brand = (!options.is_static).then(|| binding.name.clone());
        let (desc, getter) = self.attribute_descriptor(brand, name, value, &options);
        if options.unforgeable && !options.is_static {
            self.add_unforgeable(binding, name.into(), desc);
        } else {
            let holder = self.member_holder(binding, options.is_static);
            self.define_property(holder, name.into(), desc);
        }
        getter
    }

    /// An accessor property on an arbitrary holder, brand checked against
    /// `brand` when given.
    pub fn define_attribute_on(
        &mut self,
        holder: ObjectId,
        brand: Option<&str>,
        name: &str,
        value: Value,
        options: AttributeOptions,
    ) -> ObjectId {
        let (desc, getter) = self.attribute_descriptor(brand.map(str::to_string), name, value, &options);
        self.define_property(holder, name.into(), desc);
        getter
    }

    fn attribute_descriptor(
        &mut self,
        brand: Option<String>,
        name: &str,
        value: Value,
        options: &AttributeOptions,
    ) -> (PropertyDescriptor, ObjectId) {
        let storage = Rc::new(RefCell::new(value));

        let get_storage = Rc::clone(&storage);
        let get_brand = brand.clone();
        let (lenient_this, promise) = (options.lenient_this, options.promise);
        let get_name = format!("get {name}");
        let get_message = format!("'{get_name}' called on an object that does not implement the interface");
        let getter = self.create_native_function(&get_name, 0, move |realm, this, _| {
            if let Some(brand) = &get_brand {
                if !realm.implements(this, brand) {
                    if lenient_this {
                        return Ok(Value::Undefined);
                    }
                    return brand_failure(realm, &get_message, promise);
                }
            }
            Ok(get_storage.borrow().clone())
        });

        let setter = (!options.readonly || options.has_setter_anyway).then(|| {
            let set_name = format!("set {name}");
            let set_message = format!("'{set_name}' called on an object that does not implement the interface");
            self.create_native_function(&set_name, 1, move |realm, this, args| {
                if let Some(brand) = &brand {
                    if !realm.implements(this, brand) {
                        if lenient_this {
                            return Ok(Value::Undefined);
                        }
                        return Err(realm.type_error(&set_message));
                    }
                }
                *storage.borrow_mut() = args.first().cloned().unwrap_or_default();
                Ok(Value::Undefined)
            })
        });

        let desc = PropertyDescriptor::Accessor {
            get: Some(getter),
            set: setter,
            enumerable: true,
            configurable: !options.unforgeable,
        };
        (desc, getter)
    }

    /// A brand checked regular or static operation of `binding`.
    pub fn define_operation(&mut self, binding: &InterfaceBinding, name: &str, options: OperationOptions) -> ObjectId {
        let brand = (!options.is_static).then_some(binding.name.as_str());
        let unforgeable = options.unforgeable && !options.is_static;
        let function = self.create_operation(brand, name, &options);
        let desc = PropertyDescriptor::Data {
            value: function.into(),
            writable: !options.unforgeable,
            enumerable: true,
            configurable: !options.unforgeable,
        };
        if unforgeable {
            self.add_unforgeable(binding, name.into(), desc);
        } else {
            let holder = self.member_holder(binding, options.is_static);
            self.define_property(holder, name.into(), desc);
        }
        function
    }

    /// An operation on an arbitrary holder (namespaces, callback interfaces).
    pub fn define_operation_on(
        &mut self,
        holder: ObjectId,
        brand: Option<&str>,
        name: &str,
        options: OperationOptions,
    ) -> ObjectId {
        let function = self.create_operation(brand, name, &options);
        self.define_property(holder, name.into(), PropertyDescriptor::Data {
            value: function.into(),
            writable: true,
            enumerable: true,
            configurable: true,
        });
        function
    }

    fn create_operation(&mut self, brand: Option<&str>, name: &str, options: &OperationOptions) -> ObjectId {
        let brand = brand.map(str::to_string);
        let (length, promise) = (options.length, options.promise);
        let result = options.result.clone();
        let brand_message = format!("'{name}' called on an object that does not implement the interface");
        let arity_message = format!("'{name}': {length} argument(s) required");
        self.create_native_function(name, length, move |realm, this, args| {
            if let Some(brand) = &brand {
                if !realm.implements(this, brand) {
                    return brand_failure(realm, &brand_message, promise);
                }
            }
            if args.len() < length as usize {
                return brand_failure(realm, &arity_message, promise);
            }
            if promise {
                Ok(realm.create_promise(PromiseState::Fulfilled(result.clone())))
            } else {
                Ok(result.clone())
            }
        })
    }

    /// A constant on both the interface object and the prototype object.
    pub fn define_constant(&mut self, binding: &InterfaceBinding, name: &str, value: Value) {
        self.define_constant_on(binding.interface_object, name, value.clone());
        self.define_constant_on(binding.prototype, name, value);
    }

    pub fn define_constant_on(&mut self, holder: ObjectId, name: &str, value: Value) {
        self.define_property(holder, name.into(), PropertyDescriptor::Data {
            value,
            writable: false,
            enumerable: true,
            configurable: false,
        });
    }

    /// A `toString` stringifier returning `result` for branded receivers.
    pub fn define_stringifier(&mut self, binding: &InterfaceBinding, result: &str) -> ObjectId {
        self.define_operation(binding, "toString", OperationOptions {
            result: result.into(),
            ..OperationOptions::default()
        })
    }

    /// `[Default] object toJSON()`: copies `attributes` off the receiver.
    pub fn define_default_to_json(&mut self, binding: &InterfaceBinding, attributes: Vec<String>) -> ObjectId {
        let brand = binding.name.clone();
        let function = self.create_native_function("toJSON", 0, move |realm, this, _| {
            if !realm.implements(this, &brand) {
                return Err(realm.type_error("'toJSON' called on an object that does not implement the interface"));
            }
            let receiver = match this {
                Value::Object(object) => *object,
                _ => realm.global,
            };
            let json = realm.create_plain_object();
            for attribute in &attributes {
                let value = realm.get(receiver, &PropertyKey::from(attribute.as_str()))?;
                realm.create_data_property(json, attribute.as_str().into(), value)?;
            }
            Ok(Value::Object(json))
        });
        let holder = self.member_holder(binding, false);
        self.define_property(holder, "toJSON".into(), PropertyDescriptor::Data {
            value: function.into(),
            writable: true,
            enumerable: true,
            configurable: true,
        });
        function
    }

    /// Install the methods an iterable, maplike or setlike declaration adds
    /// to the prototype object.
    pub fn define_iteration(&mut self, binding: &InterfaceBinding, kind: IterationKind) {
        let prototype = binding.prototype;
        let (methods, iterator) = match kind {
            IterationKind::ValueIterable => {
                let array_prototype = self.intrinsics.array_prototype;
                for name in ["entries", "keys", "values", "forEach"] {
                    if let Some(value) = self.own_data_value(array_prototype, &PropertyKey::from(name)) {
                        self.define_property(prototype, name.into(), PropertyDescriptor::data(value));
                    }
                }
                if let Some(values) = self.own_data_value(array_prototype, &WellKnownSymbol::Iterator.key()) {
                    self.define_property(prototype, WellKnownSymbol::Iterator.key(), PropertyDescriptor::hidden(values));
                }
                return;
            }
            IterationKind::PairIterable => (PAIR_ITERABLE_METHODS, (WellKnownSymbol::Iterator, "entries")),
            IterationKind::AsyncValueIterable => (ASYNC_VALUE_METHODS, (WellKnownSymbol::AsyncIterator, "values")),
            IterationKind::AsyncPairIterable => (ASYNC_PAIR_METHODS, (WellKnownSymbol::AsyncIterator, "entries")),
            IterationKind::Maplike { readonly: true } => (READONLY_MAPLIKE_METHODS, (WellKnownSymbol::Iterator, "entries")),
            IterationKind::Maplike { readonly: false } => (MAPLIKE_METHODS, (WellKnownSymbol::Iterator, "entries")),
            IterationKind::Setlike { readonly: true } => (READONLY_SETLIKE_METHODS, (WellKnownSymbol::Iterator, "values")),
            IterationKind::Setlike { readonly: false } => (SETLIKE_METHODS, (WellKnownSymbol::Iterator, "values")),
        };
        for &(name, length) in methods {
            self.define_operation(binding, name, OperationOptions {
                length,
                ..OperationOptions::default()
            });
        }
        if matches!(kind, IterationKind::Maplike { .. } | IterationKind::Setlike { .. }) {
            self.define_attribute(binding, "size", Value::Number(0.0), AttributeOptions {
                readonly: true,
                ..AttributeOptions::default()
            });
        }
        let (symbol, target) = iterator;
        if let Some(function) = self.own_data_value(prototype, &PropertyKey::from(target)) {
            self.define_property(prototype, symbol.key(), PropertyDescriptor::hidden(function));
        }
    }

    /// `@@unscopables` on the prototype object listing `names`.
    pub fn define_unscopables(&mut self, binding: &InterfaceBinding, names: &[&str]) -> ObjectId {
        let unscopables = self.create_object(None);
        for name in names {
            self.define_property(unscopables, (*name).into(), PropertyDescriptor::data(Value::Bool(true)));
        }
        self.define_property(
            binding.prototype,
            WellKnownSymbol::Unscopables.key(),
            PropertyDescriptor::readonly_hidden(unscopables.into()),
        );
        unscopables
    }

    /// `[LegacyFactoryFunction=name(...)]`
    pub fn define_legacy_factory_function(&mut self, binding: &InterfaceBinding, name: &str, length: u32) -> ObjectId {
        let call_message = format!("Failed to construct '{name}': Please use the 'new' operator");
        let construct_binding = binding.clone();
        let factory = self.create_function(
            name,
            length,
            Some(native(move |realm, _, _| Err(realm.type_error(&call_message)))),
            Some(native(move |realm, _, _| {
                Ok(Value::Object(realm.create_platform_object(&construct_binding)))
            })),
        );
        self.define_property(factory, "prototype".into(), PropertyDescriptor::Data {
            value: binding.prototype.into(),
            writable: false,
            enumerable: false,
            configurable: false,
        });
        let global = self.global;
        self.define_property(global, name.into(), PropertyDescriptor::hidden(factory.into()));
        factory
    }

    /// `[LegacyWindowAlias=alias]`
    pub fn define_legacy_window_alias(&mut self, binding: &InterfaceBinding, alias: &str) {
        let global = self.global;
        self.define_property(global, alias.into(), PropertyDescriptor::hidden(binding.interface_object.into()));
    }

    /// A namespace object exposed on the global.
    pub fn define_namespace(&mut self, name: &str) -> ObjectId {
        let object_prototype = self.intrinsics.object_prototype;
        let namespace = self.create_object(Some(object_prototype));
        self.define_property(
            namespace,
            WellKnownSymbol::ToStringTag.key(),
            PropertyDescriptor::readonly_hidden(name.into()),
        );
        let global = self.global;
        self.define_property(global, name.into(), PropertyDescriptor::hidden(namespace.into()));
        namespace
    }

    /// Whether `object` is an error object (has `[[ErrorData]]`).
    pub fn is_error_object(&self, object: ObjectId) -> bool {
        self.slot(object)
            .is_some_and(|data| matches!(data.kind, ObjectKind::Error))
    }
}
