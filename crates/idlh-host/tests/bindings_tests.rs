//! Shape of the objects the binding helpers build.

use idlh_host::{
    AttributeOptions, IterationKind, MemoryRealm, OperationOptions, PromiseState, PropertyKey,
    PrototypeMutation, Realm, RealmExt, Value, WellKnownSymbol,
};

#[test]
fn test_interface_object_and_prototype_shape() {
    let mut realm = MemoryRealm::window();
    let node = realm.define_interface("Node", None);
    let element = realm.define_interface("Element", Some(&node));

    let global = realm.global();
    let desc = realm.get_own_named(global, "Element").unwrap().unwrap();
    assert_eq!(desc.writable(), Some(true));
    assert!(!desc.enumerable());
    assert!(desc.configurable());

    assert_eq!(
        realm.get_prototype_of(element.interface_object).unwrap(),
        Some(node.interface_object)
    );
    assert_eq!(realm.get_prototype_of(element.prototype).unwrap(), Some(node.prototype));

    let prototype = realm.get_own_named(element.interface_object, "prototype").unwrap().unwrap();
    assert_eq!(prototype.writable(), Some(false));
    assert!(!prototype.configurable());

    let constructor = realm.get_named(element.prototype, "constructor").unwrap();
    assert_eq!(constructor, Value::Object(element.interface_object));
    assert_eq!(
        realm.class_string(&Value::Object(element.prototype)).unwrap(),
        "[object Element]"
    );
}

#[test]
fn test_interface_object_is_not_callable_without_constructor() {
    let mut realm = MemoryRealm::window();
    let binding = realm.define_interface("Blob", None);
    let callee = Value::Object(binding.interface_object);
    let err = realm.call(&callee, &Value::Undefined, &[]).unwrap_err();
    assert!(realm.is_type_error(&err.0));
    assert!(realm.construct(&callee, &[]).is_err());

    realm.define_constructor(&binding, 1);
    assert!(realm.construct(&callee, &[]).is_err());
    let instance = realm.construct(&callee, &[Value::from("x")]).unwrap();
    assert!(realm.instance_of(&instance, &callee).unwrap());
    assert!(realm.implements(&instance, "Blob"));
}

#[test]
fn test_attribute_accessors_brand_check() {
    let mut realm = MemoryRealm::window();
    let binding = realm.define_interface("Doc", None);
    realm.define_attribute(&binding, "title", Value::from("t"), AttributeOptions::default());
    realm.define_attribute(&binding, "url", Value::from("u"), AttributeOptions {
        readonly: true,
        ..AttributeOptions::default()
    });

    let title = realm.get_own_named(binding.prototype, "title").unwrap().unwrap();
    assert!(title.is_accessor());
    assert!(title.enumerable());
    let getter = title.getter().unwrap();
    assert_eq!(realm.get_named(getter.as_object().unwrap(), "name").unwrap(), Value::from("get title"));
    let setter = title.setter().unwrap();
    assert_eq!(realm.get_named(setter.as_object().unwrap(), "length").unwrap(), Value::Number(1.0));

    let plain = Value::Object(realm.create_plain_object());
    assert!(realm.call(&getter, &plain, &[]).is_err());

    let instance = Value::Object(realm.create_platform_object(&binding));
    realm.call(&setter, &instance, &[Value::from("new")]).unwrap();
    assert_eq!(realm.call(&getter, &instance, &[]).unwrap(), Value::from("new"));

    let url = realm.get_own_named(binding.prototype, "url").unwrap().unwrap();
    assert_eq!(url.setter(), Some(Value::Undefined));
}

#[test]
fn test_lenient_this_and_promise_attributes() {
    let mut realm = MemoryRealm::window();
    let binding = realm.define_interface("Media", None);
    let lenient = realm.define_attribute(&binding, "onerror", Value::Null, AttributeOptions {
        lenient_this: true,
        ..AttributeOptions::default()
    });
    let ready = realm.define_attribute(&binding, "ready", Value::Null, AttributeOptions {
        readonly: true,
        promise: true,
        ..AttributeOptions::default()
    });
    let plain = Value::Object(realm.create_plain_object());
    assert_eq!(realm.call(&Value::Object(lenient), &plain, &[]), Ok(Value::Undefined));
    let promise = realm.call(&Value::Object(ready), &plain, &[]).unwrap();
    match realm.promise_state(&promise) {
        Some(PromiseState::Rejected(reason)) => assert!(realm.is_type_error(&reason)),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[test]
fn test_operations_check_brand_then_arity() {
    let mut realm = MemoryRealm::window();
    let binding = realm.define_interface("Range", None);
    let op = realm.define_operation(&binding, "setStart", OperationOptions {
        length: 2,
        ..OperationOptions::default()
    });
    let op = Value::Object(op);
    let instance = Value::Object(realm.create_platform_object(&binding));
    assert!(realm.call(&op, &Value::Null, &[Value::Null, Value::Null]).is_err());
    assert!(realm.call(&op, &instance, &[Value::Null]).is_err());
    assert_eq!(realm.call(&op, &instance, &[Value::Null, Value::Null]), Ok(Value::Undefined));

    let desc = realm.get_own_named(binding.prototype, "setStart").unwrap().unwrap();
    assert_eq!(desc.writable(), Some(true));
    assert!(desc.enumerable());
}

#[test]
fn test_unforgeable_members_live_on_instances() {
    let mut realm = MemoryRealm::window();
    let binding = realm.define_interface("Location", None);
    realm.define_attribute(&binding, "href", Value::from("about:blank"), AttributeOptions {
        unforgeable: true,
        ..AttributeOptions::default()
    });
    assert_eq!(realm.get_own_named(binding.prototype, "href"), Ok(None));
    let instance = realm.create_platform_object(&binding);
    let desc = realm.get_own_named(instance, "href").unwrap().unwrap();
    assert!(!desc.configurable());
    assert_eq!(realm.get_named(instance, "href").unwrap(), Value::from("about:blank"));
}

#[test]
fn test_global_interface_members_and_immutable_prototype() {
    let mut realm = MemoryRealm::window();
    let event_target = realm.define_interface("EventTarget", None);
    let mut window = realm.define_interface("Window", Some(&event_target));
    realm.install_global(&mut window);
    realm.define_attribute(&window, "name", Value::from(""), AttributeOptions::default());

    let global = realm.global();
    assert!(realm.get_own_named(global, "name").unwrap().is_some());
    assert_eq!(realm.get_prototype_of(global).unwrap(), Some(window.prototype));
    assert!(realm.implements(&Value::Undefined, "EventTarget"));

    let other = realm.create_plain_object();
    assert_eq!(
        realm.set_prototype_of(global, Some(other), PrototypeMutation::Reflect),
        Ok(false)
    );
}

#[test]
fn test_iteration_methods() {
    let mut realm = MemoryRealm::window();
    let list = realm.define_interface("NodeList", None);
    realm.define_iteration(&list, IterationKind::ValueIterable);
    let array_proto = realm.intrinsic(idlh_host::Intrinsic::ArrayPrototype);
    for name in ["entries", "keys", "values", "forEach"] {
        assert_eq!(
            realm.get_named(list.prototype, name).unwrap(),
            realm.get_named(array_proto, name).unwrap()
        );
    }

    let headers = realm.define_interface("Headers", None);
    realm.define_iteration(&headers, IterationKind::PairIterable);
    let iterator = realm.get(headers.prototype, &WellKnownSymbol::Iterator.key()).unwrap();
    assert_eq!(iterator, realm.get_named(headers.prototype, "entries").unwrap());

    let map = realm.define_interface("RTCStatsReport", None);
    realm.define_iteration(&map, IterationKind::Maplike { readonly: true });
    assert!(realm.get_own_named(map.prototype, "get").unwrap().is_some());
    assert_eq!(realm.get_own_named(map.prototype, "set"), Ok(None));
    let size = realm.get_own_named(map.prototype, "size").unwrap().unwrap();
    assert!(size.is_accessor());
}

#[test]
fn test_constants_unscopables_and_legacy_extras() {
    let mut realm = MemoryRealm::window();
    let binding = realm.define_interface("Element", None);
    realm.define_constant(&binding, "ELEMENT_NODE", Value::Number(1.0));
    let constant = realm.get_own_named(binding.interface_object, "ELEMENT_NODE").unwrap().unwrap();
    assert_eq!(constant.writable(), Some(false));
    assert!(constant.enumerable());
    assert!(!constant.configurable());

    let unscopables = realm.define_unscopables(&binding, &["append"]);
    assert_eq!(realm.get_prototype_of(unscopables).unwrap(), None);
    assert_eq!(realm.get_named(unscopables, "append").unwrap(), Value::Bool(true));

    let factory = realm.define_legacy_factory_function(&binding, "Image", 0);
    let factory = Value::Object(factory);
    assert!(realm.call(&factory, &Value::Undefined, &[]).is_err());
    let made = realm.construct(&factory, &[]).unwrap();
    assert!(realm.implements(&made, "Element"));

    realm.define_legacy_window_alias(&binding, "HTMLElementAlias");
    assert_eq!(
        realm.global_get("HTMLElementAlias").unwrap(),
        Value::Object(binding.interface_object)
    );

    realm.hide_interface_object(&binding);
    assert!(!realm.global_has("Element").unwrap());
}

#[test]
fn test_default_to_json_copies_attributes() {
    let mut realm = MemoryRealm::window();
    let binding = realm.define_interface("Entry", None);
    realm.define_attribute(&binding, "name", Value::from("n"), AttributeOptions::default());
    let to_json = realm.define_default_to_json(&binding, vec!["name".to_string()]);
    let instance = Value::Object(realm.create_platform_object(&binding));
    let json = realm.call(&Value::Object(to_json), &instance, &[]).unwrap();
    let json = json.as_object().unwrap();
    assert_eq!(realm.get_named(json, "name").unwrap(), Value::from("n"));
    let keys = realm.own_property_keys(json).unwrap();
    assert_eq!(keys, vec![PropertyKey::from("name")]);
}
