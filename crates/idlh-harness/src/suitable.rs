//! Minimal argument values for probing operation arity.

use idlh_ast::IdlType;
use idlh_host::{Intrinsic, Realm, Value};

const NUMERIC_TYPES: &[&str] = &[
    "byte",
    "octet",
    "short",
    "unsigned short",
    "long",
    "unsigned long",
    "long long",
    "unsigned long long",
    "float",
    "double",
    "unrestricted float",
    "unrestricted double",
];

/// A value of `ty` the host should accept as an argument, or `null` when no
/// such value can be built without knowing more about the type.
pub fn create_suitable_object(realm: &mut dyn Realm, ty: &IdlType) -> Value {
    if ty.nullable {
        return Value::Null;
    }
    let Some(name) = ty.name() else {
        return Value::Null;
    };
    match name {
        "any" | "boolean" => Value::Bool(true),
        "DOMString" | "ByteString" | "USVString" => Value::String("foo".to_string()),
        "object" => {
            let prototype = realm.intrinsic(Intrinsic::ObjectPrototype);
            let object = realm.create_object(Some(prototype));
            match realm.create_data_property(object, "a".into(), Value::String("b".to_string())) {
                Ok(_) => Value::Object(object),
                Err(_) => Value::Null,
            }
        }
        "Node" => realm
            .evaluate("document.createTextNode(\"abc\")")
            .unwrap_or(Value::Null),
        _ if NUMERIC_TYPES.contains(&name) => Value::Number(7.0),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idlh_host::{MemoryRealm, RealmExt};

    #[test]
    fn test_suitable_primitives() {
        let mut realm = MemoryRealm::window();
        assert_eq!(create_suitable_object(&mut realm, &IdlType::named("long")), Value::Number(7.0));
        assert_eq!(create_suitable_object(&mut realm, &IdlType::named("any")), Value::Bool(true));
        assert_eq!(
            create_suitable_object(&mut realm, &IdlType::named("USVString")),
            Value::String("foo".to_string())
        );
        assert_eq!(
            create_suitable_object(&mut realm, &IdlType::named("long").nullable()),
            Value::Null
        );
    }

    #[test]
    fn test_suitable_object_has_property() {
        let mut realm = MemoryRealm::window();
        let value = create_suitable_object(&mut realm, &IdlType::named("object"));
        let object = value.as_object().expect("object");
        assert_eq!(realm.get_named(object, "a").unwrap(), Value::String("b".to_string()));
    }

    #[test]
    fn test_suitable_unknown_and_missing_node() {
        let mut realm = MemoryRealm::window();
        assert_eq!(create_suitable_object(&mut realm, &IdlType::named("Blob")), Value::Null);
        // No document in a bare realm.
        assert_eq!(create_suitable_object(&mut realm, &IdlType::named("Node")), Value::Null);
    }
}
