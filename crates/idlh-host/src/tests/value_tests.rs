use super::*;

#[test]
fn test_same_value_distinguishes_signed_zero() {
    assert!(!Value::Number(0.0).same_value(&Value::Number(-0.0)));
    assert!(Value::Number(-0.0).same_value(&Value::Number(-0.0)));
}

#[test]
fn test_same_value_nan_equals_nan() {
    assert!(Value::Number(f64::NAN).same_value(&Value::Number(f64::NAN)));
    assert!(!Value::Number(f64::NAN).same_value(&Value::Number(1.0)));
}

#[test]
fn test_number_to_string_matches_js() {
    assert_eq!(number_to_string(7.0), "7");
    assert_eq!(number_to_string(1.5), "1.5");
    assert_eq!(number_to_string(-0.0), "0");
    assert_eq!(number_to_string(1e40), "1e+40");
    assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
    assert_eq!(number_to_string(f64::NAN), "NaN");
}

#[test]
fn test_well_known_symbols_round_trip() {
    let key = PropertyKey::from(WellKnownSymbol::Unscopables);
    assert!(key.is_symbol());
    assert_eq!(key.to_string(), "@@unscopables");
    assert_eq!(
        WellKnownSymbol::from_id(WellKnownSymbol::AsyncIterator.id()),
        Some(WellKnownSymbol::AsyncIterator)
    );
    assert_eq!(WellKnownSymbol::from_id(SymbolId(SymbolId::FIRST_USER)), None);
}

#[test]
fn test_descriptor_accessors() {
    let data = PropertyDescriptor::readonly_hidden(Value::Number(0.0));
    assert_eq!(data.writable(), Some(false));
    assert!(!data.enumerable());
    assert!(data.configurable());
    assert!(data.getter().is_none());

    let accessor = PropertyDescriptor::Accessor {
        get: Some(ObjectId(3)),
        set: None,
        enumerable: true,
        configurable: true,
    };
    assert!(accessor.is_accessor());
    assert_eq!(accessor.writable(), None);
    assert_eq!(accessor.getter(), Some(Value::Object(ObjectId(3))));
    assert_eq!(accessor.setter(), Some(Value::Undefined));
}
