//! ECMAScript values as seen through the host seam.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// Handle to an object owned by a realm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

/// Handle to a symbol. Ids below [`SymbolId::FIRST_USER`] are the
/// well-known symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub const FIRST_USER: u32 = 16;
}

/// Well-known symbols the harness inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WellKnownSymbol {
    Iterator,
    AsyncIterator,
    Unscopables,
    ToStringTag,
}

impl WellKnownSymbol {
    /// Well-known symbols occupy ids 1..=4.
    pub const fn id(self) -> SymbolId {
        SymbolId(self as u32 + 1)
    }

    pub const fn key(self) -> PropertyKey {
        PropertyKey::Symbol(self.id())
    }

    /// Display name (e.g. `@@iterator`).
    pub const fn name(self) -> &'static str {
        match self {
            Self::Iterator => "@@iterator",
            Self::AsyncIterator => "@@asyncIterator",
            Self::Unscopables => "@@unscopables",
            Self::ToStringTag => "@@toStringTag",
        }
    }

    pub fn from_id(id: SymbolId) -> Option<Self> {
        [
            Self::Iterator,
            Self::AsyncIterator,
            Self::Unscopables,
            Self::ToStringTag,
        ]
        .into_iter()
        .find(|symbol| symbol.id() == id)
    }
}

// ---------------------------------------------------------------------------
// PropertyKey
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PropertyKey {
    String(String),
    Symbol(SymbolId),
}

impl PropertyKey {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Symbol(_) => None,
        }
    }

    pub const fn is_symbol(&self) -> bool {
        matches!(self, Self::Symbol(_))
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Symbol(id) => match WellKnownSymbol::from_id(*id) {
                Some(symbol) => f.write_str(symbol.name()),
                None => write!(f, "Symbol({})", id.0),
            },
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<WellKnownSymbol> for PropertyKey {
    fn from(symbol: WellKnownSymbol) -> Self {
        symbol.key()
    }
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Symbol(SymbolId),
    Object(ObjectId),
}

impl Value {
    pub const fn as_object(&self) -> Option<ObjectId> {
        match self {
            Self::Object(id) => Some(*id),
            _ => None,
        }
    }

    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub const fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    pub const fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    /// `Object.is` semantics: `NaN` equals itself, `+0` and `-0` differ.
    pub fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => {
                if a.is_nan() && b.is_nan() {
                    return true;
                }
                a == b && a.is_sign_negative() == b.is_sign_negative()
            }
            _ => self == other,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Self::Object(id)
    }
}

/// `Number::toString` for the values the harness prints.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let magnitude = n.abs();
    if (1e-7..1e21).contains(&magnitude) {
        return format!("{n}");
    }
    // 1e40 -> "1e+40", 1.5e-9 -> "1.5e-9"
    let exponent_form = format!("{n:e}");
    match exponent_form.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => exponent_form,
    }
}

// ---------------------------------------------------------------------------
// Property descriptors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyDescriptor {
    Data {
        value: Value,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    },
    Accessor {
        get: Option<ObjectId>,
        set: Option<ObjectId>,
        enumerable: bool,
        configurable: bool,
    },
}

impl PropertyDescriptor {
    /// Writable, enumerable, configurable data property (plain assignment).
    pub const fn data(value: Value) -> Self {
        Self::Data {
            value,
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// `{ writable: true, enumerable: false, configurable: true }`, the shape
    /// of built-in methods and global interface bindings.
    pub const fn hidden(value: Value) -> Self {
        Self::Data {
            value,
            writable: true,
            enumerable: false,
            configurable: true,
        }
    }

    /// `{ writable: false, enumerable: false, configurable: true }`, the
    /// shape of function `length`/`name`.
    pub const fn readonly_hidden(value: Value) -> Self {
        Self::Data {
            value,
            writable: false,
            enumerable: false,
            configurable: true,
        }
    }

    pub const fn is_accessor(&self) -> bool {
        matches!(self, Self::Accessor { .. })
    }

    pub const fn enumerable(&self) -> bool {
        match self {
            Self::Data { enumerable, .. } | Self::Accessor { enumerable, .. } => *enumerable,
        }
    }

    pub const fn configurable(&self) -> bool {
        match self {
            Self::Data { configurable, .. } | Self::Accessor { configurable, .. } => *configurable,
        }
    }

    /// `writable` field; `None` for accessors.
    pub const fn writable(&self) -> Option<bool> {
        match self {
            Self::Data { writable, .. } => Some(*writable),
            Self::Accessor { .. } => None,
        }
    }

    /// `value` field; `None` for accessors.
    pub const fn value(&self) -> Option<&Value> {
        match self {
            Self::Data { value, .. } => Some(value),
            Self::Accessor { .. } => None,
        }
    }

    /// `get` field as a value (`undefined` when absent); `None` for data
    /// properties.
    pub fn getter(&self) -> Option<Value> {
        match self {
            Self::Accessor { get, .. } => Some(get.map_or(Value::Undefined, Value::Object)),
            Self::Data { .. } => None,
        }
    }

    pub fn setter(&self) -> Option<Value> {
        match self {
            Self::Accessor { set, .. } => Some(set.map_or(Value::Undefined, Value::Object)),
            Self::Data { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Exceptions and promises
// ---------------------------------------------------------------------------

/// A JavaScript exception propagated out of the realm.
#[derive(Debug, Clone, PartialEq)]
pub struct Thrown(pub Value);

#[derive(Debug, Clone, PartialEq)]
pub enum PromiseState {
    Pending,
    Fulfilled(Value),
    Rejected(Value),
}

#[cfg(test)]
#[path = "tests/value_tests.rs"]
mod tests;
