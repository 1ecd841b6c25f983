//! Top-level definitions and their members.

use serde::{Deserialize, Deserializer};

use crate::ext_attr::{ExtAttr, has_ext_attr};
use crate::types::{IdlType, null_as_default};

// =============================================================================
// Declarations
// =============================================================================

/// Kind tag of a top-level definition (`type` in the AST).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum DeclarationKind {
    #[default]
    Interface,
    InterfaceMixin,
    CallbackInterface,
    Dictionary,
    Typedef,
    Callback,
    Enum,
    Namespace,
    Includes,
    /// End-of-input marker appended by some parser versions.
    Eof,
    /// Anything else (`implements`, extensions); rejected at registration.
    Unsupported(String),
}

impl From<String> for DeclarationKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "interface" => Self::Interface,
            "interface mixin" => Self::InterfaceMixin,
            "callback interface" => Self::CallbackInterface,
            "dictionary" => Self::Dictionary,
            "typedef" => Self::Typedef,
            "callback" => Self::Callback,
            "enum" => Self::Enum,
            "namespace" => Self::Namespace,
            "includes" => Self::Includes,
            "eof" => Self::Eof,
            _ => Self::Unsupported(tag),
        }
    }
}

impl DeclarationKind {
    /// The keyword as written in IDL and in test names.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Interface => "interface",
            Self::InterfaceMixin => "interface mixin",
            Self::CallbackInterface => "callback interface",
            Self::Dictionary => "dictionary",
            Self::Typedef => "typedef",
            Self::Callback => "callback",
            Self::Enum => "enum",
            Self::Namespace => "namespace",
            Self::Includes => "includes",
            Self::Eof => "eof",
            Self::Unsupported(tag) => tag,
        }
    }

    /// Kinds that may appear with the `partial` keyword.
    pub const fn allows_partial(&self) -> bool {
        matches!(
            self,
            Self::Interface | Self::InterfaceMixin | Self::Dictionary | Self::Namespace
        )
    }
}

/// One parsed definition.
///
/// Fields that do not apply to a kind are left at their defaults: only
/// `includes` statements carry `target`/`includes`, only typedefs and
/// callbacks carry `idl_type`, only enums carry `values`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Declaration {
    #[serde(rename = "type")]
    pub kind: DeclarationKind,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    pub inheritance: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub members: Vec<Member>,
    #[serde(deserialize_with = "null_as_default")]
    pub ext_attrs: Vec<ExtAttr>,
    pub partial: bool,
    pub target: Option<String>,
    pub includes: Option<String>,
    pub idl_type: Option<IdlType>,
    pub values: Vec<EnumValue>,
    pub arguments: Vec<Argument>,
}

impl Declaration {
    pub fn has_extended_attribute(&self, names: &[&str]) -> bool {
        has_ext_attr(&self.ext_attrs, names)
    }

    /// Names this declaration introduces or refers to at top level:
    /// its own name, or both sides of an `includes` statement.
    pub fn referenced_names(&self) -> Vec<&str> {
        if !self.name.is_empty() {
            return vec![self.name.as_str()];
        }
        [self.target.as_deref(), self.includes.as_deref()]
            .into_iter()
            .flatten()
            .collect()
    }
}

/// One value of an enum.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "EnumValueRepr")]
pub struct EnumValue {
    pub value: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EnumValueRepr {
    Plain(String),
    Tagged { value: String },
}

impl From<EnumValueRepr> for EnumValue {
    fn from(repr: EnumValueRepr) -> Self {
        match repr {
            EnumValueRepr::Plain(value) | EnumValueRepr::Tagged { value } => Self { value },
        }
    }
}

// =============================================================================
// Members
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum MemberKind {
    #[default]
    Attribute,
    Operation,
    Constructor,
    Const,
    Iterable,
    Maplike,
    Setlike,
    /// Dictionary member.
    Field,
    Other(String),
}

impl From<String> for MemberKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "attribute" => Self::Attribute,
            "operation" => Self::Operation,
            "constructor" => Self::Constructor,
            "const" => Self::Const,
            "iterable" => Self::Iterable,
            "maplike" => Self::Maplike,
            "setlike" => Self::Setlike,
            "field" => Self::Field,
            _ => Self::Other(tag),
        }
    }
}

impl MemberKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Attribute => "attribute",
            Self::Operation => "operation",
            Self::Constructor => "constructor",
            Self::Const => "const",
            Self::Iterable => "iterable",
            Self::Maplike => "maplike",
            Self::Setlike => "setlike",
            Self::Field => "field",
            Self::Other(tag) => tag,
        }
    }
}

/// Special keyword preceding a member.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum Special {
    #[default]
    None,
    Static,
    Stringifier,
    Getter,
    Setter,
    Deleter,
    LegacyCaller,
    Inherit,
    Other(String),
}

impl From<String> for Special {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "" => Self::None,
            "static" => Self::Static,
            "stringifier" => Self::Stringifier,
            "getter" => Self::Getter,
            "setter" => Self::Setter,
            "deleter" => Self::Deleter,
            "legacycaller" => Self::LegacyCaller,
            "inherit" => Self::Inherit,
            _ => Self::Other(tag),
        }
    }
}

/// An interface, mixin, namespace or dictionary member.
///
/// `idl_type` holds the attribute type, the operation return type, or the
/// type arguments of `iterable`/`maplike`/`setlike` declarations. Older AST
/// versions flag `static`/`stringifier`/`legacycaller` with booleans instead
/// of `special`; both forms are accepted.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Member {
    #[serde(rename = "type")]
    pub kind: MemberKind,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "one_or_many")]
    pub idl_type: Vec<IdlType>,
    #[serde(deserialize_with = "null_as_default")]
    pub arguments: Vec<Argument>,
    #[serde(deserialize_with = "null_as_default")]
    pub ext_attrs: Vec<ExtAttr>,
    #[serde(deserialize_with = "null_as_default")]
    pub special: Special,
    pub readonly: bool,
    #[serde(rename = "async")]
    pub is_async: bool,
    pub value: Option<ConstValue>,
    pub required: bool,
    #[serde(rename = "static")]
    pub static_flag: bool,
    pub stringifier: bool,
    pub legacycaller: bool,
}

impl Member {
    /// Attribute type or operation return type.
    pub fn idl_type(&self) -> Option<&IdlType> {
        self.idl_type.first()
    }

    pub fn is_static(&self) -> bool {
        self.static_flag || self.special == Special::Static
    }

    pub fn is_stringifier(&self) -> bool {
        self.stringifier || self.special == Special::Stringifier
    }

    pub fn is_legacy_caller(&self) -> bool {
        self.legacycaller || self.special == Special::LegacyCaller
    }

    pub fn has_extended_attribute(&self, names: &[&str]) -> bool {
        has_ext_attr(&self.ext_attrs, names)
    }

    /// Whether the (first) declared type is `Promise<T>`.
    pub fn returns_promise(&self) -> bool {
        self.idl_type().is_some_and(IdlType::is_promise)
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<IdlType>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<IdlType>),
        One(IdlType),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::Many(types)) => types,
        Some(OneOrMany::One(ty)) => vec![ty],
    })
}

// =============================================================================
// Arguments and constants
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Argument {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub idl_type: IdlType,
    pub optional: bool,
    pub variadic: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub ext_attrs: Vec<ExtAttr>,
}

impl Argument {
    /// Arguments that count towards a function's `length`.
    pub const fn is_required(&self) -> bool {
        !self.optional && !self.variadic
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
pub enum ConstKind {
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "boolean")]
    Boolean,
    #[default]
    #[serde(rename = "null")]
    Null,
    #[serde(rename = "Infinity")]
    Infinity,
    #[serde(rename = "NaN")]
    NaN,
    #[serde(rename = "string")]
    String,
    #[serde(other)]
    Other,
}

/// Literal value of a `const` member.
///
/// Numbers arrive as their source text (`"0x1F"`, `"-3"`, `"1.5e3"`).
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConstValue {
    #[serde(rename = "type")]
    pub kind: ConstKind,
    pub value: serde_json::Value,
    pub negative: bool,
}

impl ConstValue {
    /// Numeric value of `number`, `Infinity` and `NaN` constants.
    pub fn as_number(&self) -> Option<f64> {
        match self.kind {
            ConstKind::NaN => Some(f64::NAN),
            ConstKind::Infinity if self.negative => Some(f64::NEG_INFINITY),
            ConstKind::Infinity => Some(f64::INFINITY),
            ConstKind::Number => match &self.value {
                serde_json::Value::Number(n) => n.as_f64(),
                serde_json::Value::String(text) => parse_number_literal(text),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Parse an IDL integer or float literal, including hex and octal forms.
fn parse_number_literal(text: &str) -> Option<f64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let magnitude = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16).ok()? as f64
    } else if digits.len() > 1
        && digits.starts_with('0')
        && digits.bytes().all(|b| b.is_ascii_digit())
    {
        u64::from_str_radix(&digits[1..], 8).ok()? as f64
    } else {
        digits.parse::<f64>().ok()?
    };
    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
#[path = "tests/declaration_tests.rs"]
mod tests;
