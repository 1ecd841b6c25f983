//! Extended attributes.

use serde::Deserialize;
use smallvec::SmallVec;

use crate::declaration::Argument;

/// One `[Name]`, `[Name=Value]`, `[Name=(A,B)]` or `[Name(args)]` entry.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExtAttr {
    pub name: String,
    pub rhs: Option<ExtAttrRhs>,
    pub arguments: Vec<Argument>,
}

/// Right-hand side of an extended attribute.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExtAttrRhs {
    /// `identifier`, `identifier-list`, `string`, `string-list`, `*`, ...
    #[serde(rename = "type")]
    pub kind: String,
    /// A bare string, or a list whose items are strings or `{ "value": .. }`.
    pub value: serde_json::Value,
}

impl ExtAttr {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// `[Name=value]`.
    pub fn with_identifier(name: impl Into<String>, value: impl Into<String>) -> Self {
        let value: String = value.into();
        let kind = if value == "*" { "*" } else { "identifier" };
        Self {
            name: name.into(),
            rhs: Some(ExtAttrRhs {
                kind: kind.to_string(),
                value: serde_json::Value::String(value),
            }),
            arguments: Vec::new(),
        }
    }

    /// Whether the right-hand side is the `*` wildcard.
    pub fn is_wildcard(&self) -> bool {
        self.rhs.as_ref().is_some_and(|rhs| {
            rhs.kind == "*" || rhs.value.as_str().is_some_and(|value| value == "*")
        })
    }

    /// Every identifier named on the right-hand side, in source order.
    pub fn rhs_values(&self) -> SmallVec<[&str; 4]> {
        let mut out = SmallVec::new();
        let Some(rhs) = &self.rhs else {
            return out;
        };
        match &rhs.value {
            serde_json::Value::String(value) => out.push(value.as_str()),
            serde_json::Value::Array(items) => {
                for item in items {
                    let value = match item {
                        serde_json::Value::String(value) => Some(value.as_str()),
                        serde_json::Value::Object(map) => {
                            map.get("value").and_then(serde_json::Value::as_str)
                        }
                        _ => None,
                    };
                    if let Some(value) = value {
                        out.push(value);
                    }
                }
            }
            _ => {}
        }
        out
    }

    /// The single identifier on the right-hand side, if there is exactly one.
    pub fn rhs_identifier(&self) -> Option<&str> {
        self.rhs.as_ref()?.value.as_str()
    }
}

/// First extended attribute whose name is one of `names`.
///
/// Several attributes were renamed with a `Legacy` prefix; callers pass both
/// spellings.
pub fn find_ext_attr<'a>(ext_attrs: &'a [ExtAttr], names: &[&str]) -> Option<&'a ExtAttr> {
    ext_attrs
        .iter()
        .find(|attr| names.contains(&attr.name.as_str()))
}

pub fn has_ext_attr(ext_attrs: &[ExtAttr], names: &[&str]) -> bool {
    find_ext_attr(ext_attrs, names).is_some()
}
