//! IDL type expressions.
//!
//! `webidl2` represents every type as one recursive record:
//!
//! ```text
//! long                  { generic: "",         union: false, idlType: "long" }
//! sequence<long>        { generic: "sequence", union: false, idlType: [long] }
//! (DOMString or long)?  { generic: "",         union: true,  idlType: [DOMString, long], nullable: true }
//! record<K, V>          { generic: "record",   union: false, idlType: [K, V] }
//! ```

use std::fmt;

use serde::{Deserialize, Deserializer};

use crate::ext_attr::ExtAttr;

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdlType {
    /// `sequence`, `FrozenArray`, `ObservableArray`, `Promise`, `record`, or empty.
    #[serde(deserialize_with = "null_as_default")]
    pub generic: String,
    pub nullable: bool,
    pub union: bool,
    pub idl_type: TypeBody,
    pub ext_attrs: Vec<ExtAttr>,
}

/// Either a type name or the list of nested types of a generic or union.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TypeBody {
    Named(String),
    List(Vec<IdlType>),
}

impl Default for TypeBody {
    fn default() -> Self {
        Self::Named(String::new())
    }
}

impl IdlType {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            idl_type: TypeBody::Named(name.into()),
            ..Self::default()
        }
    }

    pub fn generic(generic: impl Into<String>, arguments: Vec<Self>) -> Self {
        Self {
            generic: generic.into(),
            idl_type: TypeBody::List(arguments),
            ..Self::default()
        }
    }

    pub fn union_of(members: Vec<Self>) -> Self {
        Self {
            union: true,
            idl_type: TypeBody::List(members),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// The referenced type name for non-generic, non-union types.
    pub fn name(&self) -> Option<&str> {
        match &self.idl_type {
            TypeBody::Named(name) => Some(name),
            TypeBody::List(_) => None,
        }
    }

    /// Nested types: union members or generic arguments.
    pub fn arguments(&self) -> &[Self] {
        match &self.idl_type {
            TypeBody::Named(_) => &[],
            TypeBody::List(types) => types,
        }
    }

    pub fn is_generic(&self, generic: &str) -> bool {
        self.generic == generic
    }

    pub fn is_promise(&self) -> bool {
        self.is_generic("Promise")
    }
}

impl fmt::Display for IdlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.idl_type {
            TypeBody::Named(name) if self.generic.is_empty() => f.write_str(name)?,
            TypeBody::Named(name) => write!(f, "{}<{name}>", self.generic)?,
            TypeBody::List(types) if self.union => {
                f.write_str("(")?;
                write_joined(f, types, " or ")?;
                f.write_str(")")?;
            }
            TypeBody::List(types) => {
                write!(f, "{}<", self.generic)?;
                write_joined(f, types, ", ")?;
                f.write_str(">")?;
            }
        }
        if self.nullable {
            f.write_str("?")?;
        }
        Ok(())
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, types: &[IdlType], separator: &str) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{ty}")?;
    }
    Ok(())
}

/// Older parser versions emit `null` where newer ones emit an empty string.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
