//! Parsed WebIDL declarations.
//!
//! The harness does not parse IDL text. It consumes the JSON abstract syntax
//! tree emitted by `webidl2` (`WebIDL2.parse(text)`), deserialized here with
//! `serde`. Only the fields the conformance engine reads are modelled;
//! trivia, source positions and unknown fields are ignored.
//!
//! Module layout:
//! - `declaration`: top-level definitions and their members
//! - `types`: `IdlType`, the recursive type expression
//! - `ext_attr`: extended attributes (`[Exposed=Window]`, ...)

pub mod declaration;
pub mod ext_attr;
pub mod types;

pub use declaration::{
    Argument, ConstKind, ConstValue, Declaration, DeclarationKind, EnumValue, Member, MemberKind,
    Special,
};
pub use ext_attr::{ExtAttr, ExtAttrRhs, find_ext_attr, has_ext_attr};
pub use types::{IdlType, TypeBody};

use thiserror::Error;
use tracing::debug;

/// Errors raised while reading a parsed AST.
#[derive(Debug, Error)]
pub enum AstError {
    #[error("malformed IDL AST: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected an array of definitions, found {0}")]
    NotAnArray(&'static str),
}

/// Deserialize the output of `WebIDL2.parse` from a JSON string.
///
/// The trailing `eof` pseudo-definition some parser versions append is dropped.
pub fn parse_definitions(json: &str) -> Result<Vec<Declaration>, AstError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    from_value(value)
}

/// Deserialize parsed definitions from an already-decoded JSON value.
pub fn from_value(value: serde_json::Value) -> Result<Vec<Declaration>, AstError> {
    if !value.is_array() {
        return Err(AstError::NotAnArray(json_kind(&value)));
    }
    let mut definitions: Vec<Declaration> = serde_json::from_value(value)?;
    definitions.retain(|decl| decl.kind != DeclarationKind::Eof);
    debug!(count = definitions.len(), "parsed IDL definitions");
    Ok(definitions)
}

const fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
