//! JSON type classification (WebIDL "JSON types"), used to validate the
//! return type of `toJSON` operations.

use idlh_ast::IdlType;
use idlh_common::limits::{MAX_INHERITANCE_DEPTH, MAX_TYPE_NESTING_DEPTH};
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::definitions::{Definition, IdlInterface};
use crate::error::{HarnessError, HarnessResult};
use crate::registry::IdlArray;

const JSON_PRIMITIVES: &[&str] = &[
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
    "DOMTimeStamp",
    "DOMHighResTimeStamp",
    "boolean",
    "DOMString",
    "ByteString",
    "USVString",
    "object",
];

const NON_JSON: &[&str] = &[
    "Error",
    "DOMException",
    "Int8Array",
    "Int16Array",
    "Int32Array",
    "Uint8Array",
    "Uint16Array",
    "Uint32Array",
    "Uint8ClampedArray",
    "BigInt64Array",
    "BigUint64Array",
    "Float32Array",
    "Float64Array",
    "ArrayBuffer",
    "DataView",
    "any",
];

impl IdlArray {
    /// Whether `ty` is a JSON type. Names the registry does not know are an
    /// error rather than `false`.
    pub fn is_json_type(&self, ty: &IdlType) -> HarnessResult<bool> {
        self.json_type_at(ty, 0)
    }

    fn json_type_at(&self, ty: &IdlType, depth: u32) -> HarnessResult<bool> {
        if depth > MAX_TYPE_NESTING_DEPTH {
            return Err(HarnessError::Internal(format!("type {ty} nests too deeply")));
        }
        if ty.is_promise() {
            return Ok(false);
        }
        if ty.union || ty.is_generic("record") {
            return self.all_json(ty.arguments(), depth);
        }
        if ty.is_generic("sequence") || ty.is_generic("FrozenArray") || ty.is_generic("ObservableArray") {
            let Some(element) = ty.arguments().first() else {
                return Err(HarnessError::UnexpectedType(ty.to_string()));
            };
            return self.json_type_at(element, depth + 1);
        }
        if !ty.generic.is_empty() {
            return Err(HarnessError::UnexpectedType(ty.to_string()));
        }
        let Some(name) = ty.name() else {
            return Err(HarnessError::UnexpectedType(ty.to_string()));
        };

        if JSON_PRIMITIVES.contains(&name) {
            return Ok(true);
        }
        if NON_JSON.contains(&name) {
            return Ok(false);
        }
        match self.members.get(name) {
            None => Err(HarnessError::TypeNotFound(name.to_string())),
            Some(Definition::Enum(_)) => Ok(true),
            Some(Definition::Typedef(typedef)) => self.json_type_at(&typedef.idl_type, depth + 1),
            Some(Definition::Dictionary(_)) => {
                // Derived members override base members of the same name.
                let mut fields: IndexMap<&str, &IdlType, FxBuildHasher> = IndexMap::default();
                for definition in self.inheritance_stack(name)?.into_iter().rev() {
                    if let Definition::Dictionary(dictionary) = definition {
                        for member in &dictionary.members {
                            if let Some(member_type) = member.idl_type() {
                                fields.insert(member.name.as_str(), member_type);
                            }
                        }
                    }
                }
                for field_type in fields.values() {
                    if !self.json_type_at(field_type, depth + 1)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Some(Definition::Interface(interface) | Definition::Mixin(interface)) => {
                self.interface_has_to_json(interface)
            }
            Some(Definition::Callback(_) | Definition::Namespace(_)) => Ok(false),
        }
    }

    fn all_json(&self, types: &[IdlType], depth: u32) -> HarnessResult<bool> {
        for member in types {
            if !self.json_type_at(member, depth + 1)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// A `toJSON` regular operation on the interface, one of its mixins, or
    /// anything it inherits from.
    fn interface_has_to_json(&self, interface: &IdlInterface) -> HarnessResult<bool> {
        let mut current = interface;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            if current.has_to_json_regular_operation() {
                return Ok(true);
            }
            for mixin_name in self.mixins_of(&current.name) {
                let Some(mixin) = self.interface(mixin_name) else {
                    return Err(HarnessError::InterfaceNotFound {
                        interface: mixin_name.to_string(),
                        name: current.name.clone(),
                    });
                };
                if mixin.has_to_json_regular_operation() {
                    return Ok(true);
                }
            }
            let Some(base) = &current.base else {
                return Ok(false);
            };
            current = self.interface(base).ok_or_else(|| HarnessError::InterfaceNotFound {
                interface: base.clone(),
                name: current.name.clone(),
            })?;
        }
        Err(HarnessError::Internal(format!(
            "inheritance chain of {} is deeper than {MAX_INHERITANCE_DEPTH}",
            interface.name
        )))
    }
}

#[cfg(test)]
#[path = "tests/json_types_tests.rs"]
mod tests;
