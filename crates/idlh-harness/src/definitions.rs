//! Registry entries.
//!
//! Every registered name maps to exactly one [`Definition`]. Interfaces and
//! namespaces generate checks; the other kinds only exist so that declared
//! types can be resolved while checking values.

use idlh_ast::{Argument, Declaration, DeclarationKind, EnumValue, ExtAttr, IdlType, Member};

use crate::exposure::ExposureSet;
use crate::member::{IdlMember, min_overload_length};
use crate::names;

// =============================================================================
// Interfaces
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InterfaceKind {
    Regular,
    Callback,
    Mixin,
}

#[derive(Clone, Debug)]
pub struct IdlInterface {
    pub name: String,
    pub kind: InterfaceKind,
    /// Skip checks on the interface and prototype objects. Members carry
    /// their own flag.
    pub untested: bool,
    pub ext_attrs: Vec<ExtAttr>,
    pub members: Vec<IdlMember>,
    pub base: Option<String>,
    /// Computed by `IdlArray::test`.
    pub exposure: ExposureSet,
    pub exposed: bool,
    pub prevent_multiple_testing: bool,
    pub(crate) iteration_members_added: bool,
}

impl IdlInterface {
    pub fn new(decl: Declaration, kind: InterfaceKind, untested: bool) -> Self {
        let mut interface = Self {
            name: decl.name,
            kind,
            untested,
            ext_attrs: decl.ext_attrs,
            members: Vec::new(),
            base: decl.inheritance,
            exposure: ExposureSet::default(),
            exposed: false,
            prevent_multiple_testing: false,
            iteration_members_added: false,
        };
        interface.push_members(decl.members, untested);
        interface
    }

    /// Append members, applying the interface-level `[LegacyUnforgeable]`.
    pub(crate) fn push_members(&mut self, members: impl IntoIterator<Item = Member>, untested: bool) {
        for member in members {
            self.push_member(member, untested);
        }
    }

    pub(crate) fn push_member(&mut self, member: Member, untested: bool) {
        let mut member = IdlMember::new(member, untested);
        if self.has_extended_attribute(names::UNFORGEABLE)
            && !member.is_static()
            && (member.is_attribute() || member.is_operation())
        {
            member.mark_unforgeable();
        }
        self.members.push(member);
    }

    pub fn has_extended_attribute(&self, names: &[&str]) -> bool {
        idlh_ast::has_ext_attr(&self.ext_attrs, names)
    }

    pub const fn is_callback(&self) -> bool {
        matches!(self.kind, InterfaceKind::Callback)
    }

    pub const fn is_mixin(&self) -> bool {
        matches!(self.kind, InterfaceKind::Mixin)
    }

    pub fn is_global(&self) -> bool {
        self.has_extended_attribute(names::GLOBAL)
    }

    pub fn has_interface_object(&self) -> bool {
        !self.has_extended_attribute(names::NO_INTERFACE_OBJECT)
    }

    pub fn has_constants(&self) -> bool {
        self.members
            .iter()
            .any(|m| m.kind == idlh_ast::MemberKind::Const)
    }

    /// Callback interfaces without constants have no interface object.
    pub fn is_callback_without_constants(&self) -> bool {
        self.is_callback() && !self.has_constants()
    }

    pub fn unscopable_names(&self) -> Vec<&str> {
        self.members
            .iter()
            .filter(|m| m.is_unscopable())
            .map(|m| m.name.as_str())
            .collect()
    }

    /// `[LegacyNamespace=X]`
    pub fn legacy_namespace(&self) -> Option<&str> {
        idlh_ast::find_ext_attr(&self.ext_attrs, names::LEGACY_NAMESPACE)
            .and_then(ExtAttr::rhs_identifier)
    }

    pub fn qualified_name(&self) -> String {
        match self.legacy_namespace() {
            Some(namespace) => format!("{namespace}.{}", self.name),
            None => self.name.clone(),
        }
    }

    pub fn has_to_json_regular_operation(&self) -> bool {
        self.members.iter().any(|m| m.is_to_json_regular_operation())
    }

    pub fn has_default_to_json_regular_operation(&self) -> bool {
        self.members
            .iter()
            .any(|m| m.is_to_json_regular_operation() && m.has_extended_attribute(names::DEFAULT))
    }

    /// Argument lists of every constructor: `constructor(...)` members and
    /// legacy `[Constructor(...)]` attributes.
    pub fn constructor_overloads(&self) -> Vec<&[Argument]> {
        let members = self
            .members
            .iter()
            .filter(|m| m.kind == idlh_ast::MemberKind::Constructor)
            .map(|m| m.arguments.as_slice());
        let attrs = self
            .ext_attrs
            .iter()
            .filter(|attr| names::CONSTRUCTOR.contains(&attr.name.as_str()))
            .map(|attr| attr.arguments.as_slice());
        members.chain(attrs).collect()
    }

    pub fn has_constructor(&self) -> bool {
        !self.constructor_overloads().is_empty()
    }

    /// Expected `length` of the interface object.
    pub fn constructor_length(&self) -> usize {
        min_overload_length(self.constructor_overloads())
    }

    /// Operations sharing `name`, used for the `length` of overloaded
    /// operations.
    pub fn operation_overloads<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a [Argument]> + 'a {
        self.members
            .iter()
            .filter(move |m| m.is_operation() && m.name == name)
            .map(|m| m.arguments.as_slice())
    }

    /// Whether instances report `typeof` other than `"object"`.
    pub fn expected_typeof(&self) -> &'static str {
        if self.name == "HTMLAllCollection" {
            "undefined"
        } else if self.members.iter().any(|m| m.is_legacy_caller()) {
            "function"
        } else {
            "object"
        }
    }
}

// =============================================================================
// Other definitions
// =============================================================================

#[derive(Clone, Debug)]
pub struct IdlDictionary {
    pub name: String,
    pub base: Option<String>,
    pub members: Vec<Member>,
    pub ext_attrs: Vec<ExtAttr>,
}

#[derive(Clone, Debug)]
pub struct IdlTypedef {
    pub name: String,
    pub idl_type: IdlType,
}

#[derive(Clone, Debug)]
pub struct IdlCallback {
    pub name: String,
    pub return_type: Option<IdlType>,
    pub arguments: Vec<Argument>,
}

#[derive(Clone, Debug)]
pub struct IdlEnum {
    pub name: String,
    pub values: Vec<EnumValue>,
}

#[derive(Clone, Debug)]
pub struct IdlNamespace {
    pub name: String,
    pub untested: bool,
    pub ext_attrs: Vec<ExtAttr>,
    pub members: Vec<IdlMember>,
    pub exposure: ExposureSet,
    pub exposed: bool,
}

impl IdlNamespace {
    pub fn new(decl: Declaration, untested: bool) -> Self {
        Self {
            name: decl.name,
            untested,
            ext_attrs: decl.ext_attrs,
            members: decl
                .members
                .into_iter()
                .map(|m| IdlMember::new(m, untested))
                .collect(),
            exposure: ExposureSet::default(),
            exposed: false,
        }
    }

    pub fn operation_overloads<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a [Argument]> + 'a {
        self.members
            .iter()
            .filter(move |m| m.is_operation() && m.name == name)
            .map(|m| m.arguments.as_slice())
    }
}

// =============================================================================
// Definition
// =============================================================================

/// Everything a name can be registered as.
#[derive(Clone, Debug)]
pub enum Definition {
    /// A regular or callback interface.
    Interface(IdlInterface),
    Mixin(IdlInterface),
    Dictionary(IdlDictionary),
    Typedef(IdlTypedef),
    Callback(IdlCallback),
    Enum(IdlEnum),
    Namespace(IdlNamespace),
}

impl Definition {
    /// Wrap a non-partial declaration. `None` for kinds that cannot be
    /// registered by name.
    pub fn from_declaration(decl: Declaration, untested: bool) -> Option<Self> {
        let definition = match decl.kind {
            DeclarationKind::Interface => {
                Self::Interface(IdlInterface::new(decl, InterfaceKind::Regular, untested))
            }
            DeclarationKind::CallbackInterface => {
                Self::Interface(IdlInterface::new(decl, InterfaceKind::Callback, untested))
            }
            DeclarationKind::InterfaceMixin => {
                Self::Mixin(IdlInterface::new(decl, InterfaceKind::Mixin, untested))
            }
            DeclarationKind::Dictionary => Self::Dictionary(IdlDictionary {
                name: decl.name,
                base: decl.inheritance,
                members: decl.members,
                ext_attrs: decl.ext_attrs,
            }),
            DeclarationKind::Typedef => Self::Typedef(IdlTypedef {
                name: decl.name,
                idl_type: decl.idl_type.unwrap_or_default(),
            }),
            DeclarationKind::Callback => Self::Callback(IdlCallback {
                name: decl.name,
                return_type: decl.idl_type,
                arguments: decl.arguments,
            }),
            DeclarationKind::Enum => Self::Enum(IdlEnum {
                name: decl.name,
                values: decl.values,
            }),
            DeclarationKind::Namespace => Self::Namespace(IdlNamespace::new(decl, untested)),
            DeclarationKind::Includes | DeclarationKind::Eof | DeclarationKind::Unsupported(_) => {
                return None;
            }
        };
        Some(definition)
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Interface(i) | Self::Mixin(i) => &i.name,
            Self::Dictionary(d) => &d.name,
            Self::Typedef(t) => &t.name,
            Self::Callback(c) => &c.name,
            Self::Enum(e) => &e.name,
            Self::Namespace(n) => &n.name,
        }
    }

    /// Keyword used in messages and partial test names.
    pub const fn kind_str(&self) -> &'static str {
        match self {
            Self::Interface(i) if i.is_callback() => "callback interface",
            Self::Interface(_) => "interface",
            Self::Mixin(_) => "interface mixin",
            Self::Dictionary(_) => "dictionary",
            Self::Typedef(_) => "typedef",
            Self::Callback(_) => "callback",
            Self::Enum(_) => "enum",
            Self::Namespace(_) => "namespace",
        }
    }

    /// Inherited interface or dictionary.
    pub fn base(&self) -> Option<&str> {
        match self {
            Self::Interface(i) | Self::Mixin(i) => i.base.as_deref(),
            Self::Dictionary(d) => d.base.as_deref(),
            _ => None,
        }
    }

    /// Interfaces, callback interfaces and mixins.
    pub const fn as_interface(&self) -> Option<&IdlInterface> {
        match self {
            Self::Interface(i) | Self::Mixin(i) => Some(i),
            _ => None,
        }
    }

    pub const fn as_interface_mut(&mut self) -> Option<&mut IdlInterface> {
        match self {
            Self::Interface(i) | Self::Mixin(i) => Some(i),
            _ => None,
        }
    }

    pub const fn is_interface_like(&self) -> bool {
        self.as_interface().is_some()
    }

    /// Whether a partial declaration of `kind` can extend this definition.
    pub fn accepts_partial(&self, kind: &DeclarationKind) -> bool {
        matches!(
            (self, kind),
            (Self::Interface(_), DeclarationKind::Interface)
                | (Self::Mixin(_), DeclarationKind::InterfaceMixin)
                | (Self::Dictionary(_), DeclarationKind::Dictionary)
                | (Self::Namespace(_), DeclarationKind::Namespace)
        )
    }

    pub fn ext_attrs(&self) -> &[ExtAttr] {
        match self {
            Self::Interface(i) | Self::Mixin(i) => &i.ext_attrs,
            Self::Dictionary(d) => &d.ext_attrs,
            Self::Namespace(n) => &n.ext_attrs,
            _ => &[],
        }
    }

    /// Append partial or mixin contributions.
    pub(crate) fn absorb(&mut self, ext_attrs: Vec<ExtAttr>, members: Vec<(Member, bool)>) {
        match self {
            Self::Interface(i) | Self::Mixin(i) => {
                i.ext_attrs.extend(ext_attrs);
                for (member, untested) in members {
                    i.push_member(member, untested);
                }
            }
            Self::Dictionary(d) => {
                d.ext_attrs.extend(ext_attrs);
                d.members.extend(members.into_iter().map(|(member, _)| member));
            }
            Self::Namespace(n) => {
                n.ext_attrs.extend(ext_attrs);
                n.members
                    .extend(members.into_iter().map(|(member, untested)| IdlMember::new(member, untested)));
            }
            _ => {}
        }
    }

    /// Member names, for duplicate detection during merges.
    pub fn member_decls(&self) -> Vec<&Member> {
        match self {
            Self::Interface(i) | Self::Mixin(i) => i.members.iter().map(IdlMember::member).collect(),
            Self::Namespace(n) => n.members.iter().map(IdlMember::member).collect(),
            Self::Dictionary(d) => d.members.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Whether tested content (the definition or one of its members) is
    /// present.
    pub fn is_tested(&self) -> bool {
        match self {
            Self::Interface(i) | Self::Mixin(i) => !i.untested,
            Self::Namespace(n) => !n.untested,
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "tests/definitions_tests.rs"]
mod tests;
