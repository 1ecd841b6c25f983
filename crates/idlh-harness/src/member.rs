//! Interface and namespace members as the harness sees them.
//!
//! An [`IdlMember`] owns a copy of the parsed [`Member`] plus the flags the
//! checks branch on. Partial and mixin merges clone members onto their
//! target, so the original declaration is never shared.

use std::ops::Deref;

use bitflags::bitflags;
use idlh_ast::{Argument, IdlType, Member, MemberKind, Special};

use crate::names;

bitflags! {
    /// Derived classification of a member.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MemberFlags: u8 {
        /// `[LegacyUnforgeable]` on the member, or on the owning interface
        /// for regular attributes and operations.
        const UNFORGEABLE = 1 << 0;
        /// `[Unscopable]`
        const UNSCOPABLE = 1 << 1;
        /// Registered through `add_untested_idls` or as a dependency.
        const UNTESTED = 1 << 2;
        /// Added by the harness for an `iterable<K, V>` declaration.
        const SYNTHESIZED = 1 << 3;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct IdlMember {
    member: Member,
    pub flags: MemberFlags,
}

impl Deref for IdlMember {
    type Target = Member;

    fn deref(&self) -> &Member {
        &self.member
    }
}

impl IdlMember {
    pub fn new(member: Member, untested: bool) -> Self {
        let mut flags = MemberFlags::empty();
        flags.set(
            MemberFlags::UNFORGEABLE,
            member.has_extended_attribute(names::UNFORGEABLE),
        );
        flags.set(
            MemberFlags::UNSCOPABLE,
            member.has_extended_attribute(names::UNSCOPABLE),
        );
        flags.set(MemberFlags::UNTESTED, untested);
        Self { member, flags }
    }

    /// A regular operation the harness adds on behalf of an iteration
    /// declaration.
    pub(crate) fn synthesized_operation(
        name: &str,
        return_type: IdlType,
        arguments: Vec<Argument>,
        untested: bool,
    ) -> Self {
        let member = Member {
            kind: MemberKind::Operation,
            name: name.to_string(),
            idl_type: vec![return_type],
            arguments,
            ..Member::default()
        };
        let mut synthesized = Self::new(member, untested);
        synthesized.flags.insert(MemberFlags::SYNTHESIZED);
        synthesized
    }

    pub fn member(&self) -> &Member {
        &self.member
    }

    pub const fn is_unforgeable(&self) -> bool {
        self.flags.contains(MemberFlags::UNFORGEABLE)
    }

    pub const fn is_unscopable(&self) -> bool {
        self.flags.contains(MemberFlags::UNSCOPABLE)
    }

    pub const fn is_untested(&self) -> bool {
        self.flags.contains(MemberFlags::UNTESTED)
    }

    pub(crate) fn mark_unforgeable(&mut self) {
        self.flags.insert(MemberFlags::UNFORGEABLE);
    }

    pub fn is_operation(&self) -> bool {
        self.kind == MemberKind::Operation
    }

    pub fn is_attribute(&self) -> bool {
        self.kind == MemberKind::Attribute
    }

    /// A non-static operation named `toJSON`.
    pub fn is_to_json_regular_operation(&self) -> bool {
        self.is_operation() && !self.is_static() && self.name == "toJSON"
    }

    /// Attributes that get a setter despite being `readonly`.
    pub fn has_setter_despite_readonly(&self) -> bool {
        self.has_extended_attribute(names::LEGACY_LENIENT_SETTER)
            || self.has_extended_attribute(names::PUT_FORWARDS)
            || self.has_extended_attribute(names::REPLACEABLE)
    }

    pub fn is_lenient_this(&self) -> bool {
        self.has_extended_attribute(names::LENIENT_THIS)
    }

    /// `name(type, type)`, the form used in test names.
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, argument_types(&self.arguments, false))
    }

    /// Like [`signature`](Self::signature), marking variadic arguments with
    /// `...`.
    pub fn variadic_signature(&self) -> String {
        format!("{}({})", self.name, argument_types(&self.arguments, true))
    }

    /// Getters, setters and deleters without an identifier have no
    /// property of their own.
    pub fn is_anonymous_special(&self) -> bool {
        self.name.is_empty()
            && matches!(
                self.special,
                Special::Getter | Special::Setter | Special::Deleter
            )
    }
}

fn argument_types(arguments: &[Argument], mark_variadic: bool) -> String {
    arguments
        .iter()
        .map(|arg| {
            if mark_variadic && arg.variadic {
                format!("{}...", arg.idl_type)
            } else {
                arg.idl_type.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Length of the shortest argument list among `overloads`, counting only
/// required arguments. Zero when there are no overloads.
pub fn min_overload_length<'a, I>(overloads: I) -> usize
where
    I: IntoIterator<Item = &'a [Argument]>,
{
    overloads
        .into_iter()
        .map(|arguments| arguments.iter().filter(|arg| arg.is_required()).count())
        .min()
        .unwrap_or(0)
}

/// Whether two members would define the same property.
///
/// Operations with the same name but a different number of arguments are
/// overloads, not duplicates. Anonymous members never clash.
pub fn are_duplicate_members(a: &Member, b: &Member) -> bool {
    if a.name.is_empty() || a.name != b.name {
        return false;
    }
    if a.kind == MemberKind::Operation && b.kind == MemberKind::Operation {
        return a.arguments.len() == b.arguments.len();
    }
    true
}

#[cfg(test)]
#[path = "tests/member_tests.rs"]
mod tests;
