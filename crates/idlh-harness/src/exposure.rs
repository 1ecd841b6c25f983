//! `[Exposed]` sets.
//!
//! An interface or member is visible in the globals named by its
//! `[Exposed]` extended attribute, `{Window}` when it has none, or in every
//! global for `[Exposed=*]`. The `Worker` shorthand names all three worker
//! globals.

use std::fmt;

use idlh_ast::ExtAttr;
use idlh_common::{GlobalScope, WORKER_EXPOSURE_NAMES};
use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;
use tracing::trace;

use crate::error::{HarnessError, HarnessResult};
use crate::names;

pub type GlobalNames = IndexSet<String, FxBuildHasher>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExposureSet {
    /// `[Exposed=*]`
    Everywhere,
    Globals(GlobalNames),
}

impl Default for ExposureSet {
    fn default() -> Self {
        Self::window()
    }
}

impl ExposureSet {
    pub fn window() -> Self {
        Self::from_names(["Window"])
    }

    /// Build a set from exposure names, expanding `Worker`.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut globals = GlobalNames::default();
        for name in names {
            let name = name.as_ref();
            if name == "*" {
                return Self::Everywhere;
            }
            if name == "Worker" {
                globals.extend(WORKER_EXPOSURE_NAMES.iter().map(|n| (*n).to_string()));
            } else {
                globals.insert(name.to_string());
            }
        }
        Self::Globals(globals)
    }

    /// Exposure of `owner` as declared by `ext_attrs`, falling back to
    /// `default` (or `{Window}`) when there is no `[Exposed]`.
    pub fn from_ext_attrs(
        owner: &str,
        ext_attrs: &[ExtAttr],
        default: Option<&Self>,
    ) -> HarnessResult<Self> {
        let mut exposed = ext_attrs
            .iter()
            .filter(|attr| names::EXPOSED.contains(&attr.name.as_str()));
        let Some(attr) = exposed.next() else {
            return Ok(default.cloned().unwrap_or_default());
        };
        if exposed.next().is_some() {
            return Err(HarnessError::MultipleExposed(owner.to_string()));
        }
        if attr.is_wildcard() {
            return Ok(Self::Everywhere);
        }
        Ok(Self::from_names(attr.rhs_values()))
    }

    pub fn contains(&self, name: &str) -> bool {
        match self {
            Self::Everywhere => true,
            Self::Globals(globals) => globals.contains(name),
        }
    }

    /// First name of `self` that `other` does not contain.
    pub fn first_missing_from(&self, other: &Self) -> Option<String> {
        match (self, other) {
            (_, Self::Everywhere) => None,
            (Self::Everywhere, Self::Globals(_)) => Some("*".to_string()),
            (Self::Globals(mine), Self::Globals(theirs)) => {
                mine.iter().find(|name| !theirs.contains(*name)).cloned()
            }
        }
    }

    /// Whether a construct with this exposure is visible in `scope`.
    ///
    /// Shadow realms only see `[Exposed=*]`. A host that cannot tell its
    /// global kind is an error unless the set is the wildcard.
    pub fn exposed_in(&self, scope: Option<GlobalScope>) -> HarnessResult<bool> {
        let globals = match self {
            Self::Everywhere => return Ok(true),
            Self::Globals(globals) => globals,
        };
        let scope = scope.ok_or(HarnessError::UnexpectedGlobalObject)?;
        let exposed = scope
            .exposure_name()
            .is_some_and(|name| globals.contains(name));
        trace!(%scope, exposed, "exposure check");
        Ok(exposed)
    }
}

impl fmt::Display for ExposureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Everywhere => f.write_str("*"),
            Self::Globals(globals) => {
                let names: Vec<&str> = globals.iter().map(String::as_str).collect();
                write!(f, "({})", names.join(","))
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/exposure_tests.rs"]
mod tests;
