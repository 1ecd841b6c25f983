//! The IDL registry (`IdlArray`).
//!
//! Declarations are registered in batches, tested or untested, then
//! [`IdlArray::test`] merges partials and mixins, validates inheritance,
//! computes exposure and generates every check through a [`TestRunner`].
//!
//! Module layout:
//! - `dependencies`: `add_dependency_idls` and its closure computation
//! - `merge`: staged partial and mixin merges

mod dependencies;
mod merge;

use std::fmt;

use idlh_ast::{Argument, Declaration, DeclarationKind, IdlType, MemberKind};
use idlh_common::GlobalScope;
use idlh_common::limits::MAX_INHERITANCE_DEPTH;
use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use tracing::{debug, info, warn};

use crate::config::AddOptions;
use crate::definitions::{Definition, IdlInterface, IdlNamespace};
use crate::error::{HarnessError, HarnessResult};
use crate::exposure::ExposureSet;
use crate::member::IdlMember;
use crate::runner::TestRunner;
use crate::{interface, namespace};

type NameMap<V> = IndexMap<String, V, FxBuildHasher>;

/// A partial declaration waiting for `merge_partials`.
#[derive(Clone, Debug)]
pub(crate) struct PendingPartial {
    pub decl: Declaration,
    pub untested: bool,
}

/// `target includes mixin;` waiting for `merge_mixins`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PendingInclude {
    pub target: String,
    pub mixin: String,
    pub untested: bool,
}

#[derive(Debug, Default)]
pub struct IdlArray {
    /// Every registered definition, in registration order.
    pub(crate) members: NameMap<Definition>,
    /// Object expressions to check against each interface.
    pub(crate) objects: NameMap<Vec<String>>,
    pub(crate) partials: Vec<PendingPartial>,
    pub(crate) includes: Vec<PendingInclude>,
    /// Mixins already merged into each target, kept for type lookups.
    pub(crate) merged_includes: NameMap<Vec<String>>,
    /// `name -> base` for every registered declaration with a base.
    pub(crate) inheritance: FxHashMap<String, String>,
}

impl IdlArray {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    pub fn add_idls(&mut self, decls: Vec<Declaration>, options: &AddOptions) -> HarnessResult<()> {
        self.internal_add_idls(decls, options, false, false)
    }

    /// Register declarations only needed to resolve references from tested
    /// ones. No checks are generated for them or their members.
    pub fn add_untested_idls(&mut self, decls: Vec<Declaration>, options: &AddOptions) -> HarnessResult<()> {
        self.internal_add_idls(decls, options, true, false)
    }

    /// Parse `webidl2` JSON and register it as tested.
    pub fn add_idls_json(&mut self, json: &str, options: &AddOptions) -> HarnessResult<()> {
        let decls = idlh_ast::parse_definitions(json)?;
        self.add_idls(decls, options)
    }

    pub fn add_untested_idls_json(&mut self, json: &str, options: &AddOptions) -> HarnessResult<()> {
        let decls = idlh_ast::parse_definitions(json)?;
        self.add_untested_idls(decls, options)
    }

    /// `skip_known` drops declarations whose name is already registered
    /// instead of failing; dependency batches re-encounter tested names.
    pub(crate) fn internal_add_idls(
        &mut self,
        decls: Vec<Declaration>,
        options: &AddOptions,
        untested: bool,
        skip_known: bool,
    ) -> HarnessResult<()> {
        options.validate()?;
        for decl in decls {
            if decl.partial && decl.kind.allows_partial() {
                if !options.excludes(&decl.name) {
                    debug!(name = %decl.name, kind = decl.kind.as_str(), "queued partial");
                    self.partials.push(PendingPartial { decl, untested });
                }
                continue;
            }

            if decl.kind == DeclarationKind::Includes {
                let (Some(target), Some(mixin)) = (decl.target, decl.includes) else {
                    return Err(HarnessError::InvalidIdl(
                        "includes statement without target or mixin".to_string(),
                    ));
                };
                if !options.excludes(&target) {
                    debug!(%target, %mixin, "queued includes");
                    self.includes.push(PendingInclude {
                        target,
                        mixin,
                        untested,
                    });
                }
                continue;
            }

            if options.excludes(&decl.name) {
                continue;
            }
            if self.members.contains_key(&decl.name) {
                if skip_known {
                    continue;
                }
                return Err(HarnessError::DuplicateIdentifier(decl.name));
            }

            if let Some(base) = &decl.inheritance {
                match self.inheritance.get(&decl.name) {
                    Some(existing) if existing != base => {
                        return Err(HarnessError::InheritanceRedefined(decl.name));
                    }
                    _ => {
                        self.inheritance.insert(decl.name.clone(), base.clone());
                    }
                }
            }

            let name = decl.name.clone();
            let kind = decl.kind.as_str().to_string();
            let Some(definition) = Definition::from_declaration(decl, untested) else {
                return Err(HarnessError::UnsupportedDeclaration { name, kind });
            };
            debug!(%name, kind = definition.kind_str(), untested, "registered definition");
            self.members.insert(name, definition);
        }
        Ok(())
    }

    /// Queue object expressions (`"document"`, `"new Blob()"`) to check
    /// against the named interfaces.
    pub fn add_objects<I, K, V>(&mut self, objects: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        for (name, expressions) in objects {
            self.objects
                .entry(name.into())
                .or_default()
                .extend(expressions.into_iter().map(Into::into));
        }
    }

    /// Check the named interface only once across every object whose
    /// inheritance chain reaches it.
    pub fn prevent_multiple_testing(&mut self, name: &str) -> HarnessResult<()> {
        match self.members.get_mut(name).and_then(Definition::as_interface_mut) {
            Some(interface) => {
                interface.prevent_multiple_testing = true;
                Ok(())
            }
            None => Err(HarnessError::TypeNotFound(name.to_string())),
        }
    }

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------

    pub fn get(&self, name: &str) -> Option<&Definition> {
        self.members.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &Definition> {
        self.members.values()
    }

    /// A regular or callback interface, or a mixin.
    pub fn interface(&self, name: &str) -> Option<&IdlInterface> {
        self.members.get(name).and_then(Definition::as_interface)
    }

    pub fn namespace(&self, name: &str) -> Option<&IdlNamespace> {
        match self.members.get(name) {
            Some(Definition::Namespace(namespace)) => Some(namespace),
            _ => None,
        }
    }

    pub fn pending_partials(&self) -> usize {
        self.partials.len()
    }

    pub fn pending_includes(&self) -> usize {
        self.includes.len()
    }

    /// Mixins included by `target`, merged or still pending.
    pub(crate) fn mixins_of<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let merged = self
            .merged_includes
            .get(target)
            .into_iter()
            .flatten()
            .map(String::as_str);
        let pending = self
            .includes
            .iter()
            .filter(move |include| include.target == target)
            .map(|include| include.mixin.as_str());
        merged.chain(pending)
    }

    /// `name` followed by every definition it inherits from, most derived
    /// first. Works for interfaces and dictionaries.
    pub fn inheritance_stack(&self, name: &str) -> HarnessResult<Vec<&Definition>> {
        let Some(first) = self.members.get(name) else {
            return Err(HarnessError::TypeNotFound(name.to_string()));
        };
        let mut stack = vec![first];
        let mut current = first;
        while let Some(base_name) = current.base() {
            let Some(base) = self.members.get(base_name) else {
                return Err(HarnessError::BaseNotFound {
                    kind: current.kind_str().to_string(),
                    base: base_name.to_string(),
                    name: current.name().to_string(),
                });
            };
            if stack.iter().any(|seen| seen.name() == base.name()) {
                stack.push(base);
                let chain: Vec<&str> = stack.iter().map(|d| d.name()).collect();
                return Err(HarnessError::CircularDependency {
                    name: name.to_string(),
                    chain: chain.join(","),
                });
            }
            if stack.len() >= MAX_INHERITANCE_DEPTH {
                return Err(HarnessError::Internal(format!(
                    "inheritance chain of {name} is deeper than {MAX_INHERITANCE_DEPTH}"
                )));
            }
            stack.push(base);
            current = base;
        }
        Ok(stack)
    }

    // -------------------------------------------------------------------------
    // Test generation
    // -------------------------------------------------------------------------

    /// Merge pending partials and mixins, validate the registry and run every
    /// check. Setup problems abort with a [`HarnessError`]; conformance
    /// failures are recorded in the runner's report.
    pub fn test(&mut self, runner: &mut TestRunner<'_>) -> HarnessResult<()> {
        self.merge_partials(runner);
        self.merge_mixins(runner);
        self.check_inheritance()?;
        self.add_iteration_members();
        self.compute_exposure(runner.realm().global_scope())?;

        info!(
            definitions = self.members.len(),
            objects = self.objects.values().map(Vec::len).sum::<usize>(),
            "running conformance checks"
        );
        let this = &*self;
        let mut tested_once = FxHashSet::default();
        for (name, definition) in &this.members {
            match definition {
                Definition::Interface(i) => interface::test(this, i, runner)?,
                Definition::Namespace(n) => namespace::test(n, runner)?,
                _ => {}
            }
            let Some(expressions) = this.objects.get(name) else {
                continue;
            };
            let interface = match definition {
                Definition::Interface(i) => i,
                _ => return Err(HarnessError::InvalidObjectMember(name.clone())),
            };
            for expression in expressions {
                interface::test_object(this, interface, expression, runner, &mut tested_once)?;
            }
        }
        for name in this.objects.keys().filter(|name| !this.members.contains_key(*name)) {
            warn!(%name, "objects registered for an unknown interface");
        }
        Ok(())
    }

    /// Every base must exist, agree on being an interface, and the chain
    /// must be acyclic.
    fn check_inheritance(&self) -> HarnessResult<()> {
        for (name, definition) in &self.members {
            let Some(base) = definition.base() else {
                continue;
            };
            let Some(base_definition) = self.members.get(base) else {
                return Err(HarnessError::UndefinedBase {
                    lhs: name.clone(),
                    rhs: base.to_string(),
                });
            };
            let lhs_is_interface = definition.is_interface_like();
            if lhs_is_interface != base_definition.is_interface_like() {
                let culprit = if lhs_is_interface { base } else { name.as_str() };
                return Err(HarnessError::InheritanceKindMismatch {
                    lhs: name.clone(),
                    rhs: base.to_string(),
                    culprit: culprit.to_string(),
                });
            }
            self.inheritance_stack(name)?;
        }
        Ok(())
    }

    /// Pair iterables get `entries`, `keys`, `values` and `forEach`
    /// operations checked like declared ones. Value iterables reuse the
    /// `Array.prototype` functions and are checked by identity instead.
    fn add_iteration_members(&mut self) {
        for definition in self.members.values_mut() {
            let Definition::Interface(interface) = definition else {
                continue;
            };
            if interface.iteration_members_added {
                continue;
            }
            interface.iteration_members_added = true;
            let Some(untested) = interface
                .members
                .iter()
                .find(|m| {
                    m.kind == MemberKind::Iterable && !m.is_async && m.idl_type.len() == 2
                })
                .map(IdlMember::is_untested)
            else {
                continue;
            };
            let iterator = IdlType::named("iterator");
            let for_each_arguments = vec![
                Argument {
                    name: "callback".to_string(),
                    idl_type: IdlType::named("Function"),
                    ..Argument::default()
                },
                Argument {
                    name: "thisValue".to_string(),
                    idl_type: IdlType::named("any"),
                    optional: true,
                    ..Argument::default()
                },
            ];
            for name in ["entries", "keys", "values"] {
                interface.members.push(IdlMember::synthesized_operation(
                    name,
                    iterator.clone(),
                    Vec::new(),
                    untested,
                ));
            }
            interface.members.push(IdlMember::synthesized_operation(
                "forEach",
                IdlType::named("undefined"),
                for_each_arguments,
                untested,
            ));
            debug!(interface = %interface.name, "added pair iterable operations");
        }
    }

    pub(crate) fn compute_exposure(&mut self, scope: Option<GlobalScope>) -> HarnessResult<()> {
        for definition in self.members.values_mut() {
            let (name, ext_attrs, exposure, exposed) = match definition {
                Definition::Interface(i) => (&i.name, &i.ext_attrs, &mut i.exposure, &mut i.exposed),
                Definition::Namespace(n) => (&n.name, &n.ext_attrs, &mut n.exposure, &mut n.exposed),
                _ => continue,
            };
            *exposure = ExposureSet::from_ext_attrs(name, ext_attrs, None)?;
            *exposed = exposure.exposed_in(scope)?;
            debug!(%name, %exposure, exposed = *exposed, "computed exposure");
        }
        Ok(())
    }

    /// Harness self-test helper: `f` must fail with a [`HarnessError`] whose
    /// message is `expected`.
    pub fn assert_throws<F>(&mut self, expected: impl fmt::Display, f: F) -> HarnessResult<()>
    where
        F: FnOnce(&mut Self) -> HarnessResult<()>,
    {
        let expected = expected.to_string();
        match f(self) {
            Ok(()) => Err(HarnessError::DidNotThrow),
            Err(error) => {
                let actual = error.to_string();
                if actual == expected {
                    Ok(())
                } else {
                    Err(HarnessError::WrongError { actual, expected })
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/registry_tests.rs"]
mod tests;
