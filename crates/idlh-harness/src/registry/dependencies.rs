//! `add_dependency_idls`: register only the slice of a dependency batch that
//! tested definitions actually reach.
//!
//! The starting set holds every name the registry already depends on: bases,
//! both sides of pending includes statements, pending partial names and the
//! types of tested attributes. A declaration is accepted when one of its
//! names is in the set. Accepting it adds its own edges (base, mixin, typedef
//! target) to the set, and any declaration skipped earlier under one of
//! those names is revisited.

use std::collections::VecDeque;

use idlh_ast::{Declaration, DeclarationKind, IdlType, Member};
use idlh_common::limits::{MAX_DEPENDENCY_STEPS, MAX_TYPE_NESTING_DEPTH};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use super::IdlArray;
use crate::config::AddOptions;
use crate::definitions::Definition;
use crate::error::{HarnessError, HarnessResult};

/// Every type name referenced by `ty`, including generic arguments and union
/// members.
pub(crate) fn referenced_type_names(ty: &IdlType) -> Vec<&str> {
    fn walk<'a>(ty: &'a IdlType, depth: u32, out: &mut Vec<&'a str>) {
        if depth > MAX_TYPE_NESTING_DEPTH {
            return;
        }
        match ty.name() {
            Some(name) => out.push(name),
            None => {
                for nested in ty.arguments() {
                    walk(nested, depth + 1, out);
                }
            }
        }
    }
    let mut out = Vec::new();
    walk(ty, 0, &mut out);
    out
}

fn tested_attribute_types<'a>(members: impl Iterator<Item = (&'a Member, bool)>, out: &mut FxHashSet<String>) {
    for (member, untested) in members {
        if untested || member.kind != idlh_ast::MemberKind::Attribute {
            continue;
        }
        if let Some(ty) = member.idl_type() {
            out.extend(referenced_type_names(ty).into_iter().map(str::to_string));
        }
    }
}

impl IdlArray {
    /// Names the registered definitions currently depend on.
    fn dependency_names(&self) -> FxHashSet<String> {
        let mut names: FxHashSet<String> = self.inheritance.values().cloned().collect();
        for include in &self.includes {
            names.insert(include.target.clone());
            names.insert(include.mixin.clone());
        }
        for partial in &self.partials {
            names.insert(partial.decl.name.clone());
            if !partial.untested {
                tested_attribute_types(partial.decl.members.iter().map(|m| (m, false)), &mut names);
            }
        }
        for definition in self.members.values() {
            let members = match definition {
                Definition::Interface(i) | Definition::Mixin(i) if !i.untested => &i.members,
                Definition::Namespace(n) if !n.untested => &n.members,
                _ => continue,
            };
            tested_attribute_types(members.iter().map(|m| (m.member(), m.is_untested())), &mut names);
        }
        names
    }

    /// Names a just-accepted declaration pulls in.
    fn dependency_edges<'d>(&self, decl: &'d Declaration) -> Vec<&'d str> {
        let mut edges = Vec::new();
        if let Some(base) = &decl.inheritance {
            edges.push(base.as_str());
            edges.push(decl.name.as_str());
        }
        if decl.kind == DeclarationKind::Includes {
            if let Some(mixin) = &decl.includes {
                edges.push(mixin.as_str());
                // The target only matters when the mixin itself is tested.
                if self.members.get(mixin).is_some_and(Definition::is_tested) {
                    if let Some(target) = &decl.target {
                        edges.push(target.as_str());
                    }
                }
            }
        }
        if decl.kind == DeclarationKind::Typedef {
            if let Some(ty) = &decl.idl_type {
                edges.extend(referenced_type_names(ty));
            }
        }
        edges
    }

    /// Register, as untested, the declarations of `decls` that the registry
    /// transitively depends on. Names already registered are skipped.
    pub fn add_dependency_idls(&mut self, decls: Vec<Declaration>, options: &AddOptions) -> HarnessResult<()> {
        options.validate()?;
        let mut all_deps = self.dependency_names();
        let mut only: Vec<String> = Vec::new();
        let mut skipped: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        let mut queue: VecDeque<usize> = (0..decls.len()).collect();
        let mut steps = 0usize;

        while let Some(index) = queue.pop_front() {
            steps += 1;
            if steps > MAX_DEPENDENCY_STEPS {
                return Err(HarnessError::DependencyClosureDiverged(MAX_DEPENDENCY_STEPS));
            }
            let decl = &decls[index];
            let mut accepted = false;
            for name in decl.referenced_names() {
                let known = self.members.contains_key(name);
                if known || options.excludes(name) || !all_deps.contains(name) {
                    if !known {
                        skipped.entry(name.to_string()).or_default().push(index);
                    }
                    continue;
                }
                trace!(name, "dependency accepted");
                only.push(name.to_string());
                accepted = true;
            }
            if !accepted {
                continue;
            }

            let mut revisit = Vec::new();
            for dep in self.dependency_edges(decl) {
                only.push(dep.to_string());
                all_deps.insert(dep.to_string());
                if let Some(indices) = skipped.remove(dep) {
                    revisit.extend(indices);
                }
            }
            for deferred in revisit.into_iter().rev() {
                queue.push_front(deferred);
            }
        }

        if only.is_empty() {
            debug!("dependency batch contributes nothing");
            return Ok(());
        }
        debug!(count = only.len(), "registering dependency definitions");
        let options = AddOptions {
            only: Some(only),
            except: None,
        };
        self.internal_add_idls(decls, &options, true, true)
    }
}
