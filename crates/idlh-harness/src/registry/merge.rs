//! Partial and mixin merges.
//!
//! Both run in two phases: contributions are validated and staged per target
//! name while the registry is only read, then each target absorbs its staged
//! extended attributes and members once. Pending lists are drained, so a
//! second `IdlArray::test` merges nothing.

use idlh_ast::{ExtAttr, Member, find_ext_attr, has_ext_attr};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use super::{IdlArray, NameMap, PendingInclude, PendingPartial};
use crate::definitions::Definition;
use crate::error::HarnessError;
use crate::exposure::ExposureSet;
use crate::member::are_duplicate_members;
use crate::names;
use crate::runner::TestRunner;

#[derive(Default)]
struct Staged {
    ext_attrs: Vec<ExtAttr>,
    members: Vec<(Member, bool)>,
}

/// Names of `incoming` members that clash with `existing` or with an
/// earlier incoming member.
fn duplicate_names(existing: &[&Member], incoming: &[Member]) -> Vec<String> {
    incoming
        .iter()
        .enumerate()
        .filter(|(i, member)| {
            existing
                .iter()
                .copied()
                .chain(&incoming[..*i])
                .any(|other| are_duplicate_members(member, other))
        })
        .map(|(_, member)| member.name.clone())
        .collect()
}

/// Give every member without its own `[Exposed]` a copy of `exposed`.
fn inherit_exposure(members: &mut [Member], exposed: &ExtAttr) {
    for member in members {
        if !has_ext_attr(&member.ext_attrs, names::EXPOSED) {
            member.ext_attrs.push(exposed.clone());
        }
    }
}

fn assert_unique(runner: &mut TestRunner<'_>, name: String, duplicates: Vec<String>) {
    runner.test(name, |ctx| {
        ctx.assert_true(
            duplicates.is_empty(),
            &format!("Duplicate member names: [{}]", duplicates.join(", ")),
        )
    });
}

impl IdlArray {
    pub(crate) fn merge_partials(&mut self, runner: &mut TestRunner<'_>) {
        let partials = std::mem::take(&mut self.partials);
        if partials.is_empty() {
            return;
        }
        let mut staged: NameMap<Staged> = NameMap::default();
        let mut tested_counts: FxHashMap<String, usize> = FxHashMap::default();

        for PendingPartial { decl, untested } in partials {
            let name = decl.name.as_str();
            let kind = decl.kind.as_str();
            let original = self.members.get(name).filter(|d| {
                d.is_interface_like() || matches!(d, Definition::Dictionary(_) | Definition::Namespace(_))
            });

            let mut label = name.to_string();
            if !untested {
                let count = tested_counts.entry(name.to_string()).or_default();
                *count += 1;
                if *count > 1 {
                    label = format!("{name}[{count}]");
                }
                let kind_matches = original.is_some_and(|d| d.accepts_partial(&decl.kind));
                runner.test(format!("Partial {kind} {label}: original {kind} defined"), |ctx| {
                    ctx.assert_true(original.is_some(), &format!("Original {kind} should be defined"))?;
                    ctx.assert_true(
                        kind_matches,
                        &format!("Original {name} definition should have type {kind}"),
                    )
                });
            }
            let Some(original) = original else {
                warn!(%name, kind, "partial without an original definition");
                continue;
            };

            let mut members = decl.members;
            let entry = staged.entry(name.to_string()).or_default();
            if let Some(exposed) = find_ext_attr(&decl.ext_attrs, names::EXPOSED) {
                if !untested {
                    let partial_exposure = ExposureSet::from_ext_attrs(name, &decl.ext_attrs, None);
                    let original_exposure = ExposureSet::from_ext_attrs(name, original.ext_attrs(), None);
                    runner.test(format!("Partial {kind} {label}: valid exposure set"), |_| {
                        let missing = partial_exposure?.first_missing_from(&original_exposure?);
                        match missing {
                            Some(global) => Err(HarnessError::PartialExposureNotSubset {
                                name: name.to_string(),
                                kind: kind.to_string(),
                                global,
                            }
                            .into()),
                            None => Ok(()),
                        }
                    });
                }
                inherit_exposure(&mut members, exposed);
            }
            entry.ext_attrs.extend(
                decl.ext_attrs
                    .iter()
                    .filter(|attr| !names::EXPOSED.contains(&attr.name.as_str()))
                    .cloned(),
            );

            if !untested {
                let existing: Vec<&Member> = original
                    .member_decls()
                    .into_iter()
                    .chain(entry.members.iter().map(|(member, _)| member))
                    .collect();
                let duplicates = duplicate_names(&existing, &members);
                assert_unique(
                    runner,
                    format!("Partial {kind} {label}: member names are unique"),
                    duplicates,
                );
            }
            debug!(%name, members = members.len(), "staged partial");
            entry.members.extend(members.into_iter().map(|member| (member, untested)));
        }

        for (name, contribution) in staged {
            if let Some(definition) = self.members.get_mut(&name) {
                definition.absorb(contribution.ext_attrs, contribution.members);
            }
        }
    }

    pub(crate) fn merge_mixins(&mut self, runner: &mut TestRunner<'_>) {
        let includes = std::mem::take(&mut self.includes);
        if includes.is_empty() {
            return;
        }
        let mut staged: NameMap<Vec<(Member, bool)>> = NameMap::default();
        let mut merged: Vec<(String, String)> = Vec::new();

        for PendingInclude { target, mixin, untested } in includes {
            let prefix = format!("{target} includes {mixin}");
            let target_definition = self
                .members
                .get(&target)
                .filter(|d| matches!(d, Definition::Interface(_)));
            let mixin_interface = match self.members.get(&mixin) {
                Some(Definition::Mixin(m)) => Some(m),
                _ => None,
            };
            if !untested {
                runner.test(format!("{prefix}: target interface defined"), |ctx| {
                    ctx.assert_true(
                        target_definition.is_some(),
                        &format!("Interface {target} should be defined"),
                    )
                });
                runner.test(format!("{prefix}: mixin defined"), |ctx| {
                    ctx.assert_true(
                        mixin_interface.is_some(),
                        &format!("Interface mixin {mixin} should be defined"),
                    )
                });
            }
            let (Some(target_definition), Some(mixin_interface)) = (target_definition, mixin_interface) else {
                warn!(%target, %mixin, "includes statement with a missing side");
                continue;
            };

            let mut members: Vec<Member> = mixin_interface.members.iter().map(|m| m.member().clone()).collect();
            if let Some(exposed) = find_ext_attr(&mixin_interface.ext_attrs, names::EXPOSED) {
                inherit_exposure(&mut members, exposed);
            }
            let flags: Vec<bool> = mixin_interface.members.iter().map(|m| m.is_untested()).collect();

            let entry = staged.entry(target.clone()).or_default();
            if !untested {
                let existing: Vec<&Member> = target_definition
                    .member_decls()
                    .into_iter()
                    .chain(entry.iter().map(|(member, _)| member))
                    .collect();
                let duplicates = duplicate_names(&existing, &members);
                assert_unique(runner, format!("{prefix}: member names are unique"), duplicates);
            }
            debug!(%target, %mixin, members = members.len(), "staged mixin");
            entry.extend(members.into_iter().zip(flags));
            merged.push((target, mixin));
        }

        for (target, members) in staged {
            if let Some(definition) = self.members.get_mut(&target) {
                definition.absorb(Vec::new(), members);
            }
        }
        for (target, mixin) in merged {
            self.merged_includes.entry(target).or_default().push(mixin);
        }
    }
}
