//! `[[SetPrototypeOf]]` checks for immutable prototype exotic objects.
//!
//! `[Global]` interfaces make both the global object and their interface
//! prototype object refuse any prototype other than the current one.

use idlh_host::{ObjectId, PrototypeMutation, Value};

use super::InterfaceTester;
use crate::error::CheckResult;
use crate::runner::{TestContext, TestRunner};

const MUTATIONS: [(PrototypeMutation, &str); 3] = [
    (PrototypeMutation::ObjectSetPrototypeOf, "Object.setPrototypeOf"),
    (PrototypeMutation::ProtoAccessor, "__proto__"),
    (PrototypeMutation::Reflect, "Reflect.setPrototypeOf"),
];

impl InterfaceTester<'_> {
    /// Emit the six checks for the object `target` resolves to. `type_name`
    /// describes it in check names ("global platform object", ...).
    pub(super) fn test_immutable_prototype<F>(&self, runner: &mut TestRunner<'_>, type_name: &str, target: F)
    where
        F: Fn(&mut TestContext<'_>) -> CheckResult<ObjectId>,
    {
        let name = self.name();
        let prefix = format!("{name} interface: internal [[SetPrototypeOf]] method of {type_name}");

        for (via, label) in MUTATIONS {
            let outcome = match via {
                PrototypeMutation::Reflect => "return false",
                _ => "throw a TypeError",
            };
            runner.subset_test(
                name,
                format!("{prefix} - setting to a new value via {label} should {outcome}"),
                |ctx| {
                    let object = target(ctx)?;
                    let original = ctx.prototype_of(object)?;
                    let replacement = ctx.realm().create_object(None);
                    ctx.add_cleanup(move |realm| {
                        // Only matters when the object turned out to be mutable.
                        let _ = realm.set_prototype_of(object, original, PrototypeMutation::Reflect);
                    });

                    match via {
                        PrototypeMutation::Reflect => {
                            let changed = ctx.realm().set_prototype_of(object, Some(replacement), via)?;
                            ctx.assert_false(changed, "Reflect.setPrototypeOf should return false")?;
                        }
                        _ => {
                            ctx.assert_throws_js(&format!("{label} should throw"), |realm| {
                                realm
                                    .set_prototype_of(object, Some(replacement), via)
                                    .map(Value::Bool)
                            })?;
                        }
                    }
                    let after = ctx.prototype_of(object)?;
                    ctx.assert_same_object(after, original, "original value not modified")
                },
            );
        }

        for (via, label) in MUTATIONS {
            let outcome = match via {
                PrototypeMutation::Reflect => "return true",
                _ => "not throw",
            };
            runner.subset_test(
                name,
                format!("{prefix} - setting to its original value via {label} should {outcome}"),
                |ctx| {
                    let object = target(ctx)?;
                    let original = ctx.prototype_of(object)?;
                    let result = ctx.realm().set_prototype_of(object, original, via)?;
                    if via == PrototypeMutation::Reflect {
                        ctx.assert_true(result, "Reflect.setPrototypeOf should return true")?;
                    }
                    let after = ctx.prototype_of(object)?;
                    ctx.assert_same_object(after, original, "original value not modified")
                },
            );
        }
    }
}
