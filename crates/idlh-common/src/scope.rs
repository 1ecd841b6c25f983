//! Global execution contexts.
//!
//! WebIDL constructs are exposed in a set of global environments named by
//! the `[Exposed]` extended attribute. The harness only ever runs inside one
//! of them; the host reports which one through `Realm::global_scope`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Concrete global names the `Worker` shorthand expands to.
pub const WORKER_EXPOSURE_NAMES: [&str; 3] = ["DedicatedWorker", "ServiceWorker", "SharedWorker"];

/// Kind of global object the conformance run executes in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GlobalScope {
    /// `Window` (a document's global object).
    Window,
    /// `DedicatedWorkerGlobalScope`.
    DedicatedWorker,
    /// `SharedWorkerGlobalScope`.
    SharedWorker,
    /// `ServiceWorkerGlobalScope`.
    ServiceWorker,
    /// A shadow realm global. Only `[Exposed=*]` constructs are visible.
    ShadowRealm,
}

impl GlobalScope {
    /// Name used for this scope inside `[Exposed]` lists.
    ///
    /// Shadow realms have no exposure name; only the wildcard reaches them.
    pub const fn exposure_name(self) -> Option<&'static str> {
        match self {
            Self::Window => Some("Window"),
            Self::DedicatedWorker => Some("DedicatedWorker"),
            Self::SharedWorker => Some("SharedWorker"),
            Self::ServiceWorker => Some("ServiceWorker"),
            Self::ShadowRealm => None,
        }
    }

    /// Name of the interface the global object is an instance of.
    pub const fn global_interface(self) -> &'static str {
        match self {
            Self::Window => "Window",
            Self::DedicatedWorker => "DedicatedWorkerGlobalScope",
            Self::SharedWorker => "SharedWorkerGlobalScope",
            Self::ServiceWorker => "ServiceWorkerGlobalScope",
            Self::ShadowRealm => "ShadowRealmGlobalScope",
        }
    }

    pub const fn is_worker(self) -> bool {
        matches!(
            self,
            Self::DedicatedWorker | Self::SharedWorker | Self::ServiceWorker
        )
    }
}

impl fmt::Display for GlobalScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.global_interface())
    }
}

impl FromStr for GlobalScope {
    type Err = String;

    /// Accepts both exposure names (`Window`) and global interface names
    /// (`DedicatedWorkerGlobalScope`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Window" => Ok(Self::Window),
            "DedicatedWorker" | "DedicatedWorkerGlobalScope" => Ok(Self::DedicatedWorker),
            "SharedWorker" | "SharedWorkerGlobalScope" => Ok(Self::SharedWorker),
            "ServiceWorker" | "ServiceWorkerGlobalScope" => Ok(Self::ServiceWorker),
            "ShadowRealm" | "ShadowRealmGlobalScope" => Ok(Self::ShadowRealm),
            other => Err(format!("unknown global scope '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_names_round_trip_through_from_str() {
        for scope in [
            GlobalScope::Window,
            GlobalScope::DedicatedWorker,
            GlobalScope::SharedWorker,
            GlobalScope::ServiceWorker,
            GlobalScope::ShadowRealm,
        ] {
            assert_eq!(scope.global_interface().parse::<GlobalScope>(), Ok(scope));
        }
    }

    #[test]
    fn test_shadow_realm_has_no_exposure_name() {
        assert_eq!(GlobalScope::ShadowRealm.exposure_name(), None);
        assert_eq!(GlobalScope::Window.exposure_name(), Some("Window"));
        assert!(GlobalScope::SharedWorker.is_worker());
        assert!(!GlobalScope::Window.is_worker());
    }

    #[test]
    fn test_unknown_scope_is_rejected() {
        assert!("Worklet".parse::<GlobalScope>().is_err());
    }

    #[test]
    fn test_scope_deserializes_from_variant_name() {
        let scope: GlobalScope = serde_json::from_str("\"ServiceWorker\"").unwrap();
        assert_eq!(scope, GlobalScope::ServiceWorker);
    }
}
