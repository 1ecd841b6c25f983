//! Run configuration.
//!
//! [`HarnessConfig`] controls which generated checks run; [`AddOptions`]
//! filters which definitions a registration call accepts.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{HarnessError, HarnessResult};

/// Environment variable holding a comma separated subset of check keys.
pub const SUBSET_ENV: &str = "IDLH_SUBSET";

/// Settings for one conformance run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Run only checks whose key (the interface or namespace name) is
    /// listed. `None` runs everything.
    pub subset: Option<Vec<String>>,
}

impl HarnessConfig {
    /// Read `IDLH_SUBSET=Node,Element`. Unset or blank means no subset.
    pub fn from_env() -> Self {
        let subset = std::env::var(SUBSET_ENV).ok().and_then(|raw| parse_subset(&raw));
        if let Some(keys) = &subset {
            debug!(?keys, "subset selected from environment");
        }
        Self { subset }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn with_subset<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subset = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Whether checks keyed by `key` are selected.
    pub fn should_run(&self, key: &str) -> bool {
        self.subset
            .as_ref()
            .is_none_or(|keys| keys.iter().any(|k| k == key))
    }
}

fn parse_subset(raw: &str) -> Option<Vec<String>> {
    let keys: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect();
    (!keys.is_empty()).then_some(keys)
}

/// `only` / `except` filter for `add_idls` and friends.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AddOptions {
    pub only: Option<Vec<String>>,
    pub except: Option<Vec<String>>,
}

impl AddOptions {
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            only: Some(names.into_iter().map(Into::into).collect()),
            except: None,
        }
    }

    pub fn except<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            only: None,
            except: Some(names.into_iter().map(Into::into).collect()),
        }
    }

    pub fn validate(&self) -> HarnessResult<()> {
        if self.only.is_some() && self.except.is_some() {
            return Err(HarnessError::OnlyAndExcept);
        }
        Ok(())
    }

    /// Whether `name` is filtered out.
    pub fn excludes(&self, name: &str) -> bool {
        let listed = |names: &Option<Vec<String>>| {
            names
                .as_ref()
                .map(|names| names.iter().any(|n| n == name))
        };
        listed(&self.except) == Some(true) || listed(&self.only) == Some(false)
    }
}
