//! Allocator configuration.
//!
//! Loaded from a JSON file:
//! ```json
//! {
//!   "default_policy": { "balance": "reserve_against_debt" },
//!   "overrides": {
//!     "client": { "shortfall": "stop_at_first_shortfall", "balance": "leftover" }
//!   }
//! }
//! ```
//! Missing fields fall back to [`AllocationPolicy::default`].

use crate::allocation::policy::AllocationPolicy;
use crate::core::party::PartyKind;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Environment variable holding the path of the config file.
pub const CONFIG_ENV: &str = "PAYMENT_ALLOCATOR_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfig {
    /// Policy for any party kind without an override.
    pub default_policy: AllocationPolicy,
    /// Per-kind policies.
    pub overrides: BTreeMap<PartyKind, AllocationPolicy>,
}

impl AllocatorConfig {
    /// Configuration reproducing the historical per-kind rules.
    pub fn legacy() -> Self {
        Self {
            default_policy: AllocationPolicy::default(),
            overrides: PartyKind::ALL
                .into_iter()
                .map(|k| (k, AllocationPolicy::legacy(k)))
                .collect(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Load from the file named by `PAYMENT_ALLOCATOR_CONFIG`, or defaults
    /// when the variable is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    /// Policy to apply to a party of the given kind.
    pub fn policy_for(&self, kind: PartyKind) -> AllocationPolicy {
        self.overrides
            .get(&kind)
            .copied()
            .unwrap_or(self.default_policy)
    }
}
