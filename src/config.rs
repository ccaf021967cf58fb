use crate::error::StoreError;
use serde::{Deserialize, Serialize};

/// Tunables for a [`Store`](crate::Store).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Label attached to log records emitted by the store.
    pub name: String,
    /// Upper bound on turns a single `settle` call will run.
    pub max_settle_turns: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: "store".to_string(),
            max_settle_turns: 1024,
        }
    }
}

impl StoreConfig {
    /// Parse a config from TOML. Missing fields take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, StoreError> {
        Ok(toml::from_str(source)?)
    }

    /// Set the log label.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set how many turns `settle` runs before giving up.
    pub fn with_max_settle_turns(mut self, turns: usize) -> Self {
        self.max_settle_turns = turns;
        self
    }
}
