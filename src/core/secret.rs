//! Secret resolution

use crate::core::error::RunnerError;
use crate::core::stage::Stage;
use std::collections::{BTreeMap, HashMap};

/// Default environment prefix for [`EnvSecretStore`]
pub const ENV_SECRET_PREFIX: &str = "STAGEHAND_SECRET_";

/// Resolves named credentials from an external store at execution time.
///
/// Secret values are injected into stage environments and must never be
/// written to logs; the sandbox redacts them from captured output.
pub trait SecretStore: Send + Sync {
    fn resolve(&self, name: &str) -> Result<String, RunnerError>;
}

/// Resolves secrets from the process environment.
///
/// A secret `slack_webhook` is looked up as `STAGEHAND_SECRET_SLACK_WEBHOOK`.
#[derive(Debug, Clone)]
pub struct EnvSecretStore {
    prefix: String,
}

impl EnvSecretStore {
    pub fn new() -> Self {
        Self {
            prefix: ENV_SECRET_PREFIX.to_string(),
        }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for EnvSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretStore for EnvSecretStore {
    fn resolve(&self, name: &str) -> Result<String, RunnerError> {
        let var = format!("{}{}", self.prefix, name.to_uppercase());
        std::env::var(&var).map_err(|_| RunnerError::SecretResolution {
            name: name.to_string(),
        })
    }
}

/// Fixed in-memory secrets, used for CLI `--secret` overrides and tests
#[derive(Debug, Clone, Default)]
pub struct StaticSecretStore {
    values: HashMap<String, String>,
}

impl StaticSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, String)> for StaticSecretStore {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl SecretStore for StaticSecretStore {
    fn resolve(&self, name: &str) -> Result<String, RunnerError> {
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| RunnerError::SecretResolution {
                name: name.to_string(),
            })
    }
}

/// Consults stores in order, returning the first successful resolution
pub struct LayeredSecretStore {
    layers: Vec<Box<dyn SecretStore>>,
}

impl LayeredSecretStore {
    pub fn new(layers: Vec<Box<dyn SecretStore>>) -> Self {
        Self { layers }
    }
}

impl SecretStore for LayeredSecretStore {
    fn resolve(&self, name: &str) -> Result<String, RunnerError> {
        for layer in &self.layers {
            if let Ok(value) = layer.resolve(name) {
                return Ok(value);
            }
        }
        Err(RunnerError::SecretResolution {
            name: name.to_string(),
        })
    }
}

/// Resolve every secret a stage declares into an env-var map
/// (`slack_webhook` becomes `SLACK_WEBHOOK`).
///
/// Fails with the first unresolvable name, before any command runs.
pub fn resolve_stage_secrets(
    store: &dyn SecretStore,
    stage: &Stage,
) -> Result<BTreeMap<String, String>, RunnerError> {
    let mut resolved = BTreeMap::new();
    for name in &stage.secrets {
        let value = store.resolve(name)?;
        resolved.insert(name.to_uppercase(), value);
    }
    Ok(resolved)
}
