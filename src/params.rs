use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::checks::CheckParams;
use crate::error::ConfigError;

/// Check parameters keyed by plugin name, as exported from rule storage:
///
/// ```json
/// {"netbox_script": {"maxage": ["fixed", [1800, 3600]]}}
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ParamStore {
    by_plugin: BTreeMap<String, CheckParams>,
}

impl ParamStore {
    pub fn from_json(json: &str, origin: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|source| ConfigError::Json {
            path: origin.to_string(),
            source,
        })
    }

    pub fn insert(&mut self, plugin: impl Into<String>, params: CheckParams) {
        self.by_plugin.insert(plugin.into(), params);
    }

    /// Configured parameters of `plugin`, if any rule matched it.
    pub fn get(&self, plugin: &str) -> Option<&CheckParams> {
        self.by_plugin.get(plugin)
    }

    pub fn len(&self) -> usize {
        self.by_plugin.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_plugin.is_empty()
    }
}

pub fn load_params(path: &Path) -> Result<ParamStore, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let store = ParamStore::from_json(&content, &path.display().to_string())?;
    debug!("Loaded check parameters for {} plugin(s) from {:?}", store.len(), path);
    Ok(store)
}
