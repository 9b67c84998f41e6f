use std::path::Path;
use std::time::Duration;

use lowcode_layout::{DndOptions, DEFAULT_EDGE_BAND, NODE_ID_ATTRIBUTE};
use serde::{Deserialize, Serialize};

use crate::errors::EngineResult;

pub const DEFAULT_CONFIG_NAME: &str = "lowcode.config.json";

/// Engine configuration file format
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub dnd: DndConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryConfig {
    /// Maximum number of snapshots kept (0 = unlimited)
    #[serde(default = "default_max_levels")]
    pub max_levels: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_levels: default_max_levels(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DndConfig {
    /// Fraction of a target's extent treated as before/after band
    #[serde(default = "default_edge_band")]
    pub edge_band: f64,

    /// Bound on async drag predicates, in milliseconds
    #[serde(default = "default_permission_timeout_ms")]
    pub permission_timeout_ms: u64,

    #[serde(default = "default_node_id_attribute")]
    pub node_id_attribute: String,
}

impl Default for DndConfig {
    fn default() -> Self {
        Self {
            edge_band: default_edge_band(),
            permission_timeout_ms: default_permission_timeout_ms(),
            node_id_attribute: default_node_id_attribute(),
        }
    }
}

impl From<&DndConfig> for DndOptions {
    fn from(config: &DndConfig) -> Self {
        Self {
            edge_band: config.edge_band,
            permission_timeout: Duration::from_millis(config.permission_timeout_ms),
            node_id_attribute: config.node_id_attribute.clone(),
        }
    }
}

fn default_max_levels() -> usize {
    100
}

fn default_edge_band() -> f64 {
    DEFAULT_EDGE_BAND
}

fn default_permission_timeout_ms() -> u64 {
    3000
}

fn default_node_id_attribute() -> String {
    NODE_ID_ATTRIBUTE.to_string()
}

impl EngineConfig {
    /// Load config from a directory, defaults when no file exists
    pub fn load(cwd: impl AsRef<Path>) -> EngineResult<Self> {
        let config_path = cwd.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: EngineConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(EngineConfig::default())
        }
    }

    pub fn dnd_options(&self) -> DndOptions {
        DndOptions::from(&self.dnd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "history": { "maxLevels": 20 },
            "dnd": { "edgeBand": 0.3, "nodeIdAttribute": "data-id" }
        }"#;

        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.history.max_levels, 20);
        assert_eq!(config.dnd.edge_band, 0.3);
        assert_eq!(config.dnd.permission_timeout_ms, 3000);
        assert_eq!(config.dnd.node_id_attribute, "data-id");
    }

    #[test]
    fn test_default_config() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.history.max_levels, 100);
        assert_eq!(config.dnd.edge_band, 0.25);
        assert_eq!(config.dnd.node_id_attribute, "data-node-id");

        let options = config.dnd_options();
        assert_eq!(options.permission_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig::load(dir.path()).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_load_from_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_NAME),
            r#"{ "dnd": { "permissionTimeoutMs": 250 } }"#,
        )
        .unwrap();

        let config = EngineConfig::load(dir.path()).unwrap();
        assert_eq!(config.dnd.permission_timeout_ms, 250);
        assert_eq!(config.history.max_levels, 100);
    }
}
