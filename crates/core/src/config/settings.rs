use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::{Error, Result};

/// Process-wide configuration, read-only once a session is built.
///
/// Only the `toolbox` section is interpreted here; every other top-level key
/// is kept verbatim and visible to modules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub toolbox: ToolboxSettings,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ToolboxSettings {
    /// Roots whose subdirectories are external namespaces
    #[serde(default, alias = "modul_search_paths")]
    pub module_search_paths: Vec<PathBuf>,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "CacheSettings::default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "CacheSettings::default_max_entries")]
    pub max_entries: usize,
}

impl CacheSettings {
    fn default_ttl_secs() -> u64 {
        3600
    }

    fn default_max_entries() -> usize {
        8000
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn capacity(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.max_entries).ok_or_else(|| {
            Error::Configuration("toolbox.cache.max_entries must be greater than zero".to_string())
        })
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: Self::default_ttl_secs(),
            max_entries: Self::default_max_entries(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut config = Self {
            toolbox: ToolboxSettings::default(),
            extra: Map::new(),
        };
        config.apply_template();
        config
    }
}

impl Config {
    /// Build from an in-memory mapping
    pub fn from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        let mut config: Self = serde_json::from_value(value)
            .map_err(|e| Error::Configuration(format!("Failed to parse config: {e}")))?;
        config.apply_template();
        Ok(config)
    }

    /// Parse YAML text; an empty document yields the defaults
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: serde_yaml_ng::Value = serde_yaml_ng::from_str(contents)
            .map_err(|e| Error::Configuration(format!("Failed to parse config: {e}")))?;
        if raw.is_null() {
            return Ok(Self::default());
        }
        let mut config: Self = serde_yaml_ng::from_value(raw)
            .map_err(|e| Error::Configuration(format!("Failed to parse config: {e}")))?;
        config.apply_template();
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Builder-style helper for programmatic setups
    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.toolbox.module_search_paths.push(path.into());
        self
    }

    /// A top-level section other than `toolbox`
    pub fn section(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Whole configuration as a JSON value
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn validate(&self) -> Result<()> {
        self.toolbox.cache.capacity()?;
        Ok(())
    }

    fn apply_template(&mut self) {
        self.extra
            .entry("web")
            .or_insert_with(|| json!({"groups": {}}));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.toolbox.module_search_paths.is_empty());
        assert_eq!(config.toolbox.cache.ttl(), Duration::from_secs(3600));
        assert_eq!(config.toolbox.cache.max_entries, 8000);
        assert_eq!(config.section("web"), Some(&json!({"groups": {}})));
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
toolbox:
  module_search_paths:
    - /opt/toolbox
  cache:
    ttl_secs: 60
web:
  groups:
    admin:
      tools: {}
ldap:
  server: ldap.example.org
"#;
        let config = Config::from_yaml_str(yaml).unwrap();
        assert_eq!(
            config.toolbox.module_search_paths,
            vec![PathBuf::from("/opt/toolbox")]
        );
        assert_eq!(config.toolbox.cache.ttl_secs, 60);
        assert_eq!(config.toolbox.cache.max_entries, 8000);
        assert_eq!(
            config.section("ldap"),
            Some(&json!({"server": "ldap.example.org"}))
        );
        assert_eq!(config.section("web"), Some(&json!({"groups": {"admin": {"tools": {}}}})));
    }

    #[test]
    fn test_legacy_search_path_spelling() {
        let config = Config::from_yaml_str("toolbox:\n  modul_search_paths: [./mods]\n").unwrap();
        assert_eq!(config.toolbox.module_search_paths, vec![PathBuf::from("./mods")]);
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(Config::from_yaml_str("").unwrap(), Config::default());
        assert_eq!(Config::from_yaml_str("# nothing\n").unwrap(), Config::default());
    }

    #[test]
    fn test_from_value() {
        let config = Config::from_value(json!({
            "toolbox": {"module_search_paths": ["/a", "/b"]},
            "custom": 1
        }))
        .unwrap();
        assert_eq!(config.toolbox.module_search_paths.len(), 2);
        assert_eq!(config.section("custom"), Some(&json!(1)));
        assert!(config.section("web").is_some());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = Config::from_value(json!({"toolbox": {"cache": {"max_entries": 0}}})).unwrap();
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_malformed_config_is_configuration_error() {
        let result = Config::from_yaml_str("toolbox: [1, 2]\n");
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
}
