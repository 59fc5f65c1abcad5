//! Configuration loader
//!
//! Resolves which configuration file applies and loads it.

use std::path::{Path, PathBuf};

use super::Config;
use crate::error::{Error, Result};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "TOOLBOX_CONFIG";

const DEFAULT_CONFIG_FILE: &str = ".config/toolbox.yaml";

/// Loads the configuration once at startup
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from `explicit` if given, otherwise from the per-user default location.
    ///
    /// An explicit path must exist. A missing default file yields the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        if let Some(path) = explicit {
            return Self::load_required(path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => {
                tracing::debug!("Loading config from default location: {:?}", path);
                Self::load_required(&path)
            }
            _ => {
                tracing::debug!("No config file found, using defaults");
                Ok(Config::default())
            }
        }
    }

    /// Load a file that must exist
    pub fn load_required(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(Error::Configuration(format!(
                "Configuration file {} does not exist",
                path.display()
            )));
        }
        tracing::debug!("Loading config from {:?}", path);
        let config = Config::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// `$HOME/.config/toolbox.yaml`
    pub fn default_path() -> Option<PathBuf> {
        std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(DEFAULT_CONFIG_FILE))
    }
}
