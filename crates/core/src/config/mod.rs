//! Configuration management for toolbox

mod loader;
mod settings;

// Re-export main types
pub use loader::{CONFIG_ENV_VAR, ConfigLoader};
pub use settings::{CacheSettings, Config, ToolboxSettings};
