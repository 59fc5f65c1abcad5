use std::io;

use crate::binder::BindError;

/// Errors that can occur during toolbox operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Module not found: {name}: {reason}")]
    ModuleNotFound { name: String, reason: String },

    #[error("Invalid arguments for {module}: {source}")]
    Bind {
        module: String,
        #[source]
        source: BindError,
    },

    #[error("Module {module} failed: {source}")]
    Execution {
        module: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn not_found(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ModuleNotFound {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// True for errors the command line should report as usage errors.
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Bind { .. })
    }

    /// The bind error behind this error, if binding is what failed.
    pub fn as_bind_error(&self) -> Option<&BindError> {
        match self {
            Self::Bind { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type alias for toolbox operations
pub type Result<T> = std::result::Result<T, Error>;
