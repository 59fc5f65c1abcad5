//! Core interfaces for pluggable modules
//!
//! This module defines the contract every module implements and the shared,
//! read-only context handed to each module instance.

use std::sync::Arc;

use tracing::Span;

use crate::config::Config;

pub mod module;

pub use module::{FlatRow, Module, ModuleType, Output, cell_text, records_to_rows};

/// Hierarchical logger scope, named after the invocation path.
///
/// Backed by a tracing span; events emitted while the scope is entered are
/// attributed to it.
#[derive(Debug, Clone)]
pub struct ScopedLogger {
    path: String,
    span: Span,
}

impl ScopedLogger {
    pub fn root(name: &str) -> Self {
        Self {
            path: name.to_string(),
            span: tracing::info_span!("toolbox", scope = %name),
        }
    }

    /// Child scope `<path>.<name>`
    pub fn child(&self, name: &str) -> Self {
        let path = format!("{}.{}", self.path, name);
        let span = tracing::info_span!(parent: &self.span, "module", scope = %path);
        Self { path, span }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn in_scope<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.span.in_scope(f)
    }
}

/// Shared state passed to every module instance
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    config: Arc<Config>,
    logger: ScopedLogger,
}

impl ExecutionContext {
    pub fn new(config: Arc<Config>, logger: ScopedLogger) -> Self {
        Self { config, logger }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn shared_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    pub fn logger(&self) -> &ScopedLogger {
        &self.logger
    }

    /// Same configuration, logger scoped one level deeper
    pub fn child(&self, name: &str) -> Self {
        Self {
            config: Arc::clone(&self.config),
            logger: self.logger.child(name),
        }
    }
}
