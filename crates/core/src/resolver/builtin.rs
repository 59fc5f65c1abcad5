//! Builtin module catalogue
//!
//! Manages registration and lookup of module types shipped in-process.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::is_valid_segment;
use crate::builtin::{EchoModule, SampleModule};
use crate::error::{Error, Result};
use crate::interfaces::ModuleType;
use crate::schema::Schema;

#[derive(Clone)]
struct CatalogueEntry {
    module_type: Arc<dyn ModuleType>,
    schema: Arc<Schema>,
}

/// Registry for builtin module types, keyed by dotted subpath
#[derive(Clone, Default)]
pub struct BuiltinCatalogue {
    entries: BTreeMap<String, CatalogueEntry>,
}

impl std::fmt::Debug for BuiltinCatalogue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinCatalogue")
            .field("modules", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl BuiltinCatalogue {
    /// Create an empty catalogue
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a catalogue with the stock modules
    pub fn standard() -> Result<Self> {
        let mut catalogue = Self::empty();
        catalogue.register("sample", Arc::new(SampleModule))?;
        catalogue.register("echo", Arc::new(EchoModule))?;
        Ok(catalogue)
    }

    /// Register a module type under `path`.
    ///
    /// The schema is built here, once. A second registration under the same
    /// path is rejected rather than shadowing the first.
    pub fn register(&mut self, path: &str, module_type: Arc<dyn ModuleType>) -> Result<()> {
        if path.is_empty() || !path.split('.').all(is_valid_segment) {
            return Err(Error::Configuration(format!(
                "invalid builtin module path '{path}'"
            )));
        }
        if self.entries.contains_key(path) {
            return Err(Error::Configuration(format!(
                "builtin module '{path}' is registered more than once"
            )));
        }

        let schema = module_type.schema().map_err(|e| {
            Error::Configuration(format!("builtin module '{path}' has an invalid schema: {e}"))
        })?;

        self.entries.insert(
            path.to_string(),
            CatalogueEntry {
                module_type,
                schema: Arc::new(schema),
            },
        );
        Ok(())
    }

    /// Get a module type and its schema by subpath
    pub fn get(&self, path: &str) -> Option<(Arc<dyn ModuleType>, Arc<Schema>)> {
        self.entries
            .get(path)
            .map(|entry| (Arc::clone(&entry.module_type), Arc::clone(&entry.schema)))
    }

    /// Check if a module exists
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Registered subpaths in sorted order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
