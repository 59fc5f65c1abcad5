//! Module contract
//!
//! A [`ModuleType`] describes a module (help text, schema, projection hooks)
//! and creates [`Module`] instances bound to one argument set.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::ExecutionContext;
use crate::schema::{BoundArguments, Schema, SchemaError};

/// Structured module result: string keys, arbitrarily nested values
pub type Output = Map<String, Value>;

/// One row of a flat projection, columns in insertion order
pub type FlatRow = IndexMap<String, String>;

/// Interface every pluggable module type implements
pub trait ModuleType: Send + Sync {
    /// Human-readable description
    fn help(&self) -> &str;

    /// Parameter surface. Called once per resolution; the result is shared.
    fn schema(&self) -> Result<Schema, SchemaError>;

    /// Create an instance bound to validated arguments
    fn instantiate(&self, args: BoundArguments, context: ExecutionContext) -> Box<dyn Module>;

    /// Flatten a result of this module into table rows, if supported
    fn flat_output(&self, _output: &Output) -> Option<Vec<FlatRow>> {
        None
    }

    /// Module-specific HTML for a result, if the module has its own
    fn html_output(&self, _output: &Output) -> anyhow::Result<Option<String>> {
        Ok(None)
    }
}

/// A module instance ready to run
pub trait Module: Send {
    /// Execute against an optional input payload
    fn run(&self, input: Option<Value>) -> anyhow::Result<Output>;
}

/// Project records onto flat rows.
///
/// An array of objects yields one row per object, a single object yields one
/// row. Anything else has no flat form.
pub fn records_to_rows(value: &Value) -> Option<Vec<FlatRow>> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_object().map(object_to_row))
            .collect(),
        Value::Object(map) => Some(vec![object_to_row(map)]),
        _ => None,
    }
}

fn object_to_row(map: &Map<String, Value>) -> FlatRow {
    map.iter()
        .map(|(key, value)| (key.clone(), cell_text(value)))
        .collect()
}

/// Text of one table cell
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(cell_text).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}
