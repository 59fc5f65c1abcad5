//! Binding of raw invocation input against a [`Schema`]
//!
//! Two surfaces project onto the same schema:
//! - token lists, parsed by a command-line grammar synthesized from the fields
//! - key/value mappings, validated structurally
//!
//! Both end in the same coercion step, so equivalent input produces equal
//! [`BoundArguments`].

pub(crate) mod coerce;
pub mod mapping;
pub mod tokens;

pub use mapping::bind_mapping;
pub use tokens::{bind_tokens, bind_tokens_with, parser};

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::resolver::ModuleDescriptor;
use crate::schema::{BoundArguments, Schema};

/// Binding failures, each naming the offending field where there is one
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BindError {
    #[error("missing required argument '{field}'")]
    MissingField { field: String },

    #[error("unknown argument '{field}'")]
    UnknownField { field: String },

    #[error("argument '{field}' given more than once")]
    DuplicateField { field: String },

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("{message}")]
    Usage {
        field: Option<String>,
        message: String,
    },

    /// `--help` was requested; carries the rendered help text
    #[error("help requested")]
    HelpRequested(String),
}

impl BindError {
    /// Name of the field (or unknown token) the error is about
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingField { field }
            | Self::UnknownField { field }
            | Self::DuplicateField { field }
            | Self::InvalidValue { field, .. } => Some(field),
            Self::Usage { field, .. } => field.as_deref(),
            Self::HelpRequested(_) => None,
        }
    }
}

/// Raw arguments as supplied by a caller
#[derive(Debug, Clone, PartialEq)]
pub enum RawArguments {
    /// Command-line tokens, without a program name
    Tokens(Vec<String>),
    /// Key/value pairs keyed by field `dest` or `name`
    Mapping(Map<String, Value>),
}

impl RawArguments {
    pub fn tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Tokens(tokens.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<String>> for RawArguments {
    fn from(tokens: Vec<String>) -> Self {
        Self::Tokens(tokens)
    }
}

impl From<Map<String, Value>> for RawArguments {
    fn from(mapping: Map<String, Value>) -> Self {
        Self::Mapping(mapping)
    }
}

/// Bind raw arguments for a resolved module.
///
/// Token input gets a parser named after the module, carrying its help text.
pub fn bind(descriptor: &ModuleDescriptor, raw: &RawArguments) -> Result<BoundArguments, BindError> {
    match raw {
        RawArguments::Tokens(tokens) => {
            let parser = parser(&descriptor.schema, &descriptor.name, &descriptor.help);
            bind_tokens_with(parser, &descriptor.schema, tokens)
        }
        RawArguments::Mapping(mapping) => bind_mapping(&descriptor.schema, mapping),
    }
}

/// Coerce supplied values and fill absent optional fields.
///
/// `provided` is keyed by field name. Fields are visited in declaration order
/// so the first missing required field is the one reported.
pub(crate) fn finish(
    schema: &Schema,
    mut provided: BTreeMap<String, Value>,
) -> Result<BoundArguments, BindError> {
    let mut bound = BTreeMap::new();

    for field in schema.fields() {
        let value = match provided.remove(&field.name) {
            Some(value) => coerce::coerce_field(field, &value)?,
            None if field.is_required() => {
                return Err(BindError::MissingField {
                    field: field.name.clone(),
                });
            }
            None => field.fallback(),
        };
        bound.insert(field.name.clone(), value);
    }

    if let Some(field) = provided.into_keys().next() {
        return Err(BindError::UnknownField { field });
    }

    Ok(BoundArguments::from_map(bound))
}
