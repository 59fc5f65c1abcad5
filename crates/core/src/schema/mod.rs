//! Declarative description of the parameters a module accepts
//!
//! A [`Schema`] is the single source of truth for both binding surfaces: the
//! command-line grammar built by the token binder and the structural
//! validation done by the mapping binder are projections of the same fields.

pub mod arguments;
pub mod field;

pub use arguments::BoundArguments;
pub use field::{FieldKind, FieldSpec, Multiplicity};

use std::collections::HashSet;

use serde_json::Value;

use crate::binder::coerce::coerce_scalar;

/// Flags owned by the generated parser
const RESERVED_FLAGS: &[&str] = &["-h", "--help"];

/// Invalid field declarations, detected when the schema is built
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("field name must not be empty")]
    EmptyName,

    #[error("field '{0}' is declared more than once")]
    DuplicateName(String),

    #[error("flag '{flag}' of field '{field}' is already used")]
    DuplicateFlag { field: String, flag: String },

    #[error("flag '{flag}' of field '{field}' is not of the form -x or --name")]
    InvalidFlag { field: String, flag: String },

    #[error("flag '{flag}' of field '{field}' is reserved")]
    ReservedFlag { field: String, flag: String },

    #[error("switch field '{0}' needs at least one flag")]
    SwitchPositional(String),

    #[error("variadic positional '{0}' must be the last positional field")]
    VariadicNotLast(String),

    #[error("invalid default for field '{field}': {reason}")]
    InvalidDefault { field: String, reason: String },

    #[error("invalid choice for field '{field}': {reason}")]
    InvalidChoice { field: String, reason: String },
}

/// Ordered, validated parameter surface of a module
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    fields: Vec<FieldSpec>,
    allow_hyphen_values: bool,
}

impl Schema {
    /// Validate `fields` and normalize their defaults and choices to the field kind
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self, SchemaError> {
        let mut names = HashSet::new();
        let mut flags = HashSet::new();
        let mut seen_variadic: Option<&str> = None;

        for field in &fields {
            if field.name.is_empty() {
                return Err(SchemaError::EmptyName);
            }
            if !names.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateName(field.name.clone()));
            }
            if let Some(dest) = field.dest.as_deref() {
                if dest != field.name && !names.insert(dest) {
                    return Err(SchemaError::DuplicateName(dest.to_string()));
                }
            }

            for flag in &field.flags {
                if RESERVED_FLAGS.contains(&flag.as_str()) {
                    return Err(SchemaError::ReservedFlag {
                        field: field.name.clone(),
                        flag: flag.clone(),
                    });
                }
                if !is_valid_flag(flag) {
                    return Err(SchemaError::InvalidFlag {
                        field: field.name.clone(),
                        flag: flag.clone(),
                    });
                }
                if !flags.insert(flag.as_str()) {
                    return Err(SchemaError::DuplicateFlag {
                        field: field.name.clone(),
                        flag: flag.clone(),
                    });
                }
            }

            if field.is_positional() {
                if field.kind == FieldKind::Switch {
                    return Err(SchemaError::SwitchPositional(field.name.clone()));
                }
                if let Some(variadic) = seen_variadic {
                    return Err(SchemaError::VariadicNotLast(variadic.to_string()));
                }
                if field.is_list() {
                    seen_variadic = Some(&field.name);
                }
            }
        }

        let fields = fields
            .into_iter()
            .map(normalize_field)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            fields,
            allow_hyphen_values: false,
        })
    }

    /// Schema without parameters
    pub fn empty() -> Self {
        Self::default()
    }

    /// Let positionals accept dash-prefixed tokens without a `--` terminator
    pub fn allow_hyphen_values(mut self, allow: bool) -> Self {
        self.allow_hyphen_values = allow;
        self
    }

    pub fn hyphen_values_allowed(&self) -> bool {
        self.allow_hyphen_values
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field addressed by a mapping key, matched on `dest` or `name`
    pub fn field_for_key(&self, key: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|f| f.bound_name() == key)
            .or_else(|| self.field(key))
    }

    /// Field behind a flag token such as `-a` or `--other`
    pub fn field_for_flag(&self, flag: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|f| f.flags.iter().any(|candidate| candidate == flag))
    }

    pub fn positionals(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.is_positional())
    }

    pub fn options(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| !f.is_positional())
    }
}

fn is_valid_flag(flag: &str) -> bool {
    if let Some(long) = flag.strip_prefix("--") {
        return !long.is_empty()
            && !long.starts_with('-')
            && long.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    }
    match flag.strip_prefix('-') {
        Some(short) => {
            let mut chars = short.chars();
            matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_alphanumeric())
        }
        None => false,
    }
}

fn normalize_field(mut field: FieldSpec) -> Result<FieldSpec, SchemaError> {
    if let Some(choices) = field.choices.take() {
        let normalized = choices
            .iter()
            .map(|choice| coerce_scalar(field.kind, choice))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|reason| SchemaError::InvalidChoice {
                field: field.name.clone(),
                reason,
            })?;
        field.choices = Some(normalized);
    }

    if let Some(default) = field.default.take() {
        let normalized = normalize_default(&field, default).map_err(|reason| {
            SchemaError::InvalidDefault {
                field: field.name.clone(),
                reason,
            }
        })?;
        field.default = Some(normalized);
    }

    Ok(field)
}

fn normalize_default(field: &FieldSpec, default: Value) -> Result<Value, String> {
    if default.is_null() {
        return Ok(default);
    }
    if field.kind == FieldKind::Switch && default != Value::Bool(false) {
        return Err("a switch can only default to false".to_string());
    }

    let check = |value: &Value| -> Result<Value, String> {
        let coerced = coerce_scalar(field.kind, value)?;
        match &field.choices {
            Some(choices) if !choices.contains(&coerced) => {
                Err(format!("{coerced} is not one of the declared choices"))
            }
            _ => Ok(coerced),
        }
    };

    match (field.is_list(), default) {
        (true, Value::Array(items)) => items
            .iter()
            .map(check)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        (true, scalar) => check(&scalar).map(|v| Value::Array(vec![v])),
        (false, Value::Array(_)) => Err("a single-valued field cannot default to a list".to_string()),
        (false, scalar) => check(&scalar),
    }
}
