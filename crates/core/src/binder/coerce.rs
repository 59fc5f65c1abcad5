//! Value coercion shared by token and mapping binding
//!
//! Tokens arrive as strings and mapping values as arbitrary JSON; both go
//! through the same rules so equivalent inputs bind to equal arguments.

use serde_json::{Number, Value};

use super::BindError;
use crate::schema::{FieldKind, FieldSpec};

/// Coerce one scalar to `kind`
pub(crate) fn coerce_scalar(kind: FieldKind, value: &Value) -> Result<Value, String> {
    match kind {
        FieldKind::String => match value {
            Value::String(s) => Ok(Value::String(s.clone())),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            other => Err(format!("expected a string, got {}", describe(other))),
        },
        FieldKind::Integer => match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => n
                .as_i64()
                .map(Value::from)
                .ok_or_else(|| format!("{n} is out of range")),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| format!("'{s}' is not an integer")),
            other => Err(format!("expected an integer, got {}", describe(other))),
        },
        FieldKind::Float => {
            let parsed = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                other => return Err(format!("expected a number, got {}", describe(other))),
            };
            parsed
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| format!("{value} is not a finite number"))
        }
        FieldKind::Boolean | FieldKind::Switch => match value {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Ok(Value::Bool(false)),
                Some(1) => Ok(Value::Bool(true)),
                _ => Err(format!("{n} is not a boolean")),
            },
            Value::String(s) => parse_bool(s)
                .map(Value::Bool)
                .ok_or_else(|| format!("'{s}' is not a boolean")),
            other => Err(format!("expected a boolean, got {}", describe(other))),
        },
    }
}

/// Coerce a supplied value to the field's kind, multiplicity and choices.
///
/// `null` binds an optional field to its fallback; for a required field it
/// counts as missing.
pub(crate) fn coerce_field(field: &FieldSpec, value: &Value) -> Result<Value, BindError> {
    if value.is_null() {
        if field.is_required() {
            return Err(BindError::MissingField {
                field: field.name.clone(),
            });
        }
        return Ok(field.fallback());
    }

    let check = |item: &Value| -> Result<Value, BindError> {
        let coerced = coerce_scalar(field.kind, item).map_err(|reason| BindError::InvalidValue {
            field: field.name.clone(),
            reason,
        })?;
        if let Some(choices) = &field.choices {
            if !choices.contains(&coerced) {
                return Err(BindError::InvalidValue {
                    field: field.name.clone(),
                    reason: format!("{coerced} is not one of {}", render_choices(choices)),
                });
            }
        }
        Ok(coerced)
    };

    match (field.is_list(), value) {
        (true, Value::Array(items)) => items
            .iter()
            .map(check)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        (true, scalar) => check(scalar).map(|v| Value::Array(vec![v])),
        (false, Value::Array(_)) => Err(BindError::InvalidValue {
            field: field.name.clone(),
            reason: "expected a single value, got a list".to_string(),
        }),
        (false, scalar) => check(scalar),
    }
}

/// Plain text form of a scalar, as it would be typed on a command line
pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_choices(choices: &[Value]) -> String {
    let rendered: Vec<String> = choices.iter().map(scalar_text).collect();
    format!("[{}]", rendered.join(", "))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
