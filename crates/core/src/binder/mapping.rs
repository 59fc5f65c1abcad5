use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::trace;

use super::{BindError, finish};
use crate::schema::{BoundArguments, Schema};

/// Bind a key/value mapping against `schema`.
///
/// Keys match a field's `dest` or `name`; unknown keys are rejected and field
/// order is irrelevant. No command-line grammar is involved.
pub fn bind_mapping(
    schema: &Schema,
    mapping: &Map<String, Value>,
) -> Result<BoundArguments, BindError> {
    let mut provided = BTreeMap::new();

    for (key, value) in mapping {
        let field = schema
            .field_for_key(key)
            .ok_or_else(|| BindError::UnknownField { field: key.clone() })?;
        trace!(key = %key, field = %field.name, "binding mapping entry");
        if provided.insert(field.name.clone(), value.clone()).is_some() {
            return Err(BindError::DuplicateField {
                field: field.name.clone(),
            });
        }
    }

    finish(schema, provided)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldKind, FieldSpec};
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new(vec![
            FieldSpec::positional("test"),
            FieldSpec::flagged("other", ["-a", "--other"]).optional(),
            FieldSpec::flagged("output_file", ["-o"]).dest("output").optional(),
            FieldSpec::flagged("limit", ["-l"])
                .kind(FieldKind::Integer)
                .choices([10, 50, 100])
                .default_value(10),
        ])
        .unwrap()
    }

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_optional_field_absent() {
        let args = bind_mapping(&schema(), &map(json!({"test": "hi"}))).unwrap();
        assert_eq!(args.get_str("test"), Some("hi"));
        assert_eq!(args.get("other"), Some(&Value::Null));
        assert_eq!(args.get_i64("limit"), Some(10));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = bind_mapping(&schema(), &map(json!({"test": "hi", "bogus": 1}))).unwrap_err();
        assert_eq!(
            err,
            BindError::UnknownField {
                field: "bogus".to_string()
            }
        );
    }

    #[test]
    fn test_missing_required_rejected() {
        let err = bind_mapping(&schema(), &map(json!({"other": "x"}))).unwrap_err();
        assert_eq!(err.field(), Some("test"));
        assert!(matches!(err, BindError::MissingField { .. }));
    }

    #[test]
    fn test_dest_and_name_both_accepted() {
        let by_dest = bind_mapping(&schema(), &map(json!({"test": "t", "output": "f"}))).unwrap();
        let by_name =
            bind_mapping(&schema(), &map(json!({"test": "t", "output_file": "f"}))).unwrap();
        assert_eq!(by_dest, by_name);
        assert_eq!(by_dest.get_str("output_file"), Some("f"));
    }

    #[test]
    fn test_dest_and_name_together_is_duplicate() {
        let err = bind_mapping(
            &schema(),
            &map(json!({"test": "t", "output": "f", "output_file": "g"})),
        )
        .unwrap_err();
        assert!(matches!(err, BindError::DuplicateField { field } if field == "output_file"));
    }

    #[test]
    fn test_string_values_are_coerced() {
        let args = bind_mapping(&schema(), &map(json!({"test": "t", "limit": "50"}))).unwrap();
        assert_eq!(args.get_i64("limit"), Some(50));

        let err = bind_mapping(&schema(), &map(json!({"test": "t", "limit": "7"}))).unwrap_err();
        assert!(matches!(err, BindError::InvalidValue { field, .. } if field == "limit"));
    }
}
