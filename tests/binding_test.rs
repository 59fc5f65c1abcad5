//! Token and mapping binding project onto the same schema

use serde_json::{Map, Value, json};
use toolbox::binder::{BindError, bind_mapping, bind_tokens};
use toolbox::{FieldKind, FieldSpec, Schema};

fn tokens(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn mapping(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

fn report_schema() -> Schema {
    Schema::new(vec![
        FieldSpec::positional("group").help("Group to report on"),
        FieldSpec::flagged("limit", ["-l", "--limit"])
            .kind(FieldKind::Integer)
            .default_value(50),
        FieldSpec::flagged("ratio", ["--ratio"])
            .kind(FieldKind::Float)
            .optional(),
        FieldSpec::flagged("format", ["--format"])
            .choices(["short", "long"])
            .default_value("short"),
        FieldSpec::flagged("attributes", ["-A", "--attribute"])
            .multiple()
            .dest("attrs")
            .optional(),
        FieldSpec::switch("recursive", ["-r", "--recursive"]),
    ])
    .unwrap()
}

#[test]
fn test_equivalent_inputs_bind_equally() {
    let schema = report_schema();
    let cases = vec![
        (tokens(&["admins"]), json!({"group": "admins"})),
        (
            tokens(&["-r", "admins", "--limit", "10"]),
            json!({"recursive": true, "group": "admins", "limit": 10}),
        ),
        (
            tokens(&["admins", "-A", "uid", "--attribute", "mail", "--format", "long"]),
            json!({"attrs": ["uid", "mail"], "group": "admins", "format": "long"}),
        ),
        (
            tokens(&["--ratio", "0.5", "admins", "-l", "7"]),
            json!({"ratio": "0.5", "limit": "7", "group": "admins"}),
        ),
        (
            tokens(&["admins", "-A", "cn"]),
            json!({"group": "admins", "attrs": "cn"}),
        ),
    ];

    for (tokens, mapping_input) in cases {
        let from_tokens = bind_tokens(&schema, &tokens).unwrap();
        let from_mapping = bind_mapping(&schema, &mapping(mapping_input)).unwrap();
        assert_eq!(from_tokens, from_mapping, "tokens: {tokens:?}");
        assert_eq!(from_tokens.canonical_json(), from_mapping.canonical_json());
    }
}

#[test]
fn test_bound_values_are_typed() {
    let args = bind_tokens(&report_schema(), &tokens(&["admins", "-l", "10", "--ratio", "2"])).unwrap();
    assert_eq!(
        args.to_value(),
        json!({
            "group": "admins",
            "limit": 10,
            "ratio": 2.0,
            "format": "short",
            "attributes": null,
            "recursive": false
        })
    );
}

#[test]
fn test_missing_required_field_is_named() {
    let schema = report_schema();
    let expected = BindError::MissingField {
        field: "group".to_string(),
    };
    assert_eq!(
        bind_mapping(&schema, &mapping(json!({"limit": 3}))),
        Err(expected.clone())
    );
    assert_eq!(bind_tokens(&schema, &tokens(&["-l", "3"])), Err(expected));
}

#[test]
fn test_unknown_key_rejected() {
    let err = bind_mapping(&report_schema(), &mapping(json!({"group": "a", "colour": "red"})))
        .unwrap_err();
    assert_eq!(
        err,
        BindError::UnknownField {
            field: "colour".to_string()
        }
    );
}

#[test]
fn test_choice_violation_rejected_in_both_modes() {
    let schema = report_schema();
    let from_mapping = bind_mapping(&schema, &mapping(json!({"group": "a", "format": "wide"})));
    assert!(matches!(
        from_mapping,
        Err(BindError::InvalidValue { ref field, .. }) if field == "format"
    ));

    let from_tokens = bind_tokens(&schema, &tokens(&["a", "--format", "wide"]));
    assert!(matches!(
        from_tokens,
        Err(BindError::InvalidValue { ref field, .. }) if field == "format"
    ));
}

#[test]
fn test_type_coercion_failure_names_field() {
    let err = bind_mapping(&report_schema(), &mapping(json!({"group": "a", "limit": "many"})))
        .unwrap_err();
    assert_eq!(err.field(), Some("limit"));
}

#[test]
fn test_numeric_choices_bind_equally() {
    let schema = Schema::new(vec![
        FieldSpec::flagged("ratio", ["--ratio"])
            .kind(FieldKind::Float)
            .choices([1, 2])
            .optional(),
        FieldSpec::flagged("limit", ["--limit"])
            .kind(FieldKind::Integer)
            .choices([10, 50])
            .default_value(10),
    ])
    .unwrap();

    let cases = vec![
        (tokens(&["--ratio", "1"]), json!({"ratio": "1"})),
        (tokens(&["--ratio", "2.0"]), json!({"ratio": 2})),
        (tokens(&["--limit", "050"]), json!({"limit": "050"})),
        (tokens(&["--limit", "50", "--ratio", "1"]), json!({"limit": 50, "ratio": 1.0})),
    ];
    for (tokens, mapping_input) in cases {
        let from_tokens = bind_tokens(&schema, &tokens).unwrap();
        let from_mapping = bind_mapping(&schema, &mapping(mapping_input)).unwrap();
        assert_eq!(from_tokens, from_mapping, "tokens: {tokens:?}");
    }

    let args = bind_tokens(&schema, &tokens(&["--limit", "050", "--ratio", "1"])).unwrap();
    assert_eq!(args.to_value(), json!({"ratio": 1.0, "limit": 50}));

    for (tokens, mapping_input) in [
        (tokens(&["--ratio", "3"]), json!({"ratio": "3"})),
        (tokens(&["--limit", "20"]), json!({"limit": 20})),
    ] {
        let field = mapping_input.as_object().unwrap().keys().next().unwrap().clone();
        for result in [
            bind_tokens(&schema, &tokens),
            bind_mapping(&schema, &mapping(mapping_input.clone())),
        ] {
            assert!(
                matches!(result, Err(BindError::InvalidValue { field: ref f, .. }) if *f == field),
                "{result:?}"
            );
        }
    }
}
