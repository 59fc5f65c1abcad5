//! Command-line grammar synthesized from a schema
//!
//! Flagged fields become options, flagless fields become positionals in
//! declaration order. Required-ness, type and choice checks run afterwards
//! in the shared coercion step; clap owns the token grammar itself.

use std::collections::BTreeMap;

use clap::builder::PossibleValuesParser;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Arg, ArgAction, Command};
use serde_json::Value;
use tracing::trace;

use super::coerce::scalar_text;
use super::{BindError, finish};
use crate::schema::{BoundArguments, FieldKind, FieldSpec, Schema};

/// Build the parser for `schema`
pub fn parser(schema: &Schema, program: &str, about: &str) -> Command {
    let mut command = Command::new(program.to_string())
        .no_binary_name(true)
        .disable_version_flag(true)
        .args_override_self(true);
    if !about.is_empty() {
        command = command.about(about.to_string());
    }

    schema.fields().iter().fold(command, |command, field| {
        command.arg(build_arg(field, schema.hyphen_values_allowed()))
    })
}

/// Bind `tokens` with a parser built from `schema` alone
pub fn bind_tokens(schema: &Schema, tokens: &[String]) -> Result<BoundArguments, BindError> {
    bind_tokens_with(parser(schema, "module", ""), schema, tokens)
}

/// Bind `tokens` with a parser previously built by [`parser`] for the same schema
pub fn bind_tokens_with(
    parser: Command,
    schema: &Schema,
    tokens: &[String],
) -> Result<BoundArguments, BindError> {
    let matches = parser
        .try_get_matches_from(tokens)
        .map_err(|err| translate_error(schema, err))?;

    let mut provided = BTreeMap::new();
    for field in schema.fields() {
        let raw = match (field.kind, field.is_list()) {
            (FieldKind::Switch, _) => matches.get_flag(&arg_id(field)).then_some(Value::Bool(true)),
            (_, true) => matches.get_many::<String>(&arg_id(field)).map(|values| {
                Value::Array(values.map(|v| Value::String(v.clone())).collect())
            }),
            (_, false) => matches
                .get_one::<String>(&arg_id(field))
                .map(|v| Value::String(v.clone())),
        };
        if let Some(raw) = raw {
            trace!(field = %field.name, value = %raw, "token value");
            provided.insert(field.name.clone(), raw);
        }
    }

    finish(schema, provided)
}

/// Clap id of a field; prefixed so field names never collide with clap's own ids
fn arg_id(field: &FieldSpec) -> String {
    format!("field:{}", field.name)
}

fn build_arg(field: &FieldSpec, allow_hyphen_values: bool) -> Arg {
    let mut arg = Arg::new(arg_id(field));
    if field.kind != FieldKind::Switch {
        arg = arg.value_name(field.display_name().to_string());
    }

    if let Some(help) = help_text(field) {
        arg = arg.help(help);
    }

    if field.is_positional() {
        arg = arg.allow_hyphen_values(allow_hyphen_values);
        arg = if field.is_list() {
            arg.action(ArgAction::Append).num_args(0..)
        } else {
            arg.action(ArgAction::Set).num_args(1)
        };
    } else {
        let mut has_long = false;
        let mut has_short = false;
        for flag in &field.flags {
            if let Some(long) = flag.strip_prefix("--") {
                arg = if has_long {
                    arg.visible_alias(long.to_string())
                } else {
                    arg.long(long.to_string())
                };
                has_long = true;
            } else if let Some(short) = flag.strip_prefix('-').and_then(|s| s.chars().next()) {
                arg = if has_short {
                    arg.visible_short_alias(short)
                } else {
                    arg.short(short)
                };
                has_short = true;
            }
        }

        arg = match (field.kind, field.is_list()) {
            (FieldKind::Switch, _) => arg.action(ArgAction::SetTrue),
            (_, true) => arg.action(ArgAction::Append).num_args(1),
            (_, false) => arg.action(ArgAction::Set).num_args(1),
        };
    }

    // Only strings compare by text; other kinds check choices after coercion
    if field.kind == FieldKind::String {
        if let Some(choices) = &field.choices {
            let names: Vec<String> = choices.iter().map(scalar_text).collect();
            arg = arg.value_parser(PossibleValuesParser::new(names));
        }
    }

    arg
}

fn help_text(field: &FieldSpec) -> Option<String> {
    let default = field
        .default
        .as_ref()
        .filter(|d| !d.is_null() && field.kind != FieldKind::Switch)
        .map(|d| match d {
            Value::Array(items) => items.iter().map(scalar_text).collect::<Vec<_>>().join(", "),
            other => scalar_text(other),
        });

    let mut hints = Vec::new();
    if let Some(choices) = field.choices.as_ref().filter(|_| field.kind != FieldKind::String) {
        let names: Vec<String> = choices.iter().map(scalar_text).collect();
        hints.push(format!("[possible values: {}]", names.join(", ")));
    }
    if let Some(default) = default {
        hints.push(format!("[default: {default}]"));
    }

    let text = field
        .help
        .iter()
        .cloned()
        .chain(hints)
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}

fn translate_error(schema: &Schema, err: clap::Error) -> BindError {
    let kind = err.kind();
    if matches!(
        kind,
        ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    ) {
        return BindError::HelpRequested(err.render().to_string());
    }

    let arg = context_string(&err, ContextKind::InvalidArg);
    let field = arg.as_deref().map(|arg| field_for_arg(schema, arg));

    match kind {
        ErrorKind::UnknownArgument => BindError::UnknownField {
            field: field.unwrap_or_else(|| "<unknown>".to_string()),
        },
        ErrorKind::InvalidValue => {
            let value = context_string(&err, ContextKind::InvalidValue).unwrap_or_default();
            BindError::InvalidValue {
                field: field.unwrap_or_else(|| "<unknown>".to_string()),
                reason: format!("'{value}' is not an accepted value"),
            }
        }
        other => BindError::Usage {
            field,
            message: other.as_str().unwrap_or("invalid usage").to_string(),
        },
    }
}

fn context_string(err: &clap::Error, kind: ContextKind) -> Option<String> {
    match err.get(kind)? {
        ContextValue::String(s) => Some(s.clone()),
        ContextValue::Strings(values) => values.first().cloned(),
        _ => None,
    }
}

/// Map clap's rendering of an argument (`--other <other>`, `<test>`) back to a field name.
/// Unknown tokens are returned as given.
fn field_for_arg(schema: &Schema, arg: &str) -> String {
    let token = arg.split_whitespace().next().unwrap_or(arg);
    let token = token.split('=').next().unwrap_or(token);

    if token.starts_with('-') {
        return schema
            .field_for_flag(token)
            .map(|f| f.name.clone())
            .unwrap_or_else(|| token.to_string());
    }

    let bare = token
        .trim_end_matches("...")
        .trim_matches(|c: char| matches!(c, '<' | '>' | '[' | ']'));
    let bare = bare.strip_prefix("field:").unwrap_or(bare);
    schema
        .fields()
        .iter()
        .find(|f| f.name == bare || f.display_name() == bare)
        .map(|f| f.name.clone())
        .unwrap_or_else(|| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn sample_schema() -> Schema {
        Schema::new(vec![
            FieldSpec::positional("test").help("This is a positional test argument"),
            FieldSpec::flagged("other", ["-a", "--other"])
                .optional()
                .help("This is other argument"),
        ])
        .unwrap()
    }

    #[test]
    fn test_positional_and_short_flag() {
        let args = bind_tokens(&sample_schema(), &tokens(&["hello", "-a", "world"])).unwrap();
        assert_eq!(args.to_value(), json!({"test": "hello", "other": "world"}));
    }

    #[test]
    fn test_flags_in_any_order() {
        let args = bind_tokens(&sample_schema(), &tokens(&["--other", "world", "hello"])).unwrap();
        assert_eq!(args.to_value(), json!({"test": "hello", "other": "world"}));
    }

    #[test]
    fn test_unknown_flag() {
        let err = bind_tokens(&sample_schema(), &tokens(&["hello", "--bogus"])).unwrap_err();
        assert_eq!(
            err,
            BindError::UnknownField {
                field: "--bogus".to_string()
            }
        );
    }

    #[test]
    fn test_missing_positional() {
        let err = bind_tokens(&sample_schema(), &tokens(&["-a", "world"])).unwrap_err();
        assert_eq!(
            err,
            BindError::MissingField {
                field: "test".to_string()
            }
        );
    }

    #[test]
    fn test_choice_violation_names_field() {
        let schema = Schema::new(vec![
            FieldSpec::flagged("mode", ["-m", "--mode"]).choices(["fast", "slow"]),
        ])
        .unwrap();
        let err = bind_tokens(&schema, &tokens(&["--mode", "medium"])).unwrap_err();
        assert!(matches!(err, BindError::InvalidValue { ref field, .. } if field == "mode"));
    }

    #[test]
    fn test_type_violation_names_field() {
        let schema = Schema::new(vec![
            FieldSpec::flagged("count", ["-n"]).kind(FieldKind::Integer),
        ])
        .unwrap();
        let err = bind_tokens(&schema, &tokens(&["-n", "many"])).unwrap_err();
        assert!(matches!(err, BindError::InvalidValue { ref field, .. } if field == "count"));
    }

    #[test]
    fn test_double_dash_terminates_flags() {
        let args = bind_tokens(&sample_schema(), &tokens(&["--", "-dashed"])).unwrap();
        assert_eq!(args.get_str("test"), Some("-dashed"));
    }

    #[test]
    fn test_hyphen_values_when_allowed() {
        let schema = Schema::new(vec![FieldSpec::positional("expr")])
            .unwrap()
            .allow_hyphen_values(true);
        let args = bind_tokens(&schema, &tokens(&["-5"])).unwrap();
        assert_eq!(args.get_str("expr"), Some("-5"));
    }

    #[test]
    fn test_help_is_reported_not_failed() {
        let parser = parser(&sample_schema(), "builtin.sample", "This is a sample module");
        let err = bind_tokens_with(parser, &sample_schema(), &tokens(&["--help"])).unwrap_err();
        match err {
            BindError::HelpRequested(text) => {
                assert!(text.contains("This is a sample module"));
                assert!(text.contains("--other"));
                assert!(text.contains("This is a positional test argument"));
            }
            other => panic!("expected help, got {other:?}"),
        }
    }

    #[test]
    fn test_alias_flags_bind_same_field() {
        let schema = Schema::new(vec![
            FieldSpec::flagged("name", ["-n", "-N", "--name", "--nom"]).optional(),
        ])
        .unwrap();
        for variant in ["-n", "-N", "--name", "--nom"] {
            let args = bind_tokens(&schema, &tokens(&[variant, "x"])).unwrap();
            assert_eq!(args.get_str("name"), Some("x"), "flag {variant}");
        }
    }

    #[test]
    fn test_surplus_positional_is_usage_error() {
        let err = bind_tokens(&sample_schema(), &tokens(&["one", "two"])).unwrap_err();
        assert!(matches!(err, BindError::UnknownField { .. } | BindError::Usage { .. }));
    }

    #[test]
    fn test_field_named_help_binds() {
        let schema = Schema::new(vec![
            FieldSpec::positional("help"),
            FieldSpec::flagged("version", ["--version"]).optional(),
        ])
        .unwrap();
        let args = bind_tokens(&schema, &tokens(&["topic", "--version", "2"])).unwrap();
        assert_eq!(args.to_value(), json!({"help": "topic", "version": "2"}));

        let err = bind_tokens(&schema, &tokens(&["--help"])).unwrap_err();
        assert!(matches!(err, BindError::HelpRequested(_)));
    }

    #[test]
    fn test_repeated_flag_last_value_wins() {
        let args = bind_tokens(&sample_schema(), &tokens(&["hi", "-a", "x", "--other", "y"])).unwrap();
        assert_eq!(args.get_str("other"), Some("y"));
    }

    #[test]
    fn test_numeric_choices_listed_in_help() {
        let schema = Schema::new(vec![
            FieldSpec::flagged("limit", ["--limit"])
                .kind(FieldKind::Integer)
                .choices([10, 50])
                .default_value(10)
                .help("Row limit"),
        ])
        .unwrap();
        let err = bind_tokens(&schema, &tokens(&["--help"])).unwrap_err();
        match err {
            BindError::HelpRequested(text) => {
                assert!(text.contains("Row limit [possible values: 10, 50] [default: 10]"), "{text}");
            }
            other => panic!("expected help, got {other:?}"),
        }
    }
}
