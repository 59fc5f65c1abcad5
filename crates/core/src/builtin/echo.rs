use anyhow::bail;
use serde_json::Value;
use tracing::debug;

use crate::interfaces::{
    ExecutionContext, FlatRow, Module, ModuleType, Output, records_to_rows,
};
use crate::schema::{BoundArguments, FieldSpec, Schema, SchemaError};

/// Returns the input payload, or one top-level key of it, under `input`
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoModule;

impl ModuleType for EchoModule {
    fn help(&self) -> &str {
        "Echo the input payload"
    }

    fn schema(&self) -> Result<Schema, SchemaError> {
        Schema::new(vec![
            FieldSpec::flagged("key", ["-k", "--key"])
                .optional()
                .help("Only return this top-level key of the input"),
        ])
    }

    fn instantiate(&self, args: BoundArguments, context: ExecutionContext) -> Box<dyn Module> {
        Box::new(Echo {
            key: args.get_str("key").map(str::to_string),
            context,
        })
    }

    fn flat_output(&self, output: &Output) -> Option<Vec<FlatRow>> {
        match output.get("input")? {
            Value::Null => Some(Vec::new()),
            value => records_to_rows(value),
        }
    }
}

struct Echo {
    key: Option<String>,
    context: ExecutionContext,
}

impl Module for Echo {
    fn run(&self, input: Option<Value>) -> anyhow::Result<Output> {
        debug!(scope = %self.context.logger().path(), has_input = input.is_some(), "echoing input");

        let value = match (&self.key, input) {
            (None, input) => input.unwrap_or(Value::Null),
            (Some(key), Some(Value::Object(mut map))) => match map.remove(key) {
                Some(value) => value,
                None => bail!("input has no key '{key}'"),
            },
            (Some(key), _) => bail!("cannot select key '{key}': input is not a mapping"),
        };

        let mut output = Output::new();
        output.insert("input".to_string(), value);
        Ok(output)
    }
}
