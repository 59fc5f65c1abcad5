use serde_json::Value;
use tracing::debug;

use crate::interfaces::{ExecutionContext, FlatRow, Module, ModuleType, Output};
use crate::schema::{BoundArguments, FieldSpec, Schema, SchemaError};

/// Returns its arguments unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleModule;

impl ModuleType for SampleModule {
    fn help(&self) -> &str {
        "This is a sample module"
    }

    fn schema(&self) -> Result<Schema, SchemaError> {
        Schema::new(vec![
            FieldSpec::positional("test").help("This is a positional test argument"),
            FieldSpec::flagged("other", ["-a", "--other"])
                .optional()
                .help("This is other argument"),
        ])
    }

    fn instantiate(&self, args: BoundArguments, context: ExecutionContext) -> Box<dyn Module> {
        Box::new(Sample { args, context })
    }

    fn flat_output(&self, _output: &Output) -> Option<Vec<FlatRow>> {
        Some(Vec::new())
    }
}

struct Sample {
    args: BoundArguments,
    context: ExecutionContext,
}

impl Module for Sample {
    fn run(&self, _input: Option<Value>) -> anyhow::Result<Output> {
        debug!(scope = %self.context.logger().path(), args = %self.args, "running sample");
        let mut output = Output::new();
        for name in ["test", "other"] {
            output.insert(
                name.to_string(),
                self.args.get(name).cloned().unwrap_or(Value::Null),
            );
        }
        Ok(output)
    }
}
