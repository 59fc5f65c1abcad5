//! Execution of a resolved module
//!
//! The pipeline instantiates the module with its bound arguments, runs it once
//! inside the module's logging scope and wraps the result under the module's
//! dotted name. Failures are reported, never retried.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::interfaces::{ExecutionContext, Output};
use crate::resolver::ModuleDescriptor;
use crate::schema::BoundArguments;

/// Run `descriptor` and return `{descriptor.name: result}`
pub fn execute(
    descriptor: &ModuleDescriptor,
    args: BoundArguments,
    context: &ExecutionContext,
    input: Option<Value>,
) -> Result<Output> {
    let context = context.child(&descriptor.name);
    let logger = context.logger().clone();
    let _entered = logger.span().enter();

    debug!(module = %descriptor.name, args = %args, "executing module");
    let module = descriptor.module_type.instantiate(args, context);
    let result = module.run(input).map_err(|source| {
        warn!(module = %descriptor.name, error = %source, "module failed");
        Error::Execution {
            module: descriptor.name.clone(),
            source,
        }
    })?;

    let mut output = Output::new();
    output.insert(descriptor.name.clone(), Value::Object(result));
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::bind_mapping;
    use crate::config::Config;
    use crate::interfaces::{Module, ModuleType, ScopedLogger};
    use crate::resolver::{BuiltinCatalogue, Resolver};
    use crate::schema::{Schema, SchemaError};
    use serde_json::json;
    use std::sync::Arc;

    struct Failing;

    impl ModuleType for Failing {
        fn help(&self) -> &str {
            "always fails"
        }

        fn schema(&self) -> std::result::Result<Schema, SchemaError> {
            Ok(Schema::empty())
        }

        fn instantiate(&self, _args: BoundArguments, _context: ExecutionContext) -> Box<dyn Module> {
            Box::new(Failing)
        }
    }

    impl Module for Failing {
        fn run(&self, _input: Option<Value>) -> anyhow::Result<Output> {
            anyhow::bail!("backend unavailable")
        }
    }

    fn resolver() -> Resolver {
        let mut builtins = BuiltinCatalogue::standard().unwrap();
        builtins.register("failing", Arc::new(Failing)).unwrap();
        Resolver::new(builtins, Vec::new()).unwrap()
    }

    fn context() -> ExecutionContext {
        ExecutionContext::new(Arc::new(Config::default()), ScopedLogger::root("toolbox"))
    }

    #[test]
    fn test_output_is_wrapped_under_module_name() {
        let descriptor = resolver().resolve("builtin.sample").unwrap();
        let args = bind_mapping(&descriptor.schema, json!({"test": "hi"}).as_object().unwrap())
            .unwrap();

        let output = execute(&descriptor, args, &context(), None).unwrap();
        assert_eq!(
            Value::Object(output),
            json!({"builtin.sample": {"test": "hi", "other": null}})
        );
    }

    #[test]
    fn test_input_payload_reaches_module() {
        let descriptor = resolver().resolve("builtin.echo").unwrap();
        let args = bind_mapping(&descriptor.schema, &Default::default()).unwrap();

        let output = execute(&descriptor, args, &context(), Some(json!({"a": 1}))).unwrap();
        assert_eq!(output["builtin.echo"], json!({"input": {"a": 1}}));
    }

    #[test]
    fn test_failure_names_module_and_cause() {
        let descriptor = resolver().resolve("builtin.failing").unwrap();
        let args = bind_mapping(&descriptor.schema, &Default::default()).unwrap();

        let err = execute(&descriptor, args, &context(), None).unwrap_err();
        match err {
            Error::Execution { module, source } => {
                assert_eq!(module, "builtin.failing");
                assert_eq!(source.to_string(), "backend unavailable");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
