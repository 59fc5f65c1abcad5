//! The toolbox session
//!
//! A [`Toolbox`] owns everything invocations share: the configuration, the
//! resolver with its namespaces and the result cache. It is built once at
//! startup and then used read-only, from any number of threads.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::binder::{self, RawArguments};
use crate::cache::{CacheKey, ResultCache};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::interfaces::{ExecutionContext, ModuleType, Output, ScopedLogger};
use crate::pipeline;
use crate::resolver::{BuiltinCatalogue, ModuleDescriptor, Resolver};
use crate::schema::BoundArguments;

/// What a top-level invocation produced
#[derive(Debug)]
pub enum Invocation {
    /// A bare namespace was given: the modules it contains
    Listing {
        namespace: String,
        modules: Vec<String>,
    },
    /// A module ran
    Output {
        descriptor: ModuleDescriptor,
        output: Output,
    },
}

pub struct Toolbox {
    config: Arc<Config>,
    resolver: Resolver,
    cache: ResultCache<Output>,
    logger: ScopedLogger,
}

impl std::fmt::Debug for Toolbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolbox")
            .field("resolver", &self.resolver)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl Toolbox {
    /// Session with the standard builtin modules
    pub fn new(config: Config) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: Config) -> ToolboxBuilder {
        ToolboxBuilder {
            config,
            modules: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn cache(&self) -> &ResultCache<Output> {
        &self.cache
    }

    /// Context handed to modules, scoped at the session root
    pub fn context(&self) -> ExecutionContext {
        ExecutionContext::new(Arc::clone(&self.config), self.logger.clone())
    }

    pub fn load_module(&self, name: &str) -> Result<ModuleDescriptor> {
        self.resolver.resolve(name)
    }

    pub fn list_modules(&self, namespace: &str) -> Result<Vec<String>> {
        Ok(self.resolver.enumerate(namespace)?.collect())
    }

    pub fn bind(&self, descriptor: &ModuleDescriptor, raw: &RawArguments) -> Result<BoundArguments> {
        binder::bind(descriptor, raw).map_err(|source| Error::Bind {
            module: descriptor.name.clone(),
            source,
        })
    }

    pub fn execute(
        &self,
        descriptor: &ModuleDescriptor,
        args: BoundArguments,
        input: Option<Value>,
    ) -> Result<Output> {
        pipeline::execute(descriptor, args, &self.context(), input)
    }

    /// Execute through the result cache. No input payload takes part.
    pub fn execute_cached(
        &self,
        descriptor: &ModuleDescriptor,
        args: BoundArguments,
        bypass: bool,
    ) -> Result<Output> {
        let key = CacheKey::new(&descriptor.name, &args);
        debug!(module = %descriptor.name, key = %key, bypass, "cached execution");
        self.cache
            .get_or_compute(&key, bypass, || self.execute(descriptor, args, None))
    }

    /// Top-level entry: list a bare namespace, otherwise resolve, bind and run
    pub fn run(&self, command: &str, raw: &RawArguments, input: Option<Value>) -> Result<Invocation> {
        if !command.contains('.') {
            let modules = self.list_modules(command)?;
            info!(namespace = %command, count = modules.len(), "listing namespace");
            return Ok(Invocation::Listing {
                namespace: command.to_string(),
                modules,
            });
        }

        let descriptor = self.load_module(command)?;
        let args = self.bind(&descriptor, raw)?;
        info!(module = %descriptor.name, "running module");
        let output = self.execute(&descriptor, args, input)?;
        Ok(Invocation::Output { descriptor, output })
    }

    /// Request-driven entry: mapping arguments, memoized per argument set
    pub fn run_cached(&self, command: &str, mapping: &Map<String, Value>, bypass: bool) -> Result<Output> {
        let descriptor = self.load_module(command)?;
        let args = self.bind(&descriptor, &RawArguments::Mapping(mapping.clone()))?;
        self.execute_cached(&descriptor, args, bypass)
    }
}

/// Builds a [`Toolbox`], optionally with extra builtin modules
pub struct ToolboxBuilder {
    config: Config,
    modules: Vec<(String, Arc<dyn ModuleType>)>,
}

impl ToolboxBuilder {
    /// Register `module_type` as `builtin.<path>`
    pub fn module(mut self, path: impl Into<String>, module_type: impl ModuleType + 'static) -> Self {
        self.modules.push((path.into(), Arc::new(module_type)));
        self
    }

    pub fn build(self) -> Result<Toolbox> {
        self.config.validate()?;

        let mut builtins = BuiltinCatalogue::standard()?;
        for (path, module_type) in self.modules {
            builtins.register(&path, module_type)?;
        }

        let resolver = Resolver::new(builtins, self.config.toolbox.module_search_paths.clone())?;
        let settings = self.config.toolbox.cache;
        let cache = ResultCache::new(settings.ttl(), settings.capacity()?);

        Ok(Toolbox {
            config: Arc::new(self.config),
            resolver,
            cache,
            logger: ScopedLogger::root("toolbox"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn toolbox() -> Toolbox {
        Toolbox::new(Config::default()).unwrap()
    }

    #[test]
    fn test_toolbox_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Toolbox>();
    }

    #[test]
    fn test_run_with_tokens() {
        let invocation = toolbox()
            .run(
                "builtin.sample",
                &RawArguments::tokens(["hello", "-a", "world"]),
                None,
            )
            .unwrap();
        match invocation {
            Invocation::Output { descriptor, output } => {
                assert_eq!(descriptor.name, "builtin.sample");
                assert_eq!(
                    Value::Object(output),
                    json!({"builtin.sample": {"test": "hello", "other": "world"}})
                );
            }
            other => panic!("unexpected invocation: {other:?}"),
        }
    }

    #[test]
    fn test_bare_namespace_lists_modules() {
        let invocation = toolbox()
            .run("builtin", &RawArguments::Tokens(Vec::new()), None)
            .unwrap();
        match invocation {
            Invocation::Listing { namespace, modules } => {
                assert_eq!(namespace, "builtin");
                assert_eq!(modules, vec!["builtin.echo", "builtin.sample"]);
            }
            other => panic!("unexpected invocation: {other:?}"),
        }
    }

    #[test]
    fn test_bind_errors_name_module() {
        let err = toolbox()
            .run("builtin.sample", &RawArguments::Tokens(Vec::new()), None)
            .unwrap_err();
        assert!(err.is_usage());
        assert!(matches!(
            err,
            Error::Bind { ref module, source: binder::BindError::MissingField { ref field } }
                if module == "builtin.sample" && field == "test"
        ));
    }

    #[test]
    fn test_missing_search_path_fails_build() {
        let config = Config::default().with_search_path("/definitely/not/here");
        assert!(matches!(Toolbox::new(config), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_duplicate_builtin_fails_build() {
        let result = Toolbox::builder(Config::default())
            .module("sample", crate::builtin::SampleModule)
            .build();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
}
