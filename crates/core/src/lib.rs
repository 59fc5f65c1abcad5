//! toolbox - A framework for running self-describing modules by dotted name
//!
//! This crate provides functionality to:
//! - Resolve dotted module names across a builtin and external namespaces
//! - Bind command-line tokens or key/value mappings against one parameter schema
//! - Execute modules with shared configuration and scoped logging
//! - Memoize results per argument set and render them in several formats
pub mod binder;
pub mod builtin;
pub mod cache;
pub mod config;
pub mod error;
pub mod interfaces;
pub mod pipeline;
pub mod render;
pub mod resolver;
pub mod schema;
pub mod toolbox;

// Re-export commonly used types and traits
pub use error::{Error, Result};
pub use interfaces::{ExecutionContext, FlatRow, Module, ModuleType, Output, ScopedLogger};
pub use schema::{BoundArguments, FieldKind, FieldSpec, Schema, SchemaError};

// Re-export main API components
pub use binder::{BindError, RawArguments, bind_mapping, bind_tokens};
pub use cache::{CacheKey, ResultCache};
pub use config::{Config, ConfigLoader};
pub use pipeline::execute;
pub use render::{OutputFormat, Renderer};
pub use resolver::{ModuleDescriptor, Namespace, Resolver};
pub use toolbox::{Invocation, Toolbox, ToolboxBuilder};
