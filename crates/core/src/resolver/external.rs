//! Modules backed by an external program
//!
//! The program receives one JSON request on stdin and must print one JSON
//! object on stdout.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

use anyhow::{Context, bail};
use serde_json::{Value, json};
use tracing::debug;

use super::manifest::ModuleManifest;
use crate::config::Config;
use crate::interfaces::{
    ExecutionContext, FlatRow, Module, ModuleType, Output, ScopedLogger, records_to_rows,
};
use crate::schema::{BoundArguments, Schema, SchemaError};

/// Module type declared by a manifest file
#[derive(Debug, Clone)]
pub struct ExternalModuleType {
    name: String,
    manifest: ModuleManifest,
    base_dir: PathBuf,
}

impl ExternalModuleType {
    /// `base_dir` is the directory holding the manifest
    pub fn new(name: impl Into<String>, manifest: ModuleManifest, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            manifest,
            base_dir: base_dir.into(),
        }
    }

    pub fn manifest(&self) -> &ModuleManifest {
        &self.manifest
    }

    /// Program to spawn; relative paths with a separator resolve against the manifest directory
    fn program(&self) -> Option<PathBuf> {
        let program = Path::new(self.manifest.command.first()?);
        if program.is_relative() && program.components().count() > 1 {
            Some(self.base_dir.join(program))
        } else {
            Some(program.to_path_buf())
        }
    }
}

impl ModuleType for ExternalModuleType {
    fn help(&self) -> &str {
        &self.manifest.help
    }

    fn schema(&self) -> Result<Schema, SchemaError> {
        self.manifest.schema()
    }

    fn instantiate(&self, args: BoundArguments, context: ExecutionContext) -> Box<dyn Module> {
        Box::new(ExternalModule {
            name: self.name.clone(),
            program: self.program(),
            args: self.manifest.command.iter().skip(1).cloned().collect(),
            env: self.manifest.env.clone(),
            working_dir: self.base_dir.clone(),
            bound: args,
            config: context.shared_config(),
            logger: context.logger().clone(),
        })
    }

    fn flat_output(&self, output: &Output) -> Option<Vec<FlatRow>> {
        let key = self.manifest.flat_rows.as_deref()?;
        records_to_rows(output.get(key)?)
    }

    fn html_output(&self, output: &Output) -> anyhow::Result<Option<String>> {
        self.manifest
            .render_html(output)
            .with_context(|| format!("html_template of {}", self.name))
    }
}

struct ExternalModule {
    name: String,
    program: Option<PathBuf>,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    working_dir: PathBuf,
    bound: BoundArguments,
    config: Arc<Config>,
    logger: ScopedLogger,
}

impl Module for ExternalModule {
    fn run(&self, input: Option<Value>) -> anyhow::Result<Output> {
        let Some(program) = &self.program else {
            bail!("manifest declares an empty command");
        };

        let request = json!({
            "module": self.name,
            "args": self.bound.to_value(),
            "input": input,
            "config": self.config.to_value(),
        });
        let payload = serde_json::to_vec(&request)?;

        debug!(scope = %self.logger.path(), program = %program.display(), "spawning module process");

        let mut cmd = Command::new(program);
        cmd.args(&self.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("failed to start {}", program.display()))?;

        let mut stdin = child.stdin.take().context("child stdin unavailable")?;
        let writer = std::thread::spawn(move || match stdin.write_all(&payload) {
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
            other => other,
        });

        let output = child.wait_with_output()?;
        match writer.join() {
            Ok(result) => result.context("failed to write request")?,
            Err(_) => bail!("request writer panicked"),
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("{} exited with {}: {}", program.display(), output.status, stderr.trim());
        }

        let value: Value = serde_json::from_slice(&output.stdout).with_context(|| {
            format!(
                "{} did not print valid JSON: {}",
                program.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )
        })?;

        match value {
            Value::Object(map) => Ok(map),
            other => bail!(
                "{} printed {} instead of a JSON object",
                program.display(),
                json_type(&other)
            ),
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
