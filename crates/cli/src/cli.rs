use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use toolbox_core::OutputFormat;
use toolbox_core::config::CONFIG_ENV_VAR;

use crate::commands::{list_command, run_command};

#[derive(Parser, Debug)]
#[command(name = "toolbox")]
#[command(version, about = "Run toolbox modules by dotted name", long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    RUST_LOG=debug    Enable debug logging\n    TOOLBOX_CONFIG    Configuration file")]
pub struct Cli {
    /// Configuration file (defaults to ~/.config/toolbox.yaml)
    #[arg(short, long, env = CONFIG_ENV_VAR, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Input payload as YAML or JSON, `-` for stdin
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<String>,

    /// Where to write the result, `-` for stdout
    #[arg(short, long, value_name = "FILE", default_value = "-")]
    pub output: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "yaml")]
    pub format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Module name (e.g. builtin.sample) or a bare namespace to list, followed by module arguments
    #[arg(
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    pub invocation: Vec<String>,
}

impl Cli {
    /// Dotted module name or bare namespace
    pub fn command(&self) -> &str {
        self.invocation.first().map(String::as_str).unwrap_or_default()
    }

    /// Tokens handed to the module's own parser
    pub fn module_args(&self) -> &[String] {
        self.invocation.get(1..).unwrap_or_default()
    }

    pub fn execute(self) -> Result<()> {
        if self.command().contains('.') {
            run_command(&self)
        } else {
            list_command(&self)
        }
    }
}
