use anyhow::Result;
use tracing::debug;

use toolbox_core::{BindError, Error, RawArguments};

use super::load_toolbox;
use crate::cli::Cli;
use crate::utils::{read_input, write_output};

pub fn run_command(cli: &Cli) -> Result<()> {
    let toolbox = load_toolbox(cli)?;
    let descriptor = toolbox.load_module(cli.command())?;

    let raw = RawArguments::Tokens(cli.module_args().to_vec());
    let args = match toolbox.bind(&descriptor, &raw) {
        Ok(args) => args,
        Err(Error::Bind {
            source: BindError::HelpRequested(help),
            ..
        }) => {
            print!("{help}");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let input = match cli.input.as_deref() {
        Some(source) => read_input(source)?,
        None => None,
    };
    debug!("Running {} with {}", descriptor.name, args);

    let output = toolbox.execute(&descriptor, args, input)?;
    let rendered = cli.format.renderer(&descriptor).render(&output)?;
    write_output(&cli.output, &rendered)
}
