use anyhow::Result;
use tracing::debug;

use super::load_toolbox;
use crate::cli::Cli;
use crate::utils::write_output;

/// Print every module of a namespace, one dotted name per line
pub fn list_command(cli: &Cli) -> Result<()> {
    let toolbox = load_toolbox(cli)?;
    let modules = toolbox.list_modules(cli.command())?;
    debug!("Found {} modules in {}", modules.len(), cli.command());

    let mut listing = String::new();
    for module in modules {
        listing.push_str(&module);
        listing.push('\n');
    }
    write_output(&cli.output, listing.as_bytes())
}
