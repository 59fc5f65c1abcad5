pub mod list;
pub mod run;

pub use list::list_command;
pub use run::run_command;

use anyhow::Result;
use toolbox_core::{ConfigLoader, Toolbox};

use crate::cli::Cli;

/// Session built from the configuration the command line points at
fn load_toolbox(cli: &Cli) -> Result<Toolbox> {
    let config = ConfigLoader::load(cli.config.as_deref())?;
    Ok(Toolbox::new(config)?)
}
