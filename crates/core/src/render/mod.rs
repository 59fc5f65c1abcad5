//! Serialization of module output
//!
//! The pipeline hands a fully built [`Output`] to a [`Renderer`]. Structured
//! formats serialize it as is; table formats go through the module's flat
//! projection hooks.

mod structured;
mod table;

pub use structured::{JsonRenderer, YamlRenderer};
pub use table::{CsvRenderer, HtmlRenderer, NO_DATA};

use clap::ValueEnum;

use crate::error::Result;
use crate::interfaces::Output;
use crate::resolver::ModuleDescriptor;

/// Turns a module's wrapped output into bytes
pub trait Renderer {
    /// MIME type of the rendered bytes
    fn content_type(&self) -> &'static str;

    fn render(&self, output: &Output) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
    Csv,
    Html,
}

impl OutputFormat {
    /// Renderer for results of `descriptor`
    pub fn renderer<'a>(self, descriptor: &'a ModuleDescriptor) -> Box<dyn Renderer + 'a> {
        match self {
            Self::Yaml => Box::new(YamlRenderer),
            Self::Json => Box::new(JsonRenderer),
            Self::Csv => Box::new(CsvRenderer::new(descriptor)),
            Self::Html => Box::new(HtmlRenderer::new(descriptor)),
        }
    }
}
