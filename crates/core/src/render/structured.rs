use super::Renderer;
use crate::error::Result;
use crate::interfaces::Output;

/// Block-style YAML
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlRenderer;

impl Renderer for YamlRenderer {
    fn content_type(&self) -> &'static str {
        "application/yaml"
    }

    fn render(&self, output: &Output) -> Result<Vec<u8>> {
        Ok(serde_yaml_ng::to_string(output)?.into_bytes())
    }
}

/// Pretty-printed JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn render(&self, output: &Output) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(output)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}
