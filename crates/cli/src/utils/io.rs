use std::fs;
use std::io::{Read, Write};

use anyhow::{Context, Result};
use serde_json::Value;

/// Read and parse the input payload from a file or `-` (stdin).
///
/// YAML is accepted, and so is JSON as a subset of it. An empty document means no input.
pub fn read_input(source: &str) -> Result<Option<Value>> {
    let text = if source == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read input from stdin")?;
        text
    } else {
        fs::read_to_string(source).with_context(|| format!("Failed to read input file {source}"))?
    };
    parse_input(&text)
}

fn parse_input(text: &str) -> Result<Option<Value>> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    let value: Value = serde_yaml_ng::from_str(text).context("Failed to parse input")?;
    Ok((!value.is_null()).then_some(value))
}

/// Write rendered output to a file or `-` (stdout)
pub fn write_output(target: &str, bytes: &[u8]) -> Result<()> {
    if target == "-" {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(bytes)?;
        stdout.flush()?;
    } else {
        fs::write(target, bytes).with_context(|| format!("Failed to write output to {target}"))?;
    }
    Ok(())
}
