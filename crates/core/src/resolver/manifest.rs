//! TOML manifests declaring external modules
//!
//! One manifest file is one importable unit. It must declare exactly one
//! `[[module]]` table:
//!
//! ```toml
//! [[module]]
//! help = "List group members"
//! command = ["./members.sh"]
//! flat_rows = "members"
//!
//! [[module.field]]
//! name = "group"
//! help = "Group to inspect"
//!
//! [[module.field]]
//! name = "limit"
//! kind = "integer"
//! flags = ["-l", "--limit"]
//! default = 50
//! ```
//!
//! An optional `html_template` (Jinja syntax) renders the module's own HTML,
//! with the module result bound to `data`.

use std::collections::BTreeMap;
use std::path::Path;

use minijinja::{Environment, context};
use serde::Deserialize;
use serde_json::Value;

use crate::interfaces::Output;
use crate::schema::{FieldKind, FieldSpec, Schema, SchemaError};

/// Parsed contents of a manifest file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitManifest {
    #[serde(default, rename = "module")]
    pub modules: Vec<ModuleManifest>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleManifest {
    #[serde(default)]
    pub help: String,

    /// Program followed by its arguments
    pub command: Vec<String>,

    /// Extra environment for the spawned process
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Result key holding an array of records, used for flat output
    #[serde(default)]
    pub flat_rows: Option<String>,

    #[serde(default)]
    pub allow_hyphen_values: bool,

    /// HTML template for the result, bound as `data`
    #[serde(default)]
    pub html_template: Option<String>,

    #[serde(default, rename = "field")]
    pub fields: Vec<FieldManifest>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldManifest {
    pub name: String,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub help: Option<String>,
    #[serde(default)]
    pub choices: Option<Vec<Value>>,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub dest: Option<String>,
    #[serde(default)]
    pub metavar: Option<String>,
}

impl UnitManifest {
    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        Self::parse(&contents).map_err(|e| e.to_string())
    }

    /// The single module this unit declares
    pub fn into_module(self) -> Result<ModuleManifest, String> {
        let mut modules = self.modules;
        let module = match modules.len() {
            0 => return Err("no module declared".to_string()),
            1 => modules.remove(0),
            n => return Err(format!("ambiguous: {n} modules declared, expected exactly one")),
        };
        if let Some(source) = &module.html_template {
            html_environment(source).map_err(|e| format!("invalid html_template: {e}"))?;
        }
        Ok(module)
    }
}

impl ModuleManifest {
    pub fn schema(&self) -> Result<Schema, SchemaError> {
        let fields = self
            .fields
            .iter()
            .map(FieldManifest::to_spec)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Schema::new(fields)?.allow_hyphen_values(self.allow_hyphen_values))
    }

    /// Render `html_template` against a module result
    pub fn render_html(&self, result: &Output) -> Result<Option<String>, minijinja::Error> {
        let Some(source) = &self.html_template else {
            return Ok(None);
        };
        let env = html_environment(source)?;
        let html = env
            .get_template(HTML_TEMPLATE_NAME)?
            .render(context! { data => result })?;
        Ok(Some(html))
    }
}

/// The `.html` name turns on HTML auto-escaping
const HTML_TEMPLATE_NAME: &str = "module.html";

fn html_environment(source: &str) -> Result<Environment<'_>, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template(HTML_TEMPLATE_NAME, source)?;
    Ok(env)
}

impl FieldManifest {
    fn to_spec(&self) -> Result<FieldSpec, SchemaError> {
        let mut spec = match (self.kind, self.flags.is_empty()) {
            (FieldKind::Switch, false) => FieldSpec::switch(&self.name, &self.flags),
            (kind, true) => FieldSpec::positional(&self.name).kind(kind),
            (kind, false) => FieldSpec::flagged(&self.name, &self.flags).kind(kind),
        };

        match (self.required, &self.default) {
            (Some(true), Some(_)) => {
                return Err(SchemaError::InvalidDefault {
                    field: self.name.clone(),
                    reason: "a required field cannot declare a default".to_string(),
                });
            }
            (_, Some(default)) => spec = spec.default_value(default.clone()),
            (Some(false), None) if self.kind != FieldKind::Switch => spec = spec.optional(),
            _ => {}
        }

        if let Some(help) = &self.help {
            spec = spec.help(help);
        }
        if let Some(choices) = &self.choices {
            spec = spec.choices(choices.iter().cloned());
        }
        if self.multiple {
            spec = spec.multiple();
        }
        if let Some(dest) = &self.dest {
            spec = spec.dest(dest);
        }
        if let Some(metavar) = &self.metavar {
            spec = spec.metavar(metavar);
        }
        Ok(spec)
    }
}
