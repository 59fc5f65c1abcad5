use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Primitive type a field's values are coerced to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    String,
    Integer,
    Float,
    /// Takes an explicit `true`/`false` value
    Boolean,
    /// Presence toggle, `false` unless given
    Switch,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Switch => "switch",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Multiplicity {
    #[default]
    Single,
    List,
}

/// One parameter of a module.
///
/// A field without flags is positional. A field with a `default` is optional;
/// `Value::Null` is a valid default and marks a field that may simply be absent.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub flags: Vec<String>,
    pub default: Option<Value>,
    pub help: Option<String>,
    pub choices: Option<Vec<Value>>,
    pub multiplicity: Multiplicity,
    pub dest: Option<String>,
    pub metavar: Option<String>,
}

impl FieldSpec {
    /// A positional field, consumed in declaration order
    pub fn positional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::String,
            flags: Vec::new(),
            default: None,
            help: None,
            choices: None,
            multiplicity: Multiplicity::Single,
            dest: None,
            metavar: None,
        }
    }

    /// A field reachable through one or more `-x` / `--long` flags
    pub fn flagged<I, S>(name: impl Into<String>, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            flags: flags.into_iter().map(Into::into).collect(),
            ..Self::positional(name)
        }
    }

    /// A store-true toggle
    pub fn switch<I, S>(name: impl Into<String>, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::flagged(name, flags)
            .kind(FieldKind::Switch)
            .default_value(false)
    }

    pub fn kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Make the field optional without a concrete default
    pub fn optional(self) -> Self {
        self.default_value(Value::Null)
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn choices<I, V>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    pub fn multiple(mut self) -> Self {
        self.multiplicity = Multiplicity::List;
        self
    }

    pub fn dest(mut self, dest: impl Into<String>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar = Some(metavar.into());
        self
    }

    pub fn is_positional(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn is_list(&self) -> bool {
        self.multiplicity == Multiplicity::List
    }

    /// No default means required, except for variadic positionals and switches
    pub fn is_required(&self) -> bool {
        if self.default.is_some() || self.kind == FieldKind::Switch {
            return false;
        }
        !(self.is_positional() && self.is_list())
    }

    /// Key this field is bound under in mapping input
    pub fn bound_name(&self) -> &str {
        self.dest.as_deref().unwrap_or(&self.name)
    }

    /// Value used when an optional field is absent
    pub fn fallback(&self) -> Value {
        match &self.default {
            Some(value) => value.clone(),
            None if self.kind == FieldKind::Switch => Value::Bool(false),
            None => Value::Array(Vec::new()),
        }
    }

    /// Name shown in usage text and value placeholders
    pub fn display_name(&self) -> &str {
        self.metavar.as_deref().unwrap_or(&self.name)
    }
}
