use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ConfigError;

/// One generated record, keyed by column name.
///
/// No keys are required; a missing or null value is displayed as a
/// placeholder rather than treated as an error.
pub type Row = serde_json::Map<String, Value>;

/// One named field of the dataset schema.
///
/// `name` is the key looked up in each [`Row`]. Duplicate names are not
/// rejected; they simply address the same value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = if description.trim().is_empty() {
            None
        } else {
            Some(description)
        };
        self
    }

    /// Parses the CLI form `name` or `name:description`.
    pub fn parse(spec: &str) -> Option<Self> {
        let (name, description) = match spec.split_once(':') {
            Some((name, description)) => (name.trim(), description.trim()),
            None => (spec.trim(), ""),
        };
        if name.is_empty() {
            return None;
        }
        Some(Self::new(name).with_description(description))
    }
}

/// Everything needed to request one batch. Built fresh for every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub topic: String,
    pub columns: Vec<Column>,
    /// Rows requested. Passed through to the prompt unvalidated.
    pub row_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl GeneratorConfig {
    pub fn new(topic: impl Into<String>, columns: Vec<Column>, row_count: u32) -> Self {
        Self {
            topic: topic.into(),
            columns,
            row_count,
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        self.context = if context.trim().is_empty() {
            None
        } else {
            Some(context)
        };
        self
    }

    /// Column names in configured order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Rows and citation URLs from a single generation call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub rows: Vec<Row>,
    pub sources: BTreeSet<String>,
}

impl BatchResult {
    pub fn new(rows: Vec<Row>, sources: BTreeSet<String>) -> Self {
        Self { rows, sources }
    }
}

/// A reusable dataset description loaded from a TOML or YAML file.
///
/// ```toml
/// topic = "Largest lakes in Europe"
/// row_count = 10
/// context = "Include area in square kilometres"
///
/// [[columns]]
/// name = "Lake"
///
/// [[columns]]
/// name = "Area"
/// description = "Surface area in km2"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSpec {
    pub topic: String,
    pub columns: Vec<Column>,
    #[serde(default)]
    pub row_count: Option<u32>,
    #[serde(default)]
    pub context: Option<String>,
}

impl DatasetSpec {
    /// Loads a spec, choosing the format by extension (`.yaml`/`.yml` or TOML).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let spec: DatasetSpec = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            _ => toml::from_str(&content)?,
        };

        if spec.columns.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "{} defines no columns",
                path.display()
            )));
        }

        Ok(spec)
    }

    /// Builds a request config, using `default_rows` when no count is given.
    pub fn to_generator_config(&self, default_rows: u32) -> GeneratorConfig {
        let config = GeneratorConfig::new(
            self.topic.clone(),
            self.columns.clone(),
            self.row_count.unwrap_or(default_rows),
        );
        match &self.context {
            Some(context) => config.with_context(context.clone()),
            None => config,
        }
    }
}
