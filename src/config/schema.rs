//! Configuration schema definitions

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Entry configuration: a single path or a map of named entries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryConfig {
    /// A single entry, bundled under the name `main`
    Single(String),

    /// Named entries
    Named(BTreeMap<String, String>),
}

impl Default for EntryConfig {
    fn default() -> Self {
        EntryConfig::Named(BTreeMap::new())
    }
}

impl EntryConfig {
    /// Normalize into `name -> path` pairs
    pub fn to_map(&self) -> BTreeMap<String, String> {
        match self {
            EntryConfig::Single(path) => {
                let mut map = BTreeMap::new();
                map.insert(DEFAULT_ENTRY_NAME.to_string(), path.clone());
                map
            }
            EntryConfig::Named(map) => map.clone(),
        }
    }
}

/// Name given to the entry when `entry` is a plain string
pub const DEFAULT_ENTRY_NAME: &str = "main";

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory
    #[serde(default = "default_output_path")]
    pub path: String,

    /// Filename pattern, `[name]` is replaced by the chunk name
    #[serde(default = "default_filename")]
    pub filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            filename: default_filename(),
        }
    }
}

fn default_output_path() -> String {
    "dist".to_string()
}

fn default_filename() -> String {
    "[name].js".to_string()
}

/// Resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveConfig {
    /// Suffixes tried, in order, when a specifier does not name an existing file
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec![".js".to_string(), ".json".to_string()]
}

/// Module processing configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Transform rules, matched against module paths in order
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

/// A single transform rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Regex matched against the module's absolute path
    pub test: String,

    /// Transform names; the last one runs first
    #[serde(rename = "use", default)]
    pub transforms: Vec<String>,
}

impl RuleConfig {
    pub fn new(test: impl Into<String>, transforms: &[&str]) -> Self {
        Self {
            test: test.into(),
            transforms: transforms.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Plugin configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Plugin name/identifier
    pub name: String,

    /// Plugin-specific options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<toml::Table>,
}
