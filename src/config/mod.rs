//! Configuration handling for modpack
//!
//! Parses and manages modpack.toml configuration files.

mod schema;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub use schema::*;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Base directory for entries, relative to the config file
    #[serde(default)]
    pub context: Option<String>,

    /// Entry points for bundling
    #[serde(default)]
    pub entry: EntryConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Resolver settings
    #[serde(default)]
    pub resolve: ResolveConfig,

    /// Transform rules
    #[serde(default)]
    pub module: ModuleConfig,

    /// Plugin configuration
    #[serde(default)]
    pub plugins: Vec<PluginConfig>,

    /// Root directory (computed from config file location)
    #[serde(skip)]
    pub root: PathBuf,
}

impl Config {
    /// Load configuration from a file path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let canonical_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        let content = fs::read_to_string(&canonical_path)
            .with_context(|| format!("Failed to read config file: {}", canonical_path.display()))?;

        let mut config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse modpack.toml")?;

        // Set root directory to the directory containing the config file
        config.root = canonical_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        config.validate()?;

        Ok(config)
    }

    /// Create a configuration rooted at `root` with a single `main` entry
    pub fn with_entry(root: impl Into<PathBuf>, entry: impl Into<String>) -> Self {
        Self {
            entry: EntryConfig::Single(entry.into()),
            root: root.into(),
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let entries = self.entry.to_map();

        if entries.is_empty() {
            anyhow::bail!("At least one entry must be specified in modpack.toml");
        }

        if entries.len() > 1 && !self.output.filename.contains("[name]") {
            anyhow::bail!(
                "output.filename '{}' must contain [name] when there are {} entries",
                self.output.filename,
                entries.len()
            );
        }

        for rule in &self.module.rules {
            regex::Regex::new(&rule.test)
                .with_context(|| format!("Invalid rule test pattern: {}", rule.test))?;
        }

        Ok(())
    }

    /// The context directory every relative entry resolves against
    pub fn context_dir(&self) -> PathBuf {
        match &self.context {
            Some(context) => self.root.join(context),
            None => self.root.clone(),
        }
    }

    /// Get the absolute output directory path
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.output.path)
    }

    /// Get all entries as absolute paths, ordered by name
    pub fn all_entries(&self) -> BTreeMap<String, PathBuf> {
        let context = self.context_dir();
        self.entry
            .to_map()
            .into_iter()
            .map(|(name, path)| (name, context.join(path)))
            .collect()
    }
}
