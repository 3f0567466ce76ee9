//! Plugin system for modpack
//!
//! A plugin gets the bundler once, before any build, and registers hook
//! callbacks or transforms on it. Callbacks are handed the compilation they
//! run for; plugins keep whatever state they need inside the callbacks.

mod compress;
mod define;
mod externals;
mod logger;

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use crate::bundler::Bundler;
use crate::config::PluginConfig;
use crate::transform::Transform;

pub use compress::CompressAssetsPlugin;
pub use define::DefinePlugin;
pub use externals::{ExternalLibrary, ExternalsPlugin};
pub use logger::LoggerPlugin;

/// Plugin trait - implement this to create a modpack plugin
pub trait Plugin: Send + Sync {
    /// Plugin name for logging and debugging
    fn name(&self) -> &str;

    /// Register hooks and transforms on the bundler
    fn apply(&self, bundler: &mut Bundler);
}

/// Registers a named transform that rules can then `use`
pub struct TransformPlugin {
    name: String,
    transform: Arc<dyn Transform>,
}

impl TransformPlugin {
    pub fn new(name: impl Into<String>, transform: impl Transform + 'static) -> Self {
        Self {
            name: name.into(),
            transform: Arc::new(transform),
        }
    }
}

impl Plugin for TransformPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, bundler: &mut Bundler) {
        bundler
            .transforms_mut()
            .register_shared(self.name.clone(), self.transform.clone());
    }
}

/// Instantiate the built-in plugins named in the configuration, in order
pub fn from_config(configs: &[PluginConfig]) -> Result<Vec<Box<dyn Plugin>>> {
    configs
        .iter()
        .map(|config| -> Result<Box<dyn Plugin>> {
            let plugin: Box<dyn Plugin> = match config.name.as_str() {
                "logger" => Box::new(LoggerPlugin),
                "define" => Box::new(DefinePlugin::new(options(config)?)?),
                "compress-assets" => Box::new(options::<CompressAssetsPlugin>(config)?),
                "externals" => Box::new(ExternalsPlugin::new(options(config)?)),
                other => anyhow::bail!("Unknown plugin: {}", other),
            };
            Ok(plugin)
        })
        .collect()
}

fn options<T: DeserializeOwned>(config: &PluginConfig) -> Result<T> {
    let table = config.options.clone().unwrap_or_default();
    toml::Value::Table(table)
        .try_into()
        .with_context(|| format!("Invalid options for plugin '{}'", config.name))
}
