//! Build errors
//!
//! Every failure the core can surface. None of them are retried; the first one
//! aborts the build and nothing is persisted.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for the bundler core
pub type BuildResult<T> = std::result::Result<T, BuildError>;

/// Errors produced while building a bundle
#[derive(Debug, Error)]
pub enum BuildError {
    /// An import specifier did not resolve to a file for any configured extension
    #[error("Module not found: Can't resolve '{specifier}' in '{}'", context.display())]
    ModuleNotFound { specifier: String, context: PathBuf },

    /// A rule references a transform that is not registered
    #[error("Transform '{name}' could not be loaded (used by {})", module.display())]
    TransformLoad { name: String, module: PathBuf },

    /// A transform failed on a module's source
    #[error("Transform '{name}' failed on {}", module.display())]
    Transform {
        name: String,
        module: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// An import call whose argument is not a single string literal
    #[error("{}:{line}:{column}: require() needs a single static string argument ({reason})", module.display())]
    StaticImportRequired {
        module: PathBuf,
        line: usize,
        column: usize,
        reason: &'static str,
    },

    /// The module source could not be parsed
    #[error("Failed to parse {}: {message}", module.display())]
    Parse { module: PathBuf, message: String },

    /// A rule's `test` pattern is not a valid regex
    #[error("Invalid rule pattern '{pattern}'")]
    InvalidRule {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A synchronous hook callback returned an error
    #[error("Plugin '{plugin}' failed in hook '{hook}'")]
    HookFailure {
        hook: &'static str,
        plugin: String,
        #[source]
        source: anyhow::Error,
    },

    /// An asynchronous hook callback rejected
    #[error("Plugin '{plugin}' failed in async hook '{hook}'")]
    AsyncHookFailure {
        hook: &'static str,
        plugin: String,
        #[source]
        source: anyhow::Error,
    },

    /// An asset name that would be written outside the output directory
    #[error("Asset name '{name}' must be a relative path inside the output directory")]
    InvalidAssetName { name: String },

    /// Reading a module or writing an asset failed
    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
