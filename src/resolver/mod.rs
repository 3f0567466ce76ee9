//! Module resolution
//!
//! Handles resolving import specifiers to actual file paths and turning those
//! paths into canonical module ids.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{BuildError, BuildResult};
use crate::utils::{normalize_path, to_unix_path};

/// Prefix every canonical module id starts with
pub const MODULE_ID_PREFIX: &str = "./";

/// Module resolver
#[derive(Debug, Clone)]
pub struct Resolver {
    /// Directory module ids are relative to
    root: PathBuf,

    /// Suffixes tried after the exact path, in order
    extensions: Vec<String>,
}

impl Resolver {
    /// Create a new resolver
    pub fn new(root: impl Into<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            root: normalize_path(&root.into()),
            extensions,
        }
    }

    /// The root module ids are computed against
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a specifier requested from a module living in `context`.
    ///
    /// The exact path wins; otherwise each configured extension is appended in
    /// order and the first existing file is returned.
    pub fn resolve(&self, specifier: &str, context: &Path) -> BuildResult<PathBuf> {
        debug!("Resolving '{}' from '{}'", specifier, context.display());

        let candidate = normalize_path(&context.join(specifier));

        if candidate.is_file() {
            return Ok(candidate);
        }

        for ext in &self.extensions {
            let mut with_ext = candidate.clone().into_os_string();
            with_ext.push(ext);
            let with_ext = PathBuf::from(with_ext);

            if with_ext.is_file() {
                debug!("Resolved to: {}", with_ext.display());
                return Ok(with_ext);
            }
        }

        Err(BuildError::ModuleNotFound {
            specifier: specifier.to_string(),
            context: context.to_path_buf(),
        })
    }

    /// Canonical id of a module: its root-relative path behind `./`
    pub fn module_id(&self, path: &Path) -> String {
        let path = normalize_path(path);
        let relative = pathdiff::diff_paths(&path, &self.root).unwrap_or(path);
        format!("{}{}", MODULE_ID_PREFIX, to_unix_path(&relative))
    }
}
