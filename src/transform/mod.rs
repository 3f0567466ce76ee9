//! Code transformation
//!
//! Rules select transforms by matching the module path; matched transforms are
//! applied right to left, so the last one listed sees the raw source first.

mod builtin;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use regex::Regex;
use tracing::debug;

use crate::config::RuleConfig;
use crate::error::{BuildError, BuildResult};
use crate::utils::to_unix_path;

pub use builtin::{CssTransform, JsonTransform, RawTransform};

/// A text-to-text source transform
pub trait Transform: Send + Sync {
    fn transform(&self, source: &str) -> Result<String>;
}

impl<F> Transform for F
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    fn transform(&self, source: &str) -> Result<String> {
        self(source)
    }
}

/// Transforms that rules can refer to by name
#[derive(Clone, Default)]
pub struct TransformRegistry {
    transforms: HashMap<String, Arc<dyn Transform>>,
}

impl TransformRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in `json`, `css` and `raw` transforms
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("json", JsonTransform);
        registry.register("css", CssTransform);
        registry.register("raw", RawTransform);
        registry
    }

    /// Register a transform under `name`, replacing any previous one
    pub fn register(&mut self, name: impl Into<String>, transform: impl Transform + 'static) {
        self.register_shared(name, Arc::new(transform));
    }

    pub fn register_shared(&mut self, name: impl Into<String>, transform: Arc<dyn Transform>) {
        self.transforms.insert(name.into(), transform);
    }

    /// Look up a transform by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Transform>> {
        self.transforms.get(name).cloned()
    }
}

impl fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.transforms.keys().collect();
        names.sort();
        f.debug_struct("TransformRegistry").field("transforms", &names).finish()
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    test: Regex,
    transforms: Vec<String>,
}

/// Ordered transform rules compiled from configuration
#[derive(Debug, Clone, Default)]
pub struct TransformPipeline {
    rules: Vec<CompiledRule>,
}

impl TransformPipeline {
    /// Compile the configured rules
    pub fn new(rules: &[RuleConfig]) -> BuildResult<Self> {
        let rules = rules
            .iter()
            .map(|rule| {
                let test = Regex::new(&rule.test).map_err(|source| BuildError::InvalidRule {
                    pattern: rule.test.clone(),
                    source,
                })?;
                Ok(CompiledRule {
                    test,
                    transforms: rule.transforms.clone(),
                })
            })
            .collect::<BuildResult<Vec<_>>>()?;

        Ok(Self { rules })
    }

    /// Names of every transform that applies to `path`, in rule order
    pub fn matching(&self, path: &Path) -> Vec<&str> {
        let path = to_unix_path(path);
        self.rules
            .iter()
            .filter(|rule| rule.test.is_match(&path))
            .flat_map(|rule| rule.transforms.iter().map(String::as_str))
            .collect()
    }

    /// Run the matching transforms over `source`, last-registered first
    pub fn apply(
        &self,
        registry: &TransformRegistry,
        path: &Path,
        source: String,
    ) -> BuildResult<String> {
        let names = self.matching(path);
        if names.is_empty() {
            return Ok(source);
        }

        debug!("Transforming {} with {:?}", path.display(), names);

        let mut code = source;
        for name in names.into_iter().rev() {
            let transform = registry.get(name).ok_or_else(|| BuildError::TransformLoad {
                name: name.to_string(),
                module: path.to_path_buf(),
            })?;

            code = transform
                .transform(&code)
                .map_err(|source| BuildError::Transform {
                    name: name.to_string(),
                    module: path.to_path_buf(),
                    source,
                })?;
        }

        Ok(code)
    }
}
