//! Substitutes identifiers in emitted assets

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use regex::{NoExpand, Regex};

use super::Plugin;
use crate::bundler::{Asset, Bundler};

const NAME: &str = "DefinePlugin";

/// Replaces every occurrence of each key with its value in text assets
#[derive(Debug, Clone)]
pub struct DefinePlugin {
    definitions: Arc<Vec<(Regex, String)>>,
}

impl DefinePlugin {
    pub fn new(definitions: BTreeMap<String, String>) -> Result<Self> {
        let definitions = definitions
            .into_iter()
            .map(|(key, value)| {
                let pattern = Regex::new(&regex::escape(&key))
                    .with_context(|| format!("Invalid definition key: {}", key))?;
                Ok((pattern, value))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            definitions: Arc::new(definitions),
        })
    }

    fn replace(definitions: &[(Regex, String)], text: &str) -> String {
        definitions
            .iter()
            .fold(text.to_string(), |acc, (pattern, value)| {
                pattern.replace_all(&acc, NoExpand(value)).into_owned()
            })
    }
}

impl Plugin for DefinePlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn apply(&self, bundler: &mut Bundler) {
        let definitions = self.definitions.clone();

        bundler.hooks_mut().emit.tap(NAME, move |compilation| {
            for asset in compilation.assets.values_mut() {
                if let Asset::Text(text) = asset {
                    *text = Self::replace(&definitions, text);
                }
            }
            Ok(())
        });
    }
}
