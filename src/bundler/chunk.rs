//! Chunk assembly and output naming

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

use super::ModuleGraph;
use crate::utils::hash_content;

static FILENAME_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(name|contenthash)(?::(\d+))?\]").unwrap());

const DEFAULT_HASH_LENGTH: usize = 8;

/// The modules bundled together for one entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// Chunk name, same as the entry name
    pub name: String,

    /// Id of the module the chunk boots from
    pub entry_module: String,

    /// Ids of every module owned by the entry, in discovery order
    pub modules: Vec<String>,
}

impl Chunk {
    /// Collect every graph module owned by `name`
    pub fn assemble(name: &str, entry_module: &str, graph: &ModuleGraph) -> Self {
        Self {
            name: name.to_string(),
            entry_module: entry_module.to_string(),
            modules: graph.owned_by(name).map(|m| m.id.clone()).collect(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.modules.iter().any(|m| m == id)
    }

    /// Number of modules in chunk
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if chunk is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Output filename: `[name]` becomes the chunk name, `[contenthash]` or
    /// `[contenthash:N]` a hash prefix of the rendered code
    pub fn filename(&self, pattern: &str, code: &str) -> String {
        FILENAME_PLACEHOLDER
            .replace_all(pattern, |caps: &Captures<'_>| match &caps[1] {
                "name" => self.name.clone(),
                _ => {
                    let len = caps
                        .get(2)
                        .and_then(|m| m.as_str().parse().ok())
                        .unwrap_or(DEFAULT_HASH_LENGTH);
                    let hash = hash_content(code.as_bytes());
                    hash[..len.min(hash.len())].to_string()
                }
            })
            .into_owned()
    }
}
