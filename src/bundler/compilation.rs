//! Per-build state and the stats snapshot handed back to callers

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use super::{Chunk, Module, ModuleGraph};
use crate::config::Config;

/// Rendered output keyed by filename
pub type Assets = BTreeMap<String, Asset>;

/// One output file's content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Asset {
    Text(String),
    Binary(Vec<u8>),
}

impl Asset {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Asset::Text(text) => text.as_bytes(),
            Asset::Binary(bytes) => bytes,
        }
    }

    /// Content as text, lossily decoded for binary assets
    pub fn source(&self) -> Cow<'_, str> {
        match self {
            Asset::Text(text) => Cow::Borrowed(text),
            Asset::Binary(bytes) => String::from_utf8_lossy(bytes),
        }
    }

    pub fn size(&self) -> usize {
        self.as_bytes().len()
    }
}

/// A configured entry and the module it resolved to
#[derive(Debug, Clone, Serialize)]
pub struct EntryPoint {
    pub name: String,
    pub path: PathBuf,
    pub module: String,
}

/// Everything one build produces.
///
/// A fresh value is created for every build; hooks receive it explicitly and
/// only the `emit` hook gets mutable access.
#[derive(Debug)]
pub struct Compilation {
    /// Directory module ids are relative to
    pub root: PathBuf,

    pub config: Arc<Config>,
    pub entries: Vec<EntryPoint>,
    pub graph: ModuleGraph,
    pub chunks: Vec<Chunk>,
    pub assets: Assets,

    /// Filenames written to the output directory
    pub files: Vec<String>,
}

impl Compilation {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            root: config.context_dir(),
            config,
            entries: Vec::new(),
            graph: ModuleGraph::new(),
            chunks: Vec::new(),
            assets: Assets::new(),
            files: Vec::new(),
        }
    }

    /// Add or replace an output asset
    pub fn emit_asset(&mut self, name: impl Into<String>, asset: Asset) {
        let name = name.into();
        debug!("Emitting asset {} ({} bytes)", name, asset.size());
        self.assets.insert(name, asset);
    }
}

/// The result of a finished build
#[derive(Debug)]
pub struct Stats {
    compilation: Compilation,
    elapsed: Duration,
}

impl Stats {
    pub(crate) fn new(compilation: Compilation, elapsed: Duration) -> Self {
        Self {
            compilation,
            elapsed,
        }
    }

    pub fn entries(&self) -> &[EntryPoint] {
        &self.compilation.entries
    }

    pub fn modules(&self) -> &ModuleGraph {
        &self.compilation.graph
    }

    pub fn module(&self, id: &str) -> Option<&Module> {
        self.compilation.graph.get(id)
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.compilation.chunks
    }

    pub fn chunk(&self, name: &str) -> Option<&Chunk> {
        self.compilation.chunks.iter().find(|c| c.name == name)
    }

    pub fn assets(&self) -> &Assets {
        &self.compilation.assets
    }

    pub fn files(&self) -> &[String] {
        &self.compilation.files
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn compilation(&self) -> &Compilation {
        &self.compilation
    }

    /// Serializable snapshot of the build
    pub fn to_json(&self) -> StatsJson<'_> {
        StatsJson {
            entries: self.entries(),
            modules: self.compilation.graph.iter().collect(),
            chunks: self.chunks(),
            assets: self
                .assets()
                .iter()
                .map(|(name, asset)| AssetInfo {
                    name,
                    size: asset.size(),
                })
                .collect(),
            files: self.files(),
            elapsed_ms: self.elapsed.as_millis(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AssetInfo<'a> {
    pub name: &'a str,
    pub size: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsJson<'a> {
    pub entries: &'a [EntryPoint],
    pub modules: Vec<&'a Module>,
    pub chunks: &'a [Chunk],
    pub assets: Vec<AssetInfo<'a>>,
    pub files: &'a [String],
    pub elapsed_ms: u128,
}
