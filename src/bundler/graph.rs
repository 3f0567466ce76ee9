//! Module graph data structures

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;

use serde::Serialize;

/// Where a module's code comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ModuleKind {
    /// A source file read from disk
    Normal { path: PathBuf },

    /// A value provided by the environment through a global variable
    External { variable: String },
}

/// A module in the dependency graph
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    /// Canonical, root-relative id
    pub id: String,

    pub kind: ModuleKind,

    /// Transformed source with import calls rewritten to the runtime loader
    pub source: String,

    /// Ids of the modules this one loads, in first-use order
    pub dependencies: Vec<String>,

    /// Entries whose chunk must contain this module
    pub owning_entries: Vec<String>,
}

impl Module {
    pub fn new(
        id: String,
        kind: ModuleKind,
        source: String,
        dependencies: Vec<String>,
        entry: &str,
    ) -> Self {
        Self {
            id,
            kind,
            source,
            dependencies,
            owning_entries: vec![entry.to_string()],
        }
    }

    pub fn is_owned_by(&self, entry: &str) -> bool {
        self.owning_entries.iter().any(|e| e == entry)
    }

    pub fn is_external(&self) -> bool {
        matches!(self.kind, ModuleKind::External { .. })
    }
}

/// The deduplicated module graph of one build
#[derive(Debug, Default)]
pub struct ModuleGraph {
    /// All modules in discovery order
    modules: Vec<Module>,

    /// Map from canonical id to position in `modules`
    index: HashMap<String, usize>,
}

impl ModuleGraph {
    /// Create a new empty module graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module; returns `false` and leaves the graph untouched if the id is taken
    pub fn insert(&mut self, module: Module) -> bool {
        if self.index.contains_key(&module.id) {
            return false;
        }

        self.index.insert(module.id.clone(), self.modules.len());
        self.modules.push(module);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Module> {
        self.index.get(id).map(|&i| &self.modules[i])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Module> {
        match self.index.get(id) {
            Some(&i) => Some(&mut self.modules[i]),
            None => None,
        }
    }

    /// Record that `entry` needs module `id`, and therefore everything it loads.
    ///
    /// Walking stops at modules that already belong to `entry`, so cycles end.
    pub fn add_owner(&mut self, id: &str, entry: &str) {
        let mut pending = vec![id.to_string()];

        while let Some(current) = pending.pop() {
            let Some(module) = self.get_mut(&current) else {
                continue;
            };
            if module.is_owned_by(entry) {
                continue;
            }

            module.owning_entries.push(entry.to_string());
            pending.extend(module.dependencies.iter().cloned());
        }
    }

    /// Modules whose owning entries include `entry`, in discovery order
    pub fn owned_by<'g>(&'g self, entry: &'g str) -> impl Iterator<Item = &'g Module> + 'g {
        self.modules.iter().filter(move |m| m.is_owned_by(entry))
    }

    /// Ids of all modules reachable from `start` (BFS, `start` first)
    pub fn reachable(&self, start: &str) -> Vec<String> {
        let mut visited = HashSet::new();
        let mut result = Vec::new();
        let mut queue = VecDeque::new();

        queue.push_back(start.to_string());
        visited.insert(start.to_string());

        while let Some(id) = queue.pop_front() {
            if let Some(module) = self.get(&id) {
                for dep in &module.dependencies {
                    if visited.insert(dep.clone()) {
                        queue.push_back(dep.clone());
                    }
                }
            }
            result.push(id);
        }

        result
    }

    pub fn iter(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter()
    }

    /// Total number of modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if graph is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
