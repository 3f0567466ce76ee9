//! Core bundler implementation
//!
//! Builds the module graph from every entry, groups it into one chunk per
//! entry, renders each chunk with the runtime template and writes the assets,
//! firing lifecycle hooks along the way.

mod chunk;
mod compilation;
mod extract;
mod graph;
mod output;
mod template;

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::{BuildError, BuildResult};
use crate::hooks::{ExternalModule, Hooks};
use crate::plugins::Plugin;
use crate::resolver::Resolver;
use crate::transform::{TransformPipeline, TransformRegistry};

pub use chunk::Chunk;
pub use compilation::{Asset, AssetInfo, Assets, Compilation, EntryPoint, Stats, StatsJson};
pub use extract::{
    external_module_id, extract_dependencies, Dependency, DependencyTarget, Extracted,
    REQUIRE_IDENT,
};
pub use graph::{Module, ModuleGraph, ModuleKind};
pub use template::{js_string, render, LOADER_IDENT};

/// The main bundler
pub struct Bundler {
    /// Project configuration
    config: Arc<Config>,

    /// Lifecycle hooks plugins tap into
    hooks: Hooks,

    /// Transforms available to rules
    transforms: TransformRegistry,
}

impl Bundler {
    /// Create a bundler with the plugins listed in the configuration
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let plugins = crate::plugins::from_config(&config.plugins)?;
        Ok(Self::with_plugins(config, plugins))
    }

    /// Create a bundler and apply the given plugins in order
    pub fn with_plugins(config: Config, plugins: Vec<Box<dyn Plugin>>) -> Self {
        let mut bundler = Self {
            config: Arc::new(config),
            hooks: Hooks::new(),
            transforms: TransformRegistry::with_builtins(),
        };

        for plugin in &plugins {
            bundler.apply(plugin.as_ref());
        }

        bundler
    }

    /// Let a plugin register its hooks and transforms
    pub fn apply(&mut self, plugin: &dyn Plugin) {
        debug!("Applying plugin {}", plugin.name());
        plugin.apply(self);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut Hooks {
        &mut self.hooks
    }

    pub fn transforms_mut(&mut self) -> &mut TransformRegistry {
        &mut self.transforms
    }

    /// Build the project
    pub async fn build(&self) -> BuildResult<Stats> {
        let start = Instant::now();
        let mut compilation = Compilation::new(self.config.clone());

        self.hooks.run.call(&compilation)?;

        // 1. Build the module graph and one chunk per entry
        info!("Building module graph...");
        let resolver = Resolver::new(&compilation.root, self.config.resolve.extensions.clone());
        let pipeline = TransformPipeline::new(&self.config.module.rules)?;

        for (name, path) in self.config.all_entries() {
            debug!("Processing entry: {} -> {}", name, path.display());

            let entry_path = resolver.resolve(&path.to_string_lossy(), &compilation.root)?;
            let entry_module = GraphBuilder {
                graph: &mut compilation.graph,
                resolver: &resolver,
                pipeline: &pipeline,
                transforms: &self.transforms,
                hooks: &self.hooks,
            }
            .build_module(&name, &entry_path)?;

            let chunk = Chunk::assemble(&name, &entry_module, &compilation.graph);
            debug!("Chunk {} holds {} modules", chunk.name, chunk.len());

            compilation.entries.push(EntryPoint {
                name,
                path: entry_path,
                module: entry_module,
            });
            compilation.chunks.push(chunk);
        }

        // 2. Render chunks into assets
        info!("Rendering {} chunks...", compilation.chunks.len());
        let rendered: Vec<(String, String)> = compilation
            .chunks
            .iter()
            .map(|chunk| {
                let code = render(chunk, &compilation.graph);
                (chunk.filename(&self.config.output.filename, &code), code)
            })
            .collect();
        for (filename, code) in rendered {
            compilation.emit_asset(filename, Asset::Text(code));
        }

        // 3. Let plugins rewrite assets, then persist them
        self.hooks.emit.call(&mut compilation).await?;

        info!("Writing {} assets...", compilation.assets.len());
        compilation.files = output::write_assets(&compilation.assets, &self.config.output_dir())?;

        let stats = Stats::new(compilation, start.elapsed());
        self.hooks.done.call(&stats)?;

        debug!("Build completed in {:?}", stats.elapsed());

        Ok(stats)
    }
}

/// Recursive, depth-first module graph construction for one entry
struct GraphBuilder<'b> {
    graph: &'b mut ModuleGraph,
    resolver: &'b Resolver,
    pipeline: &'b TransformPipeline,
    transforms: &'b TransformRegistry,
    hooks: &'b Hooks,
}

impl GraphBuilder<'_> {
    /// Build the module at `path` and everything it requires, returning its id.
    ///
    /// A module already in the graph is only tagged with `entry`; its source is
    /// never read or transformed twice. New modules are inserted before their
    /// dependencies are visited, which is what ends recursion on import cycles.
    fn build_module(&mut self, entry: &str, path: &Path) -> BuildResult<String> {
        let id = self.resolver.module_id(path);

        if self.graph.contains(&id) {
            debug!(module = %id, entry, "Module already built");
            self.graph.add_owner(&id, entry);
            return Ok(id);
        }

        debug!(module = %id, "Building module");

        let raw = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        let transformed = self.pipeline.apply(self.transforms, path, raw)?;
        let extracted = extract_dependencies(&transformed, path, self.resolver, self.hooks)?;

        self.graph.insert(Module::new(
            id.clone(),
            ModuleKind::Normal {
                path: path.to_path_buf(),
            },
            extracted.source,
            extracted.dependencies.iter().map(|d| d.id.clone()).collect(),
            entry,
        ));

        for dependency in extracted.dependencies {
            match dependency.target {
                DependencyTarget::File(dep_path) => {
                    self.build_module(entry, &dep_path)?;
                }
                DependencyTarget::External(external) => {
                    self.add_external(entry, dependency.id, external);
                }
            }
        }

        Ok(id)
    }

    fn add_external(&mut self, entry: &str, id: String, external: ExternalModule) {
        if self.graph.contains(&id) {
            self.graph.add_owner(&id, entry);
            return;
        }

        debug!(module = %id, variable = %external.variable, "Adding external module");
        let source = template::external_source(&external.variable);
        self.graph.insert(Module::new(
            id,
            ModuleKind::External {
                variable: external.variable,
            },
            source,
            Vec::new(),
            entry,
        ));
    }
}
