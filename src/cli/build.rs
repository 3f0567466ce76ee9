//! Build command implementation

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tracing::info;

use crate::bundler::Bundler;
use crate::config::Config;
use crate::utils::{format_duration, format_size};

/// Bundle the project
#[derive(Args, Debug, Default)]
pub struct BuildCommand {
    /// Output directory, relative to the config file
    #[arg(short, long)]
    pub outdir: Option<PathBuf>,

    /// Output filename pattern, e.g. "[name].[contenthash].js"
    #[arg(short, long)]
    pub filename: Option<String>,

    /// Directory entries are resolved against
    #[arg(long)]
    pub context: Option<String>,

    /// Print build stats as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

impl BuildCommand {
    pub async fn execute(&self, config_path: &str) -> Result<()> {
        info!("Loading configuration from {}", config_path);
        let mut config = Config::load(config_path)?;
        self.apply_overrides(&mut config)?;

        if !self.json {
            eprintln!("{} Building project...", "→".blue());
        }

        let bundler = Bundler::new(config)?;
        let stats = bundler.build().await?;

        if self.json {
            let json = serde_json::to_string_pretty(&stats.to_json())
                .context("Failed to serialize build stats")?;
            println!("{}", json);
            return Ok(());
        }

        eprintln!(
            "\n{} Built {} chunk(s) from {} module(s) in {}\n",
            "✓".green().bold(),
            stats.chunks().len(),
            stats.modules().len(),
            format_duration(stats.elapsed())
        );

        for file in stats.files() {
            let size = stats.assets().get(file).map(|a| a.size()).unwrap_or(0);
            eprintln!(
                "  {} {} {}",
                "•".dimmed(),
                file.cyan(),
                format_size(size).dimmed()
            );
        }

        eprintln!();

        Ok(())
    }

    /// Replace config values with the ones given on the command line
    fn apply_overrides(&self, config: &mut Config) -> Result<()> {
        if let Some(outdir) = &self.outdir {
            config.output.path = outdir.to_string_lossy().into_owned();
        }
        if let Some(filename) = &self.filename {
            config.output.filename = filename.clone();
        }
        if let Some(context) = &self.context {
            config.context = Some(context.clone());
        }

        config.validate()
    }
}
