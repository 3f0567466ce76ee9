//! Command-line interface for modpack
//!
//! Provides the main CLI structure using clap with subcommands for:
//! - `build`: Bundle every entry point into the output directory

mod build;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

pub use build::BuildCommand;

/// modpack - bundles CommonJS-style modules into one script per entry
#[derive(Parser, Debug)]
#[command(name = "modpack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to modpack.toml config file
    #[arg(short, long, global = true, default_value = "modpack.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bundle the project
    Build(BuildCommand),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Build(cmd) => {
                if !cmd.json {
                    print_banner();
                }
                cmd.execute(&self.config).await
            }
        }
    }
}

/// Print the modpack banner
fn print_banner() {
    eprintln!(
        "\n{} {}\n",
        "modpack".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
