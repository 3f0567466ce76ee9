//! modpack library
//!
//! Bundles a graph of CommonJS-style modules into one self-contained script
//! per entry point.

pub mod bundler;
pub mod cli;
pub mod config;
pub mod error;
pub mod hooks;
pub mod plugins;
pub mod resolver;
pub mod transform;
pub mod utils;

pub use bundler::{Bundler, Stats};
pub use cli::Cli;
pub use config::Config;
pub use error::{BuildError, BuildResult};
