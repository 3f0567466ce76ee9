//! Bundles every emitted asset into a zip archive

use std::io::{Cursor, Write};

use anyhow::{Context, Result};
use serde::Deserialize;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::Plugin;
use crate::bundler::{Asset, Bundler};

const NAME: &str = "CompressAssetsPlugin";

#[derive(Debug, Clone, Deserialize)]
pub struct CompressAssetsPlugin {
    /// Name of the archive asset, e.g. `bundle.zip`
    output: String,
}

impl CompressAssetsPlugin {
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
        }
    }
}

impl Plugin for CompressAssetsPlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn apply(&self, bundler: &mut Bundler) {
        let output = self.output.clone();

        bundler.hooks_mut().emit.tap_async(NAME, move |compilation| {
            let output = output.clone();
            Box::pin(async move {
                let files: Vec<(String, Vec<u8>)> = compilation
                    .assets
                    .iter()
                    .map(|(name, asset)| (name.clone(), asset.as_bytes().to_vec()))
                    .collect();

                let archive = tokio::task::spawn_blocking(move || zip_files(&files))
                    .await
                    .context("Compression task failed")??;

                compilation.emit_asset(output, Asset::Binary(archive));
                Ok::<(), anyhow::Error>(())
            })
        });
    }
}

fn zip_files(files: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for (name, bytes) in files {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file(name.as_str(), options)?;
        zip.write_all(bytes)?;
    }

    Ok(zip.finish()?.into_inner())
}
