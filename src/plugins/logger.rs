//! Reports build start and completion

use tracing::info;

use super::Plugin;
use crate::bundler::Bundler;
use crate::utils::format_duration;

const NAME: &str = "LoggerPlugin";

#[derive(Debug, Clone, Copy, Default)]
pub struct LoggerPlugin;

impl Plugin for LoggerPlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn apply(&self, bundler: &mut Bundler) {
        let hooks = bundler.hooks_mut();

        hooks.run.tap(NAME, |compilation| {
            info!(
                "Build started for {} entries in {}",
                compilation.config.entry.to_map().len(),
                compilation.root.display()
            );
            Ok(())
        });

        hooks.done.tap(NAME, |stats| {
            info!(
                "Build finished: {} modules, {} files in {}",
                stats.modules().len(),
                stats.files().len(),
                format_duration(stats.elapsed())
            );
            Ok(())
        });
    }
}
