//! Leaves selected libraries out of the bundle
//!
//! Claimed requests are served from a global variable at runtime. The libraries
//! that were actually required are listed in an `externals.json` asset so a
//! page template can load them before the bundle.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::Plugin;
use crate::bundler::{Asset, Bundler};
use crate::hooks::ExternalModule;

const NAME: &str = "ExternalsPlugin";

/// Name of the asset listing the used libraries
pub const EXTERNALS_MANIFEST: &str = "externals.json";

/// How one library is provided at runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLibrary {
    /// Global variable holding the library
    pub variable: String,

    /// Script URL the library is loaded from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
}

#[derive(Debug, Serialize)]
struct UsedLibrary<'a> {
    request: &'a str,
    #[serde(flatten)]
    library: &'a ExternalLibrary,
}

pub struct ExternalsPlugin {
    libraries: Arc<BTreeMap<String, ExternalLibrary>>,
    used: Arc<Mutex<BTreeSet<String>>>,
}

impl ExternalsPlugin {
    pub fn new(libraries: BTreeMap<String, ExternalLibrary>) -> Self {
        Self {
            libraries: Arc::new(libraries),
            used: Arc::new(Mutex::new(BTreeSet::new())),
        }
    }
}

impl Plugin for ExternalsPlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn apply(&self, bundler: &mut Bundler) {
        let hooks = bundler.hooks_mut();

        let used = self.used.clone();
        hooks.run.tap(NAME, move |_| {
            used.lock().clear();
            Ok(())
        });

        let libraries = self.libraries.clone();
        hooks.factorize.tap(NAME, move |data| {
            libraries.get(&data.request).map(|library| ExternalModule {
                variable: library.variable.clone(),
            })
        });

        let libraries = self.libraries.clone();
        let used = self.used.clone();
        hooks.require_call.tap(NAME, move |call| {
            if libraries.contains_key(&call.request) {
                used.lock().insert(call.request.clone());
            }
            Ok(())
        });

        let libraries = self.libraries.clone();
        let used = self.used.clone();
        hooks.emit.tap(NAME, move |compilation| {
            let used = used.lock();
            if used.is_empty() {
                return Ok(());
            }

            let manifest: Vec<UsedLibrary<'_>> = used
                .iter()
                .filter_map(|request| {
                    libraries.get(request).map(|library| UsedLibrary {
                        request: request.as_str(),
                        library,
                    })
                })
                .collect();

            let json = serde_json::to_string_pretty(&manifest)?;
            compilation.emit_asset(EXTERNALS_MANIFEST, Asset::Text(json));
            Ok(())
        });
    }
}
