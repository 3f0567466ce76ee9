//! Lifecycle hooks
//!
//! Plugins tap named extension points; the compiler calls them at fixed points
//! of a build. Synchronous hooks run their taps in registration order and
//! continue immediately. [`AsyncSeriesHook`] awaits each tap to completion
//! before the next one starts, and the compiler awaits the whole hook before
//! moving on.

use std::fmt;
use std::path::PathBuf;

use futures_util::future::BoxFuture;
use tracing::debug;

use crate::bundler::{Compilation, Stats};
use crate::error::{BuildError, BuildResult};

type SyncFn<T> = Box<dyn Fn(&T) -> anyhow::Result<()> + Send + Sync>;
type BailFn<A, R> = Box<dyn Fn(&A) -> Option<R> + Send + Sync>;
type AsyncFn<T> = Box<dyn for<'c> Fn(&'c mut T) -> BoxFuture<'c, anyhow::Result<()>> + Send + Sync>;

struct Tap<F> {
    name: String,
    callback: F,
}

/// A hook whose taps observe a value and run one after another
pub struct SyncHook<T> {
    name: &'static str,
    taps: Vec<Tap<SyncFn<T>>>,
}

impl<T> SyncHook<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            taps: Vec::new(),
        }
    }

    /// Register a callback under a plugin name
    pub fn tap<F>(&mut self, name: impl Into<String>, callback: F)
    where
        F: Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.taps.push(Tap {
            name: name.into(),
            callback: Box::new(callback),
        });
    }

    /// Call every tap in registration order; the first error stops the hook
    pub fn call(&self, arg: &T) -> BuildResult<()> {
        for tap in &self.taps {
            debug!(hook = self.name, plugin = %tap.name, "calling hook");
            (tap.callback)(arg).map_err(|source| BuildError::HookFailure {
                hook: self.name,
                plugin: tap.name.clone(),
                source,
            })?;
        }
        Ok(())
    }

    pub fn tap_names(&self) -> Vec<&str> {
        self.taps.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }
}

/// A hook whose first tap returning `Some` decides the result
pub struct SyncBailHook<A, R> {
    name: &'static str,
    taps: Vec<Tap<BailFn<A, R>>>,
}

impl<A, R> SyncBailHook<A, R> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            taps: Vec::new(),
        }
    }

    pub fn tap<F>(&mut self, name: impl Into<String>, callback: F)
    where
        F: Fn(&A) -> Option<R> + Send + Sync + 'static,
    {
        self.taps.push(Tap {
            name: name.into(),
            callback: Box::new(callback),
        });
    }

    pub fn call(&self, arg: &A) -> Option<R> {
        self.taps.iter().find_map(|tap| {
            let result = (tap.callback)(arg);
            if result.is_some() {
                debug!(hook = self.name, plugin = %tap.name, "hook bailed");
            }
            result
        })
    }

    pub fn tap_names(&self) -> Vec<&str> {
        self.taps.iter().map(|t| t.name.as_str()).collect()
    }
}

/// A hook whose taps may mutate the value and may suspend.
///
/// Taps run strictly in series: each one's future is awaited before the next
/// tap is invoked.
pub struct AsyncSeriesHook<T> {
    name: &'static str,
    taps: Vec<Tap<AsyncFn<T>>>,
}

impl<T: Send> AsyncSeriesHook<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            taps: Vec::new(),
        }
    }

    /// Register a callback that performs asynchronous work
    pub fn tap_async<F>(&mut self, name: impl Into<String>, callback: F)
    where
        F: for<'c> Fn(&'c mut T) -> BoxFuture<'c, anyhow::Result<()>> + Send + Sync + 'static,
    {
        self.taps.push(Tap {
            name: name.into(),
            callback: Box::new(callback),
        });
    }

    /// Register a callback that completes without suspending
    pub fn tap<F>(&mut self, name: impl Into<String>, callback: F)
    where
        F: Fn(&mut T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.tap_async(name, move |arg| {
            let result = callback(arg);
            Box::pin(async move { result })
        });
    }

    /// Await every tap in registration order; the first rejection stops the hook
    pub async fn call(&self, arg: &mut T) -> BuildResult<()> {
        for tap in &self.taps {
            debug!(hook = self.name, plugin = %tap.name, "calling async hook");
            (tap.callback)(&mut *arg)
                .await
                .map_err(|source| BuildError::AsyncHookFailure {
                    hook: self.name,
                    plugin: tap.name.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    pub fn tap_names(&self) -> Vec<&str> {
        self.taps.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Data handed to `factorize` before an import specifier is resolved
#[derive(Debug, Clone)]
pub struct ResolveData {
    /// The specifier as written in the source
    pub request: String,

    /// Directory of the requesting module
    pub context: PathBuf,
}

/// A dependency provided by the environment instead of the bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalModule {
    /// Global variable the module's exports are read from
    pub variable: String,
}

/// An import call seen by the dependency extractor
#[derive(Debug, Clone)]
pub struct RequireCall {
    pub request: String,
    pub module: PathBuf,
}

/// Every extension point the compiler exposes
pub struct Hooks {
    /// Before entry resolution begins
    pub run: SyncHook<Compilation>,

    /// After all assets are rendered, before they are written
    pub emit: AsyncSeriesHook<Compilation>,

    /// After assets are written
    pub done: SyncHook<Stats>,

    /// Before an import specifier is resolved; may claim it as external
    pub factorize: SyncBailHook<ResolveData, ExternalModule>,

    /// For every static import call found while parsing
    pub require_call: SyncHook<RequireCall>,
}

impl Hooks {
    pub fn new() -> Self {
        Self {
            run: SyncHook::new("run"),
            emit: AsyncSeriesHook::new("emit"),
            done: SyncHook::new("done"),
            factorize: SyncBailHook::new("factorize"),
            require_call: SyncHook::new("require_call"),
        }
    }
}

impl Default for Hooks {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("run", &self.run.tap_names())
            .field("emit", &self.emit.tap_names())
            .field("done", &self.done.tap_names())
            .field("factorize", &self.factorize.tap_names())
            .field("require_call", &self.require_call.tap_names())
            .finish()
    }
}
