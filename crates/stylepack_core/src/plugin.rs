//! Hook protocol between a host bundler and its plugins.
//!
//! Plugins register resolve, load and end-of-build callbacks on a
//! [`PluginBuild`]. The host then asks the build to resolve specifiers and
//! load files; callbacks run in registration order and the first one that
//! returns `Some` answers. End callbacks run once, after everything else.

use anyhow::{Context, Result};
use log::{debug, trace};
use regex::Regex;

use crate::types::{LoadArgs, LoadResult, ResolveArgs, ResolveResult};

pub type ResolveFn = Box<dyn Fn(&ResolveArgs<'_>) -> Result<Option<ResolveResult>> + Send + Sync>;
pub type LoadFn = Box<dyn Fn(&LoadArgs<'_>) -> Result<Option<LoadResult>> + Send + Sync>;
pub type EndFn = Box<dyn Fn() -> Result<()> + Send + Sync>;

pub trait Plugin {
    fn name(&self) -> &str;
    fn setup(&self, build: &mut PluginBuild) -> Result<()>;
}

struct Registered<F> {
    plugin: String,
    filter: Regex,
    callback: F,
}

#[derive(Default)]
pub struct PluginBuild {
    current: String,
    resolvers: Vec<Registered<ResolveFn>>,
    loaders: Vec<Registered<LoadFn>>,
    end: Vec<(String, EndFn)>,
}

impl PluginBuild {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `plugin.setup`, attributing its hooks to the plugin's name
    pub fn register(&mut self, plugin: &dyn Plugin) -> Result<()> {
        debug!("Setting up plugin '{}'", plugin.name());
        self.current = plugin.name().to_string();
        plugin.setup(self).with_context(|| format!("Plugin '{}' failed to set up", plugin.name()))
    }

    pub fn on_resolve<F>(&mut self, filter: Regex, callback: F)
    where
        F: Fn(&ResolveArgs<'_>) -> Result<Option<ResolveResult>> + Send + Sync + 'static,
    {
        self.resolvers.push(Registered {
            plugin: self.current.clone(),
            filter,
            callback: Box::new(callback),
        });
    }

    pub fn on_load<F>(&mut self, filter: Regex, callback: F)
    where
        F: Fn(&LoadArgs<'_>) -> Result<Option<LoadResult>> + Send + Sync + 'static,
    {
        self.loaders.push(Registered {
            plugin: self.current.clone(),
            filter,
            callback: Box::new(callback),
        });
    }

    pub fn on_end<F>(&mut self, callback: F)
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        self.end.push((self.current.clone(), Box::new(callback)));
    }

    /// First answer from a resolve hook whose filter matches the specifier
    pub fn resolve(&self, args: &ResolveArgs<'_>) -> Result<Option<ResolveResult>> {
        for hook in self.resolvers.iter().filter(|h| h.filter.is_match(args.path)) {
            trace!("Plugin '{}' resolving '{}'", hook.plugin, args.path);
            let result = (hook.callback)(args).with_context(|| {
                format!("[{}] Failed to resolve '{}'", hook.plugin, args.path)
            })?;
            if result.is_some() {
                return Ok(result);
            }
        }
        Ok(None)
    }

    /// First answer from a load hook whose filter matches the path
    pub fn load(&self, args: &LoadArgs<'_>) -> Result<Option<LoadResult>> {
        let path = args.path.to_string_lossy();
        for hook in self.loaders.iter().filter(|h| h.filter.is_match(&path)) {
            trace!("Plugin '{}' loading {}", hook.plugin, path);
            let result = (hook.callback)(args)
                .with_context(|| format!("[{}] Failed to load {}", hook.plugin, path))?;
            if result.is_some() {
                return Ok(result);
            }
        }
        Ok(None)
    }

    /// Runs every end hook once, stopping at the first failure
    pub fn end(&self) -> Result<()> {
        for (plugin, hook) in &self.end {
            debug!("Running end hook of plugin '{}'", plugin);
            hook().with_context(|| format!("[{}] End hook failed", plugin))?;
        }
        Ok(())
    }
}
