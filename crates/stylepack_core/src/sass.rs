use anyhow::{Context, Result};
use log::{debug, info};
use regex::Regex;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    compiler::{GrassCompiler, StylesheetCompiler},
    constants::{DEFAULT_ASSET_MARKER, DEFAULT_INLINE_LIMIT, DEFAULT_OUT_DIR, DEFAULT_SOURCE_DIR},
    copy::DeferredCopy,
    loader::StylesheetLoader,
    plugin::{Plugin, PluginBuild},
    resolver::resolve,
    router::{AssetRouter, PendingCopies},
};

pub const PLUGIN_NAME: &str = "sass";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SassPluginOptions {
    /// Root that relative image specifiers and compiler load paths start from
    pub source_root: PathBuf,
    pub out_dir: PathBuf,
    /// Path component where the output-relative part of a copied asset begins
    pub asset_marker: String,
    pub inline_limit: u64,
}

impl SassPluginOptions {
    /// Conventional layout under a project root: `src/scss` in, `public` out
    pub fn for_root(root: &Path) -> Self {
        Self {
            source_root: root.join(DEFAULT_SOURCE_DIR),
            out_dir: root.join(DEFAULT_OUT_DIR),
            asset_marker: DEFAULT_ASSET_MARKER.to_string(),
            inline_limit: DEFAULT_INLINE_LIMIT,
        }
    }
}

/// Glob imports, size-routed images and SCSS compilation for a host bundler.
///
/// Each `setup` call creates a fresh pending-copy list shared by that build's
/// resolve hook and end hook, so nothing carries over between builds.
pub struct SassPlugin {
    options: SassPluginOptions,
    compiler: Arc<dyn StylesheetCompiler>,
}

impl SassPlugin {
    pub fn new(options: SassPluginOptions) -> Self {
        Self::with_compiler(options, Arc::new(GrassCompiler))
    }

    pub fn with_compiler(
        options: SassPluginOptions,
        compiler: Arc<dyn StylesheetCompiler>,
    ) -> Self {
        Self { options, compiler }
    }
}

impl Plugin for SassPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn setup(&self, build: &mut PluginBuild) -> Result<()> {
        let opts = &self.options;
        debug!(
            "Sass plugin: source_root={}, out_dir={}, inline_limit={}",
            opts.source_root.display(),
            opts.out_dir.display(),
            opts.inline_limit
        );

        let any = Regex::new(".").context("Invalid hook filter")?;
        let pending = PendingCopies::new();

        let router = AssetRouter::new(opts.inline_limit, pending.clone());
        let source_root = opts.source_root.clone();
        build.on_resolve(any.clone(), move |args| {
            resolve(&source_root, &router, args.path, args.resolve_dir)
        });

        let copy = DeferredCopy::new(&opts.out_dir, &opts.asset_marker, pending);
        build.on_end(move || {
            let copied = copy.run()?;
            if copied > 0 {
                info!("Copied {} external assets", copied);
            }
            Ok(())
        });

        let loader = StylesheetLoader::new(&opts.source_root, Arc::clone(&self.compiler));
        build.on_load(any, move |args| loader.load(args.path));

        Ok(())
    }
}
