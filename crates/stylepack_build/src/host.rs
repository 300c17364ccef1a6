use anyhow::{Result, anyhow, bail};
use log::{debug, info, trace};
use path_clean::clean;
use rayon::prelude::*;
use std::{fs, path::Path, thread};
use stylepack_core::{LoadArgs, PluginBuild, ResolveArgs, SassPlugin};

use crate::{
    assets::{rewrite_urls, stylesheet_dir},
    config::Config,
    constants::OUTPUT_EXTENSION,
    types::{BuildResult, EntryPoint, OutputFile},
};

pub fn run_build(mut cfg: Config) -> Result<BuildResult> {
    info!("Starting stylesheet build");

    // Initialize config (resolve root, parse entry points)
    cfg.initialize()?;
    let root = cfg.root()?.clone();
    let options = cfg.plugin_options()?;
    let out_dir = options.out_dir.clone();

    let mut build = PluginBuild::new();
    build.register(&SassPlugin::new(options))?;

    info!("Building {} entry points in parallel", cfg.entry_points.len());
    let outputs: Result<Vec<OutputFile>> = cfg
        .entry_points
        .par_iter()
        .map(|entry| {
            debug!("Thread {:?} building: {}", thread::current().id(), entry.path);
            build_entry(&build, &root, &out_dir, entry)
        })
        .collect();

    // End hooks run once whether or not an entry failed, like the copy step of a failed build
    let ended = build.end();
    let outputs = outputs?;
    ended?;

    let result = BuildResult { outputs };
    info!(
        "Build complete: {} outputs, {} inlined assets, {} external assets",
        result.outputs.len(),
        result.inlined(),
        result.external()
    );
    Ok(result)
}

/// Resolves, loads and writes one entry point
fn build_entry(
    build: &PluginBuild,
    root: &Path,
    out_dir: &Path,
    entry: &EntryPoint,
) -> Result<OutputFile> {
    let source = match build.resolve(&ResolveArgs { path: &entry.path, resolve_dir: root })? {
        Some(r) if r.external => bail!("Entry point '{}' resolved as external", entry.path),
        Some(r) => r.path,
        None => clean(root.join(&entry.path)),
    };
    trace!("Entry '{}' resolved to {}", entry.name, source.display());

    let loaded = build
        .load(&LoadArgs { path: &source })?
        .ok_or_else(|| anyhow!("No loader is configured for {}", source.display()))?;
    trace!("Loaded {} as {:?}", source.display(), loaded.loader);

    let (css, assets) = rewrite_urls(build, &loaded.contents, &stylesheet_dir(&source))?;

    let dest = out_dir.join(format!("{}.{}", entry.name, OUTPUT_EXTENSION));
    if let Some(dir) = dest.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(&dest, &css)?;
    debug!("Wrote {} ({} bytes)", dest.display(), css.len());

    Ok(OutputFile { entry: entry.name.clone(), source, path: dest, bytes: css.len(), assets })
}
