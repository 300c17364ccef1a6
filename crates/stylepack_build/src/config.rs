use anyhow::{Result, anyhow, bail};
use clap::Parser;
use log::{debug, info};
use std::{
    env,
    path::{Path, PathBuf},
};
use stylepack_core::{
    DEFAULT_ASSET_MARKER, DEFAULT_INLINE_LIMIT, DEFAULT_OUT_DIR, DEFAULT_SOURCE_DIR,
    SassPluginOptions,
};

use crate::{constants::DEFAULT_ENTRY, types::EntryPoint};

#[derive(Debug, Clone, Parser)]
#[command(name = "build")]
#[command(about = "Compile SCSS entry points with glob imports and size-routed SVG assets")]
pub struct Config {
    /// Root directory of the project (defaults to the current directory)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Stylesheet source root, relative to the project root
    #[arg(long, default_value = DEFAULT_SOURCE_DIR)]
    pub source_dir: PathBuf,

    /// Output directory, relative to the project root
    #[arg(long, default_value = DEFAULT_OUT_DIR)]
    pub outdir: PathBuf,

    /// Entry point as `name=path` (repeatable); writes `<outdir>/<name>.css`
    #[arg(long = "entry", default_value = DEFAULT_ENTRY)]
    pub entries: Vec<String>,

    /// SVG assets at or above this many bytes are copied instead of inlined
    #[arg(long, default_value_t = DEFAULT_INLINE_LIMIT)]
    pub inline_limit: u64,

    /// Directory name where the output path of a copied asset begins
    #[arg(long, default_value = DEFAULT_ASSET_MARKER)]
    pub asset_marker: String,

    /// Print the build summary as JSON
    #[arg(long)]
    pub json: bool,

    #[clap(skip)]
    pub entry_points: Vec<EntryPoint>,
}

impl Config {
    /// Initialize the config by resolving the root directory and parsing entry points
    pub fn initialize(&mut self) -> Result<()> {
        let root = if let Some(r) = self.root.take() {
            debug!("Using provided root directory: {:?}", r);
            r.canonicalize().unwrap_or(r)
        } else {
            debug!("No root provided, using current directory");
            env::current_dir()?
        };
        info!("Using root directory: {}", root.display());

        self.entry_points =
            self.entries.iter().map(|e| parse_entry(e)).collect::<Result<Vec<_>>>()?;
        if self.entry_points.is_empty() {
            bail!("No entry points given");
        }
        debug!("Parsed {} entry points", self.entry_points.len());

        self.root = Some(root);
        Ok(())
    }

    /// Get the root directory, returning an error if not initialized
    pub fn root(&self) -> Result<&PathBuf> {
        self.root
            .as_ref()
            .ok_or_else(|| anyhow!("Config not initialized - call initialize() first"))
    }

    /// Options for the sass plugin, with directories anchored at the root
    pub fn plugin_options(&self) -> Result<SassPluginOptions> {
        let root = self.root()?;
        Ok(SassPluginOptions {
            source_root: root.join(&self.source_dir),
            out_dir: root.join(&self.outdir),
            asset_marker: self.asset_marker.clone(),
            inline_limit: self.inline_limit,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: None,
            source_dir: PathBuf::from(DEFAULT_SOURCE_DIR),
            outdir: PathBuf::from(DEFAULT_OUT_DIR),
            entries: vec![DEFAULT_ENTRY.to_string()],
            inline_limit: DEFAULT_INLINE_LIMIT,
            asset_marker: DEFAULT_ASSET_MARKER.to_string(),
            json: false,
            entry_points: Vec::new(),
        }
    }
}

/// `name=path`, or just `path` in which case the file stem names the output
pub fn parse_entry(raw: &str) -> Result<EntryPoint> {
    let (name, path) = match raw.split_once('=') {
        Some((name, path)) => (name.trim().to_string(), path.trim().to_string()),
        None => {
            let stem = Path::new(raw.trim())
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            (stem, raw.trim().to_string())
        }
    };

    if name.is_empty() || path.is_empty() {
        bail!("Invalid entry point '{}', expected name=path", raw);
    }
    Ok(EntryPoint { name, path })
}
