//! Reference host for the stylepack sass plugin.
//!
//! This crate drives the plugin hooks the way a bundler would: it resolves
//! and loads each stylesheet entry point, embeds or externalizes the assets
//! the compiled CSS references, writes the output, and runs the end-of-build
//! hooks once every entry is done.
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```no_run
//! use stylepack_build::{Config, run_build};
//! use std::io::{BufWriter, Write};
//!
//! # fn main() -> anyhow::Result<()> {
//! let cfg = Config {
//!     root: Some(std::path::PathBuf::from("/path/to/project")),
//!     ..Default::default()
//! };
//!
//! let result = run_build(cfg)?;
//!
//! let mut stdout = BufWriter::new(std::io::stdout());
//! stylepack_build::print_build_summary(&mut stdout, &result)?;
//! stdout.flush()?;
//! # Ok(())
//! # }
//! ```

mod assets;
mod config;
mod constants;
mod host;
mod reporter;
mod types;

// Re-export public API
pub use assets::rewrite_urls;
pub use config::{Config, parse_entry};
pub use host::run_build;
pub use reporter::{print_build_summary, print_json};
pub use types::{AssetRef, BuildResult, EntryPoint, OutputFile};
