//! Core of the stylepack stylesheet plugin.
//!
//! This crate provides everything a host bundler needs to build SCSS with:
//! - Glob expansion of `@import` lines (`@import "components/*";`)
//! - Import resolution for partials and size-routed SVG assets
//! - Loading and compiling `.scss` files to compressed CSS
//! - Copying large assets into the output tree once the build ends
//! - The resolve/load/end hook protocol the plugin is registered through

mod compiler;
mod constants;
mod copy;
mod glob;
mod loader;
mod plugin;
mod resolver;
mod router;
mod sass;
mod types;

// Re-export public API
pub use compiler::{CompileOptions, GrassCompiler, StylesheetCompiler};
pub use constants::{
    DEFAULT_ASSET_MARKER, DEFAULT_INLINE_LIMIT, DEFAULT_OUT_DIR, DEFAULT_SOURCE_DIR,
    IMPORT_KEYWORD, PARTIAL_PREFIX, STYLESHEET_EXTENSION, VECTOR_IMAGE_EXTENSION,
};
pub use copy::{DeferredCopy, destination_for};
pub use glob::{expand_line, expand_line_with, glob_files, is_dynamic_pattern};
pub use loader::{StylesheetLoader, expand_imports};
pub use plugin::{EndFn, LoadFn, Plugin, PluginBuild, ResolveFn};
pub use resolver::{partial_file_name, resolve};
pub use router::{AssetRouter, PendingCopies};
pub use sass::{PLUGIN_NAME, SassPlugin, SassPluginOptions};
pub use types::{LoadArgs, LoadResult, Loader, ResolveArgs, ResolveResult, Route};
