use std::path::{Path, PathBuf};

/// An import specifier as seen by a resolve hook.
#[derive(Debug, Clone, Copy)]
pub struct ResolveArgs<'a> {
    pub path: &'a str,
    pub resolve_dir: &'a Path,
}

/// Outcome of a resolve hook. External results are left unresolved by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveResult {
    pub path: PathBuf,
    pub external: bool,
}

impl ResolveResult {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), external: false }
    }

    pub fn external(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), external: true }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LoadArgs<'a> {
    pub path: &'a Path,
}

/// How the host should treat loaded contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loader {
    Css,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadResult {
    pub contents: String,
    pub loader: Loader,
}

/// Size-based routing decision for a vector image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Inline,
    External,
}
