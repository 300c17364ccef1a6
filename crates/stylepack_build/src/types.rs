use serde::Serialize;
use std::path::PathBuf;

/// A stylesheet to build: output name and source specifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryPoint {
    pub name: String,
    pub path: String,
}

/// What happened to one `url(...)` reference in compiled CSS
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "url", rename_all = "lowercase")]
pub enum AssetRef {
    /// Embedded as a data URL
    Inline(String),
    /// Left for the deployed site to serve
    External(String),
    /// Left as written, no data-url loader for it
    Kept(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputFile {
    pub entry: String,
    pub source: PathBuf,
    pub path: PathBuf,
    pub bytes: usize,
    pub assets: Vec<AssetRef>,
}

impl OutputFile {
    pub fn inlined(&self) -> usize {
        self.assets.iter().filter(|a| matches!(a, AssetRef::Inline(_))).count()
    }

    pub fn external(&self) -> impl Iterator<Item = &str> {
        self.assets.iter().filter_map(|a| match a {
            AssetRef::External(url) => Some(url.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildResult {
    pub outputs: Vec<OutputFile>,
}

impl BuildResult {
    pub fn inlined(&self) -> usize {
        self.outputs.iter().map(OutputFile::inlined).sum()
    }

    pub fn external(&self) -> usize {
        self.outputs.iter().map(|o| o.external().count()).sum()
    }
}
