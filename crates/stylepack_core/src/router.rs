use anyhow::{Context, Result};
use log::{debug, trace};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::types::Route;

/// Source paths of assets waiting to be copied into the output tree.
///
/// Cloning shares the same underlying list, so the resolve hook and the
/// end-of-build hook of one plugin instance see the same entries.
#[derive(Debug, Clone, Default)]
pub struct PendingCopies {
    inner: Arc<Mutex<Vec<PathBuf>>>,
}

impl PendingCopies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, path: PathBuf) {
        self.lock().push(path);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of the current entries, in insertion order
    pub fn to_vec(&self) -> Vec<PathBuf> {
        self.lock().clone()
    }

    /// Removes and returns every entry, leaving the list empty
    pub fn drain(&self) -> Vec<PathBuf> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PathBuf>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Routes vector images by file size: small ones are embedded, large ones
/// are recorded for copying and referenced externally.
#[derive(Debug, Clone)]
pub struct AssetRouter {
    inline_limit: u64,
    pending: PendingCopies,
}

impl AssetRouter {
    pub fn new(inline_limit: u64, pending: PendingCopies) -> Self {
        Self { inline_limit, pending }
    }

    pub fn pending(&self) -> &PendingCopies {
        &self.pending
    }

    /// Stats `path` and classifies it. External paths are appended to the
    /// pending list on every call, without de-duplication.
    pub fn classify(&self, path: &Path) -> Result<Route> {
        let size = fs::metadata(path)
            .with_context(|| format!("Failed to stat {}", path.display()))?
            .len();
        trace!("Asset {} is {} bytes (limit {})", path.display(), size, self.inline_limit);

        if size < self.inline_limit {
            return Ok(Route::Inline);
        }

        debug!("Routing {} externally ({} bytes)", path.display(), size);
        self.pending.push(path.to_path_buf());
        Ok(Route::External)
    }
}
