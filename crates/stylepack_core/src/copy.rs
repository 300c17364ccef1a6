use anyhow::{Context, Result, anyhow};
use dashmap::DashMap;
use log::{debug, info, trace};
use rayon::prelude::*;
use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use crate::router::PendingCopies;

/// Copies every pending asset into the output tree. Runs once, after the
/// host has finished resolving and loading.
#[derive(Debug, Clone)]
pub struct DeferredCopy {
    out_dir: PathBuf,
    marker: String,
    pending: PendingCopies,
}

impl DeferredCopy {
    pub fn new(
        out_dir: impl Into<PathBuf>,
        marker: impl Into<String>,
        pending: PendingCopies,
    ) -> Self {
        Self { out_dir: out_dir.into(), marker: marker.into(), pending }
    }

    /// Drains the pending list and copies all entries concurrently.
    ///
    /// Every copy is attempted before the first failure, if any, is returned.
    /// Returns the number of files copied.
    pub fn run(&self) -> Result<usize> {
        let files = self.pending.drain();
        if files.is_empty() {
            trace!("No pending assets to copy");
            return Ok(0);
        }
        debug!("Copying {} assets into {}", files.len(), self.out_dir.display());

        // Destination directory -> created
        let visited: DashMap<PathBuf, bool> = DashMap::new();

        let results: Vec<Result<()>> = files
            .par_iter()
            .map(|file| {
                let dest = destination_for(file, &self.out_dir, &self.marker)?;
                if let Some(dir) = dest.parent() {
                    ensure_dir(&visited, dir)?;
                }
                trace!("Copying {} -> {}", file.display(), dest.display());
                fs::copy(file, &dest).with_context(|| {
                    format!("Failed to copy {} to {}", file.display(), dest.display())
                })?;
                Ok(())
            })
            .collect();

        let copied = results.iter().filter(|r| r.is_ok()).count();
        if let Some(err) = results.into_iter().find_map(Result::err) {
            return Err(err);
        }

        info!(
            "Copied {} assets into {} ({} directories)",
            copied,
            self.out_dir.display(),
            visited.len()
        );
        Ok(copied)
    }
}

/// Creates `dir` once per run; concurrent callers for the same directory
/// wait on the entry until it exists.
fn ensure_dir(visited: &DashMap<PathBuf, bool>, dir: &Path) -> Result<()> {
    visited.entry(dir.to_path_buf()).or_try_insert_with(|| {
        trace!("Creating directory {}", dir.display());
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))
            .map(|_| true)
    })?;
    Ok(())
}

/// Maps an asset source path into the output tree, keeping everything from
/// the first `marker` component onward.
///
/// `/project/src/scss/images/icon-big.svg` with `public` and `images` gives
/// `public/images/icon-big.svg`.
pub fn destination_for(source: &Path, out_dir: &Path, marker: &str) -> Result<PathBuf> {
    let components: Vec<Component> = source.components().collect();
    let start = components
        .iter()
        .position(|c| matches!(c, Component::Normal(name) if *name == marker))
        .ok_or_else(|| {
            anyhow!("Asset {} is not under an '{}' directory", source.display(), marker)
        })?;

    Ok(components[start..].iter().fold(out_dir.to_path_buf(), |acc, c| acc.join(c)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, path: &str, content: &str) -> PathBuf {
        let file_path = dir.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    #[test]
    fn test_destination_for_strips_up_to_marker() {
        let dest = destination_for(
            Path::new("/project/src/scss/images/icon-big.svg"),
            Path::new("public"),
            "images",
        )
        .unwrap();
        assert_eq!(dest, PathBuf::from("public/images/icon-big.svg"));
    }

    #[test]
    fn test_destination_for_keeps_nested_dirs() {
        let dest = destination_for(
            Path::new("/p/src/scss/images/icons/social/x.svg"),
            Path::new("/out"),
            "images",
        )
        .unwrap();
        assert_eq!(dest, PathBuf::from("/out/images/icons/social/x.svg"));
    }

    #[test]
    fn test_destination_for_uses_first_marker() {
        let dest =
            destination_for(Path::new("/a/images/b/images/c.svg"), Path::new("out"), "images")
                .unwrap();
        assert_eq!(dest, PathBuf::from("out/images/b/images/c.svg"));
    }

    #[test]
    fn test_destination_for_requires_whole_component() {
        let result = destination_for(Path::new("/a/myimages/c.svg"), Path::new("out"), "images");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_run_touches_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("public");
        let task = DeferredCopy::new(&out, "images", PendingCopies::new());

        assert_eq!(task.run().unwrap(), 0);
        assert_eq!(task.run().unwrap(), 0);
        assert!(!out.exists());
    }

    #[test]
    fn test_copies_pending_files_and_drains() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let a = create_test_file(root, "src/scss/images/a.svg", "<svg>a</svg>");
        let b = create_test_file(root, "src/scss/images/icons/b.svg", "<svg>b</svg>");
        let c = create_test_file(root, "src/scss/images/c.svg", "<svg>c</svg>");

        let pending = PendingCopies::new();
        for f in [&a, &b, &c] {
            pending.push(f.clone());
        }
        let out = root.join("public");
        let task = DeferredCopy::new(&out, "images", pending.clone());

        assert_eq!(task.run().unwrap(), 3);
        assert_eq!(fs::read_to_string(out.join("images/a.svg")).unwrap(), "<svg>a</svg>");
        assert_eq!(fs::read_to_string(out.join("images/icons/b.svg")).unwrap(), "<svg>b</svg>");
        assert_eq!(fs::read_to_string(out.join("images/c.svg")).unwrap(), "<svg>c</svg>");
        assert!(pending.is_empty());
    }

    #[test]
    fn test_duplicate_entries_are_copied_again() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let a = create_test_file(root, "images/a.svg", "<svg/>");

        let pending = PendingCopies::new();
        pending.push(a.clone());
        pending.push(a);
        let task = DeferredCopy::new(root.join("out"), "images", pending);

        assert_eq!(task.run().unwrap(), 2);
        assert!(root.join("out/images/a.svg").exists());
    }

    #[test]
    fn test_failed_copy_fails_the_batch() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let good = create_test_file(root, "images/good.svg", "<svg/>");

        let pending = PendingCopies::new();
        pending.push(good);
        pending.push(root.join("images/missing.svg"));
        let task = DeferredCopy::new(root.join("out"), "images", pending);

        let err = task.run().unwrap_err();
        assert!(err.to_string().contains("missing.svg"));
        // The other copy still ran
        assert!(root.join("out/images/good.svg").exists());
    }
}
