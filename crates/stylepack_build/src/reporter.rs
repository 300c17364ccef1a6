use std::{
    env,
    io::{self, Write},
    path::{Path, PathBuf},
};

use colored::Colorize;
use log::{debug, trace};

use crate::types::{AssetRef, BuildResult};

/// Relativize a path to the current working directory for clickable links
fn relativize_to_cwd(path: &Path) -> String {
    let cwd = match env::current_dir() {
        Ok(cwd) => cwd,
        Err(_) => {
            debug!("Failed to get current directory");
            return path.display().to_string();
        }
    };
    trace!("Relativizing {:?} to cwd {:?}", path, cwd);

    match make_relative(path, &cwd) {
        Some(rel_path) => rel_path.to_string_lossy().to_string(),
        None => path.display().to_string(),
    }
}

/// Create a relative path from `base` to `target`
fn make_relative(target: &Path, base: &Path) -> Option<PathBuf> {
    use std::path::Component;

    let mut target_components = target.components().peekable();
    let mut base_components = base.components().peekable();

    // Skip the shared prefix
    let mut shared = 0;
    while let (Some(t), Some(b)) = (target_components.peek(), base_components.peek()) {
        if t != b {
            break;
        }
        target_components.next();
        base_components.next();
        shared += 1;
    }

    // No common root, so no relative path between them
    if shared == 0 && (target.has_root() || base.has_root()) {
        return None;
    }

    let mut result = PathBuf::new();
    for _ in base_components {
        result.push("..");
    }
    for component in target_components {
        match component {
            Component::Normal(p) => result.push(p),
            Component::ParentDir => result.push(".."),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    if result.as_os_str().is_empty() { Some(PathBuf::from(".")) } else { Some(result) }
}

pub fn print_build_summary<W: Write>(writer: &mut W, result: &BuildResult) -> io::Result<()> {
    debug!("Printing summary for {} outputs", result.outputs.len());

    for output in &result.outputs {
        writeln!(
            writer,
            "{} {} ({} bytes)",
            "✓".green().bold(),
            relativize_to_cwd(&output.path).blue(),
            output.bytes.to_string().cyan()
        )?;

        let shown: Vec<&AssetRef> =
            output.assets.iter().filter(|a| !matches!(a, AssetRef::Kept(_))).collect();
        for (idx, asset) in shown.iter().enumerate() {
            let is_last = idx == shown.len() - 1;
            let prefix = if is_last { "└──" } else { "├──" };
            match asset {
                AssetRef::Inline(url) => {
                    writeln!(writer, "{}  {} {}", prefix.dimmed(), url, "inlined".green())?
                }
                AssetRef::External(url) => {
                    writeln!(writer, "{}  {} {}", prefix.dimmed(), url, "copied".yellow())?
                }
                AssetRef::Kept(_) => {}
            }
        }
    }

    writeln!(writer, "{}", "─".repeat(60).dimmed())?;
    writeln!(writer, "{}", "Summary".bold())?;
    writeln!(writer, "  Stylesheets: {}", result.outputs.len().to_string().cyan().bold())?;
    writeln!(writer, "  Inlined assets: {}", result.inlined().to_string().green())?;
    writeln!(writer, "  External assets: {}", result.external().to_string().yellow())?;

    writer.flush()?;
    Ok(())
}

pub fn print_json<W: Write>(writer: &mut W, result: &BuildResult) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, result)?;
    writeln!(writer)?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OutputFile;

    fn sample() -> BuildResult {
        BuildResult {
            outputs: vec![OutputFile {
                entry: "stylesheets/style".to_string(),
                source: PathBuf::from("/p/src/scss/style.scss"),
                path: PathBuf::from("/p/public/stylesheets/style.css"),
                bytes: 42,
                assets: vec![
                    AssetRef::Inline("./images/a.svg".to_string()),
                    AssetRef::External("./images/b.svg".to_string()),
                    AssetRef::Kept("./fonts/c.woff2".to_string()),
                ],
            }],
        }
    }

    #[test]
    fn test_make_relative_child_dir() {
        let target = Path::new("/project/public/stylesheets/style.css");
        let base = Path::new("/project");
        let result = make_relative(target, base);
        assert_eq!(result, Some(PathBuf::from("public/stylesheets/style.css")));
    }

    #[test]
    fn test_make_relative_sibling_dir() {
        let target = Path::new("/project/public/style.css");
        let base = Path::new("/project/src");
        let result = make_relative(target, base);
        assert_eq!(result, Some(PathBuf::from("../public/style.css")));
    }

    #[test]
    fn test_make_relative_same_path() {
        let target = Path::new("/project/src");
        let base = Path::new("/project/src");
        let result = make_relative(target, base);
        assert_eq!(result, Some(PathBuf::from(".")));
    }

    #[test]
    fn test_make_relative_mixed_roots() {
        let result = make_relative(Path::new("relative/file.css"), Path::new("/project"));
        assert_eq!(result, None);
    }

    #[test]
    fn test_summary_lists_routed_assets() {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        print_build_summary(&mut buf, &sample()).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("./images/a.svg inlined"));
        assert!(text.contains("./images/b.svg copied"));
        assert!(!text.contains("c.woff2"));
        assert!(text.contains("Inlined assets: 1"));
        assert!(text.contains("External assets: 1"));
    }

    #[test]
    fn test_json_output() {
        let mut buf = Vec::new();
        print_json(&mut buf, &sample()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        let output = &value["outputs"][0];
        assert_eq!(output["entry"], "stylesheets/style");
        assert_eq!(output["bytes"], 42);
        assert_eq!(output["assets"][1]["kind"], "external");
        assert_eq!(output["assets"][1]["url"], "./images/b.svg");
    }
}
