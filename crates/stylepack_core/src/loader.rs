use anyhow::{Context, Result};
use log::{debug, trace};
use regex::Regex;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, LazyLock},
};

use crate::{
    compiler::{CompileOptions, StylesheetCompiler},
    constants::STYLESHEET_EXTENSION,
    glob::expand_line_with,
    types::{LoadResult, Loader},
};

static IMPORT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^.*(?-u:\b)import(?-u:\b).*$").expect("import line pattern is valid")
});

/// Loads `.scss` files: expands glob imports, then compiles to compressed CSS.
#[derive(Clone)]
pub struct StylesheetLoader {
    source_root: PathBuf,
    compiler: Arc<dyn StylesheetCompiler>,
}

impl StylesheetLoader {
    pub fn new(source_root: impl Into<PathBuf>, compiler: Arc<dyn StylesheetCompiler>) -> Self {
        Self { source_root: source_root.into(), compiler }
    }

    /// Returns `None` for anything that is not a stylesheet source so other
    /// loaders can handle it.
    pub fn load(&self, path: &Path) -> Result<Option<LoadResult>> {
        if path.extension().and_then(|e| e.to_str()) != Some(STYLESHEET_EXTENSION) {
            trace!("Not a stylesheet, skipping: {}", path.display());
            return Ok(None);
        }

        let cwd = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let expanded = expand_imports(&source, cwd)
            .with_context(|| format!("Failed to expand imports in {}", path.display()))?;

        let options =
            CompileOptions { load_paths: vec![self.source_root.clone(), cwd.to_path_buf()] };
        let css = self
            .compiler
            .compile(&expanded, &options)
            .with_context(|| format!("Failed to compile {}", path.display()))?;

        debug!("Compiled {} ({} bytes of CSS)", path.display(), css.len());
        Ok(Some(LoadResult { contents: css, loader: Loader::Css }))
    }
}

/// Rewrites every line mentioning `import` through the glob expander,
/// leaving all other lines untouched.
pub fn expand_imports(source: &str, cwd: &Path) -> Result<String> {
    let mut out = String::with_capacity(source.len());
    let mut last = 0;

    for m in IMPORT_LINE.find_iter(source) {
        out.push_str(&source[last..m.start()]);
        out.push_str(&expand_line_with(m.as_str(), cwd, import_target)?);
        last = m.end();
    }
    out.push_str(&source[last..]);

    Ok(out)
}

/// grass only finds a partial spelled out as `_name.scss` through its
/// extensionless form, so matched stylesheets are imported without `.scss`.
fn import_target(file: String) -> String {
    match file.strip_suffix(&format!(".{STYLESHEET_EXTENSION}")) {
        Some(stem) => stem.to_string(),
        None => file,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::GrassCompiler;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, path: &str, content: &str) -> PathBuf {
        let file_path = dir.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    /// Records what it was asked to compile and echoes the source back
    #[derive(Default)]
    struct RecordingCompiler {
        calls: Mutex<Vec<(String, CompileOptions)>>,
    }

    impl StylesheetCompiler for RecordingCompiler {
        fn compile(&self, source: &str, options: &CompileOptions) -> Result<String> {
            self.calls.lock().unwrap().push((source.to_string(), options.clone()));
            Ok(source.to_string())
        }
    }

    #[test]
    fn test_non_stylesheet_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_test_file(temp_dir.path(), "app.css", ".a{}");
        let loader = StylesheetLoader::new(temp_dir.path(), Arc::new(GrassCompiler));
        assert_eq!(loader.load(&file).unwrap(), None);
    }

    #[test]
    fn test_partial_import_is_compiled_in() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("src/scss");
        create_test_file(&root, "_buttons.scss", ".btn {\n  color: red;\n}\n");
        let style =
            create_test_file(&root, "style.scss", "@import \"buttons\";\nbody { margin: 0; }\n");

        let loader = StylesheetLoader::new(&root, Arc::new(GrassCompiler));
        let result = loader.load(&style).unwrap().unwrap();

        assert_eq!(result.loader, Loader::Css);
        assert!(result.contents.contains(".btn{color:red}"));
        assert!(result.contents.contains("body{margin:0}"));
        assert!(!result.contents.contains("@import"));
    }

    #[test]
    fn test_glob_import_pulls_every_match() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("src/scss");
        create_test_file(&root, "components/a.scss", ".a { color: blue; }\n");
        create_test_file(&root, "components/b.scss", ".b { color: green; }\n");
        let style = create_test_file(&root, "style.scss", "@import \"./components/*\";\n");

        let loader = StylesheetLoader::new(&root, Arc::new(GrassCompiler));
        let css = loader.load(&style).unwrap().unwrap().contents;

        assert!(css.contains(".a{color:blue}"));
        assert!(css.contains(".b{color:green}"));
    }

    #[test]
    fn test_glob_over_partials_compiles() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("src/scss");
        create_test_file(&root, "components/_card.scss", ".card { padding: 1px; }\n");
        create_test_file(&root, "components/_nav.scss", ".nav { margin: 2px; }\n");
        let style = create_test_file(&root, "style.scss", "@import \"./components/_*.scss\";\n");

        let loader = StylesheetLoader::new(&root, Arc::new(GrassCompiler));
        let css = loader.load(&style).unwrap().unwrap().contents;

        assert!(css.contains(".card{padding:1px}"));
        assert!(css.contains(".nav{margin:2px}"));
        assert!(!css.contains("@import"));
    }

    #[test]
    fn test_matched_partials_are_imported_without_extension() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "components/_card.scss", "");
        create_test_file(root, "components/logo.svg", "");

        let out = expand_imports("@import \"./components/*\";\n", root).unwrap();
        assert_eq!(out, "@import \"components/_card\";\n@import \"components/logo.svg\";\n");
    }

    #[test]
    fn test_import_keyword_uses_ascii_word_boundaries() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "parts/a.scss", "");

        // `é` is not an ASCII word character, so `import` still stands alone
        let out = expand_imports("éimport \"parts/*\";\n", root).unwrap();
        assert_eq!(out, "éimport \"parts/a\";\n");

        let out = expand_imports("reimport \"parts/*\";\n", root).unwrap();
        assert_eq!(out, "reimport \"parts/*\";\n");
    }

    #[test]
    fn test_only_import_lines_are_rewritten() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "parts/a.scss", "");
        let source = "@import \"parts/*\";\n.x { content: \"parts/*\"; }\n";
        let style = create_test_file(root, "style.scss", source);

        let compiler = Arc::new(RecordingCompiler::default());
        let loader = StylesheetLoader::new(root.join("lib"), compiler.clone());
        loader.load(&style).unwrap();

        let calls = compiler.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (compiled_source, options) = &calls[0];
        assert_eq!(compiled_source, "@import \"parts/a\";\n.x { content: \"parts/*\"; }\n");
        assert_eq!(options.load_paths, vec![root.join("lib"), root.to_path_buf()]);
    }

    #[test]
    fn test_syntax_error_fails_the_load() {
        let temp_dir = TempDir::new().unwrap();
        let style = create_test_file(temp_dir.path(), "broken.scss", ".a { color: red;\n");
        let loader = StylesheetLoader::new(temp_dir.path(), Arc::new(GrassCompiler));
        let err = loader.load(&style).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.scss"));
    }

    #[test]
    fn test_missing_file_names_the_path() {
        let temp_dir = TempDir::new().unwrap();
        let loader = StylesheetLoader::new(temp_dir.path(), Arc::new(GrassCompiler));
        let err = loader.load(&temp_dir.path().join("_gone.scss")).unwrap_err();
        assert!(err.to_string().contains("_gone.scss"));
    }

    #[test]
    fn test_expand_imports_drops_empty_glob() {
        let temp_dir = TempDir::new().unwrap();
        let out = expand_imports("@import \"none/*\";\n.a{}\n", temp_dir.path()).unwrap();
        assert_eq!(out, "\n.a{}\n");
    }
}
