use anyhow::{Result, anyhow};
use grass::{InputSyntax, Options, OutputStyle};
use log::trace;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Directories searched, in order, for `@import`/`@use` targets
    pub load_paths: Vec<PathBuf>,
}

/// Turns SCSS source into compressed CSS.
pub trait StylesheetCompiler: Send + Sync {
    fn compile(&self, source: &str, options: &CompileOptions) -> Result<String>;
}

/// Compiler backed by `grass`, a pure Rust Sass implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrassCompiler;

impl StylesheetCompiler for GrassCompiler {
    fn compile(&self, source: &str, options: &CompileOptions) -> Result<String> {
        trace!("Compiling {} bytes with load paths {:?}", source.len(), options.load_paths);

        let grass_options = Options::default()
            .input_syntax(InputSyntax::Scss)
            .style(OutputStyle::Compressed)
            .load_paths(options.load_paths.as_slice());

        grass::from_string(source, &grass_options).map_err(|e| anyhow!("{}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compressed() -> CompileOptions {
        CompileOptions { load_paths: vec![] }
    }

    #[test]
    fn test_compiles_nested_rules_compressed() {
        let css = GrassCompiler.compile(".a { .b { color: red; } }", &compressed()).unwrap();
        assert_eq!(css.trim(), ".a .b{color:red}");
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let result = GrassCompiler.compile(".a { color: red;", &compressed());
        assert!(result.is_err());
    }
}
