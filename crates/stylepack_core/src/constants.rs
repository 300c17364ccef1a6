//! Constants for file extensions, naming conventions and asset routing.
//!
//! Everything the plugin matches on by name lives here so the resolver,
//! loader and copy task agree on the same conventions.

/// Extension of stylesheet sources handled by the loader
pub const STYLESHEET_EXTENSION: &str = "scss";

/// Extension of vector images routed by file size
pub const VECTOR_IMAGE_EXTENSION: &str = "svg";

/// Prefix of partial stylesheet files (`buttons` imports `_buttons.scss`)
pub const PARTIAL_PREFIX: &str = "_";

/// Assets strictly smaller than this many bytes are inlined (50 KiB)
pub const DEFAULT_INLINE_LIMIT: u64 = 51200;

/// Directory name marking where the output-relative part of an asset path starts
pub const DEFAULT_ASSET_MARKER: &str = "images";

/// Stylesheet source root, relative to the project root
pub const DEFAULT_SOURCE_DIR: &str = "src/scss";

/// Output root, relative to the project root
pub const DEFAULT_OUT_DIR: &str = "public";

/// Keyword identifying lines that are candidates for glob expansion
pub const IMPORT_KEYWORD: &str = "import";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_limit_is_fifty_kib() {
        assert_eq!(DEFAULT_INLINE_LIMIT, 50 * 1024);
    }

    #[test]
    fn test_extensions_have_no_leading_dot() {
        // Extensions are compared against Path::extension(), which never includes the dot
        assert!(!STYLESHEET_EXTENSION.starts_with('.'));
        assert!(!VECTOR_IMAGE_EXTENSION.starts_with('.'));
    }
}
