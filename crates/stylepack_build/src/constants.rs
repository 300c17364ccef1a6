//! Defaults and lookup tables for the reference host.

/// Entry point built when none is given: `<outdir>/stylesheets/style.css`
pub const DEFAULT_ENTRY: &str = "stylesheets/style=src/scss/style.scss";

/// Extension of emitted stylesheets
pub const OUTPUT_EXTENSION: &str = "css";

/// Extensions embedded as `data:` URLs when a reference resolves to a local file
pub const DATA_URL_TYPES: &[(&str, &str)] = &[
    ("svg", "image/svg+xml"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
];

/// `url(...)` references starting with any of these are never resolved
pub const UNRESOLVED_URL_PREFIXES: &[&str] = &["data:", "http://", "https://", "//", "#"];

/// MIME type for a data-url extension, compared case-insensitively
pub fn data_url_type(ext: &str) -> Option<&'static str> {
    DATA_URL_TYPES.iter().find(|(e, _)| e.eq_ignore_ascii_case(ext)).map(|(_, mime)| *mime)
}
