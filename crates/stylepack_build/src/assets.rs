use anyhow::{Context, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use log::{debug, trace};
use path_clean::clean;
use regex::{Captures, Regex};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};
use stylepack_core::{PluginBuild, ResolveArgs};

use crate::{
    constants::{UNRESOLVED_URL_PREFIXES, data_url_type},
    types::AssetRef,
};

static CSS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*(?:"([^"]*)"|'([^']*)'|([^)"'\s]*))\s*\)"#)
        .expect("url pattern is valid")
});

/// Resolves every `url(...)` in compiled CSS through the plugin hooks.
///
/// External results are left untouched. References resolving to a local
/// file with a data-url loader are embedded; the rest stay as written.
/// References no hook answers resolve against `resolve_dir`.
pub fn rewrite_urls(
    build: &PluginBuild,
    css: &str,
    resolve_dir: &Path,
) -> Result<(String, Vec<AssetRef>)> {
    let mut out = String::with_capacity(css.len());
    let mut assets = Vec::new();
    let mut last = 0;

    for caps in CSS_URL.captures_iter(css) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let url = url_text(&caps);
        if url.is_empty() || UNRESOLVED_URL_PREFIXES.iter().any(|p| url.starts_with(p)) {
            continue;
        }

        out.push_str(&css[last..whole.start()]);
        last = whole.end();

        let resolved = build.resolve(&ResolveArgs { path: url, resolve_dir })?;
        let file = match resolved {
            Some(r) if r.external => {
                trace!("Keeping external reference '{}'", url);
                out.push_str(whole.as_str());
                assets.push(AssetRef::External(url.to_string()));
                continue;
            }
            Some(r) => r.path,
            None => clean(resolve_dir.join(url)),
        };

        match data_url(&file)? {
            Some(data) => {
                debug!("Embedding '{}' ({} bytes encoded)", url, data.len());
                out.push_str(&format!("url({data})"));
                assets.push(AssetRef::Inline(url.to_string()));
            }
            None => {
                trace!("No data-url loader for '{}', keeping it", url);
                out.push_str(whole.as_str());
                assets.push(AssetRef::Kept(url.to_string()));
            }
        }
    }
    out.push_str(&css[last..]);

    Ok((out, assets))
}

fn url_text<'a>(caps: &Captures<'a>) -> &'a str {
    caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)).map_or("", |m| m.as_str())
}

/// `data:<mime>;base64,...` for files with a data-url loader, reading the file
fn data_url(file: &Path) -> Result<Option<String>> {
    let Some(mime) = file.extension().and_then(|e| e.to_str()).and_then(data_url_type) else {
        return Ok(None);
    };
    let bytes = fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    Ok(Some(format!("data:{};base64,{}", mime, STANDARD.encode(bytes))))
}

/// Directory a stylesheet's own references resolve from
pub fn stylesheet_dir(source: &Path) -> PathBuf {
    match source.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
