use anyhow::Result;
use log::{debug, trace};
use path_clean::clean;
use std::path::Path;

use crate::{
    constants::{PARTIAL_PREFIX, STYLESHEET_EXTENSION, VECTOR_IMAGE_EXTENSION},
    router::AssetRouter,
    types::{ResolveResult, Route},
};

/// Resolves an import specifier seen by the host bundler.
///
/// - Bare specifiers (not starting with `.`) resolve against `resolve_dir`.
///   A specifier without `/` names a partial, so `buttons` becomes `_buttons.scss`.
/// - Relative `.svg` specifiers resolve against `source_root` and are routed by
///   size: inline assets resolve to the file, large ones are marked external.
/// - Any other relative specifier returns `None`, deferring to the host.
///
/// Partials are not checked for existence here; a missing file surfaces when
/// the host reads it.
pub fn resolve(
    source_root: &Path,
    router: &AssetRouter,
    request: &str,
    resolve_dir: &Path,
) -> Result<Option<ResolveResult>> {
    trace!("Resolving: '{}' from {}", request, resolve_dir.display());

    if !request.starts_with('.') {
        let rewritten = if request.contains('/') {
            request.to_string()
        } else {
            partial_file_name(request)
        };
        // Joined like a string concatenation: a leading `/` does not escape resolve_dir
        let path = clean(resolve_dir.join(rewritten.trim_start_matches('/')));
        trace!("Resolved library import '{}' to {}", request, path.display());
        return Ok(Some(ResolveResult::file(path)));
    }

    if request.ends_with(&format!(".{VECTOR_IMAGE_EXTENSION}")) {
        let file = clean(source_root.join(request));
        return match router.classify(&file)? {
            Route::Inline => {
                debug!("Inlining '{}' from {}", request, file.display());
                Ok(Some(ResolveResult::file(file)))
            }
            Route::External => {
                debug!("Leaving '{}' external", request);
                Ok(Some(ResolveResult::external(request)))
            }
        };
    }

    trace!("Deferring '{}' to default resolution", request);
    Ok(None)
}

/// `name` -> `_name.scss`
pub fn partial_file_name(name: &str) -> String {
    format!("{PARTIAL_PREFIX}{name}.{STYLESHEET_EXTENSION}")
}
