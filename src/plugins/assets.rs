//! Static files shipped in a plugin's `static/` directory.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::manifest::is_safe_relative;

/// Content type by file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("js") | Some("mjs") => "text/javascript",
        Some("css") => "text/css",
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("woff2") => "font/woff2",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// Resolves `requested` below `root`, refusing anything that escapes it
/// (including through symlinks).
pub async fn resolve_asset(root: &Path, requested: &str) -> Option<PathBuf> {
    if !is_safe_relative(requested) {
        return None;
    }
    let root = tokio::fs::canonicalize(root).await.ok()?;
    let candidate = tokio::fs::canonicalize(root.join(requested)).await.ok()?;
    if candidate.starts_with(&root) && candidate.is_file() {
        Some(candidate)
    } else {
        None
    }
}

/// Serves one file from `root`, or 404.
pub async fn serve_asset(root: PathBuf, requested: String) -> Response {
    let Some(path) = resolve_asset(&root, &requested).await else {
        debug!("Plugin asset not found: {} under {}", requested, root.display());
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type_for(&path))], bytes).into_response(),
        Err(e) => {
            debug!("Failed to read plugin asset {}: {}", path.display(), e);
            (StatusCode::NOT_FOUND, "Not found").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for(Path::new("a.js")), "text/javascript");
        assert_eq!(content_type_for(Path::new("a.css")), "text/css");
        assert_eq!(content_type_for(Path::new("noext")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_resolve_inside_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("static");
        std::fs::create_dir_all(root.join("js")).unwrap();
        std::fs::write(root.join("js/app.js"), "x").unwrap();
        std::fs::write(dir.path().join("secret.txt"), "s").unwrap();

        assert!(resolve_asset(&root, "js/app.js").await.is_some());
        assert!(resolve_asset(&root, "../secret.txt").await.is_none());
        assert!(resolve_asset(&root, "missing.js").await.is_none());
        assert!(resolve_asset(&root, "js").await.is_none());
    }

    #[tokio::test]
    async fn test_serve_asset_status() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("style.css"), "body{}").unwrap();

        let ok = serve_asset(dir.path().to_path_buf(), "style.css".into()).await;
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(ok.headers()[header::CONTENT_TYPE], "text/css");

        let missing = serve_asset(dir.path().to_path_buf(), "../etc/passwd".into()).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
