use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use tracing::debug;

use super::AppState;

/// Serves the operator SPA. A path whose last segment carries an extension
/// maps to a real asset and 404s when missing; anything else falls through
/// to the index so client-side routes deep-link correctly.
pub(crate) async fn spa_fallback(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    let Some(relative) = sanitize(uri.path().trim_start_matches('/')) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let target = if relative.extension().is_some() {
        state.static_dir.join(&relative)
    } else {
        state.static_dir.join("index.html")
    };

    match tokio::fs::read(&target).await {
        Ok(bytes) => {
            let headers = [(header::CONTENT_TYPE, content_type_for(&target))];
            (headers, bytes).into_response()
        }
        Err(e) => {
            debug!(path = %target.display(), "static asset not served: {e}");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

/// Normalize a request path into a relative path with no traversal.
fn sanitize(path: &str) -> Option<PathBuf> {
    let mut clean = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(clean)
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("js") | Some("mjs") => "text/javascript",
        Some("css") => "text/css",
        Some("json") | Some("map") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("wasm") => "application/wasm",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
