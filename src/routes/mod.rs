//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The whole HTTP surface is one fallback handler over the asset root. There
//! are no API routes here; the auth backend lives elsewhere and the browser
//! talks to it directly.

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

use axum::Router;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;

use crate::assets::{self, AssetRoot, Lookup};

/// Static client + SPA fallback, traced per request.
pub fn app(assets: AssetRoot) -> Router {
    Router::new()
        .fallback(serve_asset)
        .layer(TraceLayer::new_for_http())
        .with_state(assets)
}

/// Serve the file named by the request path, or the entry document when
/// there is no such file.
async fn serve_asset(State(assets): State<AssetRoot>, req: Request) -> Response {
    let candidate = assets.resolve(req.uri().path());

    let target = match assets::lookup(&candidate).await {
        Lookup::Found => candidate,
        Lookup::Missing => {
            tracing::debug!(path = %req.uri().path(), "no asset; serving entry document");
            assets.entry_path().to_path_buf()
        }
        Lookup::Failed(e) => {
            tracing::error!(error = %e, path = %req.uri().path(), "asset lookup failed");
            return read_failure();
        }
    };

    let path = req.uri().path().to_owned();
    let response = match ServeFile::new(&target).oneshot(req).await {
        Ok(response) => response,
        Err(never) => match never {},
    };

    // The target was probed above; a 404 now means it vanished or became
    // unreadable since.
    if response.status() == StatusCode::NOT_FOUND {
        tracing::error!(%path, target = %target.display(), "asset disappeared while serving");
        return read_failure();
    }
    response.into_response()
}

fn read_failure() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "failed to read asset").into_response()
}
