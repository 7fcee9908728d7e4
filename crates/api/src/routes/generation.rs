//! Route definitions for generation and preview.

use axum::routing::post;
use axum::Router;

use crate::handlers::generation;
use crate::state::AppState;

/// Routes merged at the `/api/v1` root.
///
/// ```text
/// POST /generate-site  -> generate_site (requires auth)
/// POST /preview        -> preview
/// POST /preview/html   -> preview_html
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate-site", post(generation::generate_site))
        .route("/preview", post(generation::preview))
        .route("/preview/html", post(generation::preview_html))
}
