//! Route definitions for the `/sites` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::sites;
use crate::state::AppState;

/// Routes mounted at `/sites`. All require auth.
///
/// ```text
/// GET  /              -> list
/// POST /save          -> save
/// GET  /{id}          -> get_by_id
/// GET  /{id}/preview  -> preview
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(sites::list))
        .route("/save", post(sites::save))
        .route("/{id}", get(sites::get_by_id))
        .route("/{id}/preview", get(sites::preview))
}
