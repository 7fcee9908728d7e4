//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /sign-up  -> sign_up
/// POST /sign-in  -> sign_in
/// POST /refresh  -> refresh
/// POST /logout   -> logout (requires auth)
/// GET  /sessions -> sessions (requires auth)
/// GET  /me       -> me (requires auth)
/// PUT  /me       -> update_me (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(auth::sign_up))
        .route("/sign-in", post(auth::sign_in))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/sessions", get(auth::sessions))
        .route("/me", get(auth::me).put(auth::update_me))
}
