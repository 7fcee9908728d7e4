//! Route definitions for credit endpoints.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::account;
use crate::state::AppState;

/// Routes merged at the `/api/v1` root.
///
/// ```text
/// POST /init-user       -> init_user
/// POST /deduct-credits  -> deduct_credits
/// GET  /credits         -> get_credits
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/init-user", post(account::init_user))
        .route("/deduct-credits", post(account::deduct_credits))
        .route("/credits", get(account::get_credits))
}
