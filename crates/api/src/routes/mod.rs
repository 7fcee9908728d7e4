pub mod account;
pub mod auth;
pub mod editor;
pub mod generation;
pub mod health;
pub mod sites;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/sign-up                                   create account (public)
/// /auth/sign-in                                   sign in (public)
/// /auth/refresh                                   rotate tokens (public)
/// /auth/logout                                    revoke sessions
/// /auth/me                                        get, update profile
///
/// /init-user                                      initial credit grant
/// /deduct-credits                                 atomic deduction
/// /credits                                        current balance
///
/// /generate-site                                  stateless generation
/// /preview                                        sanitized markup (JSON)
/// /preview/html                                   sanitized markup (document)
///
/// /sites                                          list own sites
/// /sites/save                                     credit-gated save
/// /sites/{id}                                     site with chat history
/// /sites/{id}/preview                             sanitized document
///
/// /editor/sessions                                create
/// /editor/sessions/{id}                           get, delete
/// /editor/sessions/{id}/pages                     add page
/// /editor/sessions/{id}/pages/{page_id}           rename, delete
/// /editor/sessions/{id}/pages/{page_id}/select    make active
/// /editor/sessions/{id}/messages                  generate on active page
/// /editor/sessions/{id}/save                      save active page
/// /editor/sessions/{id}/preview                   sanitized active page
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .merge(account::router())
        .merge(generation::router())
        .nest("/sites", sites::router())
        .nest("/editor/sessions", editor::router())
}
