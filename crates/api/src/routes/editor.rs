//! Route definitions for editor sessions.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::editor;
use crate::state::AppState;

/// Routes mounted at `/editor/sessions`. All require auth.
///
/// ```text
/// POST   /                                -> create_session
/// GET    /{id}                            -> get_session
/// DELETE /{id}                            -> delete_session
/// POST   /{id}/pages                      -> add_page
/// PUT    /{id}/pages/{page_id}            -> rename_page
/// DELETE /{id}/pages/{page_id}            -> delete_page
/// POST   /{id}/pages/{page_id}/select     -> select_page
/// POST   /{id}/messages                   -> send_message
/// POST   /{id}/save                       -> save
/// GET    /{id}/preview                    -> preview
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(editor::create_session))
        .route(
            "/{id}",
            get(editor::get_session).delete(editor::delete_session),
        )
        .route("/{id}/pages", post(editor::add_page))
        .route(
            "/{id}/pages/{page_id}",
            put(editor::rename_page).delete(editor::delete_page),
        )
        .route("/{id}/pages/{page_id}/select", post(editor::select_page))
        .route("/{id}/messages", post(editor::send_message))
        .route("/{id}/save", post(editor::save))
        .route("/{id}/preview", get(editor::preview))
}
