//! Handlers for `/editor/sessions`: multi-page editing backed by
//! [`EditorSessions`](crate::editor::EditorSessions).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use sitesmith_core::project::{Page, Project};
use sitesmith_core::sanitize::sanitize;
use sitesmith_core::save::{save_page, SaveError, SaveOutcome};
use sitesmith_core::types::{DbId, PageId};
use sitesmith_db::save_store::PgSaveStore;
use uuid::Uuid;
use validator::Validate;

use crate::editor::{EditorSessionView, EditorSessions, PageTicket};
use crate::error::{AppError, AppResult};
use crate::extract::ValidJson;
use crate::handlers::html_preview;
use crate::handlers::sites::load_site;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /editor/sessions`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateSessionRequest {
    /// Reopen a saved site instead of starting from an empty `Home` page.
    pub site_id: Option<DbId>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RenamePageRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1))]
    pub message: String,
}

/// Result of a message round-trip on the active page.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub page_id: PageId,
    pub html: String,
    pub css: String,
    /// The page after the reply was applied; `None` if it was deleted meanwhile.
    pub page: Option<Page>,
}

// ---------------------------------------------------------------------------
// Session lifecycle
// ---------------------------------------------------------------------------

/// POST /api/v1/editor/sessions
pub async fn create_session(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidJson(input): ValidJson<CreateSessionRequest>,
) -> AppResult<(StatusCode, Json<EditorSessionView>)> {
    let project = match input.site_id {
        Some(site_id) => {
            let (site, chat) = load_site(&state, site_id, auth_user.user_id).await?;
            Project::from_site(site.id, &site.name, site.html, site.css, chat)
        }
        None => Project::new(),
    };
    let view = state
        .editor_sessions
        .create(auth_user.user_id, project)
        .await;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/v1/editor/sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<EditorSessionView>> {
    let view = state.editor_sessions.view(id, auth_user.user_id).await?;
    Ok(Json(view))
}

/// DELETE /api/v1/editor/sessions/{id}
pub async fn delete_session(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.editor_sessions.remove(id, auth_user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

/// POST /api/v1/editor/sessions/{id}/pages
pub async fn add_page(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<EditorSessionView>)> {
    let view = state
        .editor_sessions
        .update(id, auth_user.user_id, |project| {
            project.add_page();
            Ok(())
        })
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// PUT /api/v1/editor/sessions/{id}/pages/{page_id}
pub async fn rename_page(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((id, page_id)): Path<(Uuid, PageId)>,
    ValidJson(input): ValidJson<RenamePageRequest>,
) -> AppResult<Json<EditorSessionView>> {
    let view = state
        .editor_sessions
        .update(id, auth_user.user_id, |project| {
            project.rename_page(page_id, &input.name).map(|_| ())
        })
        .await?;
    Ok(Json(view))
}

/// DELETE /api/v1/editor/sessions/{id}/pages/{page_id}
///
/// Deleting the only page succeeds and changes nothing.
pub async fn delete_page(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((id, page_id)): Path<(Uuid, PageId)>,
) -> AppResult<Json<EditorSessionView>> {
    let view = state
        .editor_sessions
        .update(id, auth_user.user_id, |project| project.delete_page(page_id))
        .await?;
    Ok(Json(view))
}

/// POST /api/v1/editor/sessions/{id}/pages/{page_id}/select
pub async fn select_page(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((id, page_id)): Path<(Uuid, PageId)>,
) -> AppResult<Json<EditorSessionView>> {
    let view = state
        .editor_sessions
        .update(id, auth_user.user_id, |project| {
            project.select_page(page_id).map(|_| ())
        })
        .await?;
    Ok(Json(view))
}

// ---------------------------------------------------------------------------
// Active page operations
// ---------------------------------------------------------------------------

/// POST /api/v1/editor/sessions/{id}/messages
///
/// Append a user message to the active page and generate a new version of
/// it. A second message to the same page while one is outstanding is
/// rejected with 409.
pub async fn send_message(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidJson(input): ValidJson<SendMessageRequest>,
) -> AppResult<Json<MessageResponse>> {
    let (ticket, mut transcript) = state
        .editor_sessions
        .begin_message(id, auth_user.user_id, &input.message)
        .await?;
    let page_id = ticket.page_id;

    let result = state.generator.generate(&mut transcript).await;

    match result {
        Ok(site) => {
            let page = state
                .editor_sessions
                .finish(ticket, |page| {
                    page.transcript = transcript;
                    page.html = site.html.clone();
                    page.css = site.css.clone();
                    page.clone()
                })
                .await;
            Ok(Json(MessageResponse {
                page_id,
                html: site.html,
                css: site.css,
                page,
            }))
        }
        Err(e) => {
            drop(ticket);
            Err(e.into())
        }
    }
}

/// POST /api/v1/editor/sessions/{id}/save
///
/// Save the active page. On success its turns receive their ids and the
/// page is linked to the site, so the next save updates it in place.
///
/// The workflow runs on its own task: once the credit is deducted, the
/// site write and any refund complete even if the request is dropped.
pub async fn save(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SaveOutcome>> {
    let (ticket, page) = state
        .editor_sessions
        .begin_save(id, auth_user.user_id)
        .await?;

    let sessions = Arc::clone(&state.editor_sessions);
    let store = PgSaveStore::new(state.pool.clone(), auth_user.session_id);
    let owner_id = auth_user.user_id;

    let task = tokio::spawn(async move {
        let result = save_page(&store, Some(owner_id), page.site_id, &page).await;
        apply_save_result(&sessions, ticket, result).await
    });

    let outcome = task
        .await
        .map_err(|e| AppError::InternalError(format!("Save task failed: {e}")))??;
    Ok(Json(outcome))
}

/// Record a save result on the page the ticket refers to.
async fn apply_save_result(
    sessions: &EditorSessions,
    ticket: PageTicket,
    result: Result<SaveOutcome, SaveError>,
) -> AppResult<SaveOutcome> {
    match result {
        Ok(outcome) => {
            let applied = sessions
                .finish(ticket, |page| {
                    page.site_id = Some(outcome.site_id);
                    page.transcript.mark_persisted(&outcome.persisted_turns)
                })
                .await;
            if let Some(Err(e)) = applied {
                return Err(AppError::Core(e));
            }
            Ok(outcome)
        }
        Err(e) => {
            let created = match &e {
                SaveError::Persistence { site_id, .. } => *site_id,
                _ => None,
            };
            sessions
                .finish(ticket, |page| {
                    if created.is_some() {
                        page.site_id = created;
                    }
                })
                .await;
            Err(e.into())
        }
    }
}

/// GET /api/v1/editor/sessions/{id}/preview
///
/// Sanitized rendering of the active page.
pub async fn preview(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let view = state.editor_sessions.view(id, auth_user.user_id).await?;
    let page = view.project.active_page();
    Ok(html_preview(&sanitize(&page.html, &page.css)))
}
