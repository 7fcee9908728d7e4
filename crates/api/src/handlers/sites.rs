//! Handlers for the `/sites` resource: saved websites and the save workflow.

use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use sitesmith_core::chat::ChatTurn;
use sitesmith_core::error::CoreError;
use sitesmith_core::project::Page;
use sitesmith_core::sanitize::sanitize;
use sitesmith_core::save::{save_page, SaveOutcome};
use sitesmith_core::types::DbId;
use sitesmith_db::models::website::{Website, WebsiteSummary};
use sitesmith_db::repositories::{WebsiteChatRepo, WebsiteRepo};
use sitesmith_db::save_store::PgSaveStore;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::extract::ValidJson;
use crate::handlers::html_preview;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Request body for `POST /sites/save`.
#[derive(Debug, Deserialize, Validate)]
pub struct SaveSiteRequest {
    /// Existing site to update. Falls back to `page.site_id`; with neither
    /// set, a new site is created.
    pub site_id: Option<DbId>,
    pub page: Page,
}

/// A saved site with its chat history in transcript order.
#[derive(Debug, Serialize)]
pub struct SiteDetail {
    #[serde(flatten)]
    pub site: Website,
    pub chat: Vec<ChatTurn>,
}

/// GET /api/v1/sites
pub async fn list(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<Vec<WebsiteSummary>>> {
    let sites = WebsiteRepo::list_by_user(&state.pool, auth_user.user_id).await?;
    Ok(Json(sites))
}

/// GET /api/v1/sites/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<SiteDetail>> {
    let (site, chat) = load_site(&state, id, auth_user.user_id).await?;
    Ok(Json(SiteDetail { site, chat }))
}

/// GET /api/v1/sites/{id}/preview
pub async fn preview(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    let site = find_site(&state, id, auth_user.user_id).await?;
    Ok(html_preview(&sanitize(&site.html, &site.css)))
}

/// POST /api/v1/sites/save
///
/// Spend one credit to persist a page. See [`save_page`] for the ordering
/// and refund guarantees. The workflow runs on its own task so a dropped
/// request cannot interrupt it between deduction and refund.
pub async fn save(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidJson(input): ValidJson<SaveSiteRequest>,
) -> AppResult<Json<SaveOutcome>> {
    let site_id = match (input.site_id, input.page.site_id) {
        (Some(top), Some(linked)) if top != linked => {
            return Err(AppError::Core(CoreError::Validation(format!(
                "site_id {top} does not match the page's site_id {linked}"
            ))));
        }
        (top, linked) => top.or(linked),
    };

    let store = PgSaveStore::new(state.pool.clone(), auth_user.session_id);
    let owner_id = auth_user.user_id;
    let page = input.page;
    let task = tokio::spawn(async move { save_page(&store, Some(owner_id), site_id, &page).await });
    let outcome = task
        .await
        .map_err(|e| AppError::InternalError(format!("Save task failed: {e}")))??;
    Ok(Json(outcome))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_site(state: &AppState, id: DbId, user_id: DbId) -> AppResult<Website> {
    WebsiteRepo::find_for_user(&state.pool, id, user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Website",
            id,
        }))
}

/// A site owned by `user_id` and its chat turns.
pub(crate) async fn load_site(
    state: &AppState,
    id: DbId,
    user_id: DbId,
) -> AppResult<(Website, Vec<ChatTurn>)> {
    let site = find_site(state, id, user_id).await?;
    let chat = WebsiteChatRepo::list_by_website(&state.pool, id)
        .await?
        .into_iter()
        .map(ChatTurn::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((site, chat))
}
