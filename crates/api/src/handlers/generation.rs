//! Handlers for stateless generation and preview.

use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use sitesmith_core::chat::{ChatTurn, Transcript};
use sitesmith_core::error::CoreError;
use sitesmith_core::sanitize::{sanitize, SafeMarkup};
use sitesmith_core::types::DbId;
use sitesmith_db::repositories::{WebsiteChatRepo, WebsiteRepo};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::extract::ValidJson;
use crate::handlers::html_preview;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Request body for `POST /generate-site`.
///
/// `prompt` is a shorthand for a transcript with a single user turn; it is
/// used only when `chat` is empty.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateSiteRequest {
    #[serde(default)]
    #[validate(length(max = 500))]
    pub chat: Vec<ChatTurn>,
    pub prompt: Option<String>,
    #[serde(rename = "websiteId", alias = "website_id")]
    pub website_id: Option<DbId>,
}

#[derive(Debug, Serialize)]
pub struct GenerateSiteResponse {
    pub html: String,
    pub css: String,
}

/// Request body for `POST /preview`.
#[derive(Debug, Deserialize, Validate)]
pub struct PreviewRequest {
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub css: String,
}

/// POST /api/v1/generate-site
///
/// Run one generation over the supplied transcript. With `websiteId`, the
/// newest user turn (if not yet stored) and the reply are appended to that
/// site's chat history.
pub async fn generate_site(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidJson(input): ValidJson<GenerateSiteRequest>,
) -> AppResult<Json<GenerateSiteResponse>> {
    let mut transcript = if input.chat.is_empty() {
        let mut transcript = Transcript::new();
        if let Some(prompt) = input.prompt {
            transcript.push_user(prompt)?;
        }
        transcript
    } else {
        Transcript::from_turns(input.chat)
    };

    if let Some(site_id) = input.website_id {
        WebsiteRepo::find_for_user(&state.pool, site_id, auth_user.user_id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "Website",
                id: site_id,
            }))?;
    }

    let site = state.generator.generate(&mut transcript).await?;

    if let Some(site_id) = input.website_id {
        let turns = newest_exchange(&transcript);
        let rows =
            WebsiteChatRepo::insert_many(&state.pool, site_id, auth_user.user_id, &turns).await?;
        tracing::debug!(site_id, inserted = rows.len(), "Chat exchange persisted");
    }

    Ok(Json(GenerateSiteResponse {
        html: site.html,
        css: site.css,
    }))
}

/// POST /api/v1/preview
pub async fn preview(ValidJson(input): ValidJson<PreviewRequest>) -> Json<SafeMarkup> {
    Json(sanitize(&input.html, &input.css))
}

/// POST /api/v1/preview/html
pub async fn preview_html(ValidJson(input): ValidJson<PreviewRequest>) -> Response {
    html_preview(&sanitize(&input.html, &input.css))
}

/// The newest user turn, when unsaved, followed by the assistant reply.
fn newest_exchange(transcript: &Transcript) -> Vec<ChatTurn> {
    let mut turns = Vec::with_capacity(2);
    if let Some(user) = transcript.last_user_turn().filter(|t| !t.is_persisted()) {
        turns.push(user.clone());
    }
    if let Some(reply) = transcript.last() {
        turns.push(reply.clone());
    }
    turns
}

#[cfg(test)]
mod tests {
    use sitesmith_core::chat::Role;

    use super::*;

    #[test]
    fn newest_exchange_skips_already_stored_user_turn() {
        let now = chrono::Utc::now();
        let mut transcript = Transcript::from_turns(vec![ChatTurn::persisted(
            1,
            Role::User,
            "bakery".into(),
            now,
        )]);
        transcript.push_assistant("<h1>Bakery</h1>");

        let turns = newest_exchange(&transcript);

        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role(), Role::Assistant);
    }

    #[test]
    fn newest_exchange_takes_user_turn_and_reply() {
        let mut transcript = Transcript::new();
        transcript.push_user("first").unwrap();
        transcript.push_assistant("<p>1</p>");
        transcript.push_user("second").unwrap();
        transcript.push_assistant("<p>2</p>");

        let turns = newest_exchange(&transcript);

        let messages: Vec<_> = turns.iter().map(|t| t.message()).collect();
        assert_eq!(messages, vec!["second", "<p>2</p>"]);
    }
}
