//! Persisted chat turn model.

use sqlx::FromRow;
use sitesmith_core::chat::{ChatTurn, Role};
use sitesmith_core::error::CoreError;
use sitesmith_core::types::{DbId, Timestamp};

/// A row from the `website_chats` table.
#[derive(Debug, Clone, FromRow)]
pub struct WebsiteChat {
    pub id: DbId,
    pub website_id: DbId,
    pub user_id: DbId,
    pub role: String,
    pub message: String,
    pub created_at: Timestamp,
}

impl TryFrom<WebsiteChat> for ChatTurn {
    type Error = CoreError;

    fn try_from(row: WebsiteChat) -> Result<Self, Self::Error> {
        let role: Role = row.role.parse()?;
        Ok(ChatTurn::persisted(row.id, role, row.message, row.created_at))
    }
}
