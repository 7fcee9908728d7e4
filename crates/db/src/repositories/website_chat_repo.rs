//! Repository for the `website_chats` table.

use sqlx::PgPool;
use sitesmith_core::chat::ChatTurn;
use sitesmith_core::types::DbId;

use crate::models::website_chat::WebsiteChat;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, website_id, user_id, role, message, created_at";

pub struct WebsiteChatRepo;

impl WebsiteChatRepo {
    /// Insert `turns` in order inside one transaction.
    ///
    /// Either every turn is stored or none is. Returned rows are in the
    /// same order as `turns`.
    pub async fn insert_many(
        pool: &PgPool,
        website_id: DbId,
        user_id: DbId,
        turns: &[ChatTurn],
    ) -> Result<Vec<WebsiteChat>, sqlx::Error> {
        let query = format!(
            "INSERT INTO website_chats (website_id, user_id, role, message)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );

        let mut tx = pool.begin().await?;
        let mut rows = Vec::with_capacity(turns.len());
        for turn in turns {
            let row = sqlx::query_as::<_, WebsiteChat>(&query)
                .bind(website_id)
                .bind(user_id)
                .bind(turn.role().as_str())
                .bind(turn.message())
                .fetch_one(&mut *tx)
                .await?;
            rows.push(row);
        }
        tx.commit().await?;

        Ok(rows)
    }

    /// A site's chat history in transcript (insertion) order.
    pub async fn list_by_website(
        pool: &PgPool,
        website_id: DbId,
    ) -> Result<Vec<WebsiteChat>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM website_chats WHERE website_id = $1 ORDER BY id");
        sqlx::query_as::<_, WebsiteChat>(&query)
            .bind(website_id)
            .fetch_all(pool)
            .await
    }
}
