//! Repository for the `websites` table.
//!
//! Every lookup and update is scoped by owner so one user can never read or
//! overwrite another user's site.

use sqlx::PgPool;
use sitesmith_core::types::DbId;

use crate::models::website::{CreateWebsite, Website, WebsiteSummary};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, name, html, css, created_at, updated_at";

pub struct WebsiteRepo;

impl WebsiteRepo {
    /// Insert a new website, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateWebsite<'_>) -> Result<Website, sqlx::Error> {
        let query = format!(
            "INSERT INTO websites (user_id, name, html, css)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Website>(&query)
            .bind(input.user_id)
            .bind(input.name)
            .bind(input.html)
            .bind(input.css)
            .fetch_one(pool)
            .await
    }

    /// Replace html/css of a site owned by `user_id`.
    ///
    /// Returns `None` if no such site belongs to the user.
    pub async fn update_content(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        html: &str,
        css: &str,
    ) -> Result<Option<Website>, sqlx::Error> {
        let query = format!(
            "UPDATE websites SET html = $3, css = $4
             WHERE id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Website>(&query)
            .bind(id)
            .bind(user_id)
            .bind(html)
            .bind(css)
            .fetch_optional(pool)
            .await
    }

    /// Find a site by id, scoped to its owner.
    pub async fn find_for_user(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Website>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM websites WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Website>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's sites, most recently created first.
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<WebsiteSummary>, sqlx::Error> {
        sqlx::query_as::<_, WebsiteSummary>(
            "SELECT id, name, created_at, updated_at FROM websites
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
