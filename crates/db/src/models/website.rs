//! Saved website model.

use serde::Serialize;
use sqlx::FromRow;
use sitesmith_core::types::{DbId, Timestamp};

/// A row from the `websites` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Website {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub html: String,
    pub css: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Listing projection without the generated markup.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WebsiteSummary {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a website.
#[derive(Debug)]
pub struct CreateWebsite<'a> {
    pub user_id: DbId,
    pub name: &'a str,
    pub html: &'a str,
    pub css: &'a str,
}
