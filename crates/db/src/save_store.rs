//! PostgreSQL implementation of [`SaveStore`].

use async_trait::async_trait;
use sitesmith_core::chat::ChatTurn;
use sitesmith_core::save::{Deduction, NewSite, SaveStore, StoreError};
use sitesmith_core::types::DbId;

use crate::models::website::CreateWebsite;
use crate::repositories::{SessionRepo, UserRepo, WebsiteChatRepo, WebsiteRepo};
use crate::DbPool;

/// Save workflow backend over the shared connection pool.
///
/// Bound to the sign-in session the request was authenticated with; the
/// save gate passes only while that session is live.
#[derive(Clone)]
pub struct PgSaveStore {
    pool: DbPool,
    session_id: DbId,
}

impl PgSaveStore {
    pub fn new(pool: DbPool, session_id: DbId) -> Self {
        Self { pool, session_id }
    }
}

fn store_err(e: sqlx::Error) -> StoreError {
    StoreError(e.to_string())
}

#[async_trait]
impl SaveStore for PgSaveStore {
    async fn has_active_session(&self, owner_id: DbId) -> Result<bool, StoreError> {
        SessionRepo::is_live(&self.pool, self.session_id, owner_id)
            .await
            .map_err(store_err)
    }

    async fn deduct_credits(&self, owner_id: DbId, amount: i32) -> Result<Deduction, StoreError> {
        let remaining = UserRepo::deduct_credits(&self.pool, owner_id, amount)
            .await
            .map_err(store_err)?;
        Ok(match remaining {
            Some(remaining) => Deduction::Applied { remaining },
            None => Deduction::Insufficient,
        })
    }

    async fn refund_credits(&self, owner_id: DbId, amount: i32) -> Result<i32, StoreError> {
        UserRepo::refund_credits(&self.pool, owner_id, amount)
            .await
            .map_err(store_err)?
            .ok_or_else(|| StoreError(format!("User {owner_id} not found")))
    }

    async fn insert_site(&self, owner_id: DbId, site: &NewSite<'_>) -> Result<DbId, StoreError> {
        let input = CreateWebsite {
            user_id: owner_id,
            name: &site.name,
            html: site.html,
            css: site.css,
        };
        let website = WebsiteRepo::create(&self.pool, &input)
            .await
            .map_err(store_err)?;
        Ok(website.id)
    }

    async fn update_site(
        &self,
        owner_id: DbId,
        site_id: DbId,
        html: &str,
        css: &str,
    ) -> Result<bool, StoreError> {
        let updated = WebsiteRepo::update_content(&self.pool, site_id, owner_id, html, css)
            .await
            .map_err(store_err)?;
        Ok(updated.is_some())
    }

    async fn insert_turns(
        &self,
        owner_id: DbId,
        site_id: DbId,
        turns: &[ChatTurn],
    ) -> Result<Vec<ChatTurn>, StoreError> {
        let rows = WebsiteChatRepo::insert_many(&self.pool, site_id, owner_id, turns)
            .await
            .map_err(store_err)?;
        tracing::debug!(site_id, inserted = rows.len(), "Chat turns inserted");
        rows.into_iter()
            .map(|row| ChatTurn::try_from(row).map_err(|e| StoreError(e.to_string())))
            .collect()
    }
}
