//! Credit-gated save workflow.
//!
//! Saving a page runs a strictly ordered sequence against a [`SaveStore`]:
//!
//! 1. authenticate the session owner,
//! 2. atomically deduct [`SAVE_COST`] credits,
//! 3. insert or update the site row,
//! 4. insert the transcript turns that have no id yet, in order.
//!
//! A failure in step 1 or 2 halts before any write. A failure in step 3 or 4
//! happens after the credit is spent, so the workflow issues a compensating
//! refund and reports the outcome in [`SaveError::Persistence`]. No step is
//! retried automatically.

use async_trait::async_trait;
use serde::Serialize;

use crate::chat::ChatTurn;
use crate::credits::SAVE_COST;
use crate::project::Page;
use crate::types::DbId;

/// Name given to a site whose transcript has no user message.
pub const UNTITLED_SITE_NAME: &str = "Untitled";

/// Maximum length of a site name derived from the first user message.
pub const MAX_SITE_NAME_LENGTH: usize = 100;

// ---------------------------------------------------------------------------
// Store seam
// ---------------------------------------------------------------------------

/// Result of an atomic decrement-if-sufficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deduction {
    Applied { remaining: i32 },
    Insufficient,
}

/// Failure reported by a [`SaveStore`] backend.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct StoreError(pub String);

/// Values for a newly inserted site row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSite<'a> {
    pub name: String,
    pub html: &'a str,
    pub css: &'a str,
}

/// Persistence operations the save workflow depends on.
///
/// `deduct_credits` must be a single atomic decrement-if-sufficient in the
/// backing store, never a read followed by a write, so concurrent saves for
/// the same user serialize in the store.
#[async_trait]
pub trait SaveStore: Send + Sync {
    async fn has_active_session(&self, owner_id: DbId) -> Result<bool, StoreError>;

    async fn deduct_credits(&self, owner_id: DbId, amount: i32) -> Result<Deduction, StoreError>;

    /// Return previously deducted credits. Returns the new balance.
    async fn refund_credits(&self, owner_id: DbId, amount: i32) -> Result<i32, StoreError>;

    /// Insert a site owned by `owner_id`, returning its id.
    async fn insert_site(&self, owner_id: DbId, site: &NewSite<'_>) -> Result<DbId, StoreError>;

    /// Update html/css of an existing site. Returns `false` when no site
    /// with `site_id` belongs to `owner_id`.
    async fn update_site(
        &self,
        owner_id: DbId,
        site_id: DbId,
        html: &str,
        css: &str,
    ) -> Result<bool, StoreError>;

    /// Insert `turns` in order as one unit, returning the persisted rows.
    async fn insert_turns(
        &self,
        owner_id: DbId,
        site_id: DbId,
        turns: &[ChatTurn],
    ) -> Result<Vec<ChatTurn>, StoreError>;
}

// ---------------------------------------------------------------------------
// Outcome / errors
// ---------------------------------------------------------------------------

/// A completed save.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveOutcome {
    pub site_id: DbId,
    /// Whether this save created the site row.
    pub created: bool,
    /// Rows inserted for previously unsaved turns, in transcript order.
    pub persisted_turns: Vec<ChatTurn>,
    pub credits_remaining: i32,
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("No active session")]
    Unauthenticated,

    #[error("Session lookup failed: {0}")]
    SessionLookup(String),

    #[error("Not enough credits to save")]
    InsufficientCredits,

    #[error("Credit deduction failed: {0}")]
    Deduction(String),

    /// Writing the site or its turns failed after the credit was deducted.
    ///
    /// `site_id` is set when a new site row was already inserted.
    /// `refunded` reports whether the compensating refund succeeded.
    #[error("Saving failed: {message}")]
    Persistence {
        message: String,
        site_id: Option<DbId>,
        refunded: bool,
    },
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// Default site name: the first user message, shortened, or [`UNTITLED_SITE_NAME`].
pub fn default_site_name(page: &Page) -> String {
    match page.transcript.first_user_message().map(str::trim) {
        Some(msg) if !msg.is_empty() => msg.chars().take(MAX_SITE_NAME_LENGTH).collect(),
        _ => UNTITLED_SITE_NAME.to_string(),
    }
}

/// Save `page` for the session owner.
///
/// `session_user_id` is the user of the caller's session, `None` when the
/// caller has none. `site_id` selects update-in-place; `None` creates a site.
pub async fn save_page(
    store: &dyn SaveStore,
    session_user_id: Option<DbId>,
    site_id: Option<DbId>,
    page: &Page,
) -> Result<SaveOutcome, SaveError> {
    // 1. Authenticate.
    let owner_id = session_user_id.ok_or(SaveError::Unauthenticated)?;
    let active = store
        .has_active_session(owner_id)
        .await
        .map_err(|e| SaveError::SessionLookup(e.to_string()))?;
    if !active {
        return Err(SaveError::Unauthenticated);
    }

    // 2. Deduct credit.
    let credits_remaining = match store.deduct_credits(owner_id, SAVE_COST).await {
        Ok(Deduction::Applied { remaining }) => remaining,
        Ok(Deduction::Insufficient) => {
            tracing::info!(user_id = owner_id, "Save rejected: insufficient credits");
            return Err(SaveError::InsufficientCredits);
        }
        Err(e) => {
            tracing::error!(user_id = owner_id, error = %e, "Credit deduction failed");
            return Err(SaveError::Deduction(e.to_string()));
        }
    };

    // 3 + 4. Persist, refunding on failure.
    match persist(store, owner_id, site_id, page).await {
        Ok((site_id, created, persisted_turns)) => {
            tracing::info!(
                user_id = owner_id,
                site_id,
                created,
                inserted_turns = persisted_turns.len(),
                credits_remaining,
                "Page saved"
            );
            Ok(SaveOutcome {
                site_id,
                created,
                persisted_turns,
                credits_remaining,
            })
        }
        Err((message, new_site_id)) => {
            let refunded = match store.refund_credits(owner_id, SAVE_COST).await {
                Ok(balance) => {
                    tracing::warn!(user_id = owner_id, balance, error = %message, "Save failed, credit refunded");
                    true
                }
                Err(e) => {
                    tracing::error!(
                        user_id = owner_id,
                        error = %message,
                        refund_error = %e,
                        "Save failed and credit refund failed"
                    );
                    false
                }
            };
            Err(SaveError::Persistence {
                message,
                site_id: new_site_id,
                refunded,
            })
        }
    }
}

/// Steps 3 and 4. On error, returns the message and the id of a site row
/// inserted by this call, if any.
async fn persist(
    store: &dyn SaveStore,
    owner_id: DbId,
    site_id: Option<DbId>,
    page: &Page,
) -> Result<(DbId, bool, Vec<ChatTurn>), (String, Option<DbId>)> {
    let (site_id, created) = match site_id {
        None => {
            let site = NewSite {
                name: default_site_name(page),
                html: &page.html,
                css: &page.css,
            };
            let id = store
                .insert_site(owner_id, &site)
                .await
                .map_err(|e| (format!("Failed to create site: {e}"), None))?;
            (id, true)
        }
        Some(id) => {
            let updated = store
                .update_site(owner_id, id, &page.html, &page.css)
                .await
                .map_err(|e| (format!("Failed to update site {id}: {e}"), None))?;
            if !updated {
                return Err((format!("Site {id} not found"), None));
            }
            (id, false)
        }
    };

    let unsaved: Vec<ChatTurn> = page.transcript.unsaved().cloned().collect();
    let persisted = if unsaved.is_empty() {
        Vec::new()
    } else {
        store
            .insert_turns(owner_id, site_id, &unsaved)
            .await
            .map_err(|e| {
                (
                    format!("Failed to save chat history: {e}"),
                    created.then_some(site_id),
                )
            })?
    };

    Ok((site_id, created, persisted))
}
