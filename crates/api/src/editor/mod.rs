//! Server-held editor sessions.
//!
//! Each session owns one user's [`Project`]. A page is marked busy while a
//! generation call or a save is outstanding for it; a second request for
//! that page is rejected with a conflict instead of being queued. The mark
//! belongs to a [`PageTicket`] and is cleared when the ticket is dropped, so
//! a request cancelled by a timeout or a disconnect never leaves its page
//! locked. The registry lock is never held across an await on the model or
//! database.
//!
//! Sessions untouched for longer than the idle timeout are evicted, either
//! by the periodic sweep ([`sweep::start_idle_sweep`]) or on the next access.
//! A user keeps at most [`MAX_SESSIONS_PER_OWNER`] sessions; creating one
//! more drops that user's least recently used idle session.

pub mod sweep;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{Duration, Utc};
use serde::Serialize;
use sitesmith_core::chat::Transcript;
use sitesmith_core::error::CoreError;
use sitesmith_core::project::{Page, Project};
use sitesmith_core::types::{DbId, PageId, Timestamp};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Idle time after which a session is evicted (default for
/// `EDITOR_IDLE_TIMEOUT_MINS`).
pub const DEFAULT_IDLE_TIMEOUT_MINS: i64 = 120;

/// Live sessions one user may hold at a time.
pub const MAX_SESSIONS_PER_OWNER: usize = 10;

type BusySet = HashSet<(Uuid, PageId)>;

/// One user's editing session.
#[derive(Debug)]
pub struct EditorSession {
    pub owner_id: DbId,
    pub project: Project,
    pub created_at: Timestamp,
    /// Refreshed by every operation on the session.
    pub last_access: Timestamp,
}

/// Serialized view of a session returned by the editor endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct EditorSessionView {
    pub id: Uuid,
    #[serde(flatten)]
    pub project: Project,
    /// Pages with an outstanding generation or save.
    pub busy_page_ids: Vec<PageId>,
    pub created_at: Timestamp,
    pub last_access: Timestamp,
}

/// A page checked out for a long-running operation.
///
/// While the ticket lives, the page is busy. Dropping it releases the page
/// whether or not [`EditorSessions::finish`] was reached.
#[derive(Debug)]
pub struct PageTicket {
    registry: Arc<EditorSessions>,
    pub session_id: Uuid,
    pub page_id: PageId,
}

impl Drop for PageTicket {
    fn drop(&mut self) {
        self.registry
            .busy()
            .remove(&(self.session_id, self.page_id));
    }
}

/// Registry of live editor sessions, keyed by session id.
#[derive(Debug)]
pub struct EditorSessions {
    sessions: RwLock<HashMap<Uuid, EditorSession>>,
    /// `(session, page)` pairs with an outstanding operation. Kept behind a
    /// sync lock so [`PageTicket`] can release it from `Drop`.
    busy: Mutex<BusySet>,
    idle_timeout: Duration,
}

impl Default for EditorSessions {
    fn default() -> Self {
        Self::with_idle_timeout(Duration::minutes(DEFAULT_IDLE_TIMEOUT_MINS))
    }
}

impl EditorSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            busy: Mutex::new(HashSet::new()),
            idle_timeout,
        }
    }

    /// Register a session for `owner_id` around `project`.
    ///
    /// Evicts idle sessions first, then the owner's least recently used
    /// sessions beyond [`MAX_SESSIONS_PER_OWNER`].
    pub async fn create(&self, owner_id: DbId, project: Project) -> EditorSessionView {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let session = EditorSession {
            owner_id,
            project,
            created_at: now,
            last_access: now,
        };

        let mut sessions = self.sessions.write().await;
        let (idle, over_cap) = {
            let busy = self.busy();
            (
                self.sweep(&mut sessions, &busy, now),
                evict_over_cap(&mut sessions, &busy, owner_id),
            )
        };
        if idle + over_cap > 0 {
            tracing::debug!(idle, over_cap, "Editor sessions evicted");
        }

        let view = self.view_of(id, &session);
        sessions.insert(id, session);
        tracing::debug!(session_id = %id, user_id = owner_id, "Editor session created");
        view
    }

    /// Snapshot of a session owned by `owner_id`.
    pub async fn view(&self, id: Uuid, owner_id: DbId) -> Result<EditorSessionView, CoreError> {
        let mut sessions = self.sessions.write().await;
        let session = self.live(&mut sessions, id, owner_id)?;
        Ok(self.view_of(id, session))
    }

    /// Drop a session. Outstanding operations finish against nothing.
    pub async fn remove(&self, id: Uuid, owner_id: DbId) -> Result<(), CoreError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get(&id) {
            Some(s) if s.owner_id == owner_id => {}
            _ => return Err(CoreError::SessionNotFound(id)),
        }
        sessions.remove(&id);
        tracing::debug!(session_id = %id, user_id = owner_id, "Editor session removed");
        Ok(())
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Evict every session idle at `now`. Sessions with a busy page are kept.
    pub async fn evict_idle_at(&self, now: Timestamp) -> usize {
        let mut sessions = self.sessions.write().await;
        let busy = self.busy();
        self.sweep(&mut sessions, &busy, now)
    }

    pub async fn evict_idle(&self) -> usize {
        self.evict_idle_at(Utc::now()).await
    }

    /// Apply a synchronous change to a session's project and return the
    /// resulting snapshot.
    pub async fn update<F>(
        &self,
        id: Uuid,
        owner_id: DbId,
        change: F,
    ) -> Result<EditorSessionView, CoreError>
    where
        F: FnOnce(&mut Project) -> Result<(), CoreError>,
    {
        let mut sessions = self.sessions.write().await;
        let session = self.live(&mut sessions, id, owner_id)?;
        change(&mut session.project)?;
        Ok(self.view_of(id, session))
    }

    /// Append a user message to the active page and check the page out
    /// for generation.
    ///
    /// Returns the ticket and the transcript to generate from, which ends
    /// with the new user turn. The turn stays in the transcript even if
    /// generation later fails.
    pub async fn begin_message(
        self: &Arc<Self>,
        id: Uuid,
        owner_id: DbId,
        message: &str,
    ) -> Result<(PageTicket, Transcript), CoreError> {
        let mut sessions = self.sessions.write().await;
        let session = self.live(&mut sessions, id, owner_id)?;
        let page_id = session.project.active_page_id();

        let mut busy = self.busy();
        ensure_idle(&busy, id, page_id)?;
        let page = session.project.active_page_mut();
        page.transcript.push_user(message)?;
        let transcript = page.transcript.clone();
        busy.insert((id, page_id));
        drop(busy);

        Ok((self.ticket(id, page_id), transcript))
    }

    /// Check the active page out for saving. Returns a copy to persist.
    pub async fn begin_save(
        self: &Arc<Self>,
        id: Uuid,
        owner_id: DbId,
    ) -> Result<(PageTicket, Page), CoreError> {
        let mut sessions = self.sessions.write().await;
        let session = self.live(&mut sessions, id, owner_id)?;
        let page_id = session.project.active_page_id();

        let mut busy = self.busy();
        ensure_idle(&busy, id, page_id)?;
        let page = session.project.active_page().clone();
        busy.insert((id, page_id));
        drop(busy);

        Ok((self.ticket(id, page_id), page))
    }

    /// Apply `apply` to the ticket's page if both the session and the page
    /// still exist, then release the ticket.
    ///
    /// Returns `None` if the page was deleted (or its session removed)
    /// while the operation ran.
    pub async fn finish<F, R>(&self, ticket: PageTicket, apply: F) -> Option<R>
    where
        F: FnOnce(&mut Page) -> R,
    {
        let result = {
            let mut sessions = self.sessions.write().await;
            sessions
                .get_mut(&ticket.session_id)
                .and_then(|session| {
                    session.last_access = Utc::now();
                    session.project.page_mut(ticket.page_id)
                })
                .map(apply)
        };
        if result.is_none() {
            tracing::warn!(
                session_id = %ticket.session_id,
                page_id = %ticket.page_id,
                "Page removed while an operation was in flight"
            );
        }
        drop(ticket);
        result
    }

    // ---- private helpers ----

    fn busy(&self) -> MutexGuard<'_, BusySet> {
        self.busy.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ticket(self: &Arc<Self>, session_id: Uuid, page_id: PageId) -> PageTicket {
        PageTicket {
            registry: Arc::clone(self),
            session_id,
            page_id,
        }
    }

    /// The session `id` if `owner_id` owns it and it has not expired.
    ///
    /// Sessions owned by someone else are reported as missing. An expired
    /// session is removed on the spot; a live one has its access time
    /// refreshed.
    fn live<'a>(
        &self,
        sessions: &'a mut HashMap<Uuid, EditorSession>,
        id: Uuid,
        owner_id: DbId,
    ) -> Result<&'a mut EditorSession, CoreError> {
        let now = Utc::now();
        let expired = match sessions.get(&id) {
            Some(s) if s.owner_id == owner_id => {
                now - s.last_access > self.idle_timeout && !has_busy_page(&self.busy(), id)
            }
            _ => return Err(CoreError::SessionNotFound(id)),
        };
        if expired {
            sessions.remove(&id);
            tracing::debug!(session_id = %id, "Expired editor session evicted on access");
            return Err(CoreError::SessionNotFound(id));
        }

        let session = sessions
            .get_mut(&id)
            .ok_or(CoreError::SessionNotFound(id))?;
        session.last_access = now;
        Ok(session)
    }

    fn sweep(
        &self,
        sessions: &mut HashMap<Uuid, EditorSession>,
        busy: &BusySet,
        now: Timestamp,
    ) -> usize {
        let before = sessions.len();
        sessions.retain(|id, s| now - s.last_access <= self.idle_timeout || has_busy_page(busy, *id));
        before - sessions.len()
    }

    fn view_of(&self, id: Uuid, session: &EditorSession) -> EditorSessionView {
        let mut busy_page_ids: Vec<PageId> = self
            .busy()
            .iter()
            .filter(|(session_id, _)| *session_id == id)
            .map(|(_, page_id)| *page_id)
            .collect();
        busy_page_ids.sort();
        EditorSessionView {
            id,
            project: session.project.clone(),
            busy_page_ids,
            created_at: session.created_at,
            last_access: session.last_access,
        }
    }
}

fn ensure_idle(busy: &BusySet, id: Uuid, page_id: PageId) -> Result<(), CoreError> {
    if busy.contains(&(id, page_id)) {
        return Err(CoreError::Conflict(
            "A request for this page is already in progress".to_string(),
        ));
    }
    Ok(())
}

fn has_busy_page(busy: &BusySet, id: Uuid) -> bool {
    busy.iter().any(|(session_id, _)| *session_id == id)
}

/// Make room for one more session of `owner_id` by dropping its least
/// recently used idle sessions.
fn evict_over_cap(
    sessions: &mut HashMap<Uuid, EditorSession>,
    busy: &BusySet,
    owner_id: DbId,
) -> usize {
    let owned = sessions.values().filter(|s| s.owner_id == owner_id).count();
    if owned < MAX_SESSIONS_PER_OWNER {
        return 0;
    }

    let mut candidates: Vec<(Timestamp, Uuid)> = sessions
        .iter()
        .filter(|(id, s)| s.owner_id == owner_id && !has_busy_page(busy, **id))
        .map(|(id, s)| (s.last_access, *id))
        .collect();
    candidates.sort();

    let excess = owned + 1 - MAX_SESSIONS_PER_OWNER;
    let mut evicted = 0;
    for (_, id) in candidates.into_iter().take(excess) {
        sessions.remove(&id);
        evicted += 1;
    }
    evicted
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const OWNER: DbId = 1;

    fn registry() -> Arc<EditorSessions> {
        Arc::new(EditorSessions::new())
    }

    #[tokio::test]
    async fn second_message_to_busy_page_is_a_conflict() {
        let sessions = registry();
        let view = sessions.create(OWNER, Project::new()).await;

        let (ticket, transcript) = sessions.begin_message(view.id, OWNER, "a bakery").await.unwrap();
        assert_eq!(transcript.len(), 1);

        assert_matches!(
            sessions.begin_message(view.id, OWNER, "again").await,
            Err(CoreError::Conflict(_))
        );
        assert_matches!(sessions.begin_save(view.id, OWNER).await, Err(CoreError::Conflict(_)));

        sessions
            .finish(ticket, |page| {
                page.transcript.push_assistant("<h1>Bakery</h1>");
            })
            .await
            .unwrap();

        assert!(sessions.begin_message(view.id, OWNER, "again").await.is_ok());
    }

    #[tokio::test]
    async fn dropping_a_ticket_releases_the_page() {
        let sessions = registry();
        let view = sessions.create(OWNER, Project::new()).await;
        let page_id = view.project.active_page_id();

        let (ticket, _) = sessions.begin_message(view.id, OWNER, "a bakery").await.unwrap();
        assert_eq!(
            sessions.view(view.id, OWNER).await.unwrap().busy_page_ids,
            vec![page_id]
        );

        drop(ticket);

        assert!(sessions.view(view.id, OWNER).await.unwrap().busy_page_ids.is_empty());
        assert!(sessions.begin_save(view.id, OWNER).await.is_ok());
    }

    #[tokio::test]
    async fn other_pages_stay_available_while_one_is_busy() {
        let sessions = registry();
        let view = sessions.create(OWNER, Project::new()).await;
        let (_ticket, _) = sessions.begin_message(view.id, OWNER, "home").await.unwrap();

        sessions
            .update(view.id, OWNER, |project| {
                project.add_page();
                Ok(())
            })
            .await
            .unwrap();

        assert!(sessions.begin_message(view.id, OWNER, "second page").await.is_ok());
    }

    #[tokio::test]
    async fn finishing_after_page_delete_is_harmless() {
        let sessions = registry();
        let view = sessions.create(OWNER, Project::new()).await;
        sessions
            .update(view.id, OWNER, |project| {
                project.add_page();
                Ok(())
            })
            .await
            .unwrap();
        let (ticket, _) = sessions.begin_message(view.id, OWNER, "about page").await.unwrap();
        let doomed = ticket.page_id;
        sessions
            .update(view.id, OWNER, |project| project.delete_page(doomed))
            .await
            .unwrap();

        assert!(sessions.finish(ticket, |_| ()).await.is_none());
        let after = sessions.view(view.id, OWNER).await.unwrap();
        assert_eq!(after.project.len(), 1);
        assert!(after.busy_page_ids.is_empty());
    }

    #[tokio::test]
    async fn sessions_are_private_to_their_owner() {
        let sessions = registry();
        let view = sessions.create(OWNER, Project::new()).await;

        assert!(sessions.view(view.id, OWNER + 1).await.is_err());
        assert!(sessions.remove(view.id, OWNER + 1).await.is_err());
        assert!(sessions.remove(view.id, OWNER).await.is_ok());
        assert!(sessions.is_empty().await);
    }

    #[tokio::test]
    async fn blank_message_is_rejected_without_marking_busy() {
        let sessions = registry();
        let view = sessions.create(OWNER, Project::new()).await;

        assert_matches!(
            sessions.begin_message(view.id, OWNER, "   ").await,
            Err(CoreError::Validation(_))
        );
        let after = sessions.view(view.id, OWNER).await.unwrap();
        assert!(after.busy_page_ids.is_empty());
        assert!(after.project.active_page().transcript.is_empty());
    }

    #[tokio::test]
    async fn idle_sessions_are_evicted() {
        let sessions = Arc::new(EditorSessions::with_idle_timeout(Duration::minutes(30)));
        let stale = sessions.create(OWNER, Project::new()).await;
        let later = stale.last_access + Duration::minutes(31);

        assert_eq!(sessions.evict_idle_at(stale.last_access).await, 0);
        assert_eq!(sessions.evict_idle_at(later).await, 1);
        assert!(sessions.is_empty().await);
        assert_matches!(
            sessions.view(stale.id, OWNER).await,
            Err(CoreError::SessionNotFound(_))
        );
    }

    #[tokio::test]
    async fn sessions_with_a_busy_page_survive_the_sweep() {
        let sessions = Arc::new(EditorSessions::with_idle_timeout(Duration::minutes(30)));
        let view = sessions.create(OWNER, Project::new()).await;
        let (ticket, _) = sessions.begin_message(view.id, OWNER, "slow model").await.unwrap();
        let later = view.last_access + Duration::hours(5);

        assert_eq!(sessions.evict_idle_at(later).await, 0);

        drop(ticket);
        assert_eq!(sessions.evict_idle_at(later).await, 1);
    }

    #[tokio::test]
    async fn expired_session_is_gone_on_access() {
        let sessions = Arc::new(EditorSessions::with_idle_timeout(Duration::zero()));
        let view = sessions.create(OWNER, Project::new()).await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        assert_matches!(
            sessions.view(view.id, OWNER).await,
            Err(CoreError::SessionNotFound(_))
        );
        assert!(sessions.is_empty().await);
    }

    #[tokio::test]
    async fn owner_cap_drops_least_recently_used_session() {
        let sessions = registry();
        let oldest = sessions.create(OWNER, Project::new()).await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        for _ in 1..MAX_SESSIONS_PER_OWNER {
            sessions.create(OWNER, Project::new()).await;
        }
        let other_user = sessions.create(OWNER + 1, Project::new()).await;
        assert_eq!(sessions.len().await, MAX_SESSIONS_PER_OWNER + 1);

        sessions.create(OWNER, Project::new()).await;

        assert_eq!(sessions.len().await, MAX_SESSIONS_PER_OWNER + 1);
        assert!(sessions.view(oldest.id, OWNER).await.is_err());
        assert!(sessions.view(other_user.id, OWNER + 1).await.is_ok());
    }
}
