//! Chat transcript model.
//!
//! A [`Transcript`] is the ordered log of user/assistant turns for one page.
//! Its order is replayed as conversation context on every generation call,
//! so turns are only ever appended, never edited or reordered. The single
//! permitted transition on an existing turn is receiving its database id
//! once persisted (see [`Transcript::mark_persisted`]).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Maximum length of a user message in characters.
pub const MAX_USER_MESSAGE_LENGTH: usize = 20_000;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Author of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Database / wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(CoreError::Validation(format!(
                "Unknown chat role '{other}' (expected 'user' or 'assistant')"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// ChatTurn
// ---------------------------------------------------------------------------

/// A single immutable chat turn.
///
/// `id` and `created_at` are present once the turn has been persisted.
/// Deserialization goes through [`ChatTurn::new`] validation, so a malformed
/// payload is rejected at the boundary instead of at use-site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawChatTurn")]
pub struct ChatTurn {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<DbId>,
    role: Role,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at: Option<Timestamp>,
}

/// Unvalidated wire shape of a [`ChatTurn`].
#[derive(Deserialize)]
struct RawChatTurn {
    #[serde(default)]
    id: Option<DbId>,
    role: Role,
    message: String,
    #[serde(default)]
    created_at: Option<Timestamp>,
}

impl TryFrom<RawChatTurn> for ChatTurn {
    type Error = CoreError;

    fn try_from(raw: RawChatTurn) -> Result<Self, Self::Error> {
        let mut turn = ChatTurn::new(raw.role, raw.message)?;
        turn.id = raw.id;
        turn.created_at = raw.created_at;
        Ok(turn)
    }
}

impl ChatTurn {
    /// Create an unsaved turn.
    ///
    /// User messages must be non-blank and at most
    /// [`MAX_USER_MESSAGE_LENGTH`] characters. Assistant messages carry
    /// model output verbatim and may be empty (a reply consisting only of a
    /// style block leaves no HTML).
    pub fn new(role: Role, message: impl Into<String>) -> Result<Self, CoreError> {
        let message = message.into();
        if role == Role::User {
            if message.trim().is_empty() {
                return Err(CoreError::Validation(
                    "Chat message must not be empty".to_string(),
                ));
            }
            let len = message.chars().count();
            if len > MAX_USER_MESSAGE_LENGTH {
                return Err(CoreError::Validation(format!(
                    "Chat message exceeds maximum length of {MAX_USER_MESSAGE_LENGTH} characters (got {len})"
                )));
            }
        }
        Ok(Self {
            id: None,
            role,
            message,
            created_at: None,
        })
    }

    /// Create an unsaved user turn.
    pub fn user(message: impl Into<String>) -> Result<Self, CoreError> {
        Self::new(Role::User, message)
    }

    /// Create an unsaved assistant turn. Never fails.
    pub fn assistant(message: impl Into<String>) -> Self {
        Self {
            id: None,
            role: Role::Assistant,
            message: message.into(),
            created_at: None,
        }
    }

    /// Rebuild a turn loaded from the database.
    pub fn persisted(id: DbId, role: Role, message: String, created_at: Timestamp) -> Self {
        Self {
            id: Some(id),
            role,
            message,
            created_at: Some(created_at),
        }
    }

    pub fn id(&self) -> Option<DbId> {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn created_at(&self) -> Option<Timestamp> {
        self.created_at
    }

    /// Whether the turn already has a database row.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

// ---------------------------------------------------------------------------
// Transcript
// ---------------------------------------------------------------------------

/// Ordered, append-only sequence of chat turns for one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript(Vec<ChatTurn>);

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_turns(turns: Vec<ChatTurn>) -> Self {
        Self(turns)
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&ChatTurn> {
        self.0.last()
    }

    pub fn push(&mut self, turn: ChatTurn) {
        self.0.push(turn);
    }

    /// Validate and append a user message.
    pub fn push_user(&mut self, message: impl Into<String>) -> Result<&ChatTurn, CoreError> {
        self.0.push(ChatTurn::user(message)?);
        Ok(&self.0[self.0.len() - 1])
    }

    pub fn push_assistant(&mut self, message: impl Into<String>) -> &ChatTurn {
        self.0.push(ChatTurn::assistant(message));
        &self.0[self.0.len() - 1]
    }

    /// Turns without a database id, in transcript order.
    pub fn unsaved(&self) -> impl Iterator<Item = &ChatTurn> {
        self.0.iter().filter(|t| !t.is_persisted())
    }

    pub fn unsaved_count(&self) -> usize {
        self.unsaved().count()
    }

    /// The first user message, used as the default site name.
    pub fn first_user_message(&self) -> Option<&str> {
        self.0
            .iter()
            .find(|t| t.role == Role::User)
            .map(|t| t.message.as_str())
    }

    /// The newest user turn, if any.
    pub fn last_user_turn(&self) -> Option<&ChatTurn> {
        self.0.iter().rev().find(|t| t.role == Role::User)
    }

    /// Replace the unsaved turns, in order, with their persisted rows.
    ///
    /// `persisted` must be the result of inserting [`Transcript::unsaved`];
    /// rows are matched positionally and must agree on role and message.
    pub fn mark_persisted(&mut self, persisted: &[ChatTurn]) -> Result<(), CoreError> {
        let mut rows = persisted.iter();
        for turn in self.0.iter_mut().filter(|t| !t.is_persisted()) {
            let Some(row) = rows.next() else {
                return Err(CoreError::Internal(
                    "Fewer persisted chat rows than unsaved transcript turns".to_string(),
                ));
            };
            if row.role != turn.role || row.message != turn.message || row.id.is_none() {
                return Err(CoreError::Internal(
                    "Persisted chat rows do not match the unsaved transcript turns".to_string(),
                ));
            }
            turn.id = row.id;
            turn.created_at = row.created_at;
        }
        if rows.next().is_some() {
            return Err(CoreError::Internal(
                "More persisted chat rows than unsaved transcript turns".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn blank_user_message_is_rejected() {
        assert_matches!(ChatTurn::user("   "), Err(CoreError::Validation(_)));
    }

    #[test]
    fn empty_assistant_message_is_allowed() {
        let turn = ChatTurn::assistant("");
        assert_eq!(turn.role(), Role::Assistant);
        assert!(!turn.is_persisted());
    }

    #[test]
    fn deserialize_validates_payload() {
        let ok: ChatTurn =
            serde_json::from_str(r#"{"role":"user","message":"a bakery page"}"#).unwrap();
        assert_eq!(ok.message(), "a bakery page");
        assert_eq!(ok.id(), None);

        let blank = serde_json::from_str::<ChatTurn>(r#"{"role":"user","message":""}"#);
        assert!(blank.is_err());

        let bad_role = serde_json::from_str::<ChatTurn>(r#"{"role":"system","message":"x"}"#);
        assert!(bad_role.is_err());
    }

    #[test]
    fn serialization_omits_missing_id() {
        let turn = ChatTurn::user("hello").unwrap();
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "message": "hello"}));
    }

    #[test]
    fn unsaved_skips_persisted_turns() {
        let now = chrono::Utc::now();
        let mut transcript = Transcript::from_turns(vec![
            ChatTurn::persisted(1, Role::User, "first".into(), now),
            ChatTurn::persisted(2, Role::Assistant, "<p>1</p>".into(), now),
        ]);
        transcript.push_user("second").unwrap();
        transcript.push_assistant("<p>2</p>");

        let unsaved: Vec<_> = transcript.unsaved().map(|t| t.message()).collect();
        assert_eq!(unsaved, vec!["second", "<p>2</p>"]);
        assert_eq!(transcript.first_user_message(), Some("first"));
        assert_eq!(transcript.last_user_turn().unwrap().message(), "second");
    }

    #[test]
    fn mark_persisted_assigns_ids_in_order() {
        let now = chrono::Utc::now();
        let mut transcript = Transcript::new();
        transcript.push_user("make it blue").unwrap();
        transcript.push_assistant("<h1>blue</h1>");

        let rows = vec![
            ChatTurn::persisted(10, Role::User, "make it blue".into(), now),
            ChatTurn::persisted(11, Role::Assistant, "<h1>blue</h1>".into(), now),
        ];
        transcript.mark_persisted(&rows).unwrap();

        assert_eq!(transcript.unsaved_count(), 0);
        let ids: Vec<_> = transcript.turns().iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec![Some(10), Some(11)]);
    }

    #[test]
    fn mark_persisted_rejects_mismatched_rows() {
        let now = chrono::Utc::now();
        let mut transcript = Transcript::new();
        transcript.push_user("one").unwrap();

        let rows = vec![ChatTurn::persisted(1, Role::User, "other".into(), now)];
        assert_matches!(
            transcript.mark_persisted(&rows),
            Err(CoreError::Internal(_))
        );
    }

    #[test]
    fn role_round_trips_through_str() {
        assert_eq!("assistant".parse::<Role>().unwrap(), Role::Assistant);
        assert_eq!(Role::User.as_str(), "user");
        assert!("bot".parse::<Role>().is_err());
    }
}
