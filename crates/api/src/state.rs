use std::sync::Arc;

use sitesmith_core::generation::GenerationOrchestrator;

use crate::config::ServerConfig;
use crate::editor::EditorSessions;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: every field is a pool handle or behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: sitesmith_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Drives the text-generation collaborator.
    pub generator: GenerationOrchestrator,
    /// In-memory editor sessions, dropped at shutdown.
    pub editor_sessions: Arc<EditorSessions>,
}
