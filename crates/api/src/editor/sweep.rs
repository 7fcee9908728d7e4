use std::sync::Arc;
use std::time::Duration;

use crate::editor::EditorSessions;

/// Interval between idle-session sweeps (in seconds).
const SWEEP_INTERVAL_SECS: u64 = 300;

/// Spawn a background task that periodically evicts idle editor sessions.
///
/// The task runs until aborted through the returned `JoinHandle`, which the
/// server does during shutdown.
pub fn start_idle_sweep(sessions: Arc<EditorSessions>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(SWEEP_INTERVAL_SECS));

        loop {
            interval.tick().await;
            let evicted = sessions.evict_idle().await;
            if evicted > 0 {
                tracing::info!(evicted, "Idle editor sessions evicted");
            } else {
                tracing::debug!("Editor session sweep: nothing idle");
            }
        }
    })
}
