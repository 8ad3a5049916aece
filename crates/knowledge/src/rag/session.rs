//! Per-session conversation memory.
//!
//! Sessions live in a bounded cache: the least recently used ones are
//! evicted past `max_sessions`, and a session untouched for the idle timeout
//! is forgotten and starts fresh on its next query.

use std::sync::Arc;
use std::time::Duration;

use catalog_core::config::SessionSettings;
use moka::sync::Cache;
use tokio::sync::Mutex;

use crate::rag::message::Message;

/// Shared, lockable history of one session.
pub type SessionHandle = Arc<Mutex<Vec<Message>>>;

/// In-process session memory keyed by session id.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<String, SessionHandle>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("sessions", &self.sessions.entry_count())
            .finish()
    }
}

impl SessionStore {
    pub fn new(max_sessions: u64, idle_timeout: Duration) -> Self {
        let sessions = Cache::builder()
            .max_capacity(max_sessions)
            .time_to_idle(idle_timeout)
            .build();

        Self { sessions }
    }

    pub fn from_settings(settings: &SessionSettings) -> Self {
        Self::new(
            settings.max_sessions,
            Duration::from_secs(settings.idle_timeout_secs),
        )
    }

    /// History handle for a session, created empty on first use.
    pub fn get_or_create(&self, session_id: &str) -> SessionHandle {
        self.sessions.get_with(session_id.to_string(), || {
            tracing::debug!(session_id, "Creating session");
            Arc::new(Mutex::new(Vec::new()))
        })
    }

    pub async fn append(&self, session_id: &str, message: Message) {
        let handle = self.get_or_create(session_id);
        handle.lock().await.push(message);
    }

    /// Snapshot of a session's history; empty for unknown sessions.
    pub async fn history(&self, session_id: &str) -> Vec<Message> {
        match self.sessions.get(session_id) {
            Some(handle) => handle.lock().await.clone(),
            None => Vec::new(),
        }
    }

    /// Number of live sessions.
    pub fn len(&self) -> u64 {
        self.sessions.run_pending_tasks();
        self.sessions.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_appends_are_visible() {
        let store = SessionStore::new(100, Duration::from_secs(60));
        store.append("u1", Message::human("hello")).await;
        store.append("u1", Message::ai("hi")).await;

        let history = store.history("u1").await;
        assert_eq!(history, vec![Message::human("hello"), Message::ai("hi")]);
        assert!(store.history("u2").await.is_empty());
    }

    #[tokio::test]
    async fn test_handles_share_history() {
        let store = SessionStore::new(100, Duration::from_secs(60));
        let first = store.get_or_create("u1");
        let second = store.clone().get_or_create("u1");

        first.lock().await.push(Message::human("hello"));
        assert_eq!(second.lock().await.len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_idle_sessions_expire() {
        let store = SessionStore::new(100, Duration::from_millis(50));
        store.append("u1", Message::human("hello")).await;

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(store.history("u1").await.is_empty());
        assert!(store.get_or_create("u1").lock().await.is_empty());
    }
}
