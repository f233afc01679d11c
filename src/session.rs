//! In-memory conversation sessions.
//!
//! Sessions are process-lifetime and append-only: created on demand,
//! never expired by the store itself. The store is an explicit injected
//! object (not global state) and is safe for concurrent append/read from
//! the transport layer; callers that need strict ordering within one
//! session serialize their own calls per session id. `len`/`remove`/
//! `clear` exist so an embedding process can layer its own eviction.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// One message in a session. Append-only, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// One conversation's ordered history.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<Message>,
}

impl Session {
    fn new(id: Uuid) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            messages: Vec::new(),
        }
    }
}

/// Concurrency-safe map from session id to history.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Create a fresh empty session and return its id.
    pub fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.write().insert(id, Session::new(id));
        tracing::debug!(session_id = %id, "Session created");
        id
    }

    /// Append a message, silently provisioning the session if the id is
    /// unknown. Callers cannot distinguish "resumed" from "new" here.
    pub fn append(&self, session_id: Uuid, role: MessageRole, content: &str) {
        let mut sessions = self.write();
        let session = sessions
            .entry(session_id)
            .or_insert_with(|| Session::new(session_id));
        session.messages.push(Message {
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
        });
    }

    /// Ordered history for a session; empty for unknown ids, never an error.
    pub fn history(&self, session_id: Uuid) -> Vec<Message> {
        self.read()
            .get(&session_id)
            .map(|s| s.messages.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, session_id: Uuid) -> bool {
        self.read().contains_key(&session_id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Drop one session. Maintenance hook for callers that evict.
    pub fn remove(&self, session_id: Uuid) {
        self.write().remove(&session_id);
    }

    /// Drop all sessions.
    pub fn clear(&self) {
        self.write().clear();
    }

    // A poisoned lock only means another thread panicked mid-append; the
    // map itself stays usable, so continue with the inner value.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Uuid, Session>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Uuid, Session>> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn create_returns_unique_ids_with_empty_history() {
        let store = SessionStore::new();
        let a = store.create();
        let b = store.create();
        assert_ne!(a, b);
        assert!(store.history(a).is_empty());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn append_preserves_arrival_order() {
        let store = SessionStore::new();
        let id = store.create();

        store.append(id, MessageRole::User, "first");
        store.append(id, MessageRole::Assistant, "second");
        store.append(id, MessageRole::User, "third");

        let history = store.history(id);
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].content, "first");
        assert_eq!(history[0].role, MessageRole::User);
        assert_eq!(history[1].content, "second");
        assert_eq!(history[1].role, MessageRole::Assistant);
        assert_eq!(history[2].content, "third");
    }

    #[test]
    fn append_to_unknown_id_provisions_silently() {
        let store = SessionStore::new();
        let id = Uuid::new_v4();

        store.append(id, MessageRole::User, "resumed?");

        assert!(store.contains(id));
        assert_eq!(store.history(id).len(), 1);
    }

    #[test]
    fn history_for_unknown_id_is_empty_not_an_error() {
        let store = SessionStore::new();
        assert!(store.history(Uuid::new_v4()).is_empty());
    }

    #[test]
    fn remove_and_clear_drop_sessions() {
        let store = SessionStore::new();
        let a = store.create();
        let b = store.create();

        store.remove(a);
        assert!(!store.contains(a));
        assert!(store.contains(b));

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn concurrent_appends_to_independent_sessions() {
        let store = Arc::new(SessionStore::new());
        let ids: Vec<Uuid> = (0..4).map(|_| store.create()).collect();

        let handles: Vec<_> = ids
            .iter()
            .map(|&id| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        store.append(id, MessageRole::User, &format!("msg {i}"));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        for id in ids {
            let history = store.history(id);
            assert_eq!(history.len(), 50);
            assert_eq!(history[0].content, "msg 0");
            assert_eq!(history[49].content, "msg 49");
        }
    }
}
