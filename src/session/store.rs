// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veriflow Labs

//! Session storage behind a narrow key-value abstraction.
//!
//! ## Locking Protocol
//!
//! The store hands out per-session handles (`Arc<Mutex<VerificationSession>>`).
//! Sessions under different ids can be mutated in parallel; mutations of the
//! same session serialize on its mutex. The map lock is held only for map
//! operations, never across an await.
//!
//! Eviction removes a session while holding its mutex, so anyone who
//! acquires a handle's lock must re-check `contains` before mutating: a
//! handle obtained just before eviction still points at a session the store
//! no longer knows.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::Mutex;

use super::types::{SessionId, VerificationSession};

/// Shared handle to one session. Locking it serializes all access to that
/// session's state.
pub type SessionHandle = Arc<Mutex<VerificationSession>>;

/// Storage abstraction the verification service is built against.
///
/// Implementations must be safe to share across tasks.
pub trait SessionStore: Send + Sync {
    /// Insert a new session and return its handle.
    fn insert(&self, session: VerificationSession) -> SessionHandle;

    /// Look up the handle for a session id.
    fn handle(&self, id: &SessionId) -> Option<SessionHandle>;

    /// Whether the store currently knows the id.
    fn contains(&self, id: &SessionId) -> bool;

    /// Remove a session, returning its handle if it existed.
    fn remove(&self, id: &SessionId) -> Option<SessionHandle>;

    /// Snapshot of all known session ids.
    fn ids(&self) -> Vec<SessionId>;

    /// Number of stored sessions.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory session store.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn insert(&self, session: VerificationSession) -> SessionHandle {
        let id = session.id;
        let handle = Arc::new(Mutex::new(session));
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, handle.clone());
        handle
    }

    fn handle(&self, id: &SessionId) -> Option<SessionHandle> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn contains(&self, id: &SessionId) -> bool {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    fn remove(&self, id: &SessionId) -> Option<SessionHandle> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    fn ids(&self) -> Vec<SessionId> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::catalog::StepCatalog;
    use crate::session::types::{StepStatus, VerificationLevel};
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    fn sample_session(owner: &str) -> VerificationSession {
        let mut steps = StepCatalog::builtin().steps_for(VerificationLevel::Basic);
        if let Some(first) = steps.first_mut() {
            first.status = StepStatus::InProgress;
        }
        let current_step = steps.first().map(|s| s.id.clone());

        VerificationSession {
            id: SessionId::new(),
            level: VerificationLevel::Basic,
            owner_subject: owner.to_string(),
            auth_method: None,
            steps,
            current_step,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_then_handle_returns_the_session() {
        let store = InMemorySessionStore::new();
        let session = sample_session("user_1");
        let id = session.id;

        store.insert(session);
        assert!(store.contains(&id));
        assert_eq!(store.len(), 1);

        let handle = store.handle(&id).unwrap();
        assert_eq!(handle.lock().await.id, id);
    }

    #[test]
    fn remove_forgets_the_session() {
        let store = InMemorySessionStore::new();
        let id = {
            let session = sample_session("user_1");
            let id = session.id;
            store.insert(session);
            id
        };

        assert!(store.remove(&id).is_some());
        assert!(!store.contains(&id));
        assert!(store.handle(&id).is_none());
        assert!(store.remove(&id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn ids_lists_every_session() {
        let store = InMemorySessionStore::new();
        let a = sample_session("user_1");
        let b = sample_session("user_2");
        let (id_a, id_b) = (a.id, b.id);
        store.insert(a);
        store.insert(b);

        let mut ids = store.ids();
        ids.sort_by_key(|id| id.to_string());
        let mut expected = vec![id_a, id_b];
        expected.sort_by_key(|id| id.to_string());
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn same_session_locks_serialize() {
        let store = InMemorySessionStore::new();
        let handle = store.insert(sample_session("user_1"));

        let in_critical_section = Arc::new(AtomicBool::new(false));
        let mut tasks = Vec::new();
        for _ in 0..4 {
            let handle = handle.clone();
            let flag = in_critical_section.clone();
            tasks.push(tokio::spawn(async move {
                let _guard = handle.lock().await;
                assert!(!flag.swap(true, Ordering::SeqCst), "two tasks inside the lock");
                tokio::time::sleep(Duration::from_millis(10)).await;
                flag.store(false, Ordering::SeqCst);
            }));
        }

        for task in tasks {
            task.await.unwrap();
        }
    }

    #[tokio::test]
    async fn different_sessions_lock_independently() {
        let store = InMemorySessionStore::new();
        let first = store.insert(sample_session("user_1"));
        let second = store.insert(sample_session("user_2"));

        // Holding one session's lock must not block the other.
        let _first_guard = first.lock().await;
        let second_guard =
            tokio::time::timeout(Duration::from_millis(100), second.lock()).await;
        assert!(second_guard.is_ok());
    }
}
