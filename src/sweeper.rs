// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veriflow Labs

//! # Session Sweeper
//!
//! Background task that evicts idle verification sessions. Sessions live
//! in memory only, so without eviction an abandoned verification would be
//! retained until restart.
//!
//! ## Strategy
//!
//! Every `sweep_interval` (default 5 min) the sweeper:
//! 1. Lists the ids currently in the store.
//! 2. Locks each session and compares its `updated_at` against the idle
//!    TTL cutoff.
//! 3. Removes sessions idle past the cutoff, holding the session lock so
//!    an in-flight step completion cannot interleave with eviction, and
//!    records a `session_expired` audit event for each.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::audit::{AuditEvent, AuditEventType, AuditLog};
use crate::session::SessionStore;

/// Default idle TTL before a session is evicted (24 hours).
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(86_400);

/// Default interval between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Background task evicting verification sessions idle past their TTL.
pub struct SessionSweeper {
    store: Arc<dyn SessionStore>,
    audit: Arc<AuditLog>,
    ttl: Duration,
    sweep_interval: Duration,
}

impl SessionSweeper {
    /// Create a sweeper with the default TTL and interval.
    pub fn new(store: Arc<dyn SessionStore>, audit: Arc<AuditLog>) -> Self {
        Self {
            store,
            audit,
            ttl: DEFAULT_SESSION_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    /// Override the idle TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Override the sweep interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Run the sweep loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(sweeper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            ttl_secs = self.ttl.as_secs(),
            interval_secs = self.sweep_interval.as_secs(),
            "Session sweeper starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("Session sweeper shutting down");
                return;
            }

            self.sweep_step().await;

            tokio::select! {
                _ = tokio::time::sleep(self.sweep_interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Session sweeper shutting down");
                    return;
                }
            }
        }
    }

    /// Execute one sweep. Returns the number of sessions evicted.
    pub async fn sweep_step(&self) -> usize {
        let cutoff = chrono::Utc::now() - chrono::Duration::seconds(self.ttl.as_secs() as i64);
        let mut evicted = 0;

        for id in self.store.ids() {
            let Some(handle) = self.store.handle(&id) else {
                continue;
            };

            // Holding the session lock while removing keeps eviction from
            // interleaving with an in-flight mutation.
            let guard = handle.lock().await;
            if guard.updated_at <= cutoff {
                self.store.remove(&id);
                evicted += 1;

                self.audit.record(
                    AuditEvent::new(AuditEventType::SessionExpired)
                        .with_user(guard.owner_subject.clone())
                        .with_resource("session", id.to_string()),
                );

                info!(
                    session_id = %id,
                    last_update = %guard.updated_at,
                    "Evicted idle verification session"
                );
            }
        }

        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{
        InMemorySessionStore, SessionId, StepCatalog, VerificationLevel, VerificationService,
    };
    use chrono::Utc;

    fn store_and_service() -> (Arc<InMemorySessionStore>, VerificationService) {
        let store = Arc::new(InMemorySessionStore::new());
        let service = VerificationService::new(store.clone(), StepCatalog::builtin());
        (store, service)
    }

    async fn backdate(store: &InMemorySessionStore, id: SessionId, hours: i64) {
        let handle = store.handle(&id).unwrap();
        handle.lock().await.updated_at = Utc::now() - chrono::Duration::hours(hours);
    }

    #[tokio::test]
    async fn evicts_only_sessions_past_the_ttl() {
        let (store, service) = store_and_service();
        let audit = Arc::new(AuditLog::new());
        let sweeper = SessionSweeper::new(store.clone(), audit.clone())
            .with_ttl(Duration::from_secs(3600));

        let stale = service.start_verification(VerificationLevel::Basic, "user_stale", None);
        backdate(&store, stale.id, 2).await;

        let fresh = service.start_verification(VerificationLevel::Basic, "user_fresh", None);

        let evicted = sweeper.sweep_step().await;

        assert_eq!(evicted, 1);
        assert!(!store.contains(&stale.id));
        assert!(store.contains(&fresh.id));

        let events = audit.snapshot();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, AuditEventType::SessionExpired);
        assert_eq!(events[0].resource_id, Some(stale.id.to_string()));
        assert_eq!(events[0].user_id, Some("user_stale".to_string()));
    }

    #[tokio::test]
    async fn fresh_store_sweeps_nothing() {
        let (store, service) = store_and_service();
        let audit = Arc::new(AuditLog::new());
        let sweeper = SessionSweeper::new(store.clone(), audit.clone());

        service.start_verification(VerificationLevel::Basic, "user_1", None);

        assert_eq!(sweeper.sweep_step().await, 0);
        assert_eq!(store.len(), 1);
        assert!(audit.is_empty());
    }

    #[tokio::test]
    async fn run_stops_on_cancellation() {
        let store = Arc::new(InMemorySessionStore::new());
        let audit = Arc::new(AuditLog::new());
        let sweeper = SessionSweeper::new(store, audit)
            .with_sweep_interval(Duration::from_secs(3600));

        let shutdown = CancellationToken::new();
        let task = tokio::spawn(sweeper.run(shutdown.clone()));

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("sweeper did not stop after cancellation")
            .unwrap();
    }
}
