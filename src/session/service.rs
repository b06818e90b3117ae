// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veriflow Labs

//! The verification state machine.
//!
//! [`VerificationService`] owns the operations the API exposes:
//! `start_verification`, `get_session`, and `complete_step`, plus the
//! listing and aggregate queries the dashboard and admin endpoints use.
//!
//! All preconditions are checked before any mutation, in a fixed order:
//! session exists, caller owns it, step exists, step not already
//! completed. A failed call leaves the session exactly as it was.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::catalog::StepCatalog;
use super::error::SessionError;
use super::store::{InMemorySessionStore, SessionStore};
use super::types::{
    next_pending_step, SessionId, SessionStatus, StepStatus, VerificationLevel,
    VerificationSession, VerificationStep,
};

/// Result of a successful `complete_step` call.
#[derive(Debug, Clone)]
pub struct StepCompletion {
    /// The step that was just completed.
    pub step: VerificationStep,
    /// The step now awaiting action, if any remain.
    pub next_step: Option<VerificationStep>,
    /// Snapshot of the session after the mutation.
    pub session: VerificationSession,
}

/// Aggregate session counts for the admin surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub basic: usize,
    pub enhanced: usize,
}

/// Verification session state machine over an injected store and catalog.
#[derive(Clone)]
pub struct VerificationService {
    store: Arc<dyn SessionStore>,
    catalog: Arc<StepCatalog>,
}

impl VerificationService {
    pub fn new(store: Arc<dyn SessionStore>, catalog: StepCatalog) -> Self {
        Self {
            store,
            catalog: Arc::new(catalog),
        }
    }

    /// Create a new session for `owner_subject` at the given level.
    ///
    /// Copies the catalog steps for the level, promotes the first step to
    /// `in_progress`, and stores the session. Returns a snapshot.
    pub fn start_verification(
        &self,
        level: VerificationLevel,
        owner_subject: impl Into<String>,
        auth_method: Option<String>,
    ) -> VerificationSession {
        let mut steps = self.catalog.steps_for(level);
        if let Some(first) = steps.first_mut() {
            first.status = StepStatus::InProgress;
        }
        let current_step = steps.first().map(|step| step.id.clone());
        let now = Utc::now();

        let session = VerificationSession {
            id: SessionId::new(),
            level,
            owner_subject: owner_subject.into(),
            auth_method,
            steps,
            current_step,
            created_at: now,
            updated_at: now,
        };

        info!(session_id = %session.id, %level, "verification session started");
        self.store.insert(session.clone());
        session
    }

    /// Return a snapshot of the session, if it exists and `subject` owns it.
    pub async fn get_session(
        &self,
        id: SessionId,
        subject: &str,
    ) -> Result<VerificationSession, SessionError> {
        let handle = self
            .store
            .handle(&id)
            .ok_or(SessionError::SessionNotFound(id))?;
        let session = handle.lock().await;

        // The sweeper may have evicted the session between lookup and lock.
        if !self.store.contains(&id) {
            return Err(SessionError::SessionNotFound(id));
        }
        if session.owner_subject != subject {
            return Err(SessionError::NotSessionOwner);
        }

        Ok(session.clone())
    }

    /// Mark a step completed and advance `current_step`.
    ///
    /// Racing completions of the same step serialize on the session's
    /// mutex; the loser observes the step already completed and gets the
    /// conflict error.
    pub async fn complete_step(
        &self,
        id: SessionId,
        step_id: &str,
        subject: &str,
    ) -> Result<StepCompletion, SessionError> {
        let handle = self
            .store
            .handle(&id)
            .ok_or(SessionError::SessionNotFound(id))?;
        let mut session = handle.lock().await;

        if !self.store.contains(&id) {
            return Err(SessionError::SessionNotFound(id));
        }
        if session.owner_subject != subject {
            return Err(SessionError::NotSessionOwner);
        }

        let index = session
            .steps
            .iter()
            .position(|step| step.id == step_id)
            .ok_or_else(|| SessionError::StepNotFound {
                step_id: step_id.to_string(),
            })?;
        if session.steps[index].status == StepStatus::Completed {
            return Err(SessionError::StepAlreadyCompleted {
                step_id: step_id.to_string(),
            });
        }

        let now = Utc::now();
        session.steps[index].status = StepStatus::Completed;
        session.steps[index].completed_at = Some(now);

        // The first non-completed step becomes (or stays) current. Steps
        // complete out of order, so the pending step may already be
        // in_progress; promotion only ever lifts not_started.
        match session.steps.iter().position(|step| step.is_pending()) {
            Some(next) => {
                if session.steps[next].status == StepStatus::NotStarted {
                    session.steps[next].status = StepStatus::InProgress;
                }
                session.current_step = Some(session.steps[next].id.clone());
            }
            None => session.current_step = None,
        }
        session.updated_at = now;

        let step = session.steps[index].clone();
        let next_step = next_pending_step(&session.steps).cloned();
        let snapshot = session.clone();

        info!(
            session_id = %id,
            step_id,
            session_status = ?snapshot.status(),
            "verification step completed"
        );

        Ok(StepCompletion {
            step,
            next_step,
            session: snapshot,
        })
    }

    /// Snapshots of all sessions owned by `subject`, oldest first.
    pub async fn list_sessions(&self, subject: &str) -> Vec<VerificationSession> {
        let mut sessions = Vec::new();
        for id in self.store.ids() {
            if let Some(handle) = self.store.handle(&id) {
                let session = handle.lock().await;
                if session.owner_subject == subject {
                    sessions.push(session.clone());
                }
            }
        }
        sessions.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.0.cmp(&b.id.0))
        });
        sessions
    }

    /// Number of sessions currently stored.
    pub fn session_count(&self) -> usize {
        self.store.len()
    }

    /// Aggregate counts across all sessions.
    pub async fn stats(&self) -> SessionStats {
        let mut stats = SessionStats::default();
        for id in self.store.ids() {
            if let Some(handle) = self.store.handle(&id) {
                let session = handle.lock().await;
                stats.total += 1;
                match session.status() {
                    SessionStatus::Completed => stats.completed += 1,
                    SessionStatus::InProgress => stats.in_progress += 1,
                }
                match session.level {
                    VerificationLevel::Basic => stats.basic += 1,
                    VerificationLevel::Enhanced => stats.enhanced += 1,
                }
            }
        }
        stats
    }
}

impl Default for VerificationService {
    fn default() -> Self {
        Self::new(Arc::new(InMemorySessionStore::new()), StepCatalog::builtin())
    }
}
