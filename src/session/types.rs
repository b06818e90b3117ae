// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veriflow Labs

//! # Verification Session Data Model
//!
//! Core types for the verification flow: sessions, steps, and the pure
//! derivations the state machine is built on.
//!
//! ## Derived Status
//!
//! A session's status is never stored. [`derived_status`] computes it from
//! the step states, and [`next_pending_step`] selects the step that
//! `current_step` points at. Every status the API reports goes through
//! these two functions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::SessionError;

// =============================================================================
// Session Identifier
// =============================================================================

/// Opaque verification session identifier (UUID v4).
///
/// Clients receive the id when a session is started and echo it back in the
/// `x-verification-session` header on subsequent calls.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Allocate a fresh random session id.
    pub fn new() -> Self {
        SessionId(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SessionId {
    fn from(value: Uuid) -> Self {
        SessionId(value)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(SessionId)
    }
}

// =============================================================================
// Verification Level
// =============================================================================

/// How thorough the verification flow is.
///
/// The level is fixed when the session is created and selects which step
/// sequence the session is seeded with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VerificationLevel {
    /// Standard identity checks (email, document, selfie).
    Basic,
    /// Everything in basic plus address proof and a source-of-funds
    /// questionnaire.
    Enhanced,
}

impl std::str::FromStr for VerificationLevel {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(VerificationLevel::Basic),
            "enhanced" => Ok(VerificationLevel::Enhanced),
            other => Err(SessionError::InvalidLevel(other.to_string())),
        }
    }
}

impl std::fmt::Display for VerificationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationLevel::Basic => write!(f, "basic"),
            VerificationLevel::Enhanced => write!(f, "enhanced"),
        }
    }
}

// =============================================================================
// Step and Session Status
// =============================================================================

/// Per-step progress. Transitions are monotonic:
/// `not_started` → `in_progress` → `completed`, never backwards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// Session-level status, derived from the steps and never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
}

// =============================================================================
// Verification Step
// =============================================================================

/// One step of a verification flow.
///
/// Steps are copied from the catalog when a session starts and keep their
/// catalog order for the session's whole lifetime.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationStep {
    /// Stable step identifier, unique within the session's sequence.
    pub id: String,
    /// Human-readable name for dashboard display.
    pub label: String,
    /// Whether this step must be completed for the session to complete.
    pub required: bool,
    /// Estimated effort in minutes. Reported on the wire as `estimatedTime`.
    #[serde(rename = "estimatedTime")]
    pub estimated_minutes: u32,
    /// Current progress of this step.
    pub status: StepStatus,
    /// When the step was completed, if it has been.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl VerificationStep {
    /// Whether this step still needs action.
    pub fn is_pending(&self) -> bool {
        self.status != StepStatus::Completed
    }
}

// =============================================================================
// Verification Session
// =============================================================================

/// A user's verification session.
///
/// Created by `start_verification`, mutated only by `complete_step`. The
/// state machine never deletes sessions; expiry is handled externally by
/// the session sweeper.
#[derive(Debug, Clone)]
pub struct VerificationSession {
    /// Unique session id, generated at creation.
    pub id: SessionId,
    /// Verification level, fixed at creation.
    pub level: VerificationLevel,
    /// JWT subject of the user who started the session. Only this user
    /// may read or advance the session.
    pub owner_subject: String,
    /// Authentication method reported by the client at start, recorded
    /// verbatim.
    pub auth_method: Option<String>,
    /// Ordered steps, copied from the catalog. Order never changes.
    pub steps: Vec<VerificationStep>,
    /// Id of the step currently awaiting action. `None` once no
    /// non-completed steps remain.
    pub current_step: Option<String>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Touched by every mutation. Drives TTL eviction.
    pub updated_at: DateTime<Utc>,
}

impl VerificationSession {
    /// Derived session status. See [`derived_status`].
    pub fn status(&self) -> SessionStatus {
        derived_status(&self.steps)
    }

    /// Sum of the estimated minutes of all non-completed steps.
    pub fn estimated_minutes_remaining(&self) -> u32 {
        self.steps
            .iter()
            .filter(|step| step.is_pending())
            .map(|step| step.estimated_minutes)
            .sum()
    }

    /// Look up a step by id.
    pub fn step(&self, step_id: &str) -> Option<&VerificationStep> {
        self.steps.iter().find(|step| step.id == step_id)
    }
}

// =============================================================================
// Pure Derivations
// =============================================================================

/// Derive the session status from its steps.
///
/// A session is completed exactly when every required step is completed.
/// Optional steps never block completion.
pub fn derived_status(steps: &[VerificationStep]) -> SessionStatus {
    let all_required_done = steps
        .iter()
        .filter(|step| step.required)
        .all(|step| step.status == StepStatus::Completed);

    if all_required_done {
        SessionStatus::Completed
    } else {
        SessionStatus::InProgress
    }
}

/// The step `current_step` should point at: the first step in catalog
/// order that is not completed, or `None` when every step is done.
pub fn next_pending_step(steps: &[VerificationStep]) -> Option<&VerificationStep> {
    steps.iter().find(|step| step.is_pending())
}
