// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veriflow Labs

//! Verification domain errors.
//!
//! Every failure here is a local, synchronous validation failure: checks
//! run before any mutation, so a failed call leaves the session untouched.
//! The HTTP status mapping lives in `crate::error`.

use thiserror::Error;

use super::types::SessionId;

/// Errors produced by the verification state machine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The requested verification level does not exist.
    #[error("unknown verification level '{0}'")]
    InvalidLevel(String),

    /// No session with the given id (never created, or already evicted).
    #[error("verification session {0} not found")]
    SessionNotFound(SessionId),

    /// The step id is not part of the session's step sequence.
    #[error("step '{step_id}' is not part of this verification session")]
    StepNotFound { step_id: String },

    /// The step was already completed; completions are not idempotent.
    #[error("step '{step_id}' has already been completed")]
    StepAlreadyCompleted { step_id: String },

    /// The authenticated user does not own the session.
    #[error("verification session belongs to a different user")]
    NotSessionOwner,
}
