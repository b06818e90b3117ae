// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veriflow Labs

//! # Verification Sessions
//!
//! The verification domain: data model, step catalog, session store, and
//! the state machine the HTTP layer drives.
//!
//! ## Flow
//!
//! 1. `start_verification` copies the catalog steps for the requested
//!    level and marks the first step `in_progress`.
//! 2. `complete_step` marks a step completed and moves `current_step` to
//!    the first remaining non-completed step.
//! 3. Session status is derived from the steps on every read; it is
//!    `completed` exactly when all required steps are.
//!
//! ## Concurrency
//!
//! The store hands out one mutex per session. Mutations of the same
//! session serialize; different sessions proceed in parallel. See
//! `store` for the locking protocol.

pub mod catalog;
pub mod error;
pub mod service;
pub mod store;
pub mod types;

pub use catalog::{StepCatalog, StepDefinition};
pub use error::SessionError;
pub use service::{SessionStats, StepCompletion, VerificationService};
pub use store::{InMemorySessionStore, SessionHandle, SessionStore};
pub use types::{
    derived_status, next_pending_step, SessionId, SessionStatus, StepStatus, VerificationLevel,
    VerificationSession, VerificationStep,
};
