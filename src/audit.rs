// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veriflow Labs

//! Audit logging for security-sensitive operations.
//!
//! Verification lifecycle events, permission denials, and administrative
//! actions are recorded in an in-memory ring buffer. The buffer is capped
//! so a chatty client cannot grow it without bound; once full, the oldest
//! events are dropped first.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Default number of events retained before the oldest are dropped.
pub const DEFAULT_AUDIT_CAPACITY: usize = 10_000;

/// Types of auditable events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    // Verification lifecycle events
    SessionStarted,
    StepCompleted,
    SessionCompleted,
    SessionExpired,

    // Auth events
    PermissionDenied,

    // Admin events
    AdminAccess,
}

/// An audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditEvent {
    /// Unique event ID.
    pub event_id: String,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Type of event.
    pub event_type: AuditEventType,
    /// User who triggered the event (if known).
    pub user_id: Option<String>,
    /// Resource affected (session id, step id, etc.).
    pub resource_id: Option<String>,
    /// Resource type (session, step, etc.).
    pub resource_type: Option<String>,
    /// Additional details as JSON.
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error message if operation failed.
    pub error: Option<String>,
}

impl AuditEvent {
    /// Create a new audit event.
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type,
            user_id: None,
            resource_id: None,
            resource_type: None,
            details: None,
            success: true,
            error: None,
        }
    }

    /// Set the user ID.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set the resource.
    pub fn with_resource(
        mut self,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Add details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Mark as failed with error message.
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }
}

/// Capped in-memory audit trail.
///
/// Shared across handlers and the session sweeper behind an `Arc`.
pub struct AuditLog {
    capacity: usize,
    events: Mutex<VecDeque<AuditEvent>>,
}

impl AuditLog {
    /// Create a log with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_AUDIT_CAPACITY)
    }

    /// Create a log retaining at most `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            events: Mutex::new(VecDeque::new()),
        }
    }

    /// Append an event, dropping the oldest when at capacity.
    pub fn record(&self, event: AuditEvent) {
        let mut events = self
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Copy of all retained events, oldest first.
    pub fn snapshot(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Number of retained events.
    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether any events are retained.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper macro for logging audit events.
#[macro_export]
macro_rules! audit_log {
    ($log:expr, $event_type:expr, $user:expr) => {{
        let event = $crate::audit::AuditEvent::new($event_type).with_user(&$user.user_id);
        $log.record(event);
    }};
    ($log:expr, $event_type:expr, $user:expr, $resource_type:expr, $resource_id:expr) => {{
        let event = $crate::audit::AuditEvent::new($event_type)
            .with_user(&$user.user_id)
            .with_resource($resource_type, $resource_id);
        $log.record(event);
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthenticatedUser, Role};

    #[test]
    fn create_audit_event() {
        let event = AuditEvent::new(AuditEventType::SessionStarted)
            .with_user("user_123")
            .with_resource("session", "sess_abc")
            .with_details(serde_json::json!({"level": "basic"}));

        assert_eq!(event.event_type, AuditEventType::SessionStarted);
        assert_eq!(event.user_id, Some("user_123".to_string()));
        assert_eq!(event.resource_type, Some("session".to_string()));
        assert_eq!(event.resource_id, Some("sess_abc".to_string()));
        assert!(event.success);
    }

    #[test]
    fn failed_event() {
        let event = AuditEvent::new(AuditEventType::PermissionDenied)
            .with_user("user_123")
            .failed("Not authorized");

        assert!(!event.success);
        assert_eq!(event.error, Some("Not authorized".to_string()));
    }

    #[test]
    fn record_and_snapshot() {
        let log = AuditLog::new();

        log.record(AuditEvent::new(AuditEventType::SessionStarted).with_user("user_1"));
        log.record(AuditEvent::new(AuditEventType::StepCompleted).with_user("user_2"));

        let events = log.snapshot();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, AuditEventType::SessionStarted);
        assert_eq!(events[1].event_type, AuditEventType::StepCompleted);
    }

    #[test]
    fn capacity_drops_oldest() {
        let log = AuditLog::with_capacity(2);

        log.record(AuditEvent::new(AuditEventType::SessionStarted).with_user("user_1"));
        log.record(AuditEvent::new(AuditEventType::StepCompleted).with_user("user_1"));
        log.record(AuditEvent::new(AuditEventType::SessionCompleted).with_user("user_1"));

        let events = log.snapshot();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, AuditEventType::StepCompleted);
        assert_eq!(events[1].event_type, AuditEventType::SessionCompleted);
    }

    #[test]
    fn macro_records_against_log() {
        let log = AuditLog::new();
        let user = AuthenticatedUser {
            user_id: "user_123".to_string(),
            role: Role::Applicant,
            issuer: String::new(),
            expires_at: 0,
        };

        audit_log!(log, AuditEventType::SessionStarted, user);
        audit_log!(
            log,
            AuditEventType::StepCompleted,
            user,
            "session",
            "sess_abc"
        );

        let events = log.snapshot();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].user_id, Some("user_123".to_string()));
        assert_eq!(events[1].resource_id, Some("sess_abc".to_string()));
    }
}
