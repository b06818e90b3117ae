// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veriflow Labs

//! Admin API endpoints for system management.
//!
//! These endpoints require elevated roles and provide:
//! - System statistics (admin)
//! - Audit log queries (auditor or admin)

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    audit::{AuditEvent, AuditEventType},
    audit_log,
    auth::{AdminOnly, AuditorOnly},
    error::ApiError,
    state::AppState,
};

// ============================================================================
// Request/Response Types
// ============================================================================

/// System statistics response.
#[derive(Debug, Serialize, ToSchema)]
pub struct SystemStatsResponse {
    /// Total number of verification sessions in memory.
    pub total_sessions: usize,
    /// Sessions with every required step completed.
    pub completed_sessions: usize,
    /// Sessions still awaiting steps.
    pub in_progress_sessions: usize,
    /// Sessions at the basic level.
    pub basic_level_sessions: usize,
    /// Sessions at the enhanced level.
    pub enhanced_level_sessions: usize,
    /// Events currently retained in the audit buffer.
    pub audit_events: usize,
    /// Server uptime.
    pub uptime_seconds: u64,
    /// Current timestamp.
    pub timestamp: String,
}

/// Query parameters for audit log queries.
#[derive(Debug, Deserialize, IntoParams)]
pub struct AuditQueryParams {
    /// Filter by event type (snake_case, e.g. `step_completed`).
    pub event_type: Option<String>,
    /// Filter by user ID.
    pub user_id: Option<String>,
    /// Filter by resource ID.
    pub resource_id: Option<String>,
    /// Maximum number of results (default 100).
    pub limit: Option<usize>,
    /// Offset for pagination.
    pub offset: Option<usize>,
}

/// Response for audit log queries.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuditLogResponse {
    /// Audit events matching the query, oldest first.
    pub events: Vec<AuditEvent>,
    /// Total count (before limit/offset).
    pub total: usize,
    /// Whether there are more results.
    pub has_more: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Get system statistics.
///
/// Returns aggregate statistics about verification sessions and the audit
/// buffer. Admin only.
#[utoipa::path(
    get,
    path = "/admin/stats",
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "System statistics", body = SystemStatsResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn get_system_stats(
    AdminOnly(user): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<SystemStatsResponse>, ApiError> {
    let stats = state.verification.stats().await;

    audit_log!(state.audit, AuditEventType::AdminAccess, user);

    Ok(Json(SystemStatsResponse {
        total_sessions: stats.total,
        completed_sessions: stats.completed,
        in_progress_sessions: stats.in_progress,
        basic_level_sessions: stats.basic,
        enhanced_level_sessions: stats.enhanced,
        audit_events: state.audit.len(),
        uptime_seconds: state.uptime_seconds(),
        timestamp: Utc::now().to_rfc3339(),
    }))
}

/// Query the audit log.
///
/// Search and filter retained audit events. Supports user ID, event type,
/// and resource filtering. Auditor or admin only.
#[utoipa::path(
    get,
    path = "/admin/audit",
    tag = "Admin",
    params(AuditQueryParams),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Audit events", body = AuditLogResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (auditor required)")
    )
)]
pub async fn query_audit_events(
    AuditorOnly(auditor): AuditorOnly,
    Query(params): Query<AuditQueryParams>,
    State(state): State<AppState>,
) -> Result<Json<AuditLogResponse>, ApiError> {
    let mut events = state.audit.snapshot();

    // Apply filters
    if let Some(user_id) = &params.user_id {
        events.retain(|e| e.user_id.as_deref() == Some(user_id.as_str()));
    }

    if let Some(event_type) = &params.event_type {
        events.retain(|e| {
            let type_str = serde_json::to_string(&e.event_type)
                .unwrap_or_default()
                .trim_matches('"')
                .to_string();
            type_str == *event_type
        });
    }

    if let Some(resource_id) = &params.resource_id {
        events.retain(|e| e.resource_id.as_deref() == Some(resource_id.as_str()));
    }

    let total = events.len();
    let limit = params.limit.unwrap_or(100).min(1000); // Max 1000
    let offset = params.offset.unwrap_or(0);

    let has_more = offset + limit < total;
    let events: Vec<AuditEvent> = events.into_iter().skip(offset).take(limit).collect();

    // Log the auditor access
    audit_log!(state.audit, AuditEventType::AdminAccess, auditor);

    Ok(Json(AuditLogResponse {
        events,
        total,
        has_more,
    }))
}

// ============================================================================
// Tests
// ============================================================================
