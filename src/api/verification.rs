// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veriflow Labs

//! Verification session endpoints.
//!
//! The session id travels in the `x-verification-session` header on every
//! call after `POST /verification/start`; the start response carries it in
//! the body. Wire field names are camelCase. The session owner is the
//! authenticated subject that started it; other callers get a 403.

use axum::{
    extract::State,
    http::HeaderMap,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    audit::{AuditEvent, AuditEventType},
    audit_log,
    auth::Auth,
    error::ApiError,
    session::{
        next_pending_step, SessionError, SessionId, SessionStatus, VerificationLevel,
        VerificationSession, VerificationStep,
    },
    state::AppState,
};

/// Header carrying the session id on step and status calls.
pub const SESSION_HEADER: &str = "x-verification-session";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body for `POST /verification/start`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartVerificationRequest {
    /// Requested verification level (`basic` or `enhanced`).
    #[serde(default)]
    pub level: Option<String>,
    /// How the user authenticated (wallet, passkey, ...). Recorded verbatim.
    #[serde(default)]
    pub auth_method: Option<String>,
    /// Client metadata. Accepted and discarded.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
}

/// Body for `POST /verification/step`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteStepRequest {
    /// Id of the step being completed.
    #[serde(default)]
    pub step_id: Option<String>,
    /// Step payload (documents, answers). Opaque to this service and
    /// never persisted; provider-side validation happens out of band.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub data: Option<serde_json::Value>,
    /// Client metadata. Accepted and discarded.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
}

/// Session as reported on the wire.
///
/// The status field is derived from the steps at serialization time; it is
/// never stored, so it cannot drift from the step states.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    /// Session id, echoed back via the session header.
    pub id: SessionId,
    /// Verification level the session was started at.
    pub level: VerificationLevel,
    /// Derived session status.
    pub status: SessionStatus,
    /// Step currently awaiting action, absent once none remain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
    /// Authentication method reported at start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_method: Option<String>,
    /// Ordered steps with their progress.
    pub steps: Vec<VerificationStep>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session last changed.
    pub updated_at: DateTime<Utc>,
}

impl From<&VerificationSession> for SessionView {
    fn from(session: &VerificationSession) -> Self {
        Self {
            id: session.id,
            level: session.level,
            status: session.status(),
            current_step: session.current_step.clone(),
            auth_method: session.auth_method.clone(),
            steps: session.steps.clone(),
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

/// Response for `POST /verification/start` and `GET /verification/status`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationStatusResponse {
    /// The session.
    pub session: SessionView,
    /// Step awaiting action, absent once none remain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_step: Option<VerificationStep>,
    /// Estimated minutes of effort remaining.
    pub estimated_time: u32,
}

/// Response for `POST /verification/step`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteStepResponse {
    /// The step that was just completed.
    pub step: VerificationStep,
    /// Step now awaiting action, absent once none remain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_step: Option<VerificationStep>,
    /// The session after the completion.
    pub session: SessionView,
}

/// Response for `GET /verification/sessions`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionListResponse {
    /// The caller's sessions, oldest first.
    pub sessions: Vec<SessionView>,
    /// Number of sessions returned.
    pub total: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// Start a verification session.
///
/// Creates a session at the requested level, seeded from the step catalog,
/// with the first step already in progress.
#[utoipa::path(
    post,
    path = "/verification/start",
    tag = "Verification",
    security(("bearer" = [])),
    request_body = StartVerificationRequest,
    responses(
        (status = 200, description = "Session created", body = VerificationStatusResponse),
        (status = 400, description = "Missing or unknown level"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn start_verification(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(payload): Json<StartVerificationRequest>,
) -> Result<Json<VerificationStatusResponse>, ApiError> {
    let level = payload
        .level
        .ok_or_else(|| ApiError::bad_request("level is required"))?;
    let level: VerificationLevel = level.parse()?;

    let session = state
        .verification
        .start_verification(level, &user.user_id, payload.auth_method);

    audit_log!(
        state.audit,
        AuditEventType::SessionStarted,
        user,
        "session",
        session.id.to_string()
    );

    Ok(Json(status_response(&session)))
}

/// Complete a verification step.
///
/// The session id comes from the `x-verification-session` header. Marks
/// the step completed and advances the session's current step.
#[utoipa::path(
    post,
    path = "/verification/step",
    tag = "Verification",
    security(("bearer" = [])),
    request_body = CompleteStepRequest,
    params(
        ("x-verification-session" = String, Header, description = "Session id returned by start")
    ),
    responses(
        (status = 200, description = "Step completed", body = CompleteStepResponse),
        (status = 400, description = "Missing session header or stepId"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Session belongs to a different user"),
        (status = 404, description = "Session or step not found"),
        (status = 409, description = "Step already completed")
    )
)]
pub async fn complete_step(
    Auth(user): Auth,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CompleteStepRequest>,
) -> Result<Json<CompleteStepResponse>, ApiError> {
    let session_id = session_id_from_headers(&headers)?;
    let step_id = payload
        .step_id
        .ok_or_else(|| ApiError::bad_request("stepId is required"))?;

    let completion = match state
        .verification
        .complete_step(session_id, &step_id, &user.user_id)
        .await
    {
        Ok(completion) => completion,
        Err(err) => {
            if err == SessionError::NotSessionOwner {
                state.audit.record(
                    AuditEvent::new(AuditEventType::PermissionDenied)
                        .with_user(&user.user_id)
                        .with_resource("session", session_id.to_string())
                        .failed(err.to_string()),
                );
            }
            return Err(err.into());
        }
    };

    state.audit.record(
        AuditEvent::new(AuditEventType::StepCompleted)
            .with_user(&user.user_id)
            .with_resource("session", session_id.to_string())
            .with_details(serde_json::json!({ "stepId": completion.step.id })),
    );

    let session = SessionView::from(&completion.session);

    // Only the last required step flips the session to completed.
    if completion.step.required && session.status == SessionStatus::Completed {
        audit_log!(
            state.audit,
            AuditEventType::SessionCompleted,
            user,
            "session",
            session_id.to_string()
        );
    }

    Ok(Json(CompleteStepResponse {
        step: completion.step,
        next_step: completion.next_step,
        session,
    }))
}

/// Get the current state of a session.
#[utoipa::path(
    get,
    path = "/verification/status",
    tag = "Verification",
    security(("bearer" = [])),
    params(
        ("x-verification-session" = String, Header, description = "Session id returned by start")
    ),
    responses(
        (status = 200, description = "Session state", body = VerificationStatusResponse),
        (status = 400, description = "Missing or malformed session header"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Session belongs to a different user"),
        (status = 404, description = "Session not found")
    )
)]
pub async fn verification_status(
    Auth(user): Auth,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<VerificationStatusResponse>, ApiError> {
    let session_id = session_id_from_headers(&headers)?;
    let session = state
        .verification
        .get_session(session_id, &user.user_id)
        .await?;

    Ok(Json(status_response(&session)))
}

/// List the caller's sessions.
#[utoipa::path(
    get,
    path = "/verification/sessions",
    tag = "Verification",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The caller's sessions", body = SessionListResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_sessions(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Json<SessionListResponse> {
    let sessions = state.verification.list_sessions(&user.user_id).await;
    let sessions: Vec<SessionView> = sessions.iter().map(SessionView::from).collect();
    let total = sessions.len();

    Json(SessionListResponse { sessions, total })
}

// ============================================================================
// Helpers
// ============================================================================

fn status_response(session: &VerificationSession) -> VerificationStatusResponse {
    VerificationStatusResponse {
        session: SessionView::from(session),
        next_step: next_pending_step(&session.steps).cloned(),
        estimated_time: session.estimated_minutes_remaining(),
    }
}

/// Parse the session id out of the request headers.
fn session_id_from_headers(headers: &HeaderMap) -> Result<SessionId, ApiError> {
    let raw = headers
        .get(SESSION_HEADER)
        .ok_or_else(|| ApiError::bad_request("x-verification-session header is required"))?
        .to_str()
        .map_err(|_| ApiError::bad_request("x-verification-session header is not valid"))?;

    raw.parse().map_err(|_| {
        ApiError::bad_request("x-verification-session header is not a valid session id")
    })
}

// ============================================================================
// Tests
// ============================================================================
