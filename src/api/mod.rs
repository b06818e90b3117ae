// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veriflow Labs

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    audit::{AuditEvent, AuditEventType},
    auth::Role,
    session::{SessionId, SessionStatus, StepStatus, VerificationLevel, VerificationStep},
    state::AppState,
};

pub mod admin;
pub mod health;
pub mod users;
pub mod verification;

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/verification/start",
            post(verification::start_verification),
        )
        .route("/verification/step", post(verification::complete_step))
        .route(
            "/verification/status",
            get(verification::verification_status),
        )
        .route(
            "/verification/sessions",
            get(verification::list_sessions),
        )
        .route("/users/me", get(users::get_current_user))
        .route("/admin/stats", get(admin::get_system_stats))
        .route("/admin/audit", get(admin::query_audit_events))
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .merge(api_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CorsLayer::permissive()),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        verification::start_verification,
        verification::complete_step,
        verification::verification_status,
        verification::list_sessions,
        users::get_current_user,
        admin::get_system_stats,
        admin::query_audit_events,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            SessionId,
            VerificationLevel,
            StepStatus,
            SessionStatus,
            VerificationStep,
            Role,
            AuditEvent,
            AuditEventType,
            verification::StartVerificationRequest,
            verification::CompleteStepRequest,
            verification::SessionView,
            verification::VerificationStatusResponse,
            verification::CompleteStepResponse,
            verification::SessionListResponse,
            users::UserMeResponse,
            admin::SystemStatsResponse,
            admin::AuditLogResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Verification", description = "Verification session flow"),
        (name = "Users", description = "Authenticated user info"),
        (name = "Admin", description = "Statistics and audit log queries"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = router(AppState::default());
        // Ensure the router can be converted into a service without panicking.
        let _ = app.into_make_service();
    }

    #[test]
    fn openapi_document_includes_the_verification_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        assert!(paths.iter().any(|p| p.as_str() == "/verification/start"));
        assert!(paths.iter().any(|p| p.as_str() == "/verification/step"));
        assert!(paths.iter().any(|p| p.as_str() == "/health"));
    }
}
