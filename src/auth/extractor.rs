// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veriflow Labs

//! Axum extractors for JWT authentication.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```
//!
//! [`AdminOnly`] and [`AuditorOnly`] layer a role check on top so
//! privileged handlers state their requirement in the signature.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Validation};
use serde::Deserialize;

use super::{AuthError, AuthenticatedUser, Role};
use crate::state::AppState;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Claims we read out of a token.
#[derive(Debug, Deserialize)]
struct JwtClaims {
    /// Subject (user ID)
    sub: String,
    /// Issued at timestamp
    #[serde(default)]
    #[allow(dead_code)]
    iat: i64,
    /// Expiration timestamp
    #[serde(default)]
    exp: i64,
    /// Issuer
    #[serde(default)]
    iss: String,
    /// Audience (validated by jsonwebtoken crate, not read directly)
    #[serde(default)]
    #[allow(dead_code)]
    aud: Option<serde_json::Value>,
    /// Role claim, absent for ordinary applicants
    #[serde(default)]
    role: Option<String>,
}

/// Extractor for authenticated users.
///
/// This extractor validates the JWT from the Authorization header
/// and provides the authenticated user information.
///
/// ## Authentication Modes
///
/// - **Production mode** (AUTH_JWKS_URL set): full signature verification
///   against the provider's JWKS
/// - **Development mode** (no AUTH_JWKS_URL): structure and expiry checks
///   only, no signature check
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // First check if middleware already set the user
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        // Extract Authorization header
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        // Extract Bearer token
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidAuthHeader)?;

        // Decode and verify the JWT
        let user = verify_jwt(token, &state.auth_config).await?;

        // Cache for any later extractor on the same request
        parts.extensions.insert(user.clone());

        Ok(Auth(user))
    }
}

/// Extractor that requires admin role.
pub struct AdminOnly(pub AuthenticatedUser);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(user) = Auth::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(AdminOnly(user))
    }
}

/// Extractor that requires auditor privileges (admins qualify).
pub struct AuditorOnly(pub AuthenticatedUser);

impl FromRequestParts<AppState> for AuditorOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(user) = Auth::from_request_parts(parts, state).await?;

        if !user.has_role(Role::Auditor) {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(AuditorOnly(user))
    }
}

/// Verify JWT and extract user information.
///
/// In production mode (JWKS configured), verifies signature against the
/// provider's key set. In development mode, decodes without signature
/// verification but still enforces expiry.
async fn verify_jwt(token: &str, auth_config: &crate::state::AuthConfig) -> Result<AuthenticatedUser, AuthError> {
    let claims = if let Some(ref keys) = auth_config.keys {
        verify_jwt_production(token, keys, auth_config).await?
    } else {
        verify_jwt_development(token)?
    };

    // Role comes from the token's role claim (default to Applicant)
    let role = claims
        .role
        .as_deref()
        .and_then(Role::from_str)
        .unwrap_or_default();

    Ok(AuthenticatedUser {
        user_id: claims.sub,
        role,
        issuer: claims.iss,
        expires_at: claims.exp,
    })
}

/// Production JWT verification with JWKS.
async fn verify_jwt_production(
    token: &str,
    keys: &super::KeyStore,
    auth_config: &crate::state::AuthConfig,
) -> Result<JwtClaims, AuthError> {
    // Decode header to get kid (key ID)
    let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;

    // Get decoding key from JWKS
    let (decoding_key, algorithm) = if let Some(kid) = &header.kid {
        keys.decoding_key_for(kid).await?
    } else {
        // No kid in header, try any key
        keys.any_decoding_key().await?
    };

    // Build validation
    let mut validation = Validation::new(algorithm);
    validation.leeway = CLOCK_SKEW_LEEWAY;

    // Validate issuer if configured
    if let Some(ref issuer) = auth_config.issuer {
        validation.set_issuer(&[issuer]);
    }

    // Validate audience if configured
    if let Some(ref audience) = auth_config.audience {
        validation.set_audience(&[audience]);
    } else {
        validation.validate_aud = false;
    }

    // Decode and validate token
    let token_data = decode::<JwtClaims>(token, &decoding_key, &validation)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
            ErrorKind::InvalidAudience => AuthError::InvalidAudience,
            ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
            _ => AuthError::MalformedToken,
        })?;

    Ok(token_data.claims)
}

/// Development JWT verification (no signature check).
///
/// WARNING: This should only be used in development environments.
fn verify_jwt_development(token: &str) -> Result<JwtClaims, AuthError> {
    // Use the dangerous decode API to skip signature verification
    let token_data = jsonwebtoken::dangerous::insecure_decode::<JwtClaims>(token)
        .map_err(|_e| AuthError::MalformedToken)?;

    let claims = token_data.claims;

    // Check expiration manually
    let now = chrono::Utc::now().timestamp();
    if claims.exp > 0 && claims.exp < now - CLOCK_SKEW_LEEWAY as i64 {
        return Err(AuthError::TokenExpired);
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    /// Helper to create a test JWT token (unsigned, for testing only)
    fn create_test_jwt(user_id: &str, role: Option<&str>, exp_offset: i64) -> String {
        let header = r#"{"alg":"RS256","typ":"JWT"}"#;
        let exp = chrono::Utc::now().timestamp() + exp_offset;
        let claims = match role {
            Some(role) => format!(
                r#"{{"sub":"{user_id}","iat":1609459200,"exp":{exp},"iss":"https://auth.test","role":"{role}"}}"#
            ),
            None => format!(
                r#"{{"sub":"{user_id}","iat":1609459200,"exp":{exp},"iss":"https://auth.test"}}"#
            ),
        };

        let header_b64 = URL_SAFE_NO_PAD.encode(header.as_bytes());
        let claims_b64 = URL_SAFE_NO_PAD.encode(claims.as_bytes());

        // For testing, signature doesn't matter since we use development mode
        format!("{}.{}.fake_signature", header_b64, claims_b64)
    }

    fn parts_with_token(token: &str) -> Parts {
        Request::builder()
            .uri("/test")
            .header("Authorization", format!("Bearer {}", token))
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[tokio::test]
    async fn auth_extractor_requires_auth_header() {
        let state = AppState::default();
        let mut parts = Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        // Without auth header, should fail
        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_rejects_non_bearer_header() {
        let state = AppState::default();
        let mut parts = Request::builder()
            .uri("/test")
            .header("Authorization", "Basic dXNlcjpwYXNz")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_succeeds_with_jwt() {
        let state = AppState::default();
        let token = create_test_jwt("user_123", None, 3600);
        let mut parts = parts_with_token(&token);

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(result.is_ok());
        let user = result.unwrap().0;
        assert_eq!(user.user_id, "user_123");
        assert_eq!(user.role, Role::Applicant);
        assert_eq!(user.issuer, "https://auth.test");
    }

    #[tokio::test]
    async fn auth_extractor_rejects_expired_token() {
        let state = AppState::default();
        let token = create_test_jwt("user_123", None, -3600);
        let mut parts = parts_with_token(&token);

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[tokio::test]
    async fn auth_extractor_rejects_garbage_token() {
        let state = AppState::default();
        let mut parts = parts_with_token("not.a.jwt");

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MalformedToken)));
    }

    #[tokio::test]
    async fn auth_extractor_reads_role_claim() {
        let state = AppState::default();
        let token = create_test_jwt("user_admin", Some("admin"), 3600);
        let mut parts = parts_with_token(&token);

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(result.unwrap().0.is_admin());
    }

    #[tokio::test]
    async fn auth_extractor_prefers_extensions() {
        let state = AppState::default();
        // If middleware already set the user, use that
        let mut parts = Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let user = AuthenticatedUser {
            user_id: "user_from_middleware".to_string(),
            role: Role::Admin,
            issuer: "middleware".to_string(),
            expires_at: 0,
        };
        parts.extensions.insert(user.clone());

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap().0.user_id, "user_from_middleware");
    }

    #[tokio::test]
    async fn admin_only_rejects_non_admin() {
        let state = AppState::default();
        let token = create_test_jwt("user_123", None, 3600);
        let mut parts = parts_with_token(&token);

        let result = AdminOnly::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InsufficientPermissions)));
    }

    #[tokio::test]
    async fn admin_only_accepts_admin() {
        let state = AppState::default();
        let token = create_test_jwt("user_admin", Some("admin"), 3600);
        let mut parts = parts_with_token(&token);

        let result = AdminOnly::from_request_parts(&mut parts, &state).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn auditor_only_accepts_auditors_and_admins() {
        let state = AppState::default();

        let token = create_test_jwt("user_auditor", Some("auditor"), 3600);
        let mut parts = parts_with_token(&token);
        assert!(AuditorOnly::from_request_parts(&mut parts, &state)
            .await
            .is_ok());

        let token = create_test_jwt("user_admin", Some("admin"), 3600);
        let mut parts = parts_with_token(&token);
        assert!(AuditorOnly::from_request_parts(&mut parts, &state)
            .await
            .is_ok());

        let token = create_test_jwt("user_basic", None, 3600);
        let mut parts = parts_with_token(&token);
        assert!(matches!(
            AuditorOnly::from_request_parts(&mut parts, &state).await,
            Err(AuthError::InsufficientPermissions)
        ));
    }
}
