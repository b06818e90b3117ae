// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veriflow Labs

//! Shared application state handed to every handler.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::audit::AuditLog;
use crate::auth::KeyStore;
use crate::config;
use crate::session::VerificationService;

/// Authentication configuration.
///
/// With `keys` set the server verifies token signatures against the
/// provider's JWKS (production mode). Without it, tokens are decoded but
/// not verified (development mode).
#[derive(Clone)]
pub struct AuthConfig {
    /// JWKS client, present in production mode
    pub keys: Option<KeyStore>,
    /// Expected `iss` claim, when configured
    pub issuer: Option<String>,
    /// Expected `aud` claim, when configured
    pub audience: Option<String>,
}

impl AuthConfig {
    /// Build from `AUTH_JWKS_URL`, `AUTH_ISSUER` and `AUTH_AUDIENCE`.
    pub fn from_env() -> Self {
        let keys = std::env::var(config::JWKS_URL_ENV).ok().map(KeyStore::new);
        let issuer = std::env::var(config::ISSUER_ENV).ok();
        let audience = std::env::var(config::AUDIENCE_ENV).ok();

        match &keys {
            Some(store) => {
                info!(jwks_url = store.jwks_url(), "JWT signature verification enabled");
            }
            None => {
                warn!(
                    "{} not set, tokens are accepted without signature verification \
                     (development mode)",
                    config::JWKS_URL_ENV
                );
            }
        }

        Self {
            keys,
            issuer,
            audience,
        }
    }

    /// Development mode: no JWKS, no issuer or audience checks.
    pub fn development() -> Self {
        Self {
            keys: None,
            issuer: None,
            audience: None,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    /// Verification session service
    pub verification: VerificationService,
    /// Audit trail
    pub audit: Arc<AuditLog>,
    /// Authentication configuration
    pub auth_config: Arc<AuthConfig>,
    /// Process start time, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        verification: VerificationService,
        audit: Arc<AuditLog>,
        auth_config: AuthConfig,
    ) -> Self {
        Self {
            verification,
            audit,
            auth_config: Arc::new(auth_config),
            started_at: Instant::now(),
        }
    }

    /// Seconds since the state was created.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(
            VerificationService::default(),
            Arc::new(AuditLog::new()),
            AuthConfig::development(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_runs_in_development_mode() {
        let state = AppState::default();
        assert!(state.auth_config.keys.is_none());
        assert!(state.auth_config.issuer.is_none());
    }

    #[test]
    fn from_env_picks_up_jwks_configuration() {
        std::env::set_var(config::JWKS_URL_ENV, "https://auth.test/jwks.json");
        std::env::set_var(config::ISSUER_ENV, "https://auth.test");

        let auth = AuthConfig::from_env();
        assert!(auth.keys.is_some());
        assert_eq!(auth.issuer.as_deref(), Some("https://auth.test"));
        assert!(auth.audience.is_none());

        std::env::remove_var(config::JWKS_URL_ENV);
        std::env::remove_var(config::ISSUER_ENV);
    }

    #[test]
    fn uptime_counts_from_creation() {
        let state = AppState::default();
        assert!(state.uptime_seconds() < 5);
    }
}
