// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veriflow Labs

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! The identity provider publishes its signing keys at a JWKS endpoint.
//! [`KeyStore`] fetches them over HTTPS, caches them with a TTL, and
//! serves stale keys if a refresh fails so verification keeps working
//! through provider blips.

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::RwLock;
use tracing::warn;

use super::error::AuthError;

/// Default JWKS cache TTL (5 minutes).
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

struct CachedKeys {
    jwks: JwkSet,
    fetched_at: Instant,
}

/// Cached JWKS client used for production JWT verification.
#[derive(Clone)]
pub struct KeyStore {
    /// JWKS endpoint URL
    jwks_url: String,
    /// Cache TTL
    cache_ttl: Duration,
    /// Cached key set
    cache: Arc<RwLock<Option<CachedKeys>>>,
    /// HTTP client
    client: reqwest::Client,
}

impl KeyStore {
    /// Create a key store for the given JWKS endpoint
    /// (e.g. `https://auth.example.com/.well-known/jwks.json`).
    pub fn new(jwks_url: impl Into<String>) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
            cache: Arc::new(RwLock::new(None)),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Create with custom cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Get the JWKS URL.
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Get a decoding key for the given key ID.
    pub async fn decoding_key_for(&self, kid: &str) -> Result<(DecodingKey, Algorithm), AuthError> {
        let jwks = self.current_keys().await?;

        let jwk = jwks
            .keys
            .iter()
            .find(|key| key.common.key_id.as_deref() == Some(kid))
            .ok_or(AuthError::NoMatchingKey)?;

        decoding_key_from_jwk(jwk)
    }

    /// Get any usable decoding key (for tokens without a `kid` header).
    pub async fn any_decoding_key(&self) -> Result<(DecodingKey, Algorithm), AuthError> {
        let jwks = self.current_keys().await?;

        for jwk in &jwks.keys {
            if let Ok(result) = decoding_key_from_jwk(jwk) {
                return Ok(result);
            }
        }

        Err(AuthError::NoMatchingKey)
    }

    /// Force refresh the cached key set.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let jwks = self.fetch_keys().await?;
        let mut cache = self.cache.write().await;
        *cache = Some(CachedKeys {
            jwks,
            fetched_at: Instant::now(),
        });
        Ok(())
    }

    /// Whether a fresh key set is currently cached.
    pub async fn is_cached(&self) -> bool {
        let cache = self.cache.read().await;
        match &*cache {
            Some(entry) => entry.fetched_at.elapsed() < self.cache_ttl,
            None => false,
        }
    }

    /// Return the cached key set, refreshing it when the TTL has lapsed.
    /// A failed refresh falls back to stale keys when any are cached.
    async fn current_keys(&self) -> Result<JwkSet, AuthError> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = &*cache {
                if entry.fetched_at.elapsed() < self.cache_ttl {
                    return Ok(entry.jwks.clone());
                }
            }
        }

        match self.fetch_keys().await {
            Ok(jwks) => {
                let mut cache = self.cache.write().await;
                *cache = Some(CachedKeys {
                    jwks: jwks.clone(),
                    fetched_at: Instant::now(),
                });
                Ok(jwks)
            }
            Err(err) => {
                let cache = self.cache.read().await;
                if let Some(entry) = &*cache {
                    warn!(error = %err, "JWKS refresh failed, serving stale keys");
                    return Ok(entry.jwks.clone());
                }
                Err(err)
            }
        }
    }

    async fn fetch_keys(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::JwksFetchError(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))
    }
}

/// Convert a JWK into a decoding key plus the algorithm to validate with.
fn decoding_key_from_jwk(jwk: &Jwk) -> Result<(DecodingKey, Algorithm), AuthError> {
    let (key, default_alg) = match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => (
            DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                .map_err(|e| AuthError::InternalError(format!("invalid RSA key in JWKS: {e}")))?,
            Algorithm::RS256,
        ),
        AlgorithmParameters::EllipticCurve(ec) => (
            DecodingKey::from_ec_components(&ec.x, &ec.y)
                .map_err(|e| AuthError::InternalError(format!("invalid EC key in JWKS: {e}")))?,
            Algorithm::ES256,
        ),
        _ => {
            return Err(AuthError::InternalError(
                "unsupported key type in JWKS".to_string(),
            ))
        }
    };

    Ok((key, declared_algorithm(jwk).unwrap_or(default_alg)))
}

/// The algorithm the JWK itself declares, when it maps to one we verify.
fn declared_algorithm(jwk: &Jwk) -> Option<Algorithm> {
    match jwk.common.key_algorithm? {
        KeyAlgorithm::RS256 => Some(Algorithm::RS256),
        KeyAlgorithm::RS384 => Some(Algorithm::RS384),
        KeyAlgorithm::RS512 => Some(Algorithm::RS512),
        KeyAlgorithm::ES256 => Some(Algorithm::ES256),
        KeyAlgorithm::ES384 => Some(Algorithm::ES384),
        _ => None,
    }
}
