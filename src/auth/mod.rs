// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veriflow Labs

//! # Authentication Module
//!
//! This module provides JWT authentication for the Veriflow API.
//!
//! ## Auth Flow
//!
//! 1. The identity provider authenticates the user and issues a JWT
//! 2. Clients send `Authorization: Bearer <JWT>` on every request
//! 3. Verification server:
//!    - Fetches the provider's JWKS via HTTPS
//!    - Verifies JWT signature, expiry, issuer, audience
//!    - Extracts:
//!      - `sub` → canonical `user_id`
//!      - `role` claim → [`Role`] (defaults to applicant)
//!
//! ## Security
//!
//! - All non-health endpoints require authentication
//! - JWT verification uses HTTPS-only JWKS fetching
//! - JWKS is cached with TTL and served stale if a refresh fails
//! - Clock skew tolerance is 60 seconds

pub mod claims;
pub mod error;
pub mod extractor;
pub mod keys;
pub mod roles;

pub use claims::AuthenticatedUser;
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth, AuditorOnly};
pub use keys::KeyStore;
pub use roles::Role;
