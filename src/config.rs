// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veriflow Labs

//! # Runtime Configuration Constants
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `AUTH_JWKS_URL` | JWKS endpoint for JWT verification | Required for production |
//! | `AUTH_ISSUER` | Expected JWT issuer claim | Required for production |
//! | `AUTH_AUDIENCE` | Expected JWT audience claim | Optional |
//! | `SESSION_TTL_SECS` | Idle time before a session is evicted | `86400` |
//! | `SWEEP_INTERVAL_SECS` | Delay between sweeper passes | `300` |
//! | `AUDIT_CAPACITY` | Events retained in the audit buffer | `10000` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

/// Environment variable name for the server bind address.
pub const HOST_ENV: &str = "HOST";

/// Environment variable name for the server bind port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the JWKS endpoint.
///
/// When set, every bearer token's signature is verified against the keys
/// published there. When unset, the server runs in development mode and
/// skips signature verification.
pub const JWKS_URL_ENV: &str = "AUTH_JWKS_URL";

/// Environment variable name for the expected JWT issuer claim.
pub const ISSUER_ENV: &str = "AUTH_ISSUER";

/// Environment variable name for the expected JWT audience claim.
pub const AUDIENCE_ENV: &str = "AUTH_AUDIENCE";

/// Environment variable name for the session idle TTL in seconds.
pub const SESSION_TTL_ENV: &str = "SESSION_TTL_SECS";

/// Environment variable name for the sweep interval in seconds.
pub const SWEEP_INTERVAL_ENV: &str = "SWEEP_INTERVAL_SECS";

/// Environment variable name for the audit buffer capacity.
pub const AUDIT_CAPACITY_ENV: &str = "AUDIT_CAPACITY";

/// Environment variable name for the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default bind address.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 8080;

/// Read a string variable, falling back to a default when unset.
pub fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Read a numeric variable, falling back to a default when unset or
/// unparseable.
pub fn env_u64_or(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

/// Read a usize variable, falling back to a default when unset or
/// unparseable.
pub fn env_usize_or(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}
