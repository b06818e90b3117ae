// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veriflow Labs

//! Veriflow - Verification Session Service
//!
//! This crate provides the verification session service behind the Veriflow
//! dashboard: a state machine tracking multi-step identity verification
//! flows, exposed over an authenticated HTTP API.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Authentication and authorization (JWT)
//! - `session` - Verification session state machine and store
//! - `audit` - In-memory audit trail
//! - `sweeper` - TTL eviction of idle sessions

pub mod api;
pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod session;
pub mod state;
pub mod sweeper;
