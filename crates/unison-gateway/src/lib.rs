// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Unison context service.
//!
//! Exposes the tiered KV, profile, dashboard, conversation and export
//! operations over axum. Public health routes (`/health`, `/ready`, `/metrics`)
//! bypass the access gate; every other route is checked against the scope
//! and roles of its [`auth::Operation`].

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::{AccessGate, ConsentGate, Denial, Grant, OpenGate, Operation};
pub use server::{build_router, start_server, GatewayState, MetricsRender, RequestLimits};
