// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded retry for calls to external collaborators.
//!
//! Every outbound call carries a fixed attempt budget, a per-attempt timeout
//! and an exponential backoff capped at a maximum delay, so no caller ever
//! waits indefinitely on a downstream service.

pub mod retry;

pub use retry::{Attempt, RetryError, RetryPolicy};
