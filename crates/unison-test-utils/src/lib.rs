// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Unison context integration tests.
//!
//! Provides in-memory collaborator doubles and a harness with a temporary
//! SQLite database, so tests run without the storage, policy or consent
//! services.
//!
//! # Components
//!
//! - [`InMemoryKvBackend`] - durable backend double with an outage switch
//! - [`StaticPolicyDirectory`] - policy directory with a fixed group set
//! - [`TestHarness`] - temp database, doubles and config bundled together

pub mod harness;
pub mod mock_backend;
pub mod mock_policy;

pub use harness::TestHarness;
pub use mock_backend::InMemoryKvBackend;
pub use mock_policy::StaticPolicyDirectory;
