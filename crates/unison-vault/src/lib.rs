// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! At-rest encryption for profile and dashboard payloads.
//!
//! [`crypto`] holds the raw AES-256-GCM seal/open primitives. [`cipher`]
//! wraps them in the `enc:v1:` text envelope stored in SQLite and provides
//! the two-branch decode path that falls back to plaintext JSON for rows
//! written before a key was configured.

pub mod cipher;
pub mod crypto;

pub use cipher::{Decoded, DecodePath, PayloadCipher, ENVELOPE_PREFIX};
