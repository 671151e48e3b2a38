// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row-level upsert/get for the context tables.

pub mod conversations;
pub mod dashboards;
pub mod profiles;
