// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Policy collaborator contract.

use async_trait::async_trait;

use crate::error::ContextError;
use crate::traits::adapter::PluginAdapter;

/// Directory of named policy groups.
#[async_trait]
pub trait PolicyDirectory: PluginAdapter {
    /// Returns whether the named group exists.
    ///
    /// `Err` means the directory could not be reached within its retry budget.
    async fn group_exists(&self, name: &str) -> Result<bool, ContextError>;
}
