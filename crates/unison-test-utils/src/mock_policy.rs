// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Policy directory with a fixed set of groups.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use unison_core::{AdapterType, ContextError, HealthStatus, PluginAdapter, PolicyDirectory};

#[derive(Debug, Default)]
pub struct StaticPolicyDirectory {
    groups: HashSet<String>,
    unreachable: AtomicBool,
}

impl StaticPolicyDirectory {
    pub fn with_groups<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            groups: groups.into_iter().map(Into::into).collect(),
            unreachable: AtomicBool::new(false),
        }
    }

    /// Simulate the policy service being down.
    pub fn set_reachable(&self, reachable: bool) {
        self.unreachable.store(!reachable, Ordering::SeqCst);
    }
}

#[async_trait]
impl PluginAdapter for StaticPolicyDirectory {
    fn name(&self) -> &str {
        "static-policy"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Policy
    }

    async fn health_check(&self) -> Result<HealthStatus, ContextError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ContextError> {
        Ok(())
    }
}

#[async_trait]
impl PolicyDirectory for StaticPolicyDirectory {
    async fn group_exists(&self, name: &str) -> Result<bool, ContextError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(ContextError::Policy {
                message: "policy service unreachable".to_string(),
                source: None,
            });
        }
        Ok(self.groups.contains(name))
    }
}
