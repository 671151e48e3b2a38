// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`PluginAdapter`] for the context database so it reports health and
//! shuts down alongside the remote collaborators.

use async_trait::async_trait;
use unison_core::{AdapterType, ContextError, HealthStatus, PluginAdapter};

use crate::database::Database;

#[async_trait]
impl PluginAdapter for Database {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, ContextError> {
        match self.ping().await {
            Ok(status) => Ok(status),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), ContextError> {
        self.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn database_reports_as_storage_adapter() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("adapter.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();

        assert_eq!(db.name(), "sqlite");
        assert_eq!(db.adapter_type(), AdapterType::Storage);
        assert_eq!(db.health_check().await.unwrap(), HealthStatus::Healthy);
        db.shutdown().await.unwrap();
    }
}
