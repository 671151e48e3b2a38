// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for store and gateway integration tests.
//!
//! `TestHarness` owns a temporary SQLite database, the collaborator doubles,
//! a payload cipher and a config, so each test starts from a clean slate.

use std::sync::Arc;

use unison_config::ContextConfig;
use unison_core::ContextError;
use unison_storage::database::map_tr_err;
use unison_storage::Database;
use unison_vault::PayloadCipher;

use crate::mock_backend::InMemoryKvBackend;
use crate::mock_policy::StaticPolicyDirectory;

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    encryption_key: Option<[u8; 32]>,
    policy_groups: Vec<String>,
    validate_groups: bool,
    max_cards: Option<usize>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            encryption_key: None,
            policy_groups: Vec::new(),
            validate_groups: false,
            max_cards: None,
        }
    }

    /// Encrypt stored payloads with `key`.
    pub fn with_encryption_key(mut self, key: [u8; 32]) -> Self {
        self.encryption_key = Some(key);
        self
    }

    /// Enable policy-group validation against the given known groups.
    pub fn with_policy_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.policy_groups = groups.into_iter().map(Into::into).collect();
        self.validate_groups = true;
        self
    }

    pub fn with_max_cards(mut self, max_cards: usize) -> Self {
        self.max_cards = Some(max_cards);
        self
    }

    pub async fn build(self) -> Result<TestHarness, ContextError> {
        let temp_dir = tempfile::TempDir::new().map_err(ContextError::storage)?;
        let db_path = temp_dir.path().join("context.db");
        let db_path = db_path.to_string_lossy().to_string();
        let database = Arc::new(Database::open(&db_path).await?);

        let mut config = ContextConfig::default();
        config.database.path = db_path;
        config.policy.validate_groups = self.validate_groups;
        if let Some(max_cards) = self.max_cards {
            config.dashboard.max_cards = max_cards;
        }

        Ok(TestHarness {
            database,
            backend: Arc::new(InMemoryKvBackend::new()),
            policy: Arc::new(StaticPolicyDirectory::with_groups(self.policy_groups)),
            cipher: PayloadCipher::new(self.encryption_key),
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// Clean per-test environment.
pub struct TestHarness {
    /// SQLite database in a temp dir, removed on drop.
    pub database: Arc<Database>,
    pub backend: Arc<InMemoryKvBackend>,
    pub policy: Arc<StaticPolicyDirectory>,
    pub cipher: PayloadCipher,
    /// Defaults, with the database path and builder options applied.
    pub config: ContextConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness with default options.
    pub async fn new() -> Result<Self, ContextError> {
        Self::builder().build().await
    }

    /// Drop one of the record tables so every later statement against it
    /// fails.
    pub async fn break_table(&self, table: &'static str) -> Result<(), ContextError> {
        self.database
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch(&format!("DROP TABLE {table};"))
            })
            .await
            .map_err(map_tr_err)
    }
}
