// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Person profile store.
//!
//! A profile is an arbitrary JSON object. Before it is persisted the
//! `policy_group` (if any) is confirmed with the policy directory and the
//! `payments` section is reduced to its allow-list. Reads return the stored
//! profile together with a PII-masked copy.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};
use unison_core::{now_epoch_secs, PolicyDirectory, Rejection, StoredRecord};
use unison_prometheus::record_decrypt_fallback;
use unison_storage::queries::profiles;
use unison_storage::{Database, ProfileRow};
use unison_vault::PayloadCipher;

use crate::payments::sanitize_payments;
use crate::redact::redact;

const RECORD: &str = "profile";

/// A stored profile and its redacted twin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileView {
    pub profile: Value,
    pub profile_redacted: Value,
    pub updated_at: f64,
}

pub struct ProfileStore {
    db: Arc<Database>,
    cipher: PayloadCipher,
    /// Present only when policy-group validation is enabled.
    policy: Option<Arc<dyn PolicyDirectory>>,
}

impl ProfileStore {
    pub fn new(
        db: Arc<Database>,
        cipher: PayloadCipher,
        policy: Option<Arc<dyn PolicyDirectory>>,
    ) -> Self {
        Self { db, cipher, policy }
    }

    /// Sanitize, encrypt and upsert `profile` for `person_id`.
    ///
    /// Persistence is attempted once; a failure is reported, not retried.
    pub async fn put(&self, person_id: &str, profile: &Value) -> Result<(), Rejection> {
        if person_id.is_empty() {
            return Err(Rejection::InvalidPersonId);
        }
        let Value::Object(fields) = profile else {
            return Err(Rejection::InvalidProfile);
        };
        let mut fields = fields.clone();

        if let (Some(policy), Some(group)) = (self.policy.as_ref(), fields.get("policy_group")) {
            self.confirm_group(policy.as_ref(), group).await?;
        }

        if let Some(payments) = fields.get("payments") {
            let clean = sanitize_payments(payments);
            fields.insert("payments".to_string(), clean);
        }

        let failed = || Rejection::StorageFailed {
            record: StoredRecord::Profile,
        };

        let blob = self.cipher.encode(&Value::Object(fields)).map_err(|e| {
            error!(person_id, error = %e, "failed to encode profile");
            failed()
        })?;

        let row = ProfileRow {
            person_id: person_id.to_string(),
            profile_blob: blob,
            updated_at: now_epoch_secs(),
        };
        profiles::upsert_profile(&self.db, &row).await.map_err(|e| {
            error!(person_id, error = %e, "failed to persist profile");
            failed()
        })?;

        debug!(person_id, encrypted = self.cipher.is_enabled(), "profile stored");
        Ok(())
    }

    async fn confirm_group(
        &self,
        policy: &dyn PolicyDirectory,
        group: &Value,
    ) -> Result<(), Rejection> {
        let Some(name) = group.as_str() else {
            return Err(Rejection::InvalidPolicyGroup {
                group: group.to_string(),
            });
        };
        match policy.group_exists(name).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(Rejection::InvalidPolicyGroup {
                group: name.to_string(),
            }),
            Err(e) => {
                warn!(group = name, error = %e, "policy group could not be confirmed");
                Err(Rejection::InvalidPolicyGroup {
                    group: name.to_string(),
                })
            }
        }
    }

    /// Load and decode a profile. `Ok(None)` when the person has none.
    pub async fn get(&self, person_id: &str) -> Result<Option<ProfileView>, Rejection> {
        let row = profiles::get_profile(&self.db, person_id)
            .await
            .map_err(|e| {
                error!(person_id, error = %e, "failed to read profile");
                Rejection::StorageFailed {
                    record: StoredRecord::Profile,
                }
            })?;
        let Some(row) = row else {
            return Ok(None);
        };

        let decoded = self.cipher.decode(RECORD, &row.profile_blob);
        if decoded.fallback {
            record_decrypt_fallback(RECORD);
        }

        Ok(Some(ProfileView {
            profile_redacted: redact(&decoded.value),
            profile: decoded.value,
            updated_at: row.updated_at,
        }))
    }
}
