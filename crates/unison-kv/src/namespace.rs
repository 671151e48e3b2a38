// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key namespace validation for tiered writes.

use std::str::FromStr;

use unison_core::{Rejection, Tier};

/// Decide whether `keys` may be written for `person_id` at `tier`.
///
/// Checks run in order: person id, tier, then every key. The first
/// offending key rejects the whole batch. Returns the parsed tier.
pub fn validate<'a, I>(person_id: &str, tier: &str, keys: I) -> Result<Tier, Rejection>
where
    I: IntoIterator<Item = &'a str>,
{
    if person_id.is_empty() {
        return Err(Rejection::InvalidPersonId);
    }

    let tier = Tier::from_str(tier).map_err(|_| Rejection::InvalidTier {
        tier: tier.to_string(),
    })?;

    let prefix = format!("{person_id}:");
    for key in keys {
        if !key.starts_with(&prefix) {
            return Err(Rejection::InvalidNamespace {
                key: key.to_string(),
            });
        }
        if let Some(segment) = tier.required_segment()
            && !key.contains(segment)
        {
            return Err(Rejection::TierMismatch {
                key: key.to_string(),
                expected: segment.to_string(),
            });
        }
    }

    Ok(tier)
}
