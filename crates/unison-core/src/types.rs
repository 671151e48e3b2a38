// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Unison context crates.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Key segment that every Tier-B key must contain.
pub const PROFILE_SEGMENT: &str = ":profile:";

/// Storage tier of a KV write.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum Tier {
    A,
    B,
    C,
}

impl Tier {
    /// Segment a key must contain to be written at this tier, if any.
    pub fn required_segment(self) -> Option<&'static str> {
        match self {
            Tier::B => Some(PROFILE_SEGMENT),
            Tier::A | Tier::C => None,
        }
    }

    /// Whether writes at this tier maintain the export index.
    pub fn is_indexed(self) -> bool {
        matches!(self, Tier::B)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    /// Short label for health/readiness bodies.
    pub fn label(&self) -> &str {
        match self {
            HealthStatus::Healthy => "ok",
            HealthStatus::Degraded(_) => "degraded",
            HealthStatus::Unhealthy(_) => "unavailable",
        }
    }
}

/// Identifies the kind of collaborator an adapter talks to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    KvBackend,
    Policy,
    Storage,
    Observability,
}

/// Current wall-clock time as fractional seconds since the Unix epoch.
///
/// This is the representation used for every `updated_at` / `exported_at`.
pub fn now_epoch_secs() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn tier_parses_exact_letters_only() {
        assert_eq!(Tier::from_str("A").unwrap(), Tier::A);
        assert_eq!(Tier::from_str("B").unwrap(), Tier::B);
        assert_eq!(Tier::from_str("C").unwrap(), Tier::C);
        assert!(Tier::from_str("Z").is_err());
        assert!(Tier::from_str("").is_err());
    }

    #[test]
    fn only_tier_b_requires_profile_segment() {
        assert_eq!(Tier::B.required_segment(), Some(":profile:"));
        assert_eq!(Tier::A.required_segment(), None);
        assert!(!Tier::C.is_indexed());
    }

    #[test]
    fn health_labels() {
        assert_eq!(HealthStatus::Healthy.label(), "ok");
        assert!(!HealthStatus::Unhealthy("down".into()).is_healthy());
    }

    #[test]
    fn epoch_seconds_is_recent() {
        // 2020-01-01
        assert!(now_epoch_secs() > 1_577_836_800.0);
    }
}
