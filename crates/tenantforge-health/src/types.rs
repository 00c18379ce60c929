//! Health snapshot types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregated health verdict for a deployed instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Both critical subsystems (API liveness, database) are healthy.
    Healthy,
    /// At least one critical subsystem is failing.
    Unhealthy,
    /// The instance is not answering at all yet; likely still booting.
    Starting,
    /// No validation has been performed.
    #[default]
    Unknown,
}

/// A caller-supplied additional health probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomCheck {
    /// Check name used in the report (e.g. `billing_health`).
    pub name: String,
    /// Path probed on the instance (e.g. `/health/billing`).
    pub path: String,
}

impl CustomCheck {
    /// Create a custom check.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// One validation snapshot for a deployed instance.
///
/// Recomputed on every poll; the orchestrator keeps only the final passing
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerHealth {
    /// The container that was validated.
    pub container_id: String,
    /// Aggregated verdict.
    pub overall: HealthStatus,
    /// API liveness probe result (critical).
    pub api_healthy: bool,
    /// Database probe result (critical).
    pub database_healthy: bool,
    /// Cache probe result (informational).
    pub cache_healthy: bool,
    /// SSL probe result (informational; auto-passes for non-TLS URLs).
    pub ssl_healthy: bool,
    /// Response time per executed probe, in milliseconds.
    pub response_times_ms: BTreeMap<String, u64>,
    /// Name of every failing check.
    pub failed_checks: Vec<String>,
    /// Failure detail per failing check.
    pub error_messages: BTreeMap<String, String>,
    /// When this snapshot was taken.
    pub checked_at: DateTime<Utc>,
}

impl ContainerHealth {
    /// True if the overall verdict is healthy.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.overall == HealthStatus::Healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_status_is_unknown() {
        assert_eq!(HealthStatus::default(), HealthStatus::Unknown);
    }

    #[test]
    fn health_serde_round_trip() {
        let health = ContainerHealth {
            container_id: "abc".to_string(),
            overall: HealthStatus::Healthy,
            api_healthy: true,
            database_healthy: true,
            cache_healthy: false,
            ssl_healthy: true,
            response_times_ms: BTreeMap::new(),
            failed_checks: vec!["cache_health".to_string()],
            error_messages: BTreeMap::new(),
            checked_at: Utc::now(),
        };

        let json = serde_json::to_string(&health).unwrap();
        assert!(json.contains("\"overall\":\"healthy\""));
    }
}
