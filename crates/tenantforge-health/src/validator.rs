//! The health validator and its bounded polling loop.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{HealthError, Result};
use crate::types::{ContainerHealth, CustomCheck, HealthStatus};

/// Fixed probe paths on the deployed instance.
const LIVENESS_PATH: &str = "/health/live";
const DATABASE_PATH: &str = "/health/database";
const CACHE_PATH: &str = "/health/cache";
const SSL_PATH: &str = "/health/ssl";

/// Check names used in reports.
const API_CHECK: &str = "api_health";
const DATABASE_CHECK: &str = "database_health";
const CACHE_CHECK: &str = "cache_health";
const SSL_CHECK: &str = "ssl_health";

/// Configuration for the health validator.
#[derive(Debug, Clone)]
pub struct HealthConfig {
    /// Per-probe HTTP timeout.
    pub request_timeout: Duration,
    /// Default interval between polls in [`HealthValidator::wait_for_healthy`].
    pub check_interval: Duration,
    /// Default total budget for [`HealthValidator::wait_for_healthy`].
    pub max_wait: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(5),
            check_interval: Duration::from_secs(2),
            max_wait: Duration::from_secs(60),
        }
    }
}

/// The outcome of one probe.
enum ProbeOutcome {
    /// HTTP 2xx within the timeout.
    Pass { elapsed_ms: u64 },
    /// The instance answered with a non-success status.
    Fail { elapsed_ms: u64, message: String },
    /// No HTTP answer at all (connection refused, timeout, DNS).
    Unreachable { message: String },
}

/// Polls the health endpoints of a deployed instance.
pub struct HealthValidator {
    http: reqwest::Client,
    config: HealthConfig,
}

impl HealthValidator {
    /// Create a validator.
    ///
    /// # Errors
    ///
    /// Returns [`HealthError::Client`] if the HTTP client cannot be built.
    pub fn new(config: HealthConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(HealthError::Client)?;

        Ok(Self { http, config })
    }

    /// Create a validator with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HealthError::Client`] if the HTTP client cannot be built.
    pub fn with_defaults() -> Result<Self> {
        Self::new(HealthConfig::default())
    }

    /// Get a reference to the validator config.
    #[must_use]
    pub fn config(&self) -> &HealthConfig {
        &self.config
    }

    async fn probe(&self, base_url: &str, path: &str) -> ProbeOutcome {
        let url = format!("{}{path}", base_url.trim_end_matches('/'));
        let started = Instant::now();

        match self.http.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => ProbeOutcome::Pass {
                elapsed_ms: elapsed_ms(started),
            },
            Ok(resp) => ProbeOutcome::Fail {
                elapsed_ms: elapsed_ms(started),
                message: format!("HTTP {}", resp.status().as_u16()),
            },
            Err(e) if e.is_connect() || e.is_timeout() => ProbeOutcome::Unreachable {
                message: e.to_string(),
            },
            Err(e) => ProbeOutcome::Fail {
                elapsed_ms: elapsed_ms(started),
                message: e.to_string(),
            },
        }
    }

    /// Probe every health endpoint once and aggregate the results.
    ///
    /// Each probe failure is recorded individually; the report always lists
    /// every failing subsystem. The overall verdict is healthy only if both
    /// critical checks (API liveness, database) pass. The SSL probe is
    /// skipped and auto-passes when the base URL is not TLS.
    pub async fn validate_container_health(
        &self,
        container_id: &str,
        base_url: &str,
        custom_checks: &[CustomCheck],
    ) -> ContainerHealth {
        let mut response_times_ms = BTreeMap::new();
        let mut failed_checks = Vec::new();
        let mut error_messages = BTreeMap::new();
        let mut reachable = false;

        let mut run = |name: &str, outcome: ProbeOutcome| -> bool {
            match outcome {
                ProbeOutcome::Pass { elapsed_ms } => {
                    response_times_ms.insert(name.to_string(), elapsed_ms);
                    reachable = true;
                    true
                }
                ProbeOutcome::Fail { elapsed_ms, message } => {
                    response_times_ms.insert(name.to_string(), elapsed_ms);
                    failed_checks.push(name.to_string());
                    error_messages.insert(name.to_string(), message);
                    reachable = true;
                    false
                }
                ProbeOutcome::Unreachable { message } => {
                    failed_checks.push(name.to_string());
                    error_messages.insert(name.to_string(), message);
                    false
                }
            }
        };

        let api_healthy = run(API_CHECK, self.probe(base_url, LIVENESS_PATH).await);
        let database_healthy = run(DATABASE_CHECK, self.probe(base_url, DATABASE_PATH).await);
        let cache_healthy = run(CACHE_CHECK, self.probe(base_url, CACHE_PATH).await);

        // A stack serving plain HTTP has no TLS chain to validate.
        let ssl_healthy = if base_url.starts_with("https://") {
            run(SSL_CHECK, self.probe(base_url, SSL_PATH).await)
        } else {
            debug!(container_id, "Base URL is not TLS; SSL check auto-passes");
            true
        };

        for check in custom_checks {
            let _ = run(&check.name, self.probe(base_url, &check.path).await);
        }

        let overall = if api_healthy && database_healthy {
            HealthStatus::Healthy
        } else if reachable {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Starting
        };

        ContainerHealth {
            container_id: container_id.to_string(),
            overall,
            api_healthy,
            database_healthy,
            cache_healthy,
            ssl_healthy,
            response_times_ms,
            failed_checks,
            error_messages,
            checked_at: Utc::now(),
        }
    }

    /// Poll until the instance is healthy or the budget is exhausted.
    ///
    /// An explicit bounded loop: per-attempt failures are logged and
    /// swallowed, the loop sleeps `check_interval` between attempts, and a
    /// [`HealthError::Timeout`] is raised once `max_wait` has elapsed.
    ///
    /// # Errors
    ///
    /// Returns [`HealthError::Timeout`] when the budget is exhausted without
    /// a healthy verdict.
    pub async fn wait_for_healthy(
        &self,
        container_id: &str,
        base_url: &str,
        custom_checks: &[CustomCheck],
        max_wait: Duration,
        check_interval: Duration,
    ) -> Result<ContainerHealth> {
        let deadline = Instant::now() + max_wait;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let health = self
                .validate_container_health(container_id, base_url, custom_checks)
                .await;

            if health.is_healthy() {
                info!(container_id, attempt, "Instance is healthy");
                return Ok(health);
            }

            debug!(
                container_id,
                attempt,
                status = ?health.overall,
                failed = ?health.failed_checks,
                "Health check attempt failed; retrying"
            );

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!(
                    container_id,
                    attempts = attempt,
                    waited_secs = max_wait.as_secs(),
                    "Health wait budget exhausted"
                );
                return Err(HealthError::Timeout {
                    container_id: container_id.to_string(),
                    waited_secs: max_wait.as_secs(),
                    attempts: attempt,
                });
            }

            tokio::time::sleep(check_interval.min(remaining)).await;
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
