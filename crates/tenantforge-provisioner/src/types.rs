//! Provisioning request and result models.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tenantforge_core::{InfrastructureKind, IspConfig, RequestId, TenantId};
use tenantforge_health::ContainerHealth;
use tenantforge_infra::{DeploymentArtifacts, MonitoringOutcome};
use tenantforge_resources::ResourceRequirements;

use crate::error::ProvisioningStage;
use crate::state::ProvisioningStatus;

/// Default wall-clock budget for workload deployment.
pub const DEFAULT_PROVISIONING_TIMEOUT: Duration = Duration::from_secs(600);

/// Errors constructing a [`ProvisioningRequest`].
///
/// These are the only errors the provisioning surface raises; everything
/// after request construction is reported through the result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The caller-supplied tenant key does not match the configuration.
    #[error("isp_id {isp_id} does not match config tenant {tenant}")]
    TenantMismatch {
        /// Tenant key supplied to the call.
        isp_id: TenantId,
        /// Tenant named by the configuration.
        tenant: TenantId,
    },
}

/// Immutable input for one provisioning operation.
///
/// Created once per provisioning call; never mutated. Construction
/// guarantees the tenant key matches the configuration; numeric bounds are
/// checked by the validation phase so that out-of-range values surface in
/// the result rather than as an exception.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningRequest {
    /// Generated unique ID for this operation.
    pub request_id: RequestId,
    /// Caller-supplied tenant key.
    pub isp_id: TenantId,
    /// Estimated customer count (1-50,000).
    pub customer_count: u32,
    /// Tenant configuration.
    pub config: IspConfig,
    /// Caller-supplied resource budget overriding the calculator.
    pub custom_resources: Option<ResourceRequirements>,
    /// Target container platform.
    pub infrastructure: InfrastructureKind,
    /// Deployment region label.
    pub region: String,
    /// Wall-clock budget for workload deployment (120-1800 s).
    pub provisioning_timeout: Duration,
    /// Whether a phase failure tears down created resources.
    pub enable_rollback: bool,
}

impl ProvisioningRequest {
    /// Create a request with defaults: Kubernetes, region `local`, a
    /// 600-second deployment budget, and rollback enabled.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::TenantMismatch`] if `isp_id` differs from
    /// `config.tenant_name`.
    pub fn new(
        isp_id: TenantId,
        customer_count: u32,
        config: IspConfig,
    ) -> Result<Self, RequestError> {
        if config.tenant_name != isp_id {
            return Err(RequestError::TenantMismatch {
                isp_id,
                tenant: config.tenant_name,
            });
        }

        Ok(Self {
            request_id: RequestId::generate(),
            isp_id,
            customer_count,
            config,
            custom_resources: None,
            infrastructure: InfrastructureKind::default(),
            region: "local".to_string(),
            provisioning_timeout: DEFAULT_PROVISIONING_TIMEOUT,
            enable_rollback: true,
        })
    }

    /// Target a specific container platform.
    #[must_use]
    pub fn with_infrastructure(mut self, infrastructure: InfrastructureKind) -> Self {
        self.infrastructure = infrastructure;
        self
    }

    /// Supply a resource budget instead of calculating one.
    #[must_use]
    pub fn with_custom_resources(mut self, resources: ResourceRequirements) -> Self {
        self.custom_resources = Some(resources);
        self
    }

    /// Set the deployment region label.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Set the deployment wall-clock budget.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.provisioning_timeout = timeout;
        self
    }

    /// Enable or disable automatic rollback on failure.
    #[must_use]
    pub fn with_rollback(mut self, enabled: bool) -> Self {
        self.enable_rollback = enabled;
        self
    }
}

/// Full audit trail and outcome of one provisioning operation.
///
/// Created at operation start, mutated throughout by the orchestrator, and
/// frozen at [`ProvisioningResult::mark_completed`]. Persistence is the
/// caller's responsibility; the orchestrator communicates purely in memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningResult {
    /// The operation's request ID.
    pub request_id: RequestId,
    /// The tenant being provisioned.
    pub isp_id: TenantId,
    /// Whether the operation reached `Ready`.
    pub success: bool,
    /// Final (or current, while in flight) status.
    pub status: ProvisioningStatus,
    /// When the operation started.
    pub start_time: DateTime<Utc>,
    /// When the operation finished.
    pub end_time: Option<DateTime<Utc>>,
    /// Wall-clock duration of the whole operation. Measured and reported,
    /// never enforced here.
    pub deployment_duration: Option<Duration>,
    /// Everything created on the platform, for rollback and audit.
    pub artifacts: DeploymentArtifacts,
    /// The budget the stack was deployed with.
    pub allocated_resources: Option<ResourceRequirements>,
    /// Final passing health snapshot, on success.
    pub health: Option<ContainerHealth>,
    /// Monitoring configuration outcome, once phase 5 ran.
    pub monitoring: Option<MonitoringOutcome>,
    /// Human-readable failure description.
    pub error_message: Option<String>,
    /// Which of the six phases failed.
    pub error_stage: Option<ProvisioningStage>,
    /// Whether rollback removed everything it attempted.
    pub rollback_completed: bool,
    /// Append-only, timestamped trail of every phase entry, success, and
    /// failure. Part of the contract: callers rely on it for post-mortem
    /// diagnosis without re-querying the platform.
    pub provisioning_logs: Vec<String>,
}

impl ProvisioningResult {
    /// Create the result shell for a starting operation.
    #[must_use]
    pub fn new(request: &ProvisioningRequest) -> Self {
        Self {
            request_id: request.request_id,
            isp_id: request.isp_id.clone(),
            success: false,
            status: ProvisioningStatus::Pending,
            start_time: Utc::now(),
            end_time: None,
            deployment_duration: None,
            artifacts: DeploymentArtifacts::new(),
            allocated_resources: None,
            health: None,
            monitoring: None,
            error_message: None,
            error_stage: None,
            rollback_completed: false,
            provisioning_logs: Vec::new(),
        }
    }

    /// Append a timestamped entry to the provisioning log.
    pub fn log(&mut self, message: impl AsRef<str>) {
        let stamp = Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");
        self.provisioning_logs
            .push(format!("[{stamp}] {}", message.as_ref()));
    }

    /// The URL the tenant stack is reachable at, preferring the external
    /// exposure.
    #[must_use]
    pub fn endpoint_url(&self) -> Option<&str> {
        self.artifacts
            .external_url
            .as_deref()
            .or(self.artifacts.internal_url.as_deref())
    }

    /// Stamp the end time and compute the deployment duration.
    pub fn mark_completed(&mut self, success: bool) {
        let now = Utc::now();
        self.success = success;
        self.end_time = Some(now);
        self.deployment_duration = (now - self.start_time).to_std().ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenantforge_core::PlanType;

    fn request() -> ProvisioningRequest {
        let tenant = TenantId::new("t-001").unwrap();
        let config = IspConfig::new(tenant.clone(), "Tenant One", PlanType::Premium);
        ProvisioningRequest::new(tenant, 500, config).unwrap()
    }

    #[test]
    fn request_defaults() {
        let request = request();
        assert_eq!(request.infrastructure, InfrastructureKind::Kubernetes);
        assert_eq!(request.provisioning_timeout, DEFAULT_PROVISIONING_TIMEOUT);
        assert!(request.enable_rollback);
        assert!(request.custom_resources.is_none());
    }

    #[test]
    fn tenant_mismatch_is_rejected() {
        let tenant = TenantId::new("t-001").unwrap();
        let other = TenantId::new("t-002").unwrap();
        let config = IspConfig::new(other, "Other Tenant", PlanType::Standard);

        let err = ProvisioningRequest::new(tenant, 10, config).unwrap_err();
        assert!(matches!(err, RequestError::TenantMismatch { .. }));
    }

    #[test]
    fn builder_methods_compose() {
        let request = request()
            .with_infrastructure(InfrastructureKind::DockerCompose)
            .with_region("eu-west")
            .with_timeout(Duration::from_secs(300))
            .with_rollback(false);

        assert_eq!(request.infrastructure, InfrastructureKind::DockerCompose);
        assert_eq!(request.region, "eu-west");
        assert_eq!(request.provisioning_timeout, Duration::from_secs(300));
        assert!(!request.enable_rollback);
    }

    #[test]
    fn result_log_is_append_only_and_timestamped() {
        let mut result = ProvisioningResult::new(&request());
        result.log("phase 1: validation started");
        result.log("phase 1: validation passed");

        assert_eq!(result.provisioning_logs.len(), 2);
        assert!(result.provisioning_logs[0].starts_with('['));
        assert!(result.provisioning_logs[1].contains("validation passed"));
    }

    #[test]
    fn mark_completed_stamps_duration() {
        let mut result = ProvisioningResult::new(&request());
        result.mark_completed(true);

        assert!(result.success);
        assert!(result.end_time.is_some());
        assert!(result.deployment_duration.is_some());
    }

    #[test]
    fn endpoint_prefers_external_url() {
        let mut result = ProvisioningResult::new(&request());
        assert!(result.endpoint_url().is_none());

        result.artifacts.internal_url = Some("http://127.0.0.1:8080".to_string());
        assert_eq!(result.endpoint_url(), Some("http://127.0.0.1:8080"));

        result.artifacts.external_url = Some("https://t-001.example.net".to_string());
        assert_eq!(result.endpoint_url(), Some("https://t-001.example.net"));
    }
}
