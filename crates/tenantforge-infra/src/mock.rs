//! A mock adapter for testing without real infrastructure.
//!
//! Records the same artifact trail the real adapters do and supports
//! per-phase failure injection, so orchestrator tests can exercise every
//! rollback path deterministically.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use tenantforge_core::{naming, InfrastructureKind, IspConfig, TenantId};
use tenantforge_resources::ResourceRequirements;

use crate::adapter::InfrastructureAdapter;
use crate::error::{DeployPhase, InfraError, Result};
use crate::types::{CreatedResource, DeploymentArtifacts, MonitoringOutcome, SslOutcome};

/// The phase at which the mock adapter fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// Fail mid-way through infrastructure provisioning, after the
    /// isolation boundary and storage were recorded.
    Provision,
    /// Fail workload deployment with a platform error.
    Deploy,
    /// Fail workload deployment with a timeout.
    DeployTimeout,
    /// Fail networking configuration.
    Networking,
    /// Fail SSL configuration.
    Ssl,
}

#[derive(Default)]
struct MockState {
    provision_calls: usize,
    deploy_calls: usize,
    rollback_calls: usize,
    last_rollback_resources: Vec<CreatedResource>,
}

/// A scriptable in-memory adapter.
pub struct MockAdapter {
    kind: InfrastructureKind,
    fail_at: Option<MockFailure>,
    ready: bool,
    monitoring_degraded: bool,
    rollback_succeeds: bool,
    endpoint_override: Option<String>,
    state: Mutex<MockState>,
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAdapter {
    /// Create a fully-succeeding mock for the Compose platform.
    #[must_use]
    pub fn new() -> Self {
        Self {
            kind: InfrastructureKind::DockerCompose,
            fail_at: None,
            ready: true,
            monitoring_degraded: false,
            rollback_succeeds: true,
            endpoint_override: None,
            state: Mutex::new(MockState::default()),
        }
    }

    /// Create a fully-succeeding mock for the given platform.
    #[must_use]
    pub fn with_kind(kind: InfrastructureKind) -> Self {
        Self {
            kind,
            ..Self::new()
        }
    }

    /// Inject a failure at the given phase.
    #[must_use]
    pub fn fail_at(mut self, failure: MockFailure) -> Self {
        self.fail_at = Some(failure);
        self
    }

    /// Control the readiness probe result.
    #[must_use]
    pub fn with_readiness(mut self, ready: bool) -> Self {
        self.ready = ready;
        self
    }

    /// Make monitoring configuration report a degraded outcome.
    #[must_use]
    pub fn with_monitoring_degraded(mut self) -> Self {
        self.monitoring_degraded = true;
        self
    }

    /// Control whether rollback reports full success.
    #[must_use]
    pub fn with_rollback_result(mut self, succeeds: bool) -> Self {
        self.rollback_succeeds = succeeds;
        self
    }

    /// Override the internal URL reported after networking configuration.
    ///
    /// Lets tests point the health validator at a local mock server.
    #[must_use]
    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint_override = Some(url.into());
        self
    }

    /// Number of `provision_infrastructure` calls.
    #[must_use]
    pub fn provision_calls(&self) -> usize {
        self.state.lock().provision_calls
    }

    /// Number of `deploy_workload` calls.
    #[must_use]
    pub fn deploy_calls(&self) -> usize {
        self.state.lock().deploy_calls
    }

    /// Number of `rollback_deployment` calls.
    #[must_use]
    pub fn rollback_calls(&self) -> usize {
        self.state.lock().rollback_calls
    }

    /// The ledger passed to the most recent rollback call.
    #[must_use]
    pub fn last_rollback_resources(&self) -> Vec<CreatedResource> {
        self.state.lock().last_rollback_resources.clone()
    }
}

#[async_trait]
impl InfrastructureAdapter for MockAdapter {
    fn kind(&self) -> InfrastructureKind {
        self.kind
    }

    async fn infrastructure_ready(&self) -> bool {
        self.ready
    }

    async fn provision_infrastructure(
        &self,
        tenant: &TenantId,
        _config: &IspConfig,
        _resources: &ResourceRequirements,
        _region: &str,
        artifacts: &mut DeploymentArtifacts,
    ) -> Result<()> {
        self.state.lock().provision_calls += 1;

        let isolation = naming::isolation_name(tenant);
        artifacts.record(CreatedResource::new("isolation", &isolation));
        artifacts.namespace = Some(isolation);
        artifacts.record(CreatedResource::new("storage", naming::volume_name(tenant)));

        if self.fail_at == Some(MockFailure::Provision) {
            // Partial creation stays visible in the ledger; cleanup is
            // simulated as having failed.
            return Err(InfraError::Provision {
                kind: self.kind,
                resource: naming::secret_name(tenant),
                message: "injected provisioning failure".to_string(),
            });
        }

        artifacts.record(CreatedResource::new("secret", naming::secret_name(tenant)));
        artifacts.record(CreatedResource::new("config", naming::config_name(tenant)));
        Ok(())
    }

    async fn deploy_workload(
        &self,
        _rendered: &Value,
        tenant: &TenantId,
        artifacts: &mut DeploymentArtifacts,
        timeout: Duration,
    ) -> Result<()> {
        self.state.lock().deploy_calls += 1;

        artifacts.record(CreatedResource::new("workload", naming::workload_name(tenant)));

        match self.fail_at {
            Some(MockFailure::Deploy) => Err(InfraError::Deployment {
                kind: self.kind,
                phase: DeployPhase::Workload,
                message: "injected deployment failure".to_string(),
            }),
            Some(MockFailure::DeployTimeout) => Err(InfraError::Timeout {
                what: format!("workload for tenant {tenant}"),
                waited_secs: timeout.as_secs(),
            }),
            _ => {
                artifacts.container_id = Some(format!("mock-{}", naming::workload_name(tenant)));
                Ok(())
            }
        }
    }

    async fn configure_networking(
        &self,
        tenant: &TenantId,
        config: &IspConfig,
        artifacts: &mut DeploymentArtifacts,
    ) -> Result<()> {
        if self.fail_at == Some(MockFailure::Networking) {
            return Err(InfraError::Deployment {
                kind: self.kind,
                phase: DeployPhase::Networking,
                message: "injected networking failure".to_string(),
            });
        }

        let host = config.external_host("mock.test");
        artifacts.record(CreatedResource::new("routing", naming::service_name(tenant)));
        artifacts.service_name = Some(naming::service_name(tenant));
        artifacts.internal_url = Some(
            self.endpoint_override
                .clone()
                .unwrap_or_else(|| "http://127.0.0.1:8080".to_string()),
        );
        artifacts.external_url = Some(format!("http://{host}"));
        Ok(())
    }

    async fn configure_ssl(
        &self,
        tenant: &TenantId,
        config: &IspConfig,
        artifacts: &mut DeploymentArtifacts,
    ) -> Result<SslOutcome> {
        if self.fail_at == Some(MockFailure::Ssl) {
            return Err(InfraError::Deployment {
                kind: self.kind,
                phase: DeployPhase::Ssl,
                message: "injected ssl failure".to_string(),
            });
        }

        if !config.network_config.ssl_enabled {
            return Ok(SslOutcome::DevelopmentMode);
        }

        let certificate = naming::certificate_name(tenant);
        artifacts.ssl_certificate = Some(certificate.clone());
        if let Some(host) = &config.network_config.domain {
            artifacts.external_url = Some(format!("https://{host}"));
        } else if let Some(url) = artifacts.external_url.take() {
            artifacts.external_url = Some(url.replacen("http://", "https://", 1));
        }
        Ok(SslOutcome::Enabled { certificate })
    }

    async fn configure_monitoring(
        &self,
        _tenant: &TenantId,
        _config: &IspConfig,
        _artifacts: &mut DeploymentArtifacts,
    ) -> MonitoringOutcome {
        if self.monitoring_degraded {
            MonitoringOutcome::Degraded {
                reason: "injected monitoring degradation".to_string(),
            }
        } else {
            MonitoringOutcome::Configured
        }
    }

    async fn rollback_deployment(
        &self,
        _tenant: &TenantId,
        artifacts: &DeploymentArtifacts,
        _timeout: Duration,
    ) -> bool {
        let mut state = self.state.lock();
        state.rollback_calls += 1;
        state.last_rollback_resources = artifacts.created_resources.clone();
        self.rollback_succeeds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenantforge_core::PlanType;

    fn parts() -> (TenantId, IspConfig, ResourceRequirements) {
        let tenant = TenantId::new("t-001").unwrap();
        let config = IspConfig::new(tenant.clone(), "Tenant One", PlanType::Premium);
        let resources = ResourceRequirements {
            cpu_millicores: 2_000,
            memory_mb: 4_096,
            storage_gb: 50,
            max_connections: 250,
            max_concurrent_requests: 100,
        };
        (tenant, config, resources)
    }

    #[tokio::test]
    async fn full_pipeline_records_artifacts() {
        let (tenant, config, resources) = parts();
        let adapter = MockAdapter::new();
        let mut artifacts = DeploymentArtifacts::new();

        adapter
            .provision_infrastructure(&tenant, &config, &resources, "local", &mut artifacts)
            .await
            .unwrap();
        adapter
            .deploy_workload(
                &serde_json::json!({}),
                &tenant,
                &mut artifacts,
                Duration::from_secs(60),
            )
            .await
            .unwrap();
        adapter
            .configure_networking(&tenant, &config, &mut artifacts)
            .await
            .unwrap();

        let kinds: Vec<&str> = artifacts
            .created_resources
            .iter()
            .map(|r| r.kind.as_str())
            .collect();
        assert_eq!(
            kinds,
            vec!["isolation", "storage", "secret", "config", "workload", "routing"]
        );
        assert!(artifacts.container_id.is_some());
        assert!(artifacts.external_url.is_some());
    }

    #[tokio::test]
    async fn provision_failure_leaves_partial_ledger() {
        let (tenant, config, resources) = parts();
        let adapter = MockAdapter::new().fail_at(MockFailure::Provision);
        let mut artifacts = DeploymentArtifacts::new();

        let err = adapter
            .provision_infrastructure(&tenant, &config, &resources, "local", &mut artifacts)
            .await
            .unwrap_err();

        assert!(matches!(err, InfraError::Provision { .. }));
        assert_eq!(artifacts.created_resources.len(), 2);
    }

    #[tokio::test]
    async fn ssl_honors_development_mode() {
        let (tenant, mut config, resources) = parts();
        config.network_config.ssl_enabled = false;
        let adapter = MockAdapter::new();
        let mut artifacts = DeploymentArtifacts::new();

        adapter
            .provision_infrastructure(&tenant, &config, &resources, "local", &mut artifacts)
            .await
            .unwrap();
        let outcome = adapter
            .configure_ssl(&tenant, &config, &mut artifacts)
            .await
            .unwrap();

        assert_eq!(outcome, SslOutcome::DevelopmentMode);
        assert!(artifacts.ssl_certificate.is_none());
    }

    #[tokio::test]
    async fn rollback_is_counted_and_sees_the_ledger() {
        let (tenant, ..) = parts();
        let adapter = MockAdapter::new();
        let mut artifacts = DeploymentArtifacts::new();
        artifacts.record(CreatedResource::new("isolation", "tenant-t-001"));

        assert!(adapter
            .rollback_deployment(&tenant, &artifacts, Duration::from_secs(10))
            .await);
        assert_eq!(adapter.rollback_calls(), 1);
        assert_eq!(adapter.last_rollback_resources().len(), 1);
    }
}
