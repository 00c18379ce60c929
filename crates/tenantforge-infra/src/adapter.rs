//! The adapter interface consumed by the provisioning orchestrator.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use tenantforge_core::{InfrastructureKind, IspConfig, TenantId};
use tenantforge_resources::ResourceRequirements;

use crate::error::Result;
use crate::types::{DeploymentArtifacts, MonitoringOutcome, SslOutcome};

/// Platform operations needed to take one tenant stack from nothing to
/// network-reachable, and back down again.
///
/// The capability set is identical across implementations; the orchestrator
/// selects one adapter at construction time and passes it by reference
/// through the whole pipeline. Every method that creates platform resources
/// appends to `artifacts.created_resources` *before* any operation that can
/// fail on that resource completes, so partial creation is always visible
/// to a later rollback — even one issued from a different process if the
/// artifacts were persisted.
#[async_trait]
pub trait InfrastructureAdapter: Send + Sync {
    /// The platform this adapter drives.
    fn kind(&self) -> InfrastructureKind;

    /// Best-effort readiness probe of the underlying platform, consumed by
    /// pre-flight validation. Never panics; a probe failure reports `false`.
    async fn infrastructure_ready(&self) -> bool;

    /// Create the tenant's isolation boundary, persistent storage, and
    /// configuration/secret objects.
    ///
    /// Secret values are decrypted at materialization time and must never be
    /// logged. On mid-sequence failure the adapter attempts best-effort
    /// cleanup of what it already created, keeps the ledger entries, and
    /// returns the error.
    ///
    /// # Errors
    ///
    /// Returns [`InfraError::Provision`](crate::InfraError::Provision) (or a
    /// platform error) naming the resource that failed.
    async fn provision_infrastructure(
        &self,
        tenant: &TenantId,
        config: &IspConfig,
        resources: &ResourceRequirements,
        region: &str,
        artifacts: &mut DeploymentArtifacts,
    ) -> Result<()>;

    /// Submit the rendered workload template and block, bounded by
    /// `timeout`, until the platform reports it running.
    ///
    /// Populates `artifacts.container_id` on success.
    ///
    /// # Errors
    ///
    /// Returns [`InfraError::Deployment`](crate::InfraError::Deployment) on
    /// platform-reported failure or [`InfraError::Timeout`](crate::InfraError::Timeout)
    /// when the bounded wait elapses.
    async fn deploy_workload(
        &self,
        rendered: &Value,
        tenant: &TenantId,
        artifacts: &mut DeploymentArtifacts,
        timeout: Duration,
    ) -> Result<()>;

    /// Create the routing exposing the workload at the tenant's domain.
    ///
    /// Populates `artifacts.internal_url` and `artifacts.external_url`.
    ///
    /// # Errors
    ///
    /// Returns a deployment error tagged with the networking sub-phase.
    async fn configure_networking(
        &self,
        tenant: &TenantId,
        config: &IspConfig,
        artifacts: &mut DeploymentArtifacts,
    ) -> Result<()>;

    /// Attach TLS termination when the tenant requests it; acknowledge
    /// development mode otherwise.
    ///
    /// # Errors
    ///
    /// Returns a deployment error tagged with the SSL sub-phase.
    async fn configure_ssl(
        &self,
        tenant: &TenantId,
        config: &IspConfig,
        artifacts: &mut DeploymentArtifacts,
    ) -> Result<SslOutcome>;

    /// Attach logging/metrics hooks. Best-effort: failures are reported as
    /// [`MonitoringOutcome::Degraded`], never as an error.
    async fn configure_monitoring(
        &self,
        tenant: &TenantId,
        config: &IspConfig,
        artifacts: &mut DeploymentArtifacts,
    ) -> MonitoringOutcome;

    /// Tear down every resource recorded in `artifacts.created_resources`,
    /// in reverse creation order, bounded by `timeout`.
    ///
    /// Resources that are already gone count as successfully removed.
    /// Returns whether the rollback fully succeeded; never raises — partial
    /// failure is logged and reported as `false`.
    async fn rollback_deployment(
        &self,
        tenant: &TenantId,
        artifacts: &DeploymentArtifacts,
        timeout: Duration,
    ) -> bool;
}
