//! The six-phase provisioning pipeline.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use tenantforge_health::{CustomCheck, HealthValidator};
use tenantforge_infra::{InfrastructureAdapter, MonitoringOutcome, SslOutcome};
use tenantforge_resources::{
    calculate_optimal_resources, estimate_cost, validate_resource_limits, ResourceRequirements,
};
use tenantforge_template::{prepare_variables, TemplateManager, VariableContext};

use crate::error::{ProvisioningError, ProvisioningStage};
use crate::registry::{ActiveOperations, OperationSnapshot};
use crate::state::{self, ProvisioningStatus};
use crate::types::{ProvisioningRequest, ProvisioningResult};
use crate::validator::ProvisioningValidator;

use tenantforge_core::TenantId;

/// A phase failure: which phase, and why.
type PhaseFailure = (ProvisioningStage, ProvisioningError);

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct ProvisionerConfig {
    /// Template rendered for every deployment.
    pub template_name: String,
    /// Application container image passed into the template.
    pub app_image: String,
    /// Budget for the rollback pass. Independent of the caller-supplied
    /// provisioning timeout; deliberately configurable rather than a
    /// hard-coded constant.
    pub rollback_timeout: Duration,
    /// Budget for one health wait.
    pub health_max_wait: Duration,
    /// Interval between health polls within one wait.
    pub health_check_interval: Duration,
    /// Bounded retry attempts around the health wait.
    pub health_retry_attempts: u32,
    /// Base delay of the exponential backoff between health retries.
    pub health_retry_base_delay: Duration,
    /// Additional caller-defined health probes.
    pub custom_health_checks: Vec<CustomCheck>,
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            template_name: TemplateManager::DEFAULT_TEMPLATE.to_string(),
            app_image: "ghcr.io/tenantforge/tenant-app:latest".to_string(),
            rollback_timeout: Duration::from_secs(120),
            health_max_wait: Duration::from_secs(60),
            health_check_interval: Duration::from_secs(2),
            health_retry_attempts: 3,
            health_retry_base_delay: Duration::from_secs(2),
            custom_health_checks: Vec::new(),
        }
    }
}

impl ProvisionerConfig {
    /// Load configuration from environment variables.
    ///
    /// Supported environment variables:
    /// - `TENANT_APP_IMAGE`: application container image
    /// - `TENANT_ROLLBACK_TIMEOUT_SECS`: rollback budget in seconds
    /// - `TENANT_HEALTH_MAX_WAIT_SECS`: per-wait health budget in seconds
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("TENANT_APP_IMAGE") {
            config.app_image = val;
        }
        if let Ok(val) = std::env::var("TENANT_ROLLBACK_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.rollback_timeout = Duration::from_secs(secs);
            }
        }
        if let Ok(val) = std::env::var("TENANT_HEALTH_MAX_WAIT_SECS") {
            if let Ok(secs) = val.parse() {
                config.health_max_wait = Duration::from_secs(secs);
            }
        }

        config
    }
}

/// The tenant container-provisioning orchestrator.
///
/// Sequences the six-phase pipeline, tracks per-operation state, executes
/// rollback on any phase failure, and returns a structured result. One
/// adapter is selected at construction time and used for the orchestrator's
/// whole lifetime.
pub struct ContainerProvisioner {
    adapter: Arc<dyn InfrastructureAdapter>,
    health: HealthValidator,
    templates: TemplateManager,
    validator: ProvisioningValidator,
    config: ProvisionerConfig,
    operations: ActiveOperations,
}

impl ContainerProvisioner {
    /// Create an orchestrator driving the given adapter.
    #[must_use]
    pub fn new(
        adapter: Arc<dyn InfrastructureAdapter>,
        health: HealthValidator,
        templates: TemplateManager,
        config: ProvisionerConfig,
    ) -> Self {
        Self {
            adapter,
            health,
            templates,
            validator: ProvisioningValidator::new(),
            config,
            operations: ActiveOperations::new(),
        }
    }

    /// Get a reference to the orchestrator config.
    #[must_use]
    pub fn config(&self) -> &ProvisionerConfig {
        &self.config
    }

    /// Point-in-time status lookup for a tenant's in-flight operation.
    #[must_use]
    pub fn get_provisioning_status(&self, tenant: &TenantId) -> Option<OperationSnapshot> {
        self.operations.get(tenant)
    }

    /// All in-flight operations.
    #[must_use]
    pub fn list_active_operations(&self) -> Vec<(TenantId, OperationSnapshot)> {
        self.operations.list()
    }

    /// Provision a complete tenant stack.
    ///
    /// The single public entry point. Always returns a
    /// [`ProvisioningResult`]: expected failures are reported via
    /// `result.success == false` with `error_stage` naming the failed phase,
    /// never as an error. Concurrent calls for the same tenant are not
    /// deduplicated here; an upstream idempotency layer is expected to
    /// prevent them.
    pub async fn provision_isp_container(
        &self,
        request: ProvisioningRequest,
    ) -> ProvisioningResult {
        let mut result = ProvisioningResult::new(&request);
        self.operations
            .start(request.isp_id.clone(), request.request_id);

        info!(
            request_id = %request.request_id,
            isp_id = %request.isp_id,
            infrastructure = %request.infrastructure,
            customer_count = request.customer_count,
            "Provisioning started"
        );
        result.log(format!(
            "provisioning started for tenant {} on {} (request {})",
            request.isp_id, request.infrastructure, request.request_id
        ));

        match self.run_pipeline(&request, &mut result).await {
            Ok(()) => {
                self.transition(&mut result, ProvisioningStatus::Ready);
                result.log("provisioning completed; stack is ready");
                result.mark_completed(true);
                info!(
                    isp_id = %request.isp_id,
                    duration_secs = result.deployment_duration.map_or(0, |d| d.as_secs()),
                    endpoint = result.endpoint_url().unwrap_or("-"),
                    "Provisioning succeeded"
                );
            }
            Err((stage, error)) => {
                self.handle_failure(&request, &mut result, stage, &error)
                    .await;
            }
        }

        self.operations.finish(&request.isp_id);
        result
    }

    async fn run_pipeline(
        &self,
        request: &ProvisioningRequest,
        result: &mut ProvisioningResult,
    ) -> Result<(), PhaseFailure> {
        // Phase 1: validate. Nothing has been created; a failure here never
        // needs rollback.
        result.log("phase 1/6: validating request");
        self.validator
            .validate(request, self.adapter.as_ref())
            .await
            .map_err(|e| (ProvisioningStage::Validation, e))?;
        result.log("phase 1/6: validation passed");

        // Phase 2: resolve the resource budget.
        result.log("phase 2/6: resolving resource budget");
        let resources = self.resolve_resources(request)?;
        result.allocated_resources = Some(resources);
        let cost = estimate_cost(&resources);
        result.log(format!(
            "phase 2/6: allocated {}m CPU, {}Mi memory, {}Gi storage (est. ${:.2}/month)",
            resources.cpu_millicores, resources.memory_mb, resources.storage_gb, cost.monthly_usd
        ));

        // Phase 3: provision infrastructure.
        self.transition(result, ProvisioningStatus::Provisioning);
        result.log("phase 3/6: provisioning infrastructure");
        self.adapter
            .provision_infrastructure(
                &request.isp_id,
                &request.config,
                &resources,
                &request.region,
                &mut result.artifacts,
            )
            .await
            .map_err(|e| (ProvisioningStage::Infrastructure, e.into()))?;
        result.log(format!(
            "phase 3/6: {} platform resources created",
            result.artifacts.created_resources.len()
        ));

        // Phase 4: render the template and deploy the workload.
        self.transition(result, ProvisioningStatus::Deploying);
        result.log("phase 4/6: rendering template and deploying workload");
        let variables = prepare_variables(
            request.infrastructure,
            &VariableContext {
                tenant: &request.isp_id,
                config: &request.config,
                resources: &resources,
                image: &self.config.app_image,
            },
        );
        let rendered = self
            .templates
            .render(&self.config.template_name, request.infrastructure, &variables)
            .map_err(|e| (ProvisioningStage::Deployment, e.into()))?;
        self.adapter
            .deploy_workload(
                &rendered,
                &request.isp_id,
                &mut result.artifacts,
                request.provisioning_timeout,
            )
            .await
            .map_err(|e| (ProvisioningStage::Deployment, e.into()))?;
        result.log(format!(
            "phase 4/6: workload running as {}",
            result.artifacts.container_id.as_deref().unwrap_or("-")
        ));

        // Phase 5: networking, SSL, monitoring.
        self.transition(result, ProvisioningStatus::Configuring);
        result.log("phase 5/6: configuring networking, ssl, monitoring");
        self.adapter
            .configure_networking(&request.isp_id, &request.config, &mut result.artifacts)
            .await
            .map_err(|e| (ProvisioningStage::ServiceConfiguration, e.into()))?;
        let ssl = self
            .adapter
            .configure_ssl(&request.isp_id, &request.config, &mut result.artifacts)
            .await
            .map_err(|e| (ProvisioningStage::ServiceConfiguration, e.into()))?;
        match &ssl {
            SslOutcome::Enabled { certificate } => {
                result.log(format!("phase 5/6: tls enabled with certificate {certificate}"));
            }
            SslOutcome::DevelopmentMode => {
                result.log("phase 5/6: ssl disabled; serving plain http");
            }
        }

        // Monitoring is best-effort: a degraded outcome is recorded, never
        // escalated into a phase failure.
        let monitoring = self
            .adapter
            .configure_monitoring(&request.isp_id, &request.config, &mut result.artifacts)
            .await;
        if let MonitoringOutcome::Degraded { reason } = &monitoring {
            warn!(isp_id = %request.isp_id, reason = %reason, "Monitoring configuration degraded");
            result.log(format!("phase 5/6: monitoring degraded: {reason}"));
        }
        result.monitoring = Some(monitoring);
        result.log(format!(
            "phase 5/6: services configured, external url {}",
            result.artifacts.external_url.as_deref().unwrap_or("-")
        ));

        // Phase 6: health validation, with a bounded exponential-backoff
        // retry around the wait.
        self.transition(result, ProvisioningStatus::Validating);
        result.log("phase 6/6: validating stack health");
        self.validate_health(request, result).await?;

        Ok(())
    }

    fn resolve_resources(
        &self,
        request: &ProvisioningRequest,
    ) -> Result<ResourceRequirements, PhaseFailure> {
        match &request.custom_resources {
            Some(custom) => {
                validate_resource_limits(custom)
                    .map_err(|e| (ProvisioningStage::ResourceCalculation, e.into()))?;
                Ok(*custom)
            }
            None => calculate_optimal_resources(
                request.customer_count,
                request.config.plan_type,
                &request.config.feature_flags,
            )
            .map_err(|e| (ProvisioningStage::ResourceCalculation, e.into())),
        }
    }

    async fn validate_health(
        &self,
        request: &ProvisioningRequest,
        result: &mut ProvisioningResult,
    ) -> Result<(), PhaseFailure> {
        let base_url = result
            .artifacts
            .internal_url
            .clone()
            .or_else(|| result.artifacts.external_url.clone())
            .ok_or_else(|| {
                (
                    ProvisioningStage::HealthValidation,
                    ProvisioningError::Validation("deployed stack has no reachable URL".to_string()),
                )
            })?;
        let container_id = result
            .artifacts
            .container_id
            .clone()
            .unwrap_or_else(|| request.isp_id.to_string());

        let attempts = self.config.health_retry_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self
                .health
                .wait_for_healthy(
                    &container_id,
                    &base_url,
                    &self.config.custom_health_checks,
                    self.config.health_max_wait,
                    self.config.health_check_interval,
                )
                .await
            {
                Ok(health) => {
                    result.log(format!(
                        "phase 6/6: stack healthy on wait attempt {attempt}/{attempts}"
                    ));
                    result.health = Some(health);
                    return Ok(());
                }
                Err(e) => {
                    result.log(format!(
                        "phase 6/6: health wait attempt {attempt}/{attempts} failed: {e}"
                    ));
                    last_error = Some(e);

                    if attempt < attempts {
                        let backoff = self.config.health_retry_base_delay * 2u32.pow(attempt - 1);
                        result.log(format!(
                            "phase 6/6: retrying health wait in {}s",
                            backoff.as_secs()
                        ));
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }

        let error = last_error.map_or_else(
            || ProvisioningError::Validation("health retry loop made no attempts".to_string()),
            ProvisioningError::from,
        );
        Err((ProvisioningStage::HealthValidation, error))
    }

    async fn handle_failure(
        &self,
        request: &ProvisioningRequest,
        result: &mut ProvisioningResult,
        stage: ProvisioningStage,
        failure: &ProvisioningError,
    ) {
        error!(
            isp_id = %request.isp_id,
            stage = %stage,
            error = %failure,
            "Provisioning failed"
        );

        result.error_stage = Some(stage);
        result.error_message = Some(failure.to_string());
        result.log(format!("{stage} phase failed: {failure}"));
        self.transition(result, ProvisioningStatus::Failed);

        if request.enable_rollback && result.artifacts.has_created_resources() {
            self.transition(result, ProvisioningStatus::RollingBack);
            result.log(format!(
                "rolling back {} created resources",
                result.artifacts.created_resources.len()
            ));

            // Rollback gets its own budget and never masks the original
            // failure: the outcome is recorded alongside it.
            let rolled_back = self
                .adapter
                .rollback_deployment(&request.isp_id, &result.artifacts, self.config.rollback_timeout)
                .await;
            result.rollback_completed = rolled_back;

            if rolled_back {
                result.log("rollback completed; all created resources removed");
            } else {
                warn!(isp_id = %request.isp_id, "Rollback incomplete");
                result.log("rollback incomplete; some resources may remain");
            }
            self.transition(result, ProvisioningStatus::RolledBack);
        } else if request.enable_rollback {
            result.log("rollback skipped: no resources were created");
        } else {
            result.log("rollback disabled; created resources remain on the platform");
        }

        result.mark_completed(false);
    }

    /// Move the operation to a new status, keeping the registry in sync.
    ///
    /// Pipeline call sites only request transitions the state machine
    /// allows; an invalid one indicates a pipeline bug and is logged rather
    /// than panicking.
    fn transition(&self, result: &mut ProvisioningResult, to: ProvisioningStatus) {
        if !state::is_valid_transition(result.status, to) {
            warn!(
                isp_id = %result.isp_id,
                from = %result.status,
                to = %to,
                "Invalid status transition requested"
            );
            debug_assert!(false, "invalid transition {} -> {to}", result.status);
        }
        result.status = to;
        self.operations.update_status(&result.isp_id, to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tenantforge_core::{InfrastructureKind, IspConfig, PlanType, TenantId};
    use tenantforge_health::HealthConfig;
    use tenantforge_infra::{MockAdapter, MockFailure};

    fn fast_config() -> ProvisionerConfig {
        ProvisionerConfig {
            health_max_wait: Duration::from_millis(100),
            health_check_interval: Duration::from_millis(20),
            health_retry_attempts: 2,
            health_retry_base_delay: Duration::from_millis(10),
            ..Default::default()
        }
    }

    fn provisioner(adapter: MockAdapter) -> ContainerProvisioner {
        let health = HealthValidator::new(HealthConfig {
            request_timeout: Duration::from_millis(200),
            ..Default::default()
        })
        .unwrap();
        ContainerProvisioner::new(
            Arc::new(adapter),
            health,
            TemplateManager::new(),
            fast_config(),
        )
    }

    fn request() -> ProvisioningRequest {
        let tenant = TenantId::new("t-001").unwrap();
        let config = IspConfig::new(tenant.clone(), "Tenant One", PlanType::Premium);
        ProvisioningRequest::new(tenant, 500, config)
            .unwrap()
            .with_infrastructure(InfrastructureKind::DockerCompose)
            .with_timeout(Duration::from_secs(120))
    }

    #[tokio::test]
    async fn validation_failure_skips_rollback() {
        let provisioner = provisioner(MockAdapter::new().with_readiness(false));
        let result = provisioner.provision_isp_container(request()).await;

        assert!(!result.success);
        assert_eq!(result.status, ProvisioningStatus::Failed);
        assert_eq!(result.error_stage, Some(ProvisioningStage::Validation));
        assert!(!result.rollback_completed);
        assert!(!result.artifacts.has_created_resources());
    }

    #[tokio::test]
    async fn infrastructure_failure_rolls_back_partial_resources() {
        let provisioner = provisioner(MockAdapter::new().fail_at(MockFailure::Provision));
        let result = provisioner.provision_isp_container(request()).await;

        assert!(!result.success);
        assert_eq!(result.status, ProvisioningStatus::RolledBack);
        assert_eq!(result.error_stage, Some(ProvisioningStage::Infrastructure));
        assert!(result.rollback_completed);
        // The partially-created resources were visible to the rollback.
        assert_eq!(result.artifacts.created_resources.len(), 2);
    }

    #[tokio::test]
    async fn operation_is_removed_from_registry_at_end() {
        let provisioner = provisioner(MockAdapter::new().fail_at(MockFailure::Deploy));
        let request = request();
        let tenant = request.isp_id.clone();

        assert!(provisioner.get_provisioning_status(&tenant).is_none());
        let _ = provisioner.provision_isp_container(request).await;
        assert!(provisioner.get_provisioning_status(&tenant).is_none());
        assert!(provisioner.list_active_operations().is_empty());
    }

    #[tokio::test]
    async fn custom_resources_over_limits_fail_in_phase_two() {
        let mut request = request();
        request.custom_resources = Some(tenantforge_resources::ResourceRequirements {
            cpu_millicores: 32_000,
            memory_mb: 4_096,
            storage_gb: 50,
            max_connections: 250,
            max_concurrent_requests: 100,
        });

        let provisioner = provisioner(MockAdapter::new());
        let result = provisioner.provision_isp_container(request).await;

        assert!(!result.success);
        assert_eq!(
            result.error_stage,
            Some(ProvisioningStage::ResourceCalculation)
        );
        // Phase 2 fails before any platform work.
        assert!(!result.artifacts.has_created_resources());
    }

    #[tokio::test]
    async fn logs_record_every_phase_entry() {
        let provisioner = provisioner(MockAdapter::new().fail_at(MockFailure::Networking));
        let result = provisioner.provision_isp_container(request()).await;

        let joined = result.provisioning_logs.join("\n");
        assert!(joined.contains("phase 1/6"));
        assert!(joined.contains("phase 2/6"));
        assert!(joined.contains("phase 3/6"));
        assert!(joined.contains("phase 4/6"));
        assert!(joined.contains("phase 5/6"));
        assert!(joined.contains("service_configuration phase failed"));
    }
}
