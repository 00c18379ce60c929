//! End-to-end provisioning scenarios against a scriptable adapter and a
//! mock health endpoint.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tenantforge_core::{InfrastructureKind, IspConfig, PlanType, TenantId};
use tenantforge_health::{HealthConfig, HealthValidator};
use tenantforge_infra::{MockAdapter, MockFailure, MonitoringOutcome};
use tenantforge_provisioner::{
    ContainerProvisioner, ProvisionerConfig, ProvisioningRequest, ProvisioningStage,
    ProvisioningStatus,
};
use tenantforge_template::TemplateManager;

fn fast_config() -> ProvisionerConfig {
    ProvisionerConfig {
        health_max_wait: Duration::from_millis(200),
        health_check_interval: Duration::from_millis(20),
        health_retry_attempts: 2,
        health_retry_base_delay: Duration::from_millis(10),
        ..Default::default()
    }
}

fn provisioner_with(adapter: Arc<MockAdapter>) -> ContainerProvisioner {
    let health = HealthValidator::new(HealthConfig {
        request_timeout: Duration::from_millis(500),
        ..Default::default()
    })
    .unwrap();

    ContainerProvisioner::new(adapter, health, TemplateManager::new(), fast_config())
}

fn premium_request() -> ProvisioningRequest {
    let tenant = TenantId::new("t-001").unwrap();
    let config = IspConfig::new(tenant.clone(), "Tenant One", PlanType::Premium);
    ProvisioningRequest::new(tenant, 500, config)
        .unwrap()
        .with_infrastructure(InfrastructureKind::DockerCompose)
        .with_timeout(Duration::from_secs(120))
}

async fn healthy_server() -> MockServer {
    let server = MockServer::start().await;
    for probe in ["/health/live", "/health/database", "/health/cache"] {
        Mock::given(method("GET"))
            .and(path(probe))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
    }
    server
}

#[tokio::test]
async fn fully_succeeding_provision_reaches_ready() {
    let server = healthy_server().await;
    let adapter = Arc::new(MockAdapter::new().with_endpoint(server.uri()));
    let provisioner = provisioner_with(adapter.clone());

    let result = provisioner.provision_isp_container(premium_request()).await;

    assert!(result.success, "logs: {:?}", result.provisioning_logs);
    assert_eq!(result.status, ProvisioningStatus::Ready);
    assert!(result.error_message.is_none());
    assert!(result.endpoint_url().is_some());
    assert!(result.deployment_duration.is_some());
    assert_eq!(result.monitoring, Some(MonitoringOutcome::Configured));

    // The allocated budget satisfies the premium base scaled for 500
    // customers and stays within the absolute ceilings.
    let resources = result.allocated_resources.unwrap();
    assert!(resources.cpu_millicores >= 2_100);
    assert!(resources.cpu_millicores <= 16_000);
    assert!(resources.memory_mb >= 4_608);
    assert!(resources.memory_mb <= 65_536);
    assert!(resources.storage_gb >= 51);
    assert_eq!(resources.max_connections, 275);
    assert_eq!(resources.max_concurrent_requests, 110);

    // The final health snapshot is the passing one.
    let health = result.health.unwrap();
    assert!(health.is_healthy());

    // No rollback happened.
    assert_eq!(adapter.rollback_calls(), 0);
    assert!(!result.rollback_completed);
}

#[tokio::test]
async fn deploy_timeout_rolls_back_and_reports_the_stage() {
    let adapter = Arc::new(MockAdapter::new().fail_at(MockFailure::DeployTimeout));
    let provisioner = provisioner_with(adapter.clone());

    let result = provisioner.provision_isp_container(premium_request()).await;

    assert!(!result.success);
    assert_eq!(result.status, ProvisioningStatus::RolledBack);
    assert_eq!(result.error_stage, Some(ProvisioningStage::Deployment));
    assert!(result
        .error_message
        .as_deref()
        .unwrap()
        .contains("timed out"));
    assert!(result.rollback_completed);
    assert_eq!(adapter.rollback_calls(), 1);
}

#[tokio::test]
async fn disabled_rollback_leaves_partial_resources_listed() {
    let adapter = Arc::new(MockAdapter::new().fail_at(MockFailure::Provision));
    let provisioner = provisioner_with(adapter.clone());

    let request = premium_request().with_rollback(false);
    let result = provisioner.provision_isp_container(request).await;

    assert!(!result.success);
    assert_eq!(result.status, ProvisioningStatus::Failed);
    assert_eq!(result.error_stage, Some(ProvisioningStage::Infrastructure));
    assert!(!result.rollback_completed);
    assert_eq!(adapter.rollback_calls(), 0);

    // The leaked resources stay listed for ops tooling to reconcile.
    let kinds: Vec<&str> = result
        .artifacts
        .created_resources
        .iter()
        .map(|r| r.kind.as_str())
        .collect();
    assert_eq!(kinds, vec!["isolation", "storage"]);
}

#[tokio::test]
async fn every_failing_phase_triggers_exactly_one_rollback_with_the_full_ledger() {
    // Phase 3 (infrastructure), 4 (deployment), 5 (service configuration),
    // and 6 (health, via an unreachable endpoint) failures all roll back
    // exactly once, and the rollback sees every resource created before the
    // failure.
    let cases: Vec<(Option<MockFailure>, ProvisioningStage, Vec<&str>)> = vec![
        (
            Some(MockFailure::Provision),
            ProvisioningStage::Infrastructure,
            vec!["isolation", "storage"],
        ),
        (
            Some(MockFailure::Deploy),
            ProvisioningStage::Deployment,
            vec!["isolation", "storage", "secret", "config", "workload"],
        ),
        (
            Some(MockFailure::Networking),
            ProvisioningStage::ServiceConfiguration,
            vec!["isolation", "storage", "secret", "config", "workload"],
        ),
        (
            None, // all adapter phases succeed; health endpoint is down
            ProvisioningStage::HealthValidation,
            vec!["isolation", "storage", "secret", "config", "workload", "routing"],
        ),
    ];

    for (failure, expected_stage, expected_kinds) in cases {
        let mut adapter = MockAdapter::new().with_endpoint("http://127.0.0.1:1");
        if let Some(failure) = failure {
            adapter = adapter.fail_at(failure);
        }
        let adapter = Arc::new(adapter);
        let provisioner = provisioner_with(adapter.clone());

        let result = provisioner.provision_isp_container(premium_request()).await;

        assert!(!result.success, "stage {expected_stage}");
        assert_eq!(result.error_stage, Some(expected_stage));
        assert_eq!(
            adapter.rollback_calls(),
            1,
            "rollback count for stage {expected_stage}"
        );

        let rolled_back: Vec<String> = adapter
            .last_rollback_resources()
            .iter()
            .map(|r| r.kind.clone())
            .collect();
        assert_eq!(rolled_back, expected_kinds, "ledger for stage {expected_stage}");
    }
}

#[tokio::test]
async fn partial_rollback_is_reported_without_masking_the_failure() {
    let adapter = Arc::new(
        MockAdapter::new()
            .fail_at(MockFailure::Deploy)
            .with_rollback_result(false),
    );
    let provisioner = provisioner_with(adapter.clone());

    let result = provisioner.provision_isp_container(premium_request()).await;

    // The original deployment failure is what the caller sees.
    assert_eq!(result.error_stage, Some(ProvisioningStage::Deployment));
    assert!(result
        .error_message
        .as_deref()
        .unwrap()
        .contains("deployment failure"));
    // The incomplete rollback is visible alongside it.
    assert!(!result.rollback_completed);
    assert_eq!(result.status, ProvisioningStatus::RolledBack);
}

#[tokio::test]
async fn degraded_monitoring_does_not_fail_provisioning() {
    let server = healthy_server().await;
    let adapter = Arc::new(
        MockAdapter::new()
            .with_endpoint(server.uri())
            .with_monitoring_degraded(),
    );
    let provisioner = provisioner_with(adapter);

    let result = provisioner.provision_isp_container(premium_request()).await;

    assert!(result.success);
    assert_eq!(result.status, ProvisioningStatus::Ready);
    assert!(matches!(
        result.monitoring,
        Some(MonitoringOutcome::Degraded { .. })
    ));
    // The degradation is also visible in the audit trail.
    assert!(result
        .provisioning_logs
        .iter()
        .any(|line| line.contains("monitoring degraded")));
}

#[tokio::test]
async fn concurrent_tenants_provision_independently() {
    let server = healthy_server().await;
    let adapter = Arc::new(MockAdapter::new().with_endpoint(server.uri()));
    let provisioner = Arc::new(provisioner_with(adapter));

    let mut handles = Vec::new();
    for i in 1..=3 {
        let provisioner = Arc::clone(&provisioner);
        let tenant = TenantId::new(format!("tenant-{i:03}")).unwrap();
        let config = IspConfig::new(tenant.clone(), format!("Tenant {i}"), PlanType::Standard);
        let request = ProvisioningRequest::new(tenant, 50, config)
            .unwrap()
            .with_infrastructure(InfrastructureKind::DockerCompose)
            .with_timeout(Duration::from_secs(120));

        handles.push(tokio::spawn(async move {
            provisioner.provision_isp_container(request).await
        }));
    }

    for handle in handles {
        let result = handle.await.unwrap();
        assert!(result.success, "logs: {:?}", result.provisioning_logs);
        assert_eq!(result.status, ProvisioningStatus::Ready);
    }

    assert!(provisioner.list_active_operations().is_empty());
}

#[tokio::test]
async fn ssl_disabled_request_reports_development_mode() {
    let server = healthy_server().await;
    let tenant = TenantId::new("t-002").unwrap();
    let mut config = IspConfig::new(tenant.clone(), "Tenant Two", PlanType::Standard);
    config.network_config.ssl_enabled = false;
    let request = ProvisioningRequest::new(tenant, 50, config)
        .unwrap()
        .with_infrastructure(InfrastructureKind::DockerCompose)
        .with_timeout(Duration::from_secs(120));

    let adapter = Arc::new(MockAdapter::new().with_endpoint(server.uri()));
    let provisioner = provisioner_with(adapter);

    let result = provisioner.provision_isp_container(request).await;

    assert!(result.success);
    assert!(result.artifacts.ssl_certificate.is_none());
    assert!(result
        .provisioning_logs
        .iter()
        .any(|line| line.contains("ssl disabled")));
}
