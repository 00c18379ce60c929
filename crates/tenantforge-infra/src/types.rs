//! Deployment artifacts and adapter outcome types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tenantforge_core::IspConfig;
use tenantforge_resources::ResourceRequirements;

/// One platform resource created during provisioning.
///
/// The rollback pass consumes these records in reverse creation order; the
/// fields carry enough identity for a cleanup call issued from a different
/// process if the artifacts were persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedResource {
    /// Resource kind (`Namespace`, `Deployment`, `network`, `volume`, ...).
    pub kind: String,
    /// Resource name or path.
    pub name: String,
    /// Namespace the resource lives in, when namespaced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// API version for platforms that need it to address the resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

impl CreatedResource {
    /// Record for a cluster-scoped or host-scoped resource.
    #[must_use]
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            namespace: None,
            api_version: None,
        }
    }

    /// Record for a namespaced resource.
    #[must_use]
    pub fn namespaced(
        kind: impl Into<String>,
        name: impl Into<String>,
        namespace: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            namespace: Some(namespace.into()),
            api_version: Some(api_version.into()),
        }
    }
}

/// Mutable accumulator populated progressively during one provisioning
/// operation.
///
/// Owned exclusively by that operation; never shared across tenants. The
/// `created_resources` ledger exists solely for rollback/cleanup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentArtifacts {
    /// Workload identifier reported by the platform.
    pub container_id: Option<String>,
    /// Isolation boundary (Kubernetes namespace / Compose project).
    pub namespace: Option<String>,
    /// Routing service name, when the platform has one.
    pub service_name: Option<String>,
    /// Ingress resource name, when the platform has one.
    pub ingress_name: Option<String>,
    /// TLS certificate name, when SSL was configured.
    pub ssl_certificate: Option<String>,
    /// URL reachable from inside the platform.
    pub internal_url: Option<String>,
    /// URL reachable from outside the platform.
    pub external_url: Option<String>,
    /// Ordered ledger of everything created, for rollback.
    pub created_resources: Vec<CreatedResource>,
}

impl DeploymentArtifacts {
    /// Create an empty artifact set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resource to the rollback ledger.
    pub fn record(&mut self, resource: CreatedResource) {
        self.created_resources.push(resource);
    }

    /// True if any platform resource has been created.
    #[must_use]
    pub fn has_created_resources(&self) -> bool {
        !self.created_resources.is_empty()
    }
}

/// Outcome of TLS configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum SslOutcome {
    /// TLS termination was requested and attached.
    Enabled {
        /// Name of the certificate resource.
        certificate: String,
    },
    /// SSL is disabled for this tenant; the stack serves plain HTTP.
    DevelopmentMode,
}

/// Outcome of monitoring configuration.
///
/// Monitoring is best-effort: a degraded outcome never fails the
/// provisioning operation, but the distinction between "ready" and "ready
/// with degraded monitoring" stays inspectable in the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum MonitoringOutcome {
    /// Logging/metrics hooks attached.
    Configured,
    /// Monitoring could not be fully attached; the reason is recorded.
    Degraded {
        /// Why monitoring is degraded.
        reason: String,
    },
    /// Monitoring is disabled for this deployment.
    Skipped,
}

impl MonitoringOutcome {
    /// True unless monitoring configuration failed.
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        matches!(self, Self::Configured | Self::Skipped)
    }
}

/// The non-secret container environment for a tenant stack.
///
/// Derived platform variables first, then the caller's free-form
/// `environment_variables` (which may override the derived ones). Secret
/// material is materialized separately through the secrets boundary.
#[must_use]
pub fn container_environment(
    config: &IspConfig,
    resources: &ResourceRequirements,
) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();

    env.insert("TENANT_ID".to_string(), config.tenant_name.to_string());
    env.insert("TENANT_DISPLAY_NAME".to_string(), config.display_name.clone());
    env.insert("TENANT_PLAN".to_string(), config.plan_type.to_string());
    env.insert(
        "DB_POOL_SIZE".to_string(),
        config.database_config.pool_size.to_string(),
    );
    env.insert(
        "MAX_DB_CONNECTIONS".to_string(),
        resources.max_connections.to_string(),
    );
    env.insert(
        "MAX_CONCURRENT_REQUESTS".to_string(),
        resources.max_concurrent_requests.to_string(),
    );
    env.insert(
        "CORS_ORIGINS".to_string(),
        config.network_config.cors_origins.join(","),
    );
    env.insert(
        "GUEST_PORTAL_ENABLED".to_string(),
        config.feature_flags.guest_portal.to_string(),
    );
    env.insert(
        "ANALYTICS_ENABLED".to_string(),
        config.feature_flags.analytics_dashboard.to_string(),
    );
    env.insert(
        "WEBHOOKS_ENABLED".to_string(),
        config.feature_flags.api_webhooks.to_string(),
    );

    for (key, value) in &config.environment_variables {
        env.insert(key.clone(), value.clone());
    }

    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenantforge_core::{PlanType, TenantId};

    #[test]
    fn environment_merges_caller_variables() {
        let tenant = TenantId::new("acme-isp").unwrap();
        let mut config = IspConfig::new(tenant, "Acme ISP", PlanType::Premium);
        config
            .environment_variables
            .insert("CUSTOM_FLAG".to_string(), "on".to_string());
        config
            .environment_variables
            .insert("TENANT_PLAN".to_string(), "overridden".to_string());

        let resources = ResourceRequirements {
            cpu_millicores: 1_000,
            memory_mb: 2_048,
            storage_gb: 20,
            max_connections: 100,
            max_concurrent_requests: 50,
        };

        let env = container_environment(&config, &resources);
        assert_eq!(env["TENANT_ID"], "acme-isp");
        assert_eq!(env["CUSTOM_FLAG"], "on");
        assert_eq!(env["TENANT_PLAN"], "overridden");
        assert_eq!(env["MAX_DB_CONNECTIONS"], "100");
    }

    #[test]
    fn ledger_preserves_creation_order() {
        let mut artifacts = DeploymentArtifacts::new();
        assert!(!artifacts.has_created_resources());

        artifacts.record(CreatedResource::new("network", "tenant-a-net"));
        artifacts.record(CreatedResource::namespaced(
            "Deployment",
            "tenant-a-app",
            "tenant-a",
            "apps/v1",
        ));

        assert!(artifacts.has_created_resources());
        assert_eq!(artifacts.created_resources[0].kind, "network");
        assert_eq!(artifacts.created_resources[1].kind, "Deployment");
        assert_eq!(
            artifacts.created_resources[1].namespace.as_deref(),
            Some("tenant-a")
        );
    }

    #[test]
    fn monitoring_outcome_health() {
        assert!(MonitoringOutcome::Configured.is_healthy());
        assert!(MonitoringOutcome::Skipped.is_healthy());
        assert!(!MonitoringOutcome::Degraded {
            reason: "agent unreachable".to_string()
        }
        .is_healthy());
    }

    #[test]
    fn artifacts_serde_round_trip() {
        let mut artifacts = DeploymentArtifacts::new();
        artifacts.container_id = Some("abc123".to_string());
        artifacts.record(CreatedResource::new("volume", "tenant-a-data"));

        let json = serde_json::to_string(&artifacts).unwrap();
        let back: DeploymentArtifacts = serde_json::from_str(&json).unwrap();
        assert_eq!(back, artifacts);
    }
}
