//! Kubernetes infrastructure adapter.
//!
//! Drives a cluster through the API server: one namespace per tenant, a
//! PVC for persistent data, a ConfigMap/Secret pair holding the container
//! environment, the rendered Deployment, and Service/Ingress routing with
//! optional cert-manager TLS.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{
    ConfigMap, Namespace, PersistentVolumeClaim, PersistentVolumeClaimSpec, Secret, Service,
    ServicePort, ServiceSpec, VolumeResourceRequirements,
};
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::{Api, DeleteParams, ObjectMeta, Patch, PatchParams, PostParams};
use kube::Client;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use tenantforge_core::{naming, InfrastructureKind, IspConfig, SecretCipher, TenantId};
use tenantforge_resources::ResourceRequirements;

use crate::adapter::InfrastructureAdapter;
use crate::error::{DeployPhase, InfraError, Result};
use crate::types::{
    container_environment, CreatedResource, DeploymentArtifacts, MonitoringOutcome, SslOutcome,
};

/// Configuration for the Kubernetes adapter.
#[derive(Debug, Clone)]
pub struct KubernetesConfig {
    /// Base domain for derived tenant hostnames.
    pub base_domain: String,
    /// Application container image deployed for every tenant.
    pub app_image: String,
    /// Storage class for tenant PVCs; `None` uses the cluster default.
    pub storage_class: Option<String>,
    /// Ingress class handling tenant routing.
    pub ingress_class: String,
    /// cert-manager cluster issuer for tenant certificates.
    pub cluster_issuer: String,
    /// Whether metrics scrape annotations are attached.
    pub monitoring_enabled: bool,
    /// Interval between workload status polls during the deploy wait.
    pub poll_interval: Duration,
}

impl Default for KubernetesConfig {
    fn default() -> Self {
        Self {
            base_domain: "tenants.example.net".to_string(),
            app_image: "ghcr.io/tenantforge/tenant-app:latest".to_string(),
            storage_class: None,
            ingress_class: "nginx".to_string(),
            cluster_issuer: "letsencrypt-prod".to_string(),
            monitoring_enabled: true,
            poll_interval: Duration::from_secs(3),
        }
    }
}

impl KubernetesConfig {
    /// Load configuration from environment variables.
    ///
    /// Supported environment variables:
    /// - `TENANT_BASE_DOMAIN`: base domain for derived hostnames
    /// - `TENANT_APP_IMAGE`: application container image
    /// - `TENANT_STORAGE_CLASS`: storage class for tenant PVCs
    /// - `TENANT_INGRESS_CLASS`: ingress class name
    /// - `TENANT_CLUSTER_ISSUER`: cert-manager cluster issuer
    /// - `TENANT_MONITORING_ENABLED`: "true"/"false"
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("TENANT_BASE_DOMAIN") {
            config.base_domain = val;
        }
        if let Ok(val) = std::env::var("TENANT_APP_IMAGE") {
            config.app_image = val;
        }
        if let Ok(val) = std::env::var("TENANT_STORAGE_CLASS") {
            config.storage_class = Some(val);
        }
        if let Ok(val) = std::env::var("TENANT_INGRESS_CLASS") {
            config.ingress_class = val;
        }
        if let Ok(val) = std::env::var("TENANT_CLUSTER_ISSUER") {
            config.cluster_issuer = val;
        }
        if let Ok(val) = std::env::var("TENANT_MONITORING_ENABLED") {
            config.monitoring_enabled = val.eq_ignore_ascii_case("true");
        }

        config
    }
}

/// Kubernetes-based infrastructure adapter.
pub struct KubernetesAdapter {
    client: Client,
    config: KubernetesConfig,
    cipher: Arc<dyn SecretCipher>,
}

impl KubernetesAdapter {
    /// Create a new adapter, connecting via in-cluster config or kubeconfig.
    ///
    /// # Errors
    ///
    /// Returns an error if the Kubernetes client cannot be created.
    pub async fn new(config: KubernetesConfig, cipher: Arc<dyn SecretCipher>) -> Result<Self> {
        let client = Client::try_default().await?;
        Ok(Self {
            client,
            config,
            cipher,
        })
    }

    /// Create an adapter with a pre-configured client.
    ///
    /// This is useful for testing with mock clients.
    #[must_use]
    pub fn with_client(
        client: Client,
        config: KubernetesConfig,
        cipher: Arc<dyn SecretCipher>,
    ) -> Self {
        Self {
            client,
            config,
            cipher,
        }
    }

    /// Get a reference to the adapter config.
    #[must_use]
    pub fn config(&self) -> &KubernetesConfig {
        &self.config
    }

    fn tenant_labels(tenant: &TenantId, config: &IspConfig) -> BTreeMap<String, String> {
        let mut labels = BTreeMap::new();
        labels.insert("app".to_string(), "tenant-stack".to_string());
        labels.insert("tenantforge.io/tenant".to_string(), tenant.to_string());
        labels.insert(
            "tenantforge.io/plan".to_string(),
            config.plan_type.to_string(),
        );
        labels
    }

    async fn create_namespace(
        &self,
        tenant: &TenantId,
        config: &IspConfig,
        region: &str,
        artifacts: &mut DeploymentArtifacts,
    ) -> Result<String> {
        let name = naming::isolation_name(tenant);
        let mut labels = Self::tenant_labels(tenant, config);
        labels.insert("tenantforge.io/region".to_string(), region.to_string());

        let namespace = Namespace {
            metadata: ObjectMeta {
                name: Some(name.clone()),
                labels: Some(labels),
                ..Default::default()
            },
            ..Default::default()
        };

        let api: Api<Namespace> = Api::all(self.client.clone());
        artifacts.record(CreatedResource::new("Namespace", &name));
        api.create(&PostParams::default(), &namespace).await?;

        artifacts.namespace = Some(name.clone());
        Ok(name)
    }

    async fn create_storage(
        &self,
        tenant: &TenantId,
        namespace: &str,
        resources: &ResourceRequirements,
        artifacts: &mut DeploymentArtifacts,
    ) -> Result<()> {
        let name = naming::volume_name(tenant);

        let mut requests = BTreeMap::new();
        requests.insert(
            "storage".to_string(),
            Quantity(format!("{}Gi", resources.storage_gb)),
        );

        let claim = PersistentVolumeClaim {
            metadata: ObjectMeta {
                name: Some(name.clone()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            spec: Some(PersistentVolumeClaimSpec {
                access_modes: Some(vec!["ReadWriteOnce".to_string()]),
                storage_class_name: self.config.storage_class.clone(),
                resources: Some(VolumeResourceRequirements {
                    requests: Some(requests),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        let api: Api<PersistentVolumeClaim> = Api::namespaced(self.client.clone(), namespace);
        artifacts.record(CreatedResource::namespaced(
            "PersistentVolumeClaim",
            &name,
            namespace,
            "v1",
        ));
        api.create(&PostParams::default(), &claim).await?;
        Ok(())
    }

    async fn create_secret(
        &self,
        tenant: &TenantId,
        namespace: &str,
        config: &IspConfig,
        artifacts: &mut DeploymentArtifacts,
    ) -> Result<()> {
        let name = naming::secret_name(tenant);

        // Decrypt at materialization time; values never hit the logs.
        let mut string_data = BTreeMap::new();
        for (key, ciphertext) in &config.secrets {
            string_data.insert(key.clone(), self.cipher.decrypt(ciphertext)?);
        }

        debug!(
            tenant = %tenant,
            secret_keys = string_data.len(),
            "Materializing tenant secrets"
        );

        let secret = Secret {
            metadata: ObjectMeta {
                name: Some(name.clone()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            string_data: Some(string_data),
            ..Default::default()
        };

        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        artifacts.record(CreatedResource::namespaced("Secret", &name, namespace, "v1"));
        api.create(&PostParams::default(), &secret).await?;
        Ok(())
    }

    async fn create_config_map(
        &self,
        tenant: &TenantId,
        namespace: &str,
        config: &IspConfig,
        resources: &ResourceRequirements,
        artifacts: &mut DeploymentArtifacts,
    ) -> Result<()> {
        let name = naming::config_name(tenant);

        let config_map = ConfigMap {
            metadata: ObjectMeta {
                name: Some(name.clone()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            data: Some(container_environment(config, resources)),
            ..Default::default()
        };

        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        artifacts.record(CreatedResource::namespaced(
            "ConfigMap",
            &name,
            namespace,
            "v1",
        ));
        api.create(&PostParams::default(), &config_map).await?;
        Ok(())
    }

    fn deployment_available(deployment: &Deployment) -> bool {
        deployment
            .status
            .as_ref()
            .and_then(|s| s.available_replicas)
            .unwrap_or(0)
            >= 1
    }

    /// Check container statuses for waiting reasons that indicate a
    /// persistent error rather than normal startup.
    fn deployment_failed(deployment: &Deployment) -> Option<String> {
        let conditions = deployment.status.as_ref()?.conditions.as_ref()?;

        conditions
            .iter()
            .find(|c| c.type_ == "ReplicaFailure" && c.status == "True")
            .map(|c| {
                c.message
                    .clone()
                    .unwrap_or_else(|| "replica failure".to_string())
            })
    }

    async fn delete_recorded(&self, resource: &CreatedResource) -> bool {
        let params = DeleteParams::default();

        let result = match (resource.kind.as_str(), resource.namespace.as_deref()) {
            ("Namespace", _) => {
                let api: Api<Namespace> = Api::all(self.client.clone());
                api.delete(&resource.name, &params).await.map(|_| ())
            }
            ("PersistentVolumeClaim", Some(ns)) => {
                let api: Api<PersistentVolumeClaim> = Api::namespaced(self.client.clone(), ns);
                api.delete(&resource.name, &params).await.map(|_| ())
            }
            ("Secret", Some(ns)) => {
                let api: Api<Secret> = Api::namespaced(self.client.clone(), ns);
                api.delete(&resource.name, &params).await.map(|_| ())
            }
            ("ConfigMap", Some(ns)) => {
                let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), ns);
                api.delete(&resource.name, &params).await.map(|_| ())
            }
            ("Deployment", Some(ns)) => {
                let api: Api<Deployment> = Api::namespaced(self.client.clone(), ns);
                api.delete(&resource.name, &params).await.map(|_| ())
            }
            ("Service", Some(ns)) => {
                let api: Api<Service> = Api::namespaced(self.client.clone(), ns);
                api.delete(&resource.name, &params).await.map(|_| ())
            }
            ("Ingress", Some(ns)) => {
                let api: Api<Ingress> = Api::namespaced(self.client.clone(), ns);
                api.delete(&resource.name, &params).await.map(|_| ())
            }
            (kind, _) => {
                warn!(kind, name = %resource.name, "Unknown resource kind in rollback ledger");
                return false;
            }
        };

        match result {
            Ok(()) => true,
            Err(kube::Error::Api(e)) if e.code == 404 => {
                debug!(
                    kind = %resource.kind,
                    name = %resource.name,
                    "Resource already gone during teardown"
                );
                true
            }
            Err(e) => {
                warn!(
                    kind = %resource.kind,
                    name = %resource.name,
                    error = %e,
                    "Failed to delete resource during teardown"
                );
                false
            }
        }
    }

    /// Tear down recorded resources in reverse creation order.
    async fn teardown(&self, artifacts: &DeploymentArtifacts) -> bool {
        let mut all_removed = true;
        for resource in artifacts.created_resources.iter().rev() {
            if !self.delete_recorded(resource).await {
                all_removed = false;
            }
        }
        all_removed
    }
}

#[async_trait]
impl InfrastructureAdapter for KubernetesAdapter {
    fn kind(&self) -> InfrastructureKind {
        InfrastructureKind::Kubernetes
    }

    async fn infrastructure_ready(&self) -> bool {
        // The API server version endpoint is the cheapest liveness signal.
        match self.client.apiserver_version().await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Kubernetes API server is not reachable");
                false
            }
        }
    }

    async fn provision_infrastructure(
        &self,
        tenant: &TenantId,
        config: &IspConfig,
        resources: &ResourceRequirements,
        region: &str,
        artifacts: &mut DeploymentArtifacts,
    ) -> Result<()> {
        info!(tenant = %tenant, region, "Provisioning Kubernetes infrastructure");

        let result = async {
            let namespace = self
                .create_namespace(tenant, config, region, artifacts)
                .await?;
            self.create_storage(tenant, &namespace, resources, artifacts)
                .await?;
            self.create_secret(tenant, &namespace, config, artifacts)
                .await?;
            self.create_config_map(tenant, &namespace, config, resources, artifacts)
                .await?;
            Ok(())
        }
        .await;

        if let Err(e) = result {
            warn!(
                tenant = %tenant,
                error = %e,
                created = artifacts.created_resources.len(),
                "Infrastructure provisioning failed; attempting best-effort cleanup"
            );
            let cleaned = self.teardown(artifacts).await;
            if !cleaned {
                warn!(tenant = %tenant, "Best-effort cleanup left resources behind");
            }
            return Err(e);
        }

        info!(
            tenant = %tenant,
            created = artifacts.created_resources.len(),
            "Kubernetes infrastructure ready"
        );
        Ok(())
    }

    async fn deploy_workload(
        &self,
        rendered: &Value,
        tenant: &TenantId,
        artifacts: &mut DeploymentArtifacts,
        timeout: Duration,
    ) -> Result<()> {
        let namespace = artifacts
            .namespace
            .clone()
            .ok_or_else(|| InfraError::Deployment {
                kind: InfrastructureKind::Kubernetes,
                phase: DeployPhase::Workload,
                message: "no namespace provisioned".to_string(),
            })?;

        let deployment: Deployment = serde_json::from_value(rendered.clone())?;
        let name = deployment
            .metadata
            .name
            .clone()
            .unwrap_or_else(|| naming::workload_name(tenant));

        let api: Api<Deployment> = Api::namespaced(self.client.clone(), &namespace);
        artifacts.record(CreatedResource::namespaced(
            "Deployment",
            &name,
            &namespace,
            "apps/v1",
        ));
        api.create(&PostParams::default(), &deployment).await?;

        info!(tenant = %tenant, workload = %name, "Submitted workload, waiting for rollout");

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(current) = api.get_opt(&name).await? {
                if let Some(message) = Self::deployment_failed(&current) {
                    return Err(InfraError::Deployment {
                        kind: InfrastructureKind::Kubernetes,
                        phase: DeployPhase::Workload,
                        message,
                    });
                }
                if Self::deployment_available(&current) {
                    break;
                }
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(InfraError::Timeout {
                    what: format!("workload {name} rollout"),
                    waited_secs: timeout.as_secs(),
                });
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }

        artifacts.container_id = Some(name.clone());
        info!(tenant = %tenant, workload = %name, "Workload is running");
        Ok(())
    }

    async fn configure_networking(
        &self,
        tenant: &TenantId,
        config: &IspConfig,
        artifacts: &mut DeploymentArtifacts,
    ) -> Result<()> {
        let namespace = artifacts
            .namespace
            .clone()
            .ok_or_else(|| InfraError::Deployment {
                kind: InfrastructureKind::Kubernetes,
                phase: DeployPhase::Networking,
                message: "no namespace provisioned".to_string(),
            })?;

        let service_name = naming::service_name(tenant);
        let mut selector = BTreeMap::new();
        selector.insert("tenantforge.io/tenant".to_string(), tenant.to_string());

        let service = Service {
            metadata: ObjectMeta {
                name: Some(service_name.clone()),
                namespace: Some(namespace.clone()),
                labels: Some(Self::tenant_labels(tenant, config)),
                ..Default::default()
            },
            spec: Some(ServiceSpec {
                selector: Some(selector),
                ports: Some(vec![ServicePort {
                    name: Some("http".to_string()),
                    port: 80,
                    target_port: Some(IntOrString::Int(8080)),
                    ..Default::default()
                }]),
                type_: Some("ClusterIP".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let services: Api<Service> = Api::namespaced(self.client.clone(), &namespace);
        artifacts.record(CreatedResource::namespaced(
            "Service",
            &service_name,
            &namespace,
            "v1",
        ));
        services.create(&PostParams::default(), &service).await?;

        let host = config.external_host(&self.config.base_domain);
        let ingress_name = naming::ingress_name(tenant);

        let ingress = Ingress {
            metadata: ObjectMeta {
                name: Some(ingress_name.clone()),
                namespace: Some(namespace.clone()),
                labels: Some(Self::tenant_labels(tenant, config)),
                ..Default::default()
            },
            spec: Some(IngressSpec {
                ingress_class_name: Some(self.config.ingress_class.clone()),
                rules: Some(vec![IngressRule {
                    host: Some(host.clone()),
                    http: Some(HTTPIngressRuleValue {
                        paths: vec![HTTPIngressPath {
                            path: Some("/".to_string()),
                            path_type: "Prefix".to_string(),
                            backend: IngressBackend {
                                service: Some(IngressServiceBackend {
                                    name: service_name.clone(),
                                    port: Some(ServiceBackendPort {
                                        number: Some(80),
                                        ..Default::default()
                                    }),
                                }),
                                ..Default::default()
                            },
                        }],
                    }),
                }]),
                ..Default::default()
            }),
            ..Default::default()
        };

        let ingresses: Api<Ingress> = Api::namespaced(self.client.clone(), &namespace);
        artifacts.record(CreatedResource::namespaced(
            "Ingress",
            &ingress_name,
            &namespace,
            "networking.k8s.io/v1",
        ));
        ingresses.create(&PostParams::default(), &ingress).await?;

        artifacts.service_name = Some(service_name.clone());
        artifacts.ingress_name = Some(ingress_name);
        artifacts.internal_url = Some(format!("http://{service_name}.{namespace}.svc.cluster.local"));
        artifacts.external_url = Some(format!("http://{host}"));

        info!(tenant = %tenant, host = %host, "Networking configured");
        Ok(())
    }

    async fn configure_ssl(
        &self,
        tenant: &TenantId,
        config: &IspConfig,
        artifacts: &mut DeploymentArtifacts,
    ) -> Result<SslOutcome> {
        if !config.network_config.ssl_enabled {
            debug!(tenant = %tenant, "SSL disabled; leaving plain HTTP exposure");
            return Ok(SslOutcome::DevelopmentMode);
        }

        let namespace = artifacts
            .namespace
            .clone()
            .ok_or_else(|| InfraError::Deployment {
                kind: InfrastructureKind::Kubernetes,
                phase: DeployPhase::Ssl,
                message: "no namespace provisioned".to_string(),
            })?;
        let ingress_name = artifacts
            .ingress_name
            .clone()
            .ok_or_else(|| InfraError::Deployment {
                kind: InfrastructureKind::Kubernetes,
                phase: DeployPhase::Ssl,
                message: "no ingress configured".to_string(),
            })?;

        let host = config.external_host(&self.config.base_domain);
        let certificate = naming::certificate_name(tenant);

        let patch = json!({
            "metadata": {
                "annotations": {
                    "cert-manager.io/cluster-issuer": self.config.cluster_issuer,
                }
            },
            "spec": {
                "tls": [{
                    "hosts": [host],
                    "secretName": certificate,
                }]
            }
        });

        let ingresses: Api<Ingress> = Api::namespaced(self.client.clone(), &namespace);
        ingresses
            .patch(&ingress_name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;

        artifacts.ssl_certificate = Some(certificate.clone());
        artifacts.external_url = Some(format!(
            "https://{}",
            config.external_host(&self.config.base_domain)
        ));

        info!(tenant = %tenant, certificate = %certificate, "TLS termination requested");
        Ok(SslOutcome::Enabled { certificate })
    }

    async fn configure_monitoring(
        &self,
        tenant: &TenantId,
        _config: &IspConfig,
        artifacts: &mut DeploymentArtifacts,
    ) -> MonitoringOutcome {
        if !self.config.monitoring_enabled {
            return MonitoringOutcome::Skipped;
        }

        let Some(namespace) = artifacts.namespace.clone() else {
            return MonitoringOutcome::Degraded {
                reason: "no namespace provisioned".to_string(),
            };
        };
        let Some(workload) = artifacts.container_id.clone() else {
            return MonitoringOutcome::Degraded {
                reason: "no workload deployed".to_string(),
            };
        };

        let patch = json!({
            "spec": {
                "template": {
                    "metadata": {
                        "annotations": {
                            "prometheus.io/scrape": "true",
                            "prometheus.io/port": "8080",
                            "prometheus.io/path": "/metrics",
                        }
                    }
                }
            }
        });

        let api: Api<Deployment> = Api::namespaced(self.client.clone(), &namespace);
        match api
            .patch(&workload, &PatchParams::default(), &Patch::Merge(&patch))
            .await
        {
            Ok(_) => {
                debug!(tenant = %tenant, "Metrics scrape annotations attached");
                MonitoringOutcome::Configured
            }
            Err(e) => {
                warn!(tenant = %tenant, error = %e, "Monitoring configuration degraded");
                MonitoringOutcome::Degraded {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn rollback_deployment(
        &self,
        tenant: &TenantId,
        artifacts: &DeploymentArtifacts,
        timeout: Duration,
    ) -> bool {
        info!(
            tenant = %tenant,
            resources = artifacts.created_resources.len(),
            "Rolling back Kubernetes deployment"
        );

        match tokio::time::timeout(timeout, self.teardown(artifacts)).await {
            Ok(success) => {
                if success {
                    info!(tenant = %tenant, "Rollback complete");
                } else {
                    warn!(tenant = %tenant, "Rollback left resources behind");
                }
                success
            }
            Err(_) => {
                warn!(
                    tenant = %tenant,
                    timeout_secs = timeout.as_secs(),
                    "Rollback timed out"
                );
                false
            }
        }
    }
}
