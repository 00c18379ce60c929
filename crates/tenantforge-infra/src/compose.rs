//! Docker Compose infrastructure adapter.
//!
//! Drives a single host through the Docker CLI: one project directory and
//! Docker network per tenant, a named volume for persistent data, an `.env`
//! file holding the container environment, the rendered compose file brought
//! up with `docker compose up -d --wait`, and an edge-proxy dynamic
//! configuration file for routing and TLS.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::process::Command;
use tracing::{debug, info, warn};

use tenantforge_core::{naming, InfrastructureKind, IspConfig, SecretCipher, TenantId};
use tenantforge_resources::ResourceRequirements;

use crate::adapter::InfrastructureAdapter;
use crate::error::{DeployPhase, InfraError, Result};
use crate::types::{
    container_environment, CreatedResource, DeploymentArtifacts, MonitoringOutcome, SslOutcome,
};

/// Configuration for the Compose adapter.
#[derive(Debug, Clone)]
pub struct ComposeConfig {
    /// Directory under which per-tenant project directories are created.
    pub base_dir: PathBuf,
    /// Docker binary to invoke.
    pub docker_bin: String,
    /// Base domain for derived tenant hostnames.
    pub base_domain: String,
    /// Application container image deployed for every tenant.
    pub app_image: String,
    /// Edge-proxy ACME certificate resolver used for TLS.
    pub cert_resolver: String,
    /// Whether monitoring scrape targets are written.
    pub monitoring_enabled: bool,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("/var/lib/tenantforge/stacks"),
            docker_bin: "docker".to_string(),
            base_domain: "tenants.example.net".to_string(),
            app_image: "ghcr.io/tenantforge/tenant-app:latest".to_string(),
            cert_resolver: "letsencrypt".to_string(),
            monitoring_enabled: true,
        }
    }
}

impl ComposeConfig {
    /// Load configuration from environment variables.
    ///
    /// Supported environment variables:
    /// - `TENANT_COMPOSE_DIR`: base directory for tenant project dirs
    /// - `TENANT_DOCKER_BIN`: docker binary
    /// - `TENANT_BASE_DOMAIN`: base domain for derived hostnames
    /// - `TENANT_APP_IMAGE`: application container image
    /// - `TENANT_CERT_RESOLVER`: edge-proxy certificate resolver
    /// - `TENANT_MONITORING_ENABLED`: "true"/"false"
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("TENANT_COMPOSE_DIR") {
            config.base_dir = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("TENANT_DOCKER_BIN") {
            config.docker_bin = val;
        }
        if let Ok(val) = std::env::var("TENANT_BASE_DOMAIN") {
            config.base_domain = val;
        }
        if let Ok(val) = std::env::var("TENANT_APP_IMAGE") {
            config.app_image = val;
        }
        if let Ok(val) = std::env::var("TENANT_CERT_RESOLVER") {
            config.cert_resolver = val;
        }
        if let Ok(val) = std::env::var("TENANT_MONITORING_ENABLED") {
            config.monitoring_enabled = val.eq_ignore_ascii_case("true");
        }

        config
    }
}

/// Docker-Compose-based infrastructure adapter for single-host deployments.
pub struct ComposeAdapter {
    config: ComposeConfig,
    cipher: Arc<dyn SecretCipher>,
}

impl ComposeAdapter {
    /// Create a new Compose adapter.
    #[must_use]
    pub fn new(config: ComposeConfig, cipher: Arc<dyn SecretCipher>) -> Self {
        Self { config, cipher }
    }

    /// Get a reference to the adapter config.
    #[must_use]
    pub fn config(&self) -> &ComposeConfig {
        &self.config
    }

    fn project_dir(&self, tenant: &TenantId) -> PathBuf {
        self.config.base_dir.join(naming::isolation_name(tenant))
    }

    fn compose_file(&self, tenant: &TenantId) -> PathBuf {
        self.project_dir(tenant).join("compose.yaml")
    }

    /// Run the docker binary, returning trimmed stdout or the failure text.
    async fn docker(&self, args: &[&str]) -> std::result::Result<String, String> {
        let output = Command::new(&self.config.docker_bin)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| format!("failed to spawn {}: {e}", self.config.docker_bin))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(String::from_utf8_lossy(&output.stderr).trim().to_string())
        }
    }

    /// Build the `.env` file contents: derived environment plus decrypted
    /// secret material. Never logged.
    fn env_file_contents(
        env: &BTreeMap<String, String>,
        secrets: &BTreeMap<String, String>,
    ) -> String {
        let mut lines: Vec<String> = env.iter().map(|(k, v)| format!("{k}={v}")).collect();
        lines.extend(secrets.iter().map(|(k, v)| format!("{k}={v}")));
        lines.push(String::new());
        lines.join("\n")
    }

    /// Edge-proxy dynamic configuration for one tenant router.
    fn proxy_config(&self, tenant: &TenantId, host: &str, port: u16, tls: bool) -> Value {
        let router_name = naming::isolation_name(tenant);
        let mut router = json!({
            "rule": format!("Host(`{host}`)"),
            "service": router_name,
        });
        if tls {
            router["tls"] = json!({ "certResolver": self.config.cert_resolver });
        }

        json!({
            "http": {
                "routers": { router_name.clone(): router },
                "services": {
                    router_name: {
                        "loadBalancer": {
                            "servers": [{ "url": format!("http://127.0.0.1:{port}") }]
                        }
                    }
                }
            }
        })
    }

    async fn write_proxy_config(
        &self,
        tenant: &TenantId,
        host: &str,
        port: u16,
        tls: bool,
    ) -> std::io::Result<PathBuf> {
        let path = self.project_dir(tenant).join("proxy.yaml");
        let tree = self.proxy_config(tenant, host, port, tls);
        let yaml = serde_yaml::to_string(&tree).unwrap_or_default();
        tokio::fs::write(&path, yaml).await?;
        Ok(path)
    }

    async fn remove_file_resource(path: &str) -> bool {
        match tokio::fs::remove_file(path).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => {
                warn!(path, error = %e, "Failed to remove file during teardown");
                false
            }
        }
    }

    async fn delete_recorded(&self, resource: &CreatedResource) -> bool {
        match resource.kind.as_str() {
            "compose_stack" => {
                let file = resource.name.clone();
                let dir = Path::new(&file)
                    .parent()
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_default();
                match self
                    .docker(&[
                        "compose",
                        "-f",
                        &file,
                        "--project-directory",
                        &dir,
                        "down",
                        "--remove-orphans",
                    ])
                    .await
                {
                    Ok(_) => true,
                    Err(e) if is_already_gone(&e) => true,
                    Err(e) => {
                        warn!(file = %file, error = %e, "compose down failed during teardown");
                        false
                    }
                }
            }
            "network" => match self.docker(&["network", "rm", &resource.name]).await {
                Ok(_) => true,
                Err(e) if is_already_gone(&e) => true,
                Err(e) => {
                    warn!(network = %resource.name, error = %e, "Failed to remove network");
                    false
                }
            },
            "volume" => match self.docker(&["volume", "rm", &resource.name]).await {
                Ok(_) => true,
                Err(e) if is_already_gone(&e) => true,
                Err(e) => {
                    warn!(volume = %resource.name, error = %e, "Failed to remove volume");
                    false
                }
            },
            "compose_file" | "env_file" | "proxy_config" | "monitoring_target" => {
                Self::remove_file_resource(&resource.name).await
            }
            "project_dir" => match tokio::fs::remove_dir_all(&resource.name).await {
                Ok(()) => true,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
                Err(e) => {
                    warn!(dir = %resource.name, error = %e, "Failed to remove project dir");
                    false
                }
            },
            kind => {
                warn!(kind, name = %resource.name, "Unknown resource kind in rollback ledger");
                false
            }
        }
    }

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

/// Docker error text for resources that no longer exist.
fn is_already_gone(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    lower.contains("not found") || lower.contains("no such")
}

#[async_trait]
impl InfrastructureAdapter for ComposeAdapter {
    fn kind(&self) -> InfrastructureKind {
        InfrastructureKind::DockerCompose
    }

    async fn infrastructure_ready(&self) -> bool {
        match self.docker(&["info", "--format", "{{.ServerVersion}}"]).await {
            Ok(version) => {
                debug!(version = %version, "Docker engine reachable");
                true
            }
            Err(e) => {
                warn!(error = %e, "Docker engine is not reachable");
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
        info!(tenant = %tenant, region, "Provisioning Compose infrastructure");

        let project = naming::isolation_name(tenant);
        let dir = self.project_dir(tenant);
        let label = format!("tenantforge.io/tenant={tenant}");

        let result = async {
            artifacts.record(CreatedResource::new(
                "project_dir",
                dir.to_string_lossy().into_owned(),
            ));
            tokio::fs::create_dir_all(&dir).await?;
            artifacts.namespace = Some(project.clone());

            let network = naming::network_name(tenant);
            artifacts.record(CreatedResource::new("network", &network));
            self.docker(&["network", "create", "--label", &label, &network])
                .await
                .map_err(|message| InfraError::Provision {
                    kind: InfrastructureKind::DockerCompose,
                    resource: format!("network {network}"),
                    message,
                })?;

            let volume = naming::volume_name(tenant);
            artifacts.record(CreatedResource::new("volume", &volume));
            self.docker(&["volume", "create", "--label", &label, &volume])
                .await
                .map_err(|message| InfraError::Provision {
                    kind: InfrastructureKind::DockerCompose,
                    resource: format!("volume {volume}"),
                    message,
                })?;

            // Decrypt at materialization time; values never hit the logs.
            let mut secrets = BTreeMap::new();
            for (key, ciphertext) in &config.secrets {
                secrets.insert(key.clone(), self.cipher.decrypt(ciphertext)?);
            }
            debug!(tenant = %tenant, secret_keys = secrets.len(), "Materializing tenant secrets");

            let env_path = dir.join(".env");
            artifacts.record(CreatedResource::new(
                "env_file",
                env_path.to_string_lossy().into_owned(),
            ));
            let contents =
                Self::env_file_contents(&container_environment(config, resources), &secrets);
            tokio::fs::write(&env_path, contents).await?;

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
            "Compose infrastructure ready"
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
        let dir = self.project_dir(tenant);
        let file = self.compose_file(tenant);
        let file_str = file.to_string_lossy().into_owned();
        let dir_str = dir.to_string_lossy().into_owned();

        let yaml = serde_yaml::to_string(rendered)?;
        artifacts.record(CreatedResource::new("compose_file", &file_str));
        tokio::fs::write(&file, yaml).await?;

        // Recorded before `up` so rollback runs `down` even if the stack
        // came up partially.
        artifacts.record(CreatedResource::new("compose_stack", &file_str));

        info!(tenant = %tenant, "Starting compose stack, waiting for healthchecks");

        let up_args = [
            "compose",
            "-f",
            file_str.as_str(),
            "--project-directory",
            dir_str.as_str(),
            "up",
            "-d",
            "--wait",
        ];

        match tokio::time::timeout(timeout, self.docker(&up_args)).await {
            Ok(Ok(_)) => {}
            Ok(Err(message)) => {
                return Err(InfraError::Deployment {
                    kind: InfrastructureKind::DockerCompose,
                    phase: DeployPhase::Workload,
                    message,
                });
            }
            Err(_) => {
                return Err(InfraError::Timeout {
                    what: format!("compose stack for tenant {tenant}"),
                    waited_secs: timeout.as_secs(),
                });
            }
        }

        let container_id = self
            .docker(&[
                "compose",
                "-f",
                &file_str,
                "--project-directory",
                &dir_str,
                "ps",
                "-q",
                "app",
            ])
            .await
            .map_err(|message| InfraError::Deployment {
                kind: InfrastructureKind::DockerCompose,
                phase: DeployPhase::Workload,
                message,
            })?
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();

        if container_id.is_empty() {
            return Err(InfraError::Deployment {
                kind: InfrastructureKind::DockerCompose,
                phase: DeployPhase::Workload,
                message: "app service has no running container".to_string(),
            });
        }

        artifacts.container_id = Some(container_id);
        info!(tenant = %tenant, "Compose stack is running");
        Ok(())
    }

    async fn configure_networking(
        &self,
        tenant: &TenantId,
        config: &IspConfig,
        artifacts: &mut DeploymentArtifacts,
    ) -> Result<()> {
        let host = config.external_host(&self.config.base_domain);
        let port = config.network_config.http_port;

        let path = self
            .write_proxy_config(tenant, &host, port, false)
            .await
            .map_err(|e| InfraError::Deployment {
                kind: InfrastructureKind::DockerCompose,
                phase: DeployPhase::Networking,
                message: e.to_string(),
            })?;
        artifacts.record(CreatedResource::new(
            "proxy_config",
            path.to_string_lossy().into_owned(),
        ));

        artifacts.service_name = Some(naming::workload_name(tenant));
        artifacts.internal_url = Some(format!("http://127.0.0.1:{port}"));
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

        let host = config.external_host(&self.config.base_domain);
        let port = config.network_config.http_port;

        // Rewrites the router written during networking; no new ledger entry.
        self.write_proxy_config(tenant, &host, port, true)
            .await
            .map_err(|e| InfraError::Deployment {
                kind: InfrastructureKind::DockerCompose,
                phase: DeployPhase::Ssl,
                message: e.to_string(),
            })?;

        let certificate = naming::certificate_name(tenant);
        artifacts.ssl_certificate = Some(certificate.clone());
        artifacts.external_url = Some(format!("https://{host}"));

        info!(tenant = %tenant, certificate = %certificate, "TLS termination requested");
        Ok(SslOutcome::Enabled { certificate })
    }

    async fn configure_monitoring(
        &self,
        tenant: &TenantId,
        config: &IspConfig,
        artifacts: &mut DeploymentArtifacts,
    ) -> MonitoringOutcome {
        if !self.config.monitoring_enabled {
            return MonitoringOutcome::Skipped;
        }

        let targets = json!([{
            "targets": [format!("127.0.0.1:{}", config.network_config.http_port)],
            "labels": {
                "tenant": tenant.to_string(),
                "plan": config.plan_type.to_string(),
            }
        }]);

        let dir = self.project_dir(tenant).join("monitoring");
        let path = dir.join("targets.json");

        let write = async {
            tokio::fs::create_dir_all(&dir).await?;
            tokio::fs::write(&path, serde_json::to_vec_pretty(&targets)?).await?;
            Ok::<_, std::io::Error>(())
        };

        match write.await {
            Ok(()) => {
                artifacts.record(CreatedResource::new(
                    "monitoring_target",
                    path.to_string_lossy().into_owned(),
                ));
                debug!(tenant = %tenant, "Monitoring scrape target written");
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
            "Rolling back Compose deployment"
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
