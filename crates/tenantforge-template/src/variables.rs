//! Infrastructure-specific template variable preparation.
//!
//! Kubernetes wants resource quantities in its limit string format
//! (millicore and Mi suffixes); Compose wants plain decimal cores and its
//! own memory suffix. Everything else is shared.

use std::collections::BTreeMap;

use tenantforge_core::{naming, InfrastructureKind, IspConfig, TenantId};
use tenantforge_resources::ResourceRequirements;

/// Everything variable preparation needs to know about one deployment.
#[derive(Debug, Clone, Copy)]
pub struct VariableContext<'a> {
    /// Tenant being provisioned.
    pub tenant: &'a TenantId,
    /// Tenant configuration.
    pub config: &'a IspConfig,
    /// Allocated resource budget.
    pub resources: &'a ResourceRequirements,
    /// Application container image reference.
    pub image: &'a str,
}

/// Build the variable map for a template render.
///
/// The returned map is deterministic for a given context, so rendering is
/// reproducible.
#[must_use]
pub fn prepare_variables(
    kind: InfrastructureKind,
    ctx: &VariableContext<'_>,
) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();

    vars.insert("tenant_id".to_string(), ctx.tenant.to_string());
    vars.insert("display_name".to_string(), ctx.config.display_name.clone());
    vars.insert("plan".to_string(), ctx.config.plan_type.to_string());
    vars.insert("app_image".to_string(), ctx.image.to_string());
    vars.insert("namespace".to_string(), naming::isolation_name(ctx.tenant));
    vars.insert("workload_name".to_string(), naming::workload_name(ctx.tenant));
    vars.insert("volume_name".to_string(), naming::volume_name(ctx.tenant));
    vars.insert("network_name".to_string(), naming::network_name(ctx.tenant));
    vars.insert("config_name".to_string(), naming::config_name(ctx.tenant));
    vars.insert("secret_name".to_string(), naming::secret_name(ctx.tenant));
    vars.insert(
        "http_port".to_string(),
        ctx.config.network_config.http_port.to_string(),
    );
    vars.insert(
        "max_connections".to_string(),
        ctx.resources.max_connections.to_string(),
    );

    match kind {
        InfrastructureKind::Kubernetes => {
            vars.insert(
                "cpu_limit".to_string(),
                format!("{}m", ctx.resources.cpu_millicores),
            );
            vars.insert(
                "memory_limit".to_string(),
                format!("{}Mi", ctx.resources.memory_mb),
            );
            vars.insert(
                "storage_size".to_string(),
                format!("{}Gi", ctx.resources.storage_gb),
            );
        }
        InfrastructureKind::DockerCompose => {
            vars.insert("cpu_limit".to_string(), ctx.resources.cpu_cores().to_string());
            vars.insert(
                "memory_limit".to_string(),
                format!("{}m", ctx.resources.memory_mb),
            );
            vars.insert(
                "storage_size".to_string(),
                ctx.resources.storage_gb.to_string(),
            );
        }
    }

    vars
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenantforge_core::PlanType;

    fn context_parts() -> (TenantId, IspConfig, ResourceRequirements) {
        let tenant = TenantId::new("acme-isp").unwrap();
        let config = IspConfig::new(tenant.clone(), "Acme ISP", PlanType::Premium);
        let resources = ResourceRequirements {
            cpu_millicores: 1_500,
            memory_mb: 4_096,
            storage_gb: 50,
            max_connections: 250,
            max_concurrent_requests: 100,
        };
        (tenant, config, resources)
    }

    #[test]
    fn kubernetes_quantities_use_limit_strings() {
        let (tenant, config, resources) = context_parts();
        let vars = prepare_variables(
            InfrastructureKind::Kubernetes,
            &VariableContext {
                tenant: &tenant,
                config: &config,
                resources: &resources,
                image: "app:1.0",
            },
        );

        assert_eq!(vars["cpu_limit"], "1500m");
        assert_eq!(vars["memory_limit"], "4096Mi");
        assert_eq!(vars["storage_size"], "50Gi");
        assert_eq!(vars["namespace"], "tenant-acme-isp");
    }

    #[test]
    fn compose_quantities_are_plain() {
        let (tenant, config, resources) = context_parts();
        let vars = prepare_variables(
            InfrastructureKind::DockerCompose,
            &VariableContext {
                tenant: &tenant,
                config: &config,
                resources: &resources,
                image: "app:1.0",
            },
        );

        assert_eq!(vars["cpu_limit"], "1.5");
        assert_eq!(vars["memory_limit"], "4096m");
        assert_eq!(vars["storage_size"], "50");
        assert_eq!(vars["network_name"], "tenant-acme-isp-net");
    }

    #[test]
    fn built_in_templates_render_from_prepared_variables() {
        use crate::manager::TemplateManager;

        let (tenant, config, resources) = context_parts();
        let manager = TemplateManager::new();

        for kind in [InfrastructureKind::Kubernetes, InfrastructureKind::DockerCompose] {
            let vars = prepare_variables(
                kind,
                &VariableContext {
                    tenant: &tenant,
                    config: &config,
                    resources: &resources,
                    image: "app:1.0",
                },
            );
            let rendered = manager
                .render(TemplateManager::DEFAULT_TEMPLATE, kind, &vars)
                .unwrap();

            // No required placeholder survives rendering.
            let text = serde_json::to_string(&rendered).unwrap();
            assert!(!text.contains("{{"), "unrendered placeholder in {kind}: {text}");
        }
    }
}
