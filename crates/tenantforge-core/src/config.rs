//! Tenant configuration model.
//!
//! These types describe everything the provisioning pipeline needs to know
//! about one tenant: plan tier, network exposure, database shape, feature
//! toggles, branding, and free-form environment/secret material. An
//! [`IspConfig`] is created by the caller and is immutable for the life of
//! one provisioning request.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::ids::TenantId;

/// Subscription plan tier for a tenant.
///
/// Ordering is meaningful: `Standard < Premium < Enterprise`. Plan
/// recommendation relies on this to escalate, never downgrade.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    /// Entry tier for small deployments.
    #[default]
    Standard,
    /// Mid tier with analytics and integration features.
    Premium,
    /// Top tier with dedicated infrastructure features.
    Enterprise,
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Standard => "standard",
            Self::Premium => "premium",
            Self::Enterprise => "enterprise",
        };
        write!(f, "{s}")
    }
}

/// Target container platform for a deployment.
///
/// The single-host Docker and Docker Compose spellings are the same
/// platform: both are driven by the Compose adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InfrastructureKind {
    /// Kubernetes cluster (namespace-isolated).
    #[default]
    Kubernetes,
    /// Single host driven through the Docker Compose CLI (network-isolated).
    #[serde(alias = "docker")]
    DockerCompose,
}

impl InfrastructureKind {
    /// Stable lowercase name used in logs and resource labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kubernetes => "kubernetes",
            Self::DockerCompose => "docker_compose",
        }
    }
}

impl fmt::Display for InfrastructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The ten tenant-level feature toggles.
///
/// When the caller does not supply flags, they are derived from the plan
/// tier via [`FeatureFlags::defaults_for_plan`] before any other processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct FeatureFlags {
    /// Usage analytics dashboard.
    pub analytics_dashboard: bool,
    /// Outbound API webhooks.
    pub api_webhooks: bool,
    /// Bulk customer import/export operations.
    pub bulk_operations: bool,
    /// Scheduled and ad-hoc advanced reporting.
    pub advanced_reporting: bool,
    /// Multi-language UI.
    pub multi_language: bool,
    /// White-label branding.
    pub custom_branding: bool,
    /// Captive guest portal.
    pub guest_portal: bool,
    /// Dedicated (non-shared) database instance.
    pub dedicated_database: bool,
    /// Priority support channel.
    pub priority_support: bool,
    /// Automatic nightly backups.
    pub auto_backups: bool,
}

impl FeatureFlags {
    /// Derive the default feature set for a plan tier.
    ///
    /// This derivation is pure and deterministic; it is applied exactly once,
    /// at request construction, when the caller supplies no explicit flags.
    #[must_use]
    pub const fn defaults_for_plan(plan: PlanType) -> Self {
        match plan {
            PlanType::Standard => Self {
                analytics_dashboard: false,
                api_webhooks: false,
                bulk_operations: false,
                advanced_reporting: false,
                multi_language: false,
                custom_branding: false,
                guest_portal: true,
                dedicated_database: false,
                priority_support: false,
                auto_backups: true,
            },
            PlanType::Premium => Self {
                analytics_dashboard: true,
                api_webhooks: true,
                bulk_operations: true,
                advanced_reporting: false,
                multi_language: true,
                custom_branding: true,
                guest_portal: true,
                dedicated_database: false,
                priority_support: false,
                auto_backups: true,
            },
            PlanType::Enterprise => Self {
                analytics_dashboard: true,
                api_webhooks: true,
                bulk_operations: true,
                advanced_reporting: true,
                multi_language: true,
                custom_branding: true,
                guest_portal: true,
                dedicated_database: true,
                priority_support: true,
                auto_backups: true,
            },
        }
    }

    /// Names of all enabled features, in declaration order.
    #[must_use]
    pub fn enabled(&self) -> Vec<&'static str> {
        let pairs = [
            ("analytics_dashboard", self.analytics_dashboard),
            ("api_webhooks", self.api_webhooks),
            ("bulk_operations", self.bulk_operations),
            ("advanced_reporting", self.advanced_reporting),
            ("multi_language", self.multi_language),
            ("custom_branding", self.custom_branding),
            ("guest_portal", self.guest_portal),
            ("dedicated_database", self.dedicated_database),
            ("priority_support", self.priority_support),
            ("auto_backups", self.auto_backups),
        ];

        pairs
            .into_iter()
            .filter_map(|(name, on)| on.then_some(name))
            .collect()
    }
}

/// Network exposure configuration for a tenant stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Fully-qualified domain to expose the stack at. When absent, a
    /// subdomain is derived from the tenant ID and the platform base domain.
    pub domain: Option<String>,
    /// Explicit subdomain label overriding the tenant-ID-derived one.
    pub subdomain: Option<String>,
    /// Whether TLS termination should be requested for the external URL.
    pub ssl_enabled: bool,
    /// HTTP port the application container listens on.
    pub http_port: u16,
    /// Allowed CORS origins passed into the container environment.
    pub cors_origins: Vec<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            domain: None,
            subdomain: None,
            ssl_enabled: true,
            http_port: 8080,
            cors_origins: Vec::new(),
        }
    }
}

/// Database size tier for the tenant's database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseSizeTier {
    /// Shared-friendly footprint.
    #[default]
    Small,
    /// Mid-size dedicated footprint.
    Medium,
    /// Large dedicated footprint.
    Large,
}

/// Database shape for a tenant stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Whether the tenant gets a dedicated database instance.
    pub dedicated_instance: bool,
    /// Size tier of the database footprint.
    pub size_tier: DatabaseSizeTier,
    /// Whether automatic backups are enabled.
    pub backup_enabled: bool,
    /// Whether streaming replication is enabled.
    pub replication_enabled: bool,
    /// Connection pool size for the application.
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            dedicated_instance: false,
            size_tier: DatabaseSizeTier::Small,
            backup_enabled: true,
            replication_enabled: false,
            pool_size: 20,
        }
    }
}

/// White-label branding passed into the tenant application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BrandingConfig {
    /// Company name shown in the tenant UI.
    pub company_name: Option<String>,
    /// Logo asset URL.
    pub logo_url: Option<String>,
    /// Primary UI color (hex).
    pub primary_color: Option<String>,
    /// Support contact surfaced to end customers.
    pub support_email: Option<String>,
}

/// Complete tenant-level configuration for one provisioning request.
///
/// Created by the caller; immutable for the life of one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IspConfig {
    /// Validated tenant slug. Globally unique (enforced upstream).
    pub tenant_name: TenantId,
    /// Human-readable display name.
    pub display_name: String,
    /// Subscription plan tier.
    pub plan_type: PlanType,
    /// Network exposure settings.
    #[serde(default)]
    pub network_config: NetworkConfig,
    /// Database shape.
    #[serde(default)]
    pub database_config: DatabaseConfig,
    /// Feature toggles. [`IspConfig::new`] derives these from the plan; a
    /// caller overriding them must set the whole struct.
    pub feature_flags: FeatureFlags,
    /// Free-form environment variables merged into the container environment.
    #[serde(default)]
    pub environment_variables: BTreeMap<String, String>,
    /// Secret key-value material merged into the container environment.
    /// Values arrive encrypted and are decrypted by the adapter at
    /// materialization time; they must never be logged.
    #[serde(default)]
    pub secrets: BTreeMap<String, String>,
    /// White-label branding.
    #[serde(default)]
    pub branding_config: BrandingConfig,
}

impl IspConfig {
    /// Create a configuration with plan-derived feature flags and default
    /// network/database/branding settings.
    #[must_use]
    pub fn new(tenant_name: TenantId, display_name: impl Into<String>, plan_type: PlanType) -> Self {
        Self {
            tenant_name,
            display_name: display_name.into(),
            plan_type,
            network_config: NetworkConfig::default(),
            database_config: DatabaseConfig::default(),
            feature_flags: FeatureFlags::defaults_for_plan(plan_type),
            environment_variables: BTreeMap::new(),
            secrets: BTreeMap::new(),
            branding_config: BrandingConfig::default(),
        }
    }

    /// The external hostname for this tenant: the explicit domain when set,
    /// otherwise `{subdomain-or-tenant}.{base_domain}`.
    #[must_use]
    pub fn external_host(&self, base_domain: &str) -> String {
        if let Some(domain) = &self.network_config.domain {
            return domain.clone();
        }

        let label = self
            .network_config
            .subdomain
            .as_deref()
            .unwrap_or_else(|| self.tenant_name.as_str());
        format!("{label}.{base_domain}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant() -> TenantId {
        TenantId::new("acme-isp").unwrap()
    }

    #[test]
    fn plan_ordering_escalates() {
        assert!(PlanType::Standard < PlanType::Premium);
        assert!(PlanType::Premium < PlanType::Enterprise);
    }

    #[test]
    fn infrastructure_kind_accepts_docker_alias() {
        let kind: InfrastructureKind = serde_json::from_str("\"docker\"").unwrap();
        assert_eq!(kind, InfrastructureKind::DockerCompose);

        let kind: InfrastructureKind = serde_json::from_str("\"docker_compose\"").unwrap();
        assert_eq!(kind, InfrastructureKind::DockerCompose);

        let kind: InfrastructureKind = serde_json::from_str("\"kubernetes\"").unwrap();
        assert_eq!(kind, InfrastructureKind::Kubernetes);
    }

    #[test]
    fn feature_defaults_grow_with_plan() {
        let standard = FeatureFlags::defaults_for_plan(PlanType::Standard);
        let premium = FeatureFlags::defaults_for_plan(PlanType::Premium);
        let enterprise = FeatureFlags::defaults_for_plan(PlanType::Enterprise);

        assert!(standard.enabled().len() < premium.enabled().len());
        assert!(premium.enabled().len() < enterprise.enabled().len());

        // Enterprise enables everything.
        assert_eq!(enterprise.enabled().len(), 10);
        // Standard keeps the essentials only.
        assert!(standard.guest_portal);
        assert!(standard.auto_backups);
        assert!(!standard.analytics_dashboard);
    }

    #[test]
    fn feature_defaults_are_deterministic() {
        assert_eq!(
            FeatureFlags::defaults_for_plan(PlanType::Premium),
            FeatureFlags::defaults_for_plan(PlanType::Premium)
        );
    }

    #[test]
    fn new_config_derives_flags_from_plan() {
        let config = IspConfig::new(tenant(), "Acme ISP", PlanType::Enterprise);
        assert_eq!(
            config.feature_flags,
            FeatureFlags::defaults_for_plan(PlanType::Enterprise)
        );
    }

    #[test]
    fn external_host_prefers_explicit_domain() {
        let mut config = IspConfig::new(tenant(), "Acme ISP", PlanType::Standard);
        assert_eq!(config.external_host("tenants.example.net"), "acme-isp.tenants.example.net");

        config.network_config.subdomain = Some("portal".to_string());
        assert_eq!(config.external_host("tenants.example.net"), "portal.tenants.example.net");

        config.network_config.domain = Some("isp.acme.com".to_string());
        assert_eq!(config.external_host("tenants.example.net"), "isp.acme.com");
    }
}
