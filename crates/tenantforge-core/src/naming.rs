//! Canonical names for per-tenant infrastructure resources.
//!
//! Both the template variable preparation and the infrastructure adapters
//! derive resource names from the tenant ID through these helpers, so the
//! rendered workload and the provisioned primitives always agree.

use crate::ids::TenantId;

/// Kubernetes namespace / Compose project name for a tenant.
#[must_use]
pub fn isolation_name(tenant: &TenantId) -> String {
    format!("tenant-{tenant}")
}

/// Name of the tenant's application deployment / compose service container.
#[must_use]
pub fn workload_name(tenant: &TenantId) -> String {
    format!("tenant-{tenant}-app")
}

/// Name of the tenant's persistent data volume or claim.
#[must_use]
pub fn volume_name(tenant: &TenantId) -> String {
    format!("tenant-{tenant}-data")
}

/// Name of the tenant's Docker network.
#[must_use]
pub fn network_name(tenant: &TenantId) -> String {
    format!("tenant-{tenant}-net")
}

/// Name of the tenant's non-secret configuration object.
#[must_use]
pub fn config_name(tenant: &TenantId) -> String {
    format!("tenant-{tenant}-config")
}

/// Name of the tenant's secret object.
#[must_use]
pub fn secret_name(tenant: &TenantId) -> String {
    format!("tenant-{tenant}-secrets")
}

/// Name of the tenant's service / routing endpoint.
#[must_use]
pub fn service_name(tenant: &TenantId) -> String {
    format!("tenant-{tenant}-svc")
}

/// Name of the tenant's ingress resource.
#[must_use]
pub fn ingress_name(tenant: &TenantId) -> String {
    format!("tenant-{tenant}-ingress")
}

/// Name of the tenant's TLS certificate.
#[must_use]
pub fn certificate_name(tenant: &TenantId) -> String {
    format!("tenant-{tenant}-tls")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_embed_the_tenant_id() {
        let tenant = TenantId::new("acme-isp").unwrap();

        assert_eq!(isolation_name(&tenant), "tenant-acme-isp");
        assert_eq!(workload_name(&tenant), "tenant-acme-isp-app");
        assert_eq!(volume_name(&tenant), "tenant-acme-isp-data");
        assert_eq!(network_name(&tenant), "tenant-acme-isp-net");
        assert_eq!(secret_name(&tenant), "tenant-acme-isp-secrets");
    }
}
