//! The active-operations registry.
//!
//! Instance-scoped state tracking every in-flight provisioning operation,
//! keyed by tenant. Inserted at operation start, removed at operation end;
//! each task only ever touches its own key, so a read-write lock over a map
//! is all the synchronization required. Deliberately owned by the
//! orchestrator instance rather than living in a module-level global.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use tenantforge_core::{RequestId, TenantId};

use crate::state::ProvisioningStatus;

/// Point-in-time view of one in-flight operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSnapshot {
    /// The operation's request ID.
    pub request_id: RequestId,
    /// Current pipeline status.
    pub status: ProvisioningStatus,
    /// When the operation started.
    pub started_at: DateTime<Utc>,
}

/// Registry of in-flight provisioning operations, keyed by tenant.
///
/// Concurrent calls for the same tenant are not deduplicated here; an
/// upstream idempotency layer is expected to prevent them. A second insert
/// for the same tenant simply replaces the snapshot.
#[derive(Debug, Default)]
pub struct ActiveOperations {
    inner: RwLock<HashMap<TenantId, OperationSnapshot>>,
}

impl ActiveOperations {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of an operation.
    pub fn start(&self, tenant: TenantId, request_id: RequestId) {
        let snapshot = OperationSnapshot {
            request_id,
            status: ProvisioningStatus::Pending,
            started_at: Utc::now(),
        };
        self.inner.write().insert(tenant, snapshot);
    }

    /// Update the status of an in-flight operation.
    pub fn update_status(&self, tenant: &TenantId, status: ProvisioningStatus) {
        if let Some(snapshot) = self.inner.write().get_mut(tenant) {
            snapshot.status = status;
        }
    }

    /// Remove an operation at its end, returning the final snapshot.
    pub fn finish(&self, tenant: &TenantId) -> Option<OperationSnapshot> {
        self.inner.write().remove(tenant)
    }

    /// Point-in-time status lookup for a tenant.
    #[must_use]
    pub fn get(&self, tenant: &TenantId) -> Option<OperationSnapshot> {
        self.inner.read().get(tenant).cloned()
    }

    /// All in-flight operations.
    #[must_use]
    pub fn list(&self) -> Vec<(TenantId, OperationSnapshot)> {
        self.inner
            .read()
            .iter()
            .map(|(tenant, snapshot)| (tenant.clone(), snapshot.clone()))
            .collect()
    }

    /// Number of in-flight operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// True if no operation is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant(name: &str) -> TenantId {
        TenantId::new(name).unwrap()
    }

    #[test]
    fn start_update_finish() {
        let registry = ActiveOperations::new();
        let t = tenant("acme-isp");
        let id = RequestId::generate();

        registry.start(t.clone(), id);
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get(&t).unwrap().status,
            ProvisioningStatus::Pending
        );

        registry.update_status(&t, ProvisioningStatus::Deploying);
        assert_eq!(
            registry.get(&t).unwrap().status,
            ProvisioningStatus::Deploying
        );

        let final_snapshot = registry.finish(&t).unwrap();
        assert_eq!(final_snapshot.request_id, id);
        assert!(registry.is_empty());
        assert!(registry.get(&t).is_none());
    }

    #[test]
    fn distinct_tenants_do_not_contend() {
        let registry = ActiveOperations::new();
        registry.start(tenant("tenant-a"), RequestId::generate());
        registry.start(tenant("tenant-b"), RequestId::generate());

        registry.update_status(&tenant("tenant-a"), ProvisioningStatus::Validating);

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.get(&tenant("tenant-a")).unwrap().status,
            ProvisioningStatus::Validating
        );
        assert_eq!(
            registry.get(&tenant("tenant-b")).unwrap().status,
            ProvisioningStatus::Pending
        );
    }

    #[test]
    fn update_for_unknown_tenant_is_a_no_op() {
        let registry = ActiveOperations::new();
        registry.update_status(&tenant("ghost"), ProvisioningStatus::Failed);
        assert!(registry.is_empty());
    }
}
