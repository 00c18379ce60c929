//! Pre-flight request validation.
//!
//! Phase 1 of the pipeline: parameter bounds and infrastructure readiness.
//! Runs before any platform resource is touched, so a validation failure
//! never needs rollback. Every violated bound is reported, not just the
//! first.

use std::time::Duration;

use tenantforge_infra::InfrastructureAdapter;

use crate::error::ProvisioningError;
use crate::types::ProvisioningRequest;

/// Smallest accepted customer-count estimate.
pub const MIN_CUSTOMER_COUNT: u32 = 1;
/// Largest accepted customer-count estimate.
pub const MAX_CUSTOMER_COUNT: u32 = 50_000;
/// Smallest accepted deployment budget.
pub const MIN_PROVISIONING_TIMEOUT: Duration = Duration::from_secs(120);
/// Largest accepted deployment budget.
pub const MAX_PROVISIONING_TIMEOUT: Duration = Duration::from_secs(1_800);

/// Pre-flight validator for provisioning requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProvisioningValidator;

impl ProvisioningValidator {
    /// Create a validator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Check request bounds and platform readiness.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Validation`] listing every violated
    /// bound, or the readiness failure.
    pub async fn validate(
        &self,
        request: &ProvisioningRequest,
        adapter: &dyn InfrastructureAdapter,
    ) -> Result<(), ProvisioningError> {
        let mut problems = Vec::new();

        if request.customer_count < MIN_CUSTOMER_COUNT
            || request.customer_count > MAX_CUSTOMER_COUNT
        {
            problems.push(format!(
                "customer_count {} outside {MIN_CUSTOMER_COUNT}-{MAX_CUSTOMER_COUNT}",
                request.customer_count
            ));
        }

        if request.provisioning_timeout < MIN_PROVISIONING_TIMEOUT
            || request.provisioning_timeout > MAX_PROVISIONING_TIMEOUT
        {
            problems.push(format!(
                "provisioning_timeout {}s outside {}s-{}s",
                request.provisioning_timeout.as_secs(),
                MIN_PROVISIONING_TIMEOUT.as_secs(),
                MAX_PROVISIONING_TIMEOUT.as_secs()
            ));
        }

        if request.infrastructure != adapter.kind() {
            problems.push(format!(
                "request targets {} but the adapter drives {}",
                request.infrastructure,
                adapter.kind()
            ));
        }

        if !adapter.infrastructure_ready().await {
            problems.push(format!("{} infrastructure is not ready", adapter.kind()));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ProvisioningError::Validation(problems.join("; ")))
        }
    }
}
