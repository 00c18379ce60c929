//! Error types for the provisioning pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use tenantforge_health::HealthError;
use tenantforge_infra::InfraError;
use tenantforge_resources::ResourceError;
use tenantforge_template::TemplateError;

/// The six pipeline phases, used to tag failures in the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningStage {
    /// Phase 1: request bounds and infrastructure readiness.
    Validation,
    /// Phase 2: resource budget calculation or custom-budget validation.
    ResourceCalculation,
    /// Phase 3: isolation, storage, and configuration primitives.
    Infrastructure,
    /// Phase 4: template rendering and workload deployment.
    Deployment,
    /// Phase 5: networking, SSL, and monitoring configuration.
    ServiceConfiguration,
    /// Phase 6: health validation.
    HealthValidation,
}

impl fmt::Display for ProvisioningStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Validation => "validation",
            Self::ResourceCalculation => "resource_calculation",
            Self::Infrastructure => "infrastructure",
            Self::Deployment => "deployment",
            Self::ServiceConfiguration => "service_configuration",
            Self::HealthValidation => "health_validation",
        };
        write!(f, "{s}")
    }
}

/// Errors that can occur inside the provisioning pipeline.
///
/// These never escape [`provision_isp_container`]: the orchestrator converts
/// them into the result's `error_message`/`error_stage` and triggers
/// rollback before returning normally.
///
/// [`provision_isp_container`]: crate::ContainerProvisioner::provision_isp_container
#[derive(Debug, Error)]
pub enum ProvisioningError {
    /// Request parameters or infrastructure readiness out of contract.
    /// Never triggers infrastructure changes; not retried.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Computed or supplied resources violate limits.
    #[error(transparent)]
    Resources(#[from] ResourceError),

    /// Template rendering failed.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Platform-level failure in an adapter.
    #[error(transparent)]
    Infrastructure(#[from] InfraError),

    /// Health wait exceeded its budget on every retry attempt.
    #[error(transparent)]
    Health(#[from] HealthError),
}

impl ProvisioningError {
    /// Returns true if this error might be resolved by retrying the
    /// operation as a whole.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        match self {
            Self::Validation(_) | Self::Resources(_) | Self::Template(_) => false,
            Self::Infrastructure(e) => e.is_retriable(),
            Self::Health(e) => e.is_retriable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_display() {
        assert_eq!(ProvisioningStage::Deployment.to_string(), "deployment");
        assert_eq!(
            ProvisioningStage::ServiceConfiguration.to_string(),
            "service_configuration"
        );
    }

    #[test]
    fn validation_errors_are_not_retriable() {
        let err = ProvisioningError::Validation("customer_count out of range".to_string());
        assert!(!err.is_retriable());
    }

    #[test]
    fn health_timeouts_are_retriable() {
        let err = ProvisioningError::Health(HealthError::Timeout {
            container_id: "c1".to_string(),
            waited_secs: 60,
            attempts: 30,
        });
        assert!(err.is_retriable());
    }
}
