//! The resource budget type and its absolute limits.
//!
//! Quantities use integer interior units: CPU in millicores (0.1-core steps)
//! and memory in megabytes (0.5-GB steps). Float views exist only for
//! display and cost math.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// CPU allocation granularity: 100 millicores = 0.1 core.
pub const CPU_STEP_MILLICORES: u32 = 100;
/// Minimum CPU allocation (0.1 core).
pub const MIN_CPU_MILLICORES: u32 = 100;
/// Maximum CPU allocation (16 cores).
pub const MAX_CPU_MILLICORES: u32 = 16_000;

/// Memory allocation granularity: 512 MB = 0.5 GB.
pub const MEMORY_STEP_MB: u32 = 512;
/// Minimum memory allocation (0.5 GB).
pub const MIN_MEMORY_MB: u32 = 512;
/// Maximum memory allocation (64 GB).
pub const MAX_MEMORY_MB: u32 = 65_536;

/// Minimum persistent storage in GB.
pub const MIN_STORAGE_GB: u32 = 1;
/// Maximum persistent storage in GB.
pub const MAX_STORAGE_GB: u32 = 500;

/// Minimum database connection budget.
pub const MIN_CONNECTIONS: u32 = 10;
/// Maximum database connection budget.
pub const MAX_CONNECTIONS: u32 = 2_000;

/// Minimum concurrent-request budget.
pub const MIN_CONCURRENT_REQUESTS: u32 = 5;
/// Maximum concurrent-request budget.
pub const MAX_CONCURRENT_REQUESTS: u32 = 1_000;

/// A specialized Result type for resource operations.
pub type Result<T> = std::result::Result<T, ResourceError>;

/// Errors from resource calculation and validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// The customer count is outside the supported range.
    #[error("customer count {0} is outside the supported range 1-50000")]
    InvalidCustomerCount(u32),

    /// One or more dimensions violate the absolute limits. Every violated
    /// dimension is listed, not just the first.
    #[error("resource limits violated: {}", violations.join("; "))]
    LimitsViolated {
        /// Human-readable description of each violated dimension.
        violations: Vec<String>,
    },
}

/// The CPU/memory/storage/connection budget for one tenant stack.
///
/// Either supplied directly by the caller or computed by
/// [`calculate_optimal_resources`](crate::calculate_optimal_resources).
/// Immutable once computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    /// CPU budget in millicores; always a multiple of 100 (0.1 core).
    pub cpu_millicores: u32,
    /// Memory budget in MB; always a multiple of 512 (0.5 GB).
    pub memory_mb: u32,
    /// Persistent storage in whole GB.
    pub storage_gb: u32,
    /// Database connection budget.
    pub max_connections: u32,
    /// Concurrent HTTP request budget.
    pub max_concurrent_requests: u32,
}

impl ResourceRequirements {
    /// CPU budget in cores, for display and cost math.
    #[must_use]
    pub fn cpu_cores(&self) -> f64 {
        f64::from(self.cpu_millicores) / 1000.0
    }

    /// Memory budget in GB, for display and cost math.
    #[must_use]
    pub fn memory_gb(&self) -> f64 {
        f64::from(self.memory_mb) / 1024.0
    }
}

/// Re-check a budget against the absolute limits and step granularity.
///
/// Used for caller-supplied custom budgets before any infrastructure work
/// begins. Collects every violation rather than failing on the first.
///
/// # Errors
///
/// Returns [`ResourceError::LimitsViolated`] listing each out-of-contract
/// dimension.
pub fn validate_resource_limits(resources: &ResourceRequirements) -> Result<()> {
    let mut violations = Vec::new();

    if resources.cpu_millicores < MIN_CPU_MILLICORES
        || resources.cpu_millicores > MAX_CPU_MILLICORES
    {
        violations.push(format!(
            "cpu {}m outside {MIN_CPU_MILLICORES}m-{MAX_CPU_MILLICORES}m",
            resources.cpu_millicores
        ));
    } else if resources.cpu_millicores % CPU_STEP_MILLICORES != 0 {
        violations.push(format!(
            "cpu {}m is not a multiple of {CPU_STEP_MILLICORES}m",
            resources.cpu_millicores
        ));
    }

    if resources.memory_mb < MIN_MEMORY_MB || resources.memory_mb > MAX_MEMORY_MB {
        violations.push(format!(
            "memory {}Mi outside {MIN_MEMORY_MB}Mi-{MAX_MEMORY_MB}Mi",
            resources.memory_mb
        ));
    } else if resources.memory_mb % MEMORY_STEP_MB != 0 {
        violations.push(format!(
            "memory {}Mi is not a multiple of {MEMORY_STEP_MB}Mi",
            resources.memory_mb
        ));
    }

    if resources.storage_gb < MIN_STORAGE_GB || resources.storage_gb > MAX_STORAGE_GB {
        violations.push(format!(
            "storage {}Gi outside {MIN_STORAGE_GB}Gi-{MAX_STORAGE_GB}Gi",
            resources.storage_gb
        ));
    }

    if resources.max_connections < MIN_CONNECTIONS
        || resources.max_connections > MAX_CONNECTIONS
    {
        violations.push(format!(
            "connections {} outside {MIN_CONNECTIONS}-{MAX_CONNECTIONS}",
            resources.max_connections
        ));
    }

    if resources.max_concurrent_requests < MIN_CONCURRENT_REQUESTS
        || resources.max_concurrent_requests > MAX_CONCURRENT_REQUESTS
    {
        violations.push(format!(
            "concurrent requests {} outside {MIN_CONCURRENT_REQUESTS}-{MAX_CONCURRENT_REQUESTS}",
            resources.max_concurrent_requests
        ));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ResourceError::LimitsViolated { violations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ResourceRequirements {
        ResourceRequirements {
            cpu_millicores: 1_500,
            memory_mb: 4_096,
            storage_gb: 50,
            max_connections: 200,
            max_concurrent_requests: 100,
        }
    }

    #[test]
    fn valid_budget_passes() {
        assert!(validate_resource_limits(&valid()).is_ok());
    }

    #[test]
    fn boundary_values_pass() {
        let floor = ResourceRequirements {
            cpu_millicores: MIN_CPU_MILLICORES,
            memory_mb: MIN_MEMORY_MB,
            storage_gb: MIN_STORAGE_GB,
            max_connections: MIN_CONNECTIONS,
            max_concurrent_requests: MIN_CONCURRENT_REQUESTS,
        };
        let ceiling = ResourceRequirements {
            cpu_millicores: MAX_CPU_MILLICORES,
            memory_mb: MAX_MEMORY_MB,
            storage_gb: MAX_STORAGE_GB,
            max_connections: MAX_CONNECTIONS,
            max_concurrent_requests: MAX_CONCURRENT_REQUESTS,
        };

        assert!(validate_resource_limits(&floor).is_ok());
        assert!(validate_resource_limits(&ceiling).is_ok());
    }

    #[test]
    fn every_violation_is_listed() {
        let resources = ResourceRequirements {
            cpu_millicores: 32_000,
            memory_mb: 131_072,
            storage_gb: 1_000,
            max_connections: 5_000,
            max_concurrent_requests: 2_000,
        };

        let err = validate_resource_limits(&resources).unwrap_err();
        match err {
            ResourceError::LimitsViolated { violations } => {
                assert_eq!(violations.len(), 5);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn granularity_is_enforced() {
        let mut resources = valid();
        resources.cpu_millicores = 1_250;
        resources.memory_mb = 4_000;

        let err = validate_resource_limits(&resources).unwrap_err();
        match err {
            ResourceError::LimitsViolated { violations } => {
                assert_eq!(violations.len(), 2);
                assert!(violations[0].contains("multiple"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn float_views() {
        let resources = valid();
        assert!((resources.cpu_cores() - 1.5).abs() < f64::EPSILON);
        assert!((resources.memory_gb() - 4.0).abs() < f64::EPSILON);
    }
}
