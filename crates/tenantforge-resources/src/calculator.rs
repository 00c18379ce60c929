//! The resource calculation itself.
//!
//! `base + linear(customers) → × feature multipliers → round → clamp`.
//! Deterministic, no side effects, no I/O.

use tenantforge_core::{FeatureFlags, PlanType};

use crate::requirements::{
    ResourceError, ResourceRequirements, Result, CPU_STEP_MILLICORES, MAX_CONCURRENT_REQUESTS,
    MAX_CONNECTIONS, MAX_CPU_MILLICORES, MAX_MEMORY_MB, MAX_STORAGE_GB, MEMORY_STEP_MB,
    MIN_CONCURRENT_REQUESTS, MIN_CONNECTIONS, MIN_CPU_MILLICORES, MIN_MEMORY_MB, MIN_STORAGE_GB,
};

/// Largest supported customer-count estimate.
pub const MAX_CUSTOMER_COUNT: u32 = 50_000;

/// Per-plan starting budget before scaling.
struct PlanBase {
    cpu_millicores: u32,
    memory_mb: u32,
    storage_gb: u32,
    max_connections: u32,
    max_concurrent_requests: u32,
}

const fn base_for_plan(plan: PlanType) -> PlanBase {
    match plan {
        PlanType::Standard => PlanBase {
            cpu_millicores: 1_000,
            memory_mb: 2_048,
            storage_gb: 20,
            max_connections: 100,
            max_concurrent_requests: 50,
        },
        PlanType::Premium => PlanBase {
            cpu_millicores: 2_000,
            memory_mb: 4_096,
            storage_gb: 50,
            max_connections: 250,
            max_concurrent_requests: 100,
        },
        PlanType::Enterprise => PlanBase {
            cpu_millicores: 4_000,
            memory_mb: 8_192,
            storage_gb: 100,
            max_connections: 500,
            max_concurrent_requests: 200,
        },
    }
}

/// Compounding multipliers applied to CPU, memory, and storage for each
/// enabled feature. Features not listed here cost no extra capacity.
fn feature_multiplier(features: &FeatureFlags) -> f64 {
    let table = [
        (features.analytics_dashboard, 1.20),
        (features.api_webhooks, 1.10),
        (features.bulk_operations, 1.15),
        (features.advanced_reporting, 1.25),
        (features.multi_language, 1.05),
    ];

    table
        .into_iter()
        .filter_map(|(on, m)| on.then_some(m))
        .product()
}

/// Compute the optimal resource budget for a tenant.
///
/// Starts from the plan's base table, adds linear scaling terms keyed to the
/// customer count (+0.2 core per 1000 customers, +0.5 GB per 500 customers,
/// +2 GB storage per 1000 customers, +0.05 connections per customer,
/// +2 concurrent requests per 100 customers), applies the compounding
/// feature multipliers to CPU/memory/storage, rounds CPU to the nearest
/// 0.1 core, memory up to the next 0.5 GB, storage up to the next whole GB,
/// and clamps every dimension to its absolute limits.
///
/// # Errors
///
/// Returns [`ResourceError::InvalidCustomerCount`] when the estimate is
/// zero or above [`MAX_CUSTOMER_COUNT`].
pub fn calculate_optimal_resources(
    customer_count: u32,
    plan: PlanType,
    features: &FeatureFlags,
) -> Result<ResourceRequirements> {
    if customer_count == 0 || customer_count > MAX_CUSTOMER_COUNT {
        return Err(ResourceError::InvalidCustomerCount(customer_count));
    }

    let base = base_for_plan(plan);

    // Linear scaling terms, in integer interior units.
    let cpu = u64::from(base.cpu_millicores) + u64::from(customer_count) * 200 / 1_000;
    let memory = u64::from(base.memory_mb) + u64::from(customer_count) * 512 / 500;
    let storage = u64::from(base.storage_gb) + u64::from(customer_count) * 2 / 1_000;
    let connections = u64::from(base.max_connections) + u64::from(customer_count) * 5 / 100;
    let concurrent = u64::from(base.max_concurrent_requests) + u64::from(customer_count) * 2 / 100;

    // Compounding feature multipliers apply to the three capacity dimensions.
    let factor = feature_multiplier(features);
    #[allow(clippy::cast_precision_loss)]
    let (cpu, memory, storage) = (
        cpu as f64 * factor,
        memory as f64 * factor,
        storage as f64 * factor,
    );

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let requirements = ResourceRequirements {
        cpu_millicores: clamp_u32(
            round_to_step(cpu, CPU_STEP_MILLICORES),
            MIN_CPU_MILLICORES,
            MAX_CPU_MILLICORES,
        ),
        memory_mb: clamp_u32(
            round_up_to_step(memory, MEMORY_STEP_MB),
            MIN_MEMORY_MB,
            MAX_MEMORY_MB,
        ),
        storage_gb: clamp_u32(storage.ceil() as u64, MIN_STORAGE_GB, MAX_STORAGE_GB),
        max_connections: clamp_u32(connections, MIN_CONNECTIONS, MAX_CONNECTIONS),
        max_concurrent_requests: clamp_u32(concurrent, MIN_CONCURRENT_REQUESTS, MAX_CONCURRENT_REQUESTS),
    };

    Ok(requirements)
}

/// Round to the nearest multiple of `step`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_to_step(value: f64, step: u32) -> u64 {
    let step = f64::from(step);
    ((value / step).round() * step) as u64
}

/// Round up to the next multiple of `step`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_up_to_step(value: f64, step: u32) -> u64 {
    let step = f64::from(step);
    ((value / step).ceil() * step) as u64
}

#[allow(clippy::cast_possible_truncation)]
fn clamp_u32(value: u64, min: u32, max: u32) -> u32 {
    value.clamp(u64::from(min), u64::from(max)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirements::validate_resource_limits;

    #[test]
    fn rejects_out_of_range_customer_counts() {
        let features = FeatureFlags::default();
        assert!(matches!(
            calculate_optimal_resources(0, PlanType::Standard, &features),
            Err(ResourceError::InvalidCustomerCount(0))
        ));
        assert!(matches!(
            calculate_optimal_resources(50_001, PlanType::Standard, &features),
            Err(ResourceError::InvalidCustomerCount(50_001))
        ));
    }

    #[test]
    fn small_standard_tenant_stays_near_base_budget() {
        let features = FeatureFlags::defaults_for_plan(PlanType::Standard);
        let r = calculate_optimal_resources(10, PlanType::Standard, &features).unwrap();

        // CPU rounds to the nearest step, memory up to the next one.
        assert_eq!(r.cpu_millicores, 1_000);
        assert_eq!(r.memory_mb, 2_560);
        assert_eq!(r.storage_gb, 20);
        assert_eq!(r.max_connections, 100);
        assert_eq!(r.max_concurrent_requests, 50);
    }

    #[test]
    fn customer_scaling_grows_every_dimension() {
        let features = FeatureFlags::default();
        let small = calculate_optimal_resources(100, PlanType::Premium, &features).unwrap();
        let large = calculate_optimal_resources(20_000, PlanType::Premium, &features).unwrap();

        assert!(large.cpu_millicores > small.cpu_millicores);
        assert!(large.memory_mb > small.memory_mb);
        assert!(large.storage_gb > small.storage_gb);
        assert!(large.max_connections > small.max_connections);
        assert!(large.max_concurrent_requests > small.max_concurrent_requests);
    }

    #[test]
    fn feature_multipliers_compound() {
        let none = FeatureFlags::default();
        let mut analytics = none;
        analytics.analytics_dashboard = true;
        let mut both = analytics;
        both.advanced_reporting = true;

        let base = calculate_optimal_resources(1_000, PlanType::Premium, &none).unwrap();
        let one = calculate_optimal_resources(1_000, PlanType::Premium, &analytics).unwrap();
        let two = calculate_optimal_resources(1_000, PlanType::Premium, &both).unwrap();

        assert!(one.cpu_millicores > base.cpu_millicores);
        assert!(two.cpu_millicores > one.cpu_millicores);
        assert!(two.memory_mb > one.memory_mb);

        // Non-capacity dimensions are unaffected by feature multipliers.
        assert_eq!(base.max_connections, two.max_connections);
        assert_eq!(base.max_concurrent_requests, two.max_concurrent_requests);
    }

    #[test]
    fn output_always_within_limits_and_on_step() {
        // The full plan/count grid: the output must satisfy its own validator
        // and sit on the allocation steps at every point.
        let counts = [1, 50, 100, 499, 500, 1_000, 4_999, 10_000, 25_000, 50_000];
        let plans = [PlanType::Standard, PlanType::Premium, PlanType::Enterprise];

        for plan in plans {
            // Worst case: every multiplier-bearing feature enabled.
            let features = FeatureFlags::defaults_for_plan(PlanType::Enterprise);
            for count in counts {
                let r = calculate_optimal_resources(count, plan, &features).unwrap();
                validate_resource_limits(&r).unwrap();
                assert_eq!(r.cpu_millicores % 100, 0, "cpu step at count={count}");
                assert_eq!(r.memory_mb % 512, 0, "memory step at count={count}");
            }
        }
    }

    #[test]
    fn ceilings_hold_at_maximum_load() {
        let features = FeatureFlags::defaults_for_plan(PlanType::Enterprise);
        let r = calculate_optimal_resources(50_000, PlanType::Enterprise, &features).unwrap();

        assert!(r.cpu_millicores <= 16_000);
        assert!(r.memory_mb <= 65_536);
        assert!(r.storage_gb <= 500);
        assert!(r.max_connections <= 2_000);
        assert!(r.max_concurrent_requests <= 1_000);
    }

    #[test]
    fn calculation_is_deterministic() {
        let features = FeatureFlags::defaults_for_plan(PlanType::Premium);
        let a = calculate_optimal_resources(777, PlanType::Premium, &features).unwrap();
        let b = calculate_optimal_resources(777, PlanType::Premium, &features).unwrap();
        assert_eq!(a, b);
    }
}
