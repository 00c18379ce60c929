//! Plan recommendation and cost estimation.
//!
//! Both functions are advisory: nothing in the pipeline enforces their
//! output. Recommendation escalates by customer count and by the minimum
//! plan each requested feature ships in; cost multiplies the allocated
//! budget by fixed hourly unit rates.

use serde::{Deserialize, Serialize};
use tenantforge_core::{FeatureFlags, PlanType};

use crate::requirements::ResourceRequirements;

/// Customer-count threshold above which Standard is no longer recommended.
const STANDARD_MAX_CUSTOMERS: u32 = 100;
/// Customer-count threshold above which Premium is no longer recommended.
const PREMIUM_MAX_CUSTOMERS: u32 = 1_000;

/// Hourly rate per allocated CPU core, USD.
const CPU_CORE_HOURLY_USD: f64 = 0.032;
/// Hourly rate per allocated GB of memory, USD.
const MEMORY_GB_HOURLY_USD: f64 = 0.004;
/// Hourly rate per provisioned GB of storage, USD.
const STORAGE_GB_HOURLY_USD: f64 = 0.000_15;
/// Billing hours per month.
const HOURS_PER_MONTH: f64 = 730.0;

/// Recommend the minimum plan tier for a tenant.
///
/// Thresholds at 100 and 1000 customers escalate
/// standard → premium → enterprise; each requested feature carries a fixed
/// minimum plan that can force escalation regardless of customer count.
/// Monotonic in `customer_count`: a larger estimate never yields a lower
/// tier.
#[must_use]
pub fn recommend_plan_type(customer_count: u32, required_features: &FeatureFlags) -> PlanType {
    let by_count = if customer_count <= STANDARD_MAX_CUSTOMERS {
        PlanType::Standard
    } else if customer_count <= PREMIUM_MAX_CUSTOMERS {
        PlanType::Premium
    } else {
        PlanType::Enterprise
    };

    by_count.max(minimum_plan_for_features(required_features))
}

/// The minimum plan tier that ships every requested feature.
fn minimum_plan_for_features(features: &FeatureFlags) -> PlanType {
    let table = [
        (features.analytics_dashboard, PlanType::Premium),
        (features.api_webhooks, PlanType::Premium),
        (features.bulk_operations, PlanType::Premium),
        (features.multi_language, PlanType::Premium),
        (features.custom_branding, PlanType::Premium),
        (features.advanced_reporting, PlanType::Enterprise),
        (features.dedicated_database, PlanType::Enterprise),
        (features.priority_support, PlanType::Enterprise),
    ];

    table
        .into_iter()
        .filter_map(|(on, plan)| on.then_some(plan))
        .max()
        .unwrap_or(PlanType::Standard)
}

/// An informational cost estimate for an allocated budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    /// Estimated hourly infrastructure cost, USD.
    pub hourly_usd: f64,
    /// Estimated monthly infrastructure cost, USD.
    pub monthly_usd: f64,
}

/// Estimate the infrastructure cost of a budget.
///
/// Purely informational; no invariant is enforced against the result.
#[must_use]
pub fn estimate_cost(resources: &ResourceRequirements) -> CostEstimate {
    let hourly = resources.cpu_cores() * CPU_CORE_HOURLY_USD
        + resources.memory_gb() * MEMORY_GB_HOURLY_USD
        + f64::from(resources.storage_gb) * STORAGE_GB_HOURLY_USD;

    CostEstimate {
        hourly_usd: hourly,
        monthly_usd: hourly * HOURS_PER_MONTH,
    }
}
