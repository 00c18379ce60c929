//! Resource budget calculation for tenant container stacks.
//!
//! This crate turns a customer-count estimate, a plan tier, and the enabled
//! feature set into a concrete CPU/memory/storage/connection budget. The
//! calculation is a pure function: a per-plan base table, linear scaling
//! terms keyed to the customer count, compounding per-feature multipliers,
//! step rounding, and hard ceilings.
//!
//! # Example
//!
//! ```
//! use tenantforge_core::{FeatureFlags, PlanType};
//! use tenantforge_resources::calculate_optimal_resources;
//!
//! let features = FeatureFlags::defaults_for_plan(PlanType::Premium);
//! let resources = calculate_optimal_resources(500, PlanType::Premium, &features).unwrap();
//!
//! // CPU is always allocated in 0.1-core steps.
//! assert_eq!(resources.cpu_millicores % 100, 0);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod calculator;
pub mod plan;
pub mod requirements;

pub use calculator::calculate_optimal_resources;
pub use plan::{estimate_cost, recommend_plan_type, CostEstimate};
pub use requirements::{validate_resource_limits, ResourceError, ResourceRequirements, Result};
