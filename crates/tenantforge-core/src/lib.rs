//! Core types and tenant configuration model for tenantforge.
//!
//! This crate provides the foundational types used throughout the tenantforge
//! provisioning platform:
//!
//! - **Identifiers**: Strongly-typed tenant and request IDs
//! - **Configuration**: The per-tenant configuration model consumed by the
//!   provisioning pipeline (`IspConfig` and its sub-structures)
//! - **Secrets boundary**: The [`SecretCipher`] trait behind which the
//!   external secrets manager lives
//!
//! # Example
//!
//! ```
//! use tenantforge_core::{IspConfig, PlanType, TenantId};
//!
//! let tenant = TenantId::new("acme-isp").unwrap();
//! let config = IspConfig::new(tenant, "Acme ISP", PlanType::Premium);
//!
//! // Feature flags are derived from the plan unless the caller overrides them.
//! assert!(config.feature_flags.analytics_dashboard);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod ids;
pub mod naming;
pub mod secrets;

pub use config::{
    BrandingConfig, DatabaseConfig, DatabaseSizeTier, FeatureFlags, InfrastructureKind, IspConfig,
    NetworkConfig, PlanType,
};
pub use ids::{IdError, RequestId, TenantId};
pub use secrets::{CipherError, PlaintextCipher, SecretCipher};
