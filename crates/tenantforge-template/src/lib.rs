//! Declarative deployment templates for tenant container stacks.
//!
//! Templates are nested JSON trees with `{{variable}}` placeholders in
//! string leaves. Rendering is a pure recursive walk: missing required
//! variables are collected (all of them) and reported before any
//! substitution is attempted, and rendering the same template with the same
//! variables twice yields identical output.
//!
//! Two templates ship built in, one per infrastructure kind; custom
//! templates can be registered at runtime keyed by `(name, kind)`.
//!
//! # Example
//!
//! ```
//! use tenantforge_core::{InfrastructureKind, IspConfig, PlanType, TenantId};
//! use tenantforge_resources::calculate_optimal_resources;
//! use tenantforge_template::{prepare_variables, TemplateManager, VariableContext};
//!
//! let tenant = TenantId::new("acme-isp").unwrap();
//! let config = IspConfig::new(tenant.clone(), "Acme ISP", PlanType::Premium);
//! let resources =
//!     calculate_optimal_resources(500, PlanType::Premium, &config.feature_flags).unwrap();
//!
//! let manager = TemplateManager::new();
//! let variables = prepare_variables(
//!     InfrastructureKind::Kubernetes,
//!     &VariableContext {
//!         tenant: &tenant,
//!         config: &config,
//!         resources: &resources,
//!         image: "ghcr.io/tenantforge/tenant-app:latest",
//!     },
//! );
//!
//! let rendered = manager
//!     .render(TemplateManager::DEFAULT_TEMPLATE, InfrastructureKind::Kubernetes, &variables)
//!     .unwrap();
//! assert_eq!(rendered["kind"], "Deployment");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod builtin;
pub mod error;
pub mod manager;
pub mod variables;

pub use error::{Result, TemplateError};
pub use manager::{DeploymentTemplate, TemplateManager};
pub use variables::{prepare_variables, VariableContext};
