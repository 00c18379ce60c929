//! The tenant container-provisioning orchestrator.
//!
//! This crate sequences validation, resource calculation, infrastructure
//! provisioning, workload deployment, service configuration, and health
//! validation into one six-phase pipeline with transactional semantics:
//! any phase failure rolls back everything the earlier phases created.
//!
//! The public entry point is
//! [`ContainerProvisioner::provision_isp_container`], which always returns a
//! [`ProvisioningResult`] for expected failures — provisioning failure is
//! reported via `result.success`, not an error. Only constructing a
//! malformed [`ProvisioningRequest`] returns `Err`.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tenantforge_core::{IspConfig, PlaintextCipher, PlanType, TenantId};
//! use tenantforge_health::{HealthConfig, HealthValidator};
//! use tenantforge_infra::{ComposeAdapter, ComposeConfig};
//! use tenantforge_provisioner::{
//!     ContainerProvisioner, ProvisionerConfig, ProvisioningRequest,
//! };
//! use tenantforge_template::TemplateManager;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let adapter = Arc::new(ComposeAdapter::new(
//!     ComposeConfig::from_env(),
//!     Arc::new(PlaintextCipher),
//! ));
//! let provisioner = ContainerProvisioner::new(
//!     adapter,
//!     HealthValidator::new(HealthConfig::default())?,
//!     TemplateManager::new(),
//!     ProvisionerConfig::default(),
//! );
//!
//! let tenant = TenantId::new("acme-isp")?;
//! let config = IspConfig::new(tenant.clone(), "Acme ISP", PlanType::Premium);
//! let request = ProvisioningRequest::new(tenant, 500, config)?;
//!
//! let result = provisioner.provision_isp_container(request).await;
//! println!("success: {}, status: {:?}", result.success, result.status);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod orchestrator;
pub mod registry;
pub mod state;
pub mod types;
pub mod validator;

pub use error::{ProvisioningError, ProvisioningStage};
pub use orchestrator::{ContainerProvisioner, ProvisionerConfig};
pub use registry::{ActiveOperations, OperationSnapshot};
pub use state::ProvisioningStatus;
pub use types::{ProvisioningRequest, ProvisioningResult, RequestError};
pub use validator::ProvisioningValidator;
