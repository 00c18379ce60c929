//! Infrastructure adapters for tenant container stacks.
//!
//! This crate provides the [`InfrastructureAdapter`] trait consumed by the
//! provisioning orchestrator, with two implementations:
//!
//! - [`KubernetesAdapter`]: namespace-isolated stacks on a Kubernetes
//!   cluster, driven through the API server
//! - [`ComposeAdapter`]: network-isolated stacks on a single host, driven
//!   through the Docker Compose CLI
//!
//! Both implementations record every resource they create in an ordered
//! rollback ledger ([`DeploymentArtifacts::created_resources`]) so a later
//! [`InfrastructureAdapter::rollback_deployment`] call can tear the stack
//! down in reverse dependency order, tolerating resources that are already
//! gone.
//!
//! # Testing
//!
//! For testing without real infrastructure, enable the `test-utils` feature
//! and use the `MockAdapter`, which records the same artifact trail in
//! memory and supports per-phase failure injection.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod adapter;
pub mod compose;
pub mod error;
pub mod kubernetes;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use adapter::InfrastructureAdapter;
pub use compose::{ComposeAdapter, ComposeConfig};
pub use error::{DeployPhase, InfraError, Result};
pub use kubernetes::{KubernetesAdapter, KubernetesConfig};
pub use types::{CreatedResource, DeploymentArtifacts, MonitoringOutcome, SslOutcome};

#[cfg(any(test, feature = "test-utils"))]
pub use mock::{MockAdapter, MockFailure};
