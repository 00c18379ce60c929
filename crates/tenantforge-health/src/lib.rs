//! HTTP health validation for deployed tenant stacks.
//!
//! The validator probes a fixed set of endpoints on a deployed instance
//! (`/health/live`, `/health/database`, `/health/cache`, `/health/ssl`)
//! plus any caller-supplied custom paths, and aggregates the results into
//! one [`ContainerHealth`] verdict. Probes are independent: every failing
//! subsystem is reported, never just the first.
//!
//! The split between critical and informational checks is intentional: API
//! liveness and database health decide the overall verdict, while cache and
//! SSL failures degrade detail only — a missing cache layer should not
//! block a tenant from going live.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod types;
pub mod validator;

pub use error::{HealthError, Result};
pub use types::{ContainerHealth, CustomCheck, HealthStatus};
pub use validator::{HealthConfig, HealthValidator};
