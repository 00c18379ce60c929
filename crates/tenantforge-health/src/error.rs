//! Error types for health validation.

use thiserror::Error;

/// A specialized Result type for health operations.
pub type Result<T> = std::result::Result<T, HealthError>;

/// Errors that can occur during health validation.
#[derive(Debug, Error)]
pub enum HealthError {
    /// The health wait exceeded its time budget.
    #[error(
        "container {container_id} did not become healthy within {waited_secs}s ({attempts} attempts)"
    )]
    Timeout {
        /// The container that was being validated.
        container_id: String,
        /// The exhausted time budget in seconds.
        waited_secs: u64,
        /// How many validation attempts were made.
        attempts: u32,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl HealthError {
    /// Returns true if this error might be resolved by retrying.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
