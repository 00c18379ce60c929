//! Error types for the infrastructure adapters.

use tenantforge_core::{CipherError, InfrastructureKind};
use thiserror::Error;

/// A specialized Result type for adapter operations.
pub type Result<T> = std::result::Result<T, InfraError>;

/// The sub-phase of workload deployment and service configuration in which
/// a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployPhase {
    /// Submitting the rendered workload and waiting for it to run.
    Workload,
    /// Creating the service/ingress routing.
    Networking,
    /// Attaching TLS termination.
    Ssl,
}

impl DeployPhase {
    /// Stable lowercase name used in logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Workload => "workload",
            Self::Networking => "networking",
            Self::Ssl => "ssl",
        }
    }
}

impl std::fmt::Display for DeployPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur during infrastructure operations.
#[derive(Debug, Error)]
pub enum InfraError {
    /// Kubernetes API error.
    #[error("Kubernetes API error: {0}")]
    KubeApi(#[from] kube::Error),

    /// Failure creating an isolation/storage/configuration primitive.
    #[error("{kind} provisioning failed creating {resource}: {message}")]
    Provision {
        /// Platform on which the failure occurred.
        kind: InfrastructureKind,
        /// The resource that could not be created.
        resource: String,
        /// Platform-reported failure detail.
        message: String,
    },

    /// Failure during workload deployment or service configuration.
    #[error("{kind} deployment failed during {phase}: {message}")]
    Deployment {
        /// Platform on which the failure occurred.
        kind: InfrastructureKind,
        /// The sub-phase that failed.
        phase: DeployPhase,
        /// Platform-reported failure detail.
        message: String,
    },

    /// A bounded wait elapsed before the platform reported success.
    #[error("timed out after {waited_secs}s waiting for {what}")]
    Timeout {
        /// What was being waited for.
        what: String,
        /// Seconds waited before giving up.
        waited_secs: u64,
    },

    /// The rendered template does not deserialize into the platform's
    /// workload object.
    #[error("invalid rendered template: {0}")]
    InvalidTemplate(#[from] serde_json::Error),

    /// Compose file serialization failed.
    #[error("compose file serialization failed: {0}")]
    ComposeFile(#[from] serde_yaml::Error),

    /// Filesystem or subprocess I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The secrets boundary rejected a value.
    #[error("secrets boundary error: {0}")]
    Cipher(#[from] CipherError),
}

impl InfraError {
    /// Returns true if this error might be resolved by retrying.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::KubeApi(_) | Self::Timeout { .. } | Self::Io(_))
    }
}
