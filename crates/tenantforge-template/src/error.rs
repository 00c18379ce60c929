//! Error types for template rendering.

use tenantforge_core::InfrastructureKind;
use thiserror::Error;

/// A specialized Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Errors that can occur while rendering a deployment template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// No template is registered under the requested name and kind.
    #[error("unknown template {name:?} for {kind}")]
    UnknownTemplate {
        /// Requested template name.
        name: String,
        /// Requested infrastructure kind.
        kind: InfrastructureKind,
    },

    /// One or more required variables were not supplied. Every missing
    /// variable is listed; nothing is substituted silently.
    #[error("template {template:?} is missing required variables: {}", missing.join(", "))]
    MissingVariables {
        /// The template that was being rendered.
        template: String,
        /// Every required variable absent from the supplied map.
        missing: Vec<String>,
    },

    /// A template was registered with an empty name.
    #[error("template name must not be empty")]
    EmptyName,
}
