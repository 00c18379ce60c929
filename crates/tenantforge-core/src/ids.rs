//! Core identifier types for tenantforge.
//!
//! This module provides strongly-typed identifiers for tenants and
//! provisioning requests. Tenant IDs are caller-supplied slugs validated at
//! construction time; request IDs are generated per provisioning call.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Minimum length of a tenant identifier.
pub const TENANT_ID_MIN_LEN: usize = 3;

/// Maximum length of a tenant identifier.
pub const TENANT_ID_MAX_LEN: usize = 50;

/// Errors produced when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The identifier is shorter or longer than allowed.
    #[error("tenant id must be {TENANT_ID_MIN_LEN}-{TENANT_ID_MAX_LEN} characters, got {0}")]
    InvalidLength(usize),

    /// The identifier contains a character outside `[a-zA-Z0-9-]`.
    #[error("tenant id contains invalid character {0:?}")]
    InvalidCharacter(char),

    /// The identifier starts or ends with a hyphen.
    #[error("tenant id must start and end with an alphanumeric character")]
    InvalidBoundary,

    /// The request id is not a valid UUID.
    #[error("invalid request id: {0}")]
    InvalidRequestId(String),
}

/// A validated tenant identifier (slug).
///
/// Tenant IDs are caller-supplied keys: 3-50 characters, alphanumeric with
/// interior hyphens, starting and ending with an alphanumeric character.
/// Global uniqueness is enforced by an upstream collaborator, not here.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    /// Create a new `TenantId` from a string slug.
    ///
    /// # Errors
    ///
    /// Returns an [`IdError`] if the slug violates the length or character
    /// constraints.
    pub fn new(s: impl Into<String>) -> Result<Self, IdError> {
        let s = s.into();

        if s.len() < TENANT_ID_MIN_LEN || s.len() > TENANT_ID_MAX_LEN {
            return Err(IdError::InvalidLength(s.len()));
        }

        if let Some(c) = s.chars().find(|c| !c.is_ascii_alphanumeric() && *c != '-') {
            return Err(IdError::InvalidCharacter(c));
        }

        let starts_ok = s.chars().next().is_some_and(|c| c.is_ascii_alphanumeric());
        let ends_ok = s.chars().last().is_some_and(|c| c.is_ascii_alphanumeric());
        if !starts_ok || !ends_ok {
            return Err(IdError::InvalidBoundary);
        }

        Ok(Self(s))
    }

    /// Return the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TenantId({})", self.0)
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for TenantId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for TenantId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<TenantId> for String {
    fn from(id: TenantId) -> Self {
        id.0
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A unique identifier for one provisioning request.
///
/// Generated once per provisioning call; never reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generate a new random request ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a request ID from its string form.
    ///
    /// # Errors
    ///
    /// Returns an [`IdError`] if the string is not a valid UUID.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| IdError::InvalidRequestId(s.to_string()))
    }
}

impl fmt::Debug for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestId({})", self.0)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
