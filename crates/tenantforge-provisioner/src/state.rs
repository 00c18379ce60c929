//! Provisioning status state machine.
//!
//! States move strictly forward; the only branch is the rollback path taken
//! from `Failed` when rollback is enabled.
//!
//! # State Machine
//!
//! ```text
//! Pending -> Provisioning -> Deploying -> Configuring -> Validating -> Ready
//!    |            |              |             |              |
//!    +------------+--------------+-------------+--------------+--> Failed
//!                                                                    |
//!                                                             RollingBack
//!                                                                    |
//!                                                              RolledBack
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle states of one provisioning operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningStatus {
    /// Request accepted; validation and resource calculation in progress.
    #[default]
    Pending,
    /// Isolation, storage, and configuration primitives being created.
    Provisioning,
    /// Workload submitted; waiting for the platform to run it.
    Deploying,
    /// Networking, SSL, and monitoring configuration in progress.
    Configuring,
    /// Health validation in progress.
    Validating,
    /// Stack is up, healthy, and reachable. Terminal.
    Ready,
    /// A phase failed.
    Failed,
    /// Rollback of created resources in progress.
    RollingBack,
    /// Rollback finished (fully or partially). Terminal.
    RolledBack,
}

impl fmt::Display for ProvisioningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Provisioning => "provisioning",
            Self::Deploying => "deploying",
            Self::Configuring => "configuring",
            Self::Validating => "validating",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::RollingBack => "rolling_back",
            Self::RolledBack => "rolled_back",
        };
        write!(f, "{s}")
    }
}

/// Check if a status transition is valid according to the state machine.
#[must_use]
pub const fn is_valid_transition(from: ProvisioningStatus, to: ProvisioningStatus) -> bool {
    use ProvisioningStatus::{
        Configuring, Deploying, Failed, Pending, Provisioning, Ready, RolledBack, RollingBack,
        Validating,
    };

    matches!(
        (from, to),
        // The forward-moving happy path.
        (Pending, Provisioning)
            | (Provisioning, Deploying)
            | (Deploying, Configuring)
            | (Configuring, Validating)
            | (Validating, Ready)
            // Any non-terminal state can fail.
            | (Pending | Provisioning | Deploying | Configuring | Validating, Failed)
            // The rollback branch.
            | (Failed, RollingBack)
            | (RollingBack, RolledBack)
    )
}

/// Returns true if the status is terminal.
///
/// `Failed` is terminal when rollback is disabled; with rollback enabled
/// the operation continues through `RollingBack` to `RolledBack`.
#[must_use]
pub const fn is_terminal(status: ProvisioningStatus) -> bool {
    matches!(
        status,
        ProvisioningStatus::Ready | ProvisioningStatus::Failed | ProvisioningStatus::RolledBack
    )
}

/// Returns the list of valid target states from the given state.
#[must_use]
pub fn valid_transitions_from(status: ProvisioningStatus) -> Vec<ProvisioningStatus> {
    use ProvisioningStatus::{
        Configuring, Deploying, Failed, Pending, Provisioning, Ready, RolledBack, RollingBack,
        Validating,
    };

    match status {
        Pending => vec![Provisioning, Failed],
        Provisioning => vec![Deploying, Failed],
        Deploying => vec![Configuring, Failed],
        Configuring => vec![Validating, Failed],
        Validating => vec![Ready, Failed],
        Failed => vec![RollingBack],
        RollingBack => vec![RolledBack],
        Ready | RolledBack => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ProvisioningStatus::*;

    #[test]
    fn happy_path_is_valid() {
        assert!(is_valid_transition(Pending, Provisioning));
        assert!(is_valid_transition(Provisioning, Deploying));
        assert!(is_valid_transition(Deploying, Configuring));
        assert!(is_valid_transition(Configuring, Validating));
        assert!(is_valid_transition(Validating, Ready));
    }

    #[test]
    fn every_active_state_can_fail() {
        for state in [Pending, Provisioning, Deploying, Configuring, Validating] {
            assert!(is_valid_transition(state, Failed), "{state} -> Failed");
        }
    }

    #[test]
    fn rollback_branch() {
        assert!(is_valid_transition(Failed, RollingBack));
        assert!(is_valid_transition(RollingBack, RolledBack));
    }

    #[test]
    fn no_cycles_or_skips() {
        // No going backwards.
        assert!(!is_valid_transition(Deploying, Provisioning));
        assert!(!is_valid_transition(Ready, Pending));
        // No skipping phases.
        assert!(!is_valid_transition(Pending, Deploying));
        assert!(!is_valid_transition(Provisioning, Validating));
        // Terminal states go nowhere.
        assert!(!is_valid_transition(Ready, Failed));
        assert!(!is_valid_transition(RolledBack, Pending));
        // Rollback only happens after failure.
        assert!(!is_valid_transition(Validating, RollingBack));
    }

    #[test]
    fn terminal_states() {
        assert!(is_terminal(Ready));
        assert!(is_terminal(Failed));
        assert!(is_terminal(RolledBack));
        assert!(!is_terminal(Pending));
        assert!(!is_terminal(RollingBack));
    }

    #[test]
    fn transitions_from_listing_matches_validator() {
        for from in [
            Pending,
            Provisioning,
            Deploying,
            Configuring,
            Validating,
            Ready,
            Failed,
            RollingBack,
            RolledBack,
        ] {
            for to in valid_transitions_from(from) {
                assert!(is_valid_transition(from, to), "{from} -> {to}");
            }
        }
    }
}
