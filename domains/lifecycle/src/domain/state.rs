//! Deployment state machine for domain versions
//!
//! A domain version carries three pieces of lifecycle state: the environment it
//! is deployed to, whether it is the active version there, and whether it has
//! been tested. Every write path that changes them goes through
//! [`DeploymentStateMachine::transition`].
//!
//! ```text
//!   create ──► dev ──promote──► staging ──promote──► prod ──promote──┐
//!                                                     ▲              │
//!                                                     └──────────────┘
//! ```
//!
//! Environments only ever move forward. Promotion to staging clears `tested`
//! (the version must be re-validated); promotion into or within prod forces
//! `tested`. Promotion always makes the version active in its new environment.

pub use vermgr_common::StateError;

// ============================================================================
// Deployment State
// ============================================================================

/// Environment a domain version is deployed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeploymentState {
    Dev,
    Staging,
    Prod,
}

impl DeploymentState {
    /// Environment a promotion from this state lands in
    pub fn promotion_target(&self) -> DeploymentState {
        match self {
            Self::Dev => Self::Staging,
            Self::Staging | Self::Prod => Self::Prod,
        }
    }

    /// Whether versions landing in this environment count as tested
    pub fn tested_on_arrival(&self) -> bool {
        matches!(self, Self::Prod)
    }
}

impl std::fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dev => write!(f, "dev"),
            Self::Staging => write!(f, "staging"),
            Self::Prod => write!(f, "prod"),
        }
    }
}

/// Full lifecycle state of one domain version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainVersionState {
    pub deployed: DeploymentState,
    pub active: bool,
    pub tested: bool,
}

/// Events that change a domain version's lifecycle state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeploymentEvent {
    /// Move one environment forward (prod stays prod)
    Promote,
    /// Become the active version in the current environment
    Activate,
    /// Stop being the active version in the current environment
    Deactivate,
    /// Record a test result
    MarkTested(bool),
}

impl std::fmt::Display for DeploymentEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Promote => write!(f, "promote"),
            Self::Activate => write!(f, "activate"),
            Self::Deactivate => write!(f, "deactivate"),
            Self::MarkTested(tested) => write!(f, "mark_tested({tested})"),
        }
    }
}

// ============================================================================
// Deployment State Machine
// ============================================================================

/// Deployment state machine
pub struct DeploymentStateMachine;

impl DeploymentStateMachine {
    /// State of a freshly created domain version: dev, active, untested
    pub fn initial() -> DomainVersionState {
        DomainVersionState {
            deployed: DeploymentState::Dev,
            active: true,
            tested: false,
        }
    }

    /// Apply an event to a domain version's state
    pub fn transition(
        current: DomainVersionState,
        event: DeploymentEvent,
    ) -> Result<DomainVersionState, StateError> {
        let next = match event {
            DeploymentEvent::Promote => {
                let target = current.deployed.promotion_target();
                Self::ensure_forward(current.deployed, target)?;
                DomainVersionState {
                    deployed: target,
                    active: true,
                    tested: target.tested_on_arrival(),
                }
            }
            DeploymentEvent::Activate => DomainVersionState {
                active: true,
                ..current
            },
            DeploymentEvent::Deactivate => DomainVersionState {
                active: false,
                ..current
            },
            DeploymentEvent::MarkTested(tested) => DomainVersionState { tested, ..current },
        };

        Ok(next)
    }

    /// Reject any move to an earlier environment
    pub fn ensure_forward(from: DeploymentState, to: DeploymentState) -> Result<(), StateError> {
        if to < from {
            return Err(StateError::Backward {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
