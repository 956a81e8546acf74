//! Common state machine error types
//!
//! Used by the deployment state machine and by anything that needs to
//! reject a lifecycle transition before touching the store.

use thiserror::Error;

/// Errors that can occur during state transitions
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    #[error("Backward transition: cannot move from {from} back to {to}")]
    Backward { from: String, to: String },
}

impl From<StateError> for crate::Error {
    fn from(err: StateError) -> Self {
        crate::Error::Validation(err.to_string())
    }
}
