//! Domain model for the lifecycle engine

pub mod entities;
pub mod snapshot;
pub mod state;
pub mod validation;
