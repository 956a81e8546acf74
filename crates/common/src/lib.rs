//! Shared utilities, configuration, and error handling for the version manager
//!
//! This crate provides common functionality used across the workspace:
//! - Configuration management following 12-factor principles
//! - Error types and handling
//! - Store connection and schema bootstrap
//! - Request body extractors

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod state;

pub use db::Store;
pub use error::{Error, Result};
pub use extractors::{OneOrMany, ValidatedBatch, ValidatedJson, ValidatedPath};
pub use state::StateError;
