//! API layer for the Lifecycle domain
//!
//! Contains HTTP handlers, routes, and domain state definition.

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use middleware::LifecycleState;
pub use routes::routes;
