//! Lifecycle domain: images, image-domain mappings, domain versions and promotion

pub mod api;
pub mod domain;
pub mod operations;
pub mod repository;

// Re-export domain types at the crate root for convenience
pub use domain::entities::{Domain, Environment, Image, ImageDomain};
pub use domain::snapshot::{DomainHistory, ImageList, ImageSnapshot};
pub use domain::state::{
    DeploymentEvent, DeploymentState, DeploymentStateMachine, DomainVersionState, StateError,
};

// Re-export repository types
pub use repository::{
    DomainRepository, ImageDomainRepository, ImageRepository, LifecycleRepositories,
};

// Re-export engine types
pub use operations::{
    DomainActivation, DomainDeleted, DomainImagesUpdate, DomainPromotion, DomainTested,
    DomainVersionDeleted, ImageDeleted, ImageRef, LifecycleStore,
};

// Re-export API types
pub use api::routes;
pub use api::LifecycleState;
