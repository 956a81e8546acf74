//! Lifecycle operations
//!
//! [`LifecycleStore`] is the single entry point for every image and domain
//! operation. Each mutating call opens its own transaction, runs to
//! completion and commits; any error drops the transaction and rolls back.

mod domains;
mod images;
pub(crate) mod propagate;

use serde::{Deserialize, Serialize};
use validator::Validate;
use vermgr_common::{Result, Store};

use crate::domain::entities::{Domain, Environment, Image, ImageDomain};
use crate::domain::validation::{validate_domain_version, validate_name, validate_version};
use crate::repository::LifecycleRepositories;

/// Explicitly constructed handle to the lifecycle engine
#[derive(Clone)]
pub struct LifecycleStore {
    repos: LifecycleRepositories,
}

impl LifecycleStore {
    pub fn new(store: Store) -> Self {
        Self {
            repos: LifecycleRepositories::new(store),
        }
    }

    // ------------------------------------------------------------------
    // Image reads
    // ------------------------------------------------------------------

    /// Every registered image name with its domain assignment
    pub async fn list_image_names(&self) -> Result<Vec<ImageDomain>> {
        self.repos.image_domains.list().await
    }

    /// Every image version
    pub async fn list_image_versions(&self) -> Result<Vec<Image>> {
        self.repos.images.list().await
    }

    pub async fn list_tested_images(&self, tested: bool) -> Result<Vec<Image>> {
        self.repos.images.list_by_tested(tested).await
    }

    /// All versions of one image name
    pub async fn get_image(&self, name: &str) -> Result<Vec<Image>> {
        self.repos.images.list_by_name(name).await
    }

    pub async fn get_tested_image(&self, name: &str, tested: bool) -> Result<Vec<Image>> {
        self.repos.images.list_by_name_and_tested(name, tested).await
    }

    pub async fn get_image_domain(&self, name: &str) -> Result<Option<ImageDomain>> {
        self.repos.image_domains.find(name).await
    }

    // ------------------------------------------------------------------
    // Domain reads
    // ------------------------------------------------------------------

    /// Every domain version
    pub async fn list_domains(&self) -> Result<Vec<Domain>> {
        self.repos.domains.list().await
    }

    /// Active domain versions, optionally restricted to one environment
    pub async fn list_active_domains(&self, deployed: Option<Environment>) -> Result<Vec<Domain>> {
        self.repos.domains.list_active(deployed).await
    }

    /// All versions of one domain
    pub async fn get_domain(&self, name: &str) -> Result<Vec<Domain>> {
        self.repos.domains.list_by_name(name).await
    }

    pub async fn get_active_domain(
        &self,
        name: &str,
        deployed: Option<Environment>,
    ) -> Result<Vec<Domain>> {
        self.repos.domains.list_active_by_name(name, deployed).await
    }

    pub async fn find_domain(&self, name: &str, version: &str) -> Result<Option<Domain>> {
        self.repos.domains.find(name, version).await
    }
}

// ============================================================================
// Operation inputs
// ============================================================================

/// Reference to one image version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ImageRef {
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    #[validate(custom(function = "validate_version"))]
    pub version: String,
}

impl ImageRef {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Image references to merge into one domain version
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DomainImagesUpdate {
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    #[validate(custom(function = "validate_domain_version"))]
    pub version: String,
    #[validate(nested)]
    pub images: Vec<ImageRef>,
}

/// Tested flag for one domain version
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DomainTested {
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    #[validate(custom(function = "validate_domain_version"))]
    pub version: String,
    pub tested: bool,
}

/// Domain version to make active in its current environment
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DomainActivation {
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    #[validate(custom(function = "validate_domain_version"))]
    pub version: String,
}

/// Domain version to move one environment forward
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DomainPromotion {
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    #[validate(custom(function = "validate_domain_version"))]
    pub version: String,
}

// ============================================================================
// Operation results
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDeleted {
    pub deleted: bool,
    pub name: String,
    pub versions_removed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainVersionDeleted {
    pub deleted: bool,
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainDeleted {
    pub deleted: bool,
    pub name: String,
    pub versions_removed: u64,
}
