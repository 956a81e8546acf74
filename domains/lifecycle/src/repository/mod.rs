//! Repository implementations for the lifecycle domain

pub mod domains;
pub mod image_domains;
pub mod images;
pub mod transactions;

use sqlx::{Sqlite, Transaction};
use vermgr_common::Store;

pub use domains::DomainRepository;
pub use image_domains::ImageDomainRepository;
pub use images::ImageRepository;

/// Combined repository access for the lifecycle domain
#[derive(Clone)]
pub struct LifecycleRepositories {
    store: Store,
    pub images: ImageRepository,
    pub image_domains: ImageDomainRepository,
    pub domains: DomainRepository,
}

impl LifecycleRepositories {
    pub fn new(store: Store) -> Self {
        Self {
            images: ImageRepository::new(store.pool().clone()),
            image_domains: ImageDomainRepository::new(store.pool().clone()),
            domains: DomainRepository::new(store.pool().clone()),
            store,
        }
    }

    /// Begin a new database transaction.
    pub async fn begin(&self) -> std::result::Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.store.begin().await
    }
}
