//! Image-domain mapping repository

use crate::domain::entities::ImageDomain;
use sqlx::SqlitePool;
use vermgr_common::Result;

/// All columns in the image_domain table, used for SELECT clauses.
pub(crate) const IMAGE_DOMAIN_COLUMNS: &str = "image, domain, domains";

#[derive(Clone)]
pub struct ImageDomainRepository {
    pool: SqlitePool,
}

impl ImageDomainRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List every registered image name
    pub async fn list(&self) -> Result<Vec<ImageDomain>> {
        let query = format!("SELECT {IMAGE_DOMAIN_COLUMNS} FROM image_domain ORDER BY image");
        let mappings = sqlx::query_as::<_, ImageDomain>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(mappings)
    }

    /// Find the mapping for an image name
    pub async fn find(&self, image: &str) -> Result<Option<ImageDomain>> {
        let query = format!("SELECT {IMAGE_DOMAIN_COLUMNS} FROM image_domain WHERE image = ?1");
        let mapping = sqlx::query_as::<_, ImageDomain>(&query)
            .bind(image)
            .fetch_optional(&self.pool)
            .await?;

        Ok(mapping)
    }

    /// List image names currently assigned to a domain
    pub async fn list_by_domain(&self, domain: &str) -> Result<Vec<ImageDomain>> {
        let query = format!(
            "SELECT {IMAGE_DOMAIN_COLUMNS} FROM image_domain WHERE domain = ?1 ORDER BY image"
        );
        let mappings = sqlx::query_as::<_, ImageDomain>(&query)
            .bind(domain)
            .fetch_all(&self.pool)
            .await?;

        Ok(mappings)
    }
}
