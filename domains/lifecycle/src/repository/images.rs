//! Image repository

use crate::domain::entities::Image;
use sqlx::SqlitePool;
use vermgr_common::Result;

/// All columns in the images table, used for SELECT clauses.
pub(crate) const IMAGE_COLUMNS: &str = "name, version, domain, tested";

#[derive(Clone)]
pub struct ImageRepository {
    pool: SqlitePool,
}

impl ImageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List every image version
    pub async fn list(&self) -> Result<Vec<Image>> {
        let query = format!("SELECT {IMAGE_COLUMNS} FROM images ORDER BY name, version");
        let images = sqlx::query_as::<_, Image>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(images)
    }

    /// List image versions by tested status
    pub async fn list_by_tested(&self, tested: bool) -> Result<Vec<Image>> {
        let query = format!(
            "SELECT {IMAGE_COLUMNS} FROM images WHERE tested = ?1 ORDER BY name, version"
        );
        let images = sqlx::query_as::<_, Image>(&query)
            .bind(tested)
            .fetch_all(&self.pool)
            .await?;

        Ok(images)
    }

    /// List all versions of one image
    pub async fn list_by_name(&self, name: &str) -> Result<Vec<Image>> {
        let query = format!("SELECT {IMAGE_COLUMNS} FROM images WHERE name = ?1 ORDER BY version");
        let images = sqlx::query_as::<_, Image>(&query)
            .bind(name)
            .fetch_all(&self.pool)
            .await?;

        Ok(images)
    }

    /// List versions of one image by tested status
    pub async fn list_by_name_and_tested(&self, name: &str, tested: bool) -> Result<Vec<Image>> {
        let query = format!(
            "SELECT {IMAGE_COLUMNS} FROM images WHERE name = ?1 AND tested = ?2 ORDER BY version"
        );
        let images = sqlx::query_as::<_, Image>(&query)
            .bind(name)
            .bind(tested)
            .fetch_all(&self.pool)
            .await?;

        Ok(images)
    }

    /// Find one image version
    pub async fn find(&self, name: &str, version: &str) -> Result<Option<Image>> {
        let query = format!("SELECT {IMAGE_COLUMNS} FROM images WHERE name = ?1 AND version = ?2");
        let image = sqlx::query_as::<_, Image>(&query)
            .bind(name)
            .bind(version)
            .fetch_optional(&self.pool)
            .await?;

        Ok(image)
    }
}
