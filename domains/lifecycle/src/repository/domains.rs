//! Domain version repository

use crate::domain::entities::{Domain, Environment};
use sqlx::SqlitePool;
use vermgr_common::Result;

/// All columns in the domains table, used for SELECT clauses.
pub(crate) const DOMAIN_COLUMNS: &str = "name, version, deployed, tested, active, images";

#[derive(Clone)]
pub struct DomainRepository {
    pool: SqlitePool,
}

impl DomainRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List every domain version
    pub async fn list(&self) -> Result<Vec<Domain>> {
        let query = format!("SELECT {DOMAIN_COLUMNS} FROM domains ORDER BY name, version");
        let domains = sqlx::query_as::<_, Domain>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(domains)
    }

    /// List active domain versions, optionally restricted to one environment
    pub async fn list_active(&self, deployed: Option<Environment>) -> Result<Vec<Domain>> {
        let domains = match deployed {
            Some(env) => {
                let query = format!(
                    "SELECT {DOMAIN_COLUMNS} FROM domains \
                     WHERE active = 1 AND deployed = ?1 ORDER BY name, version"
                );
                sqlx::query_as::<_, Domain>(&query)
                    .bind(env)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let query = format!(
                    "SELECT {DOMAIN_COLUMNS} FROM domains WHERE active = 1 ORDER BY name, version"
                );
                sqlx::query_as::<_, Domain>(&query)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(domains)
    }

    /// List all versions of one domain
    pub async fn list_by_name(&self, name: &str) -> Result<Vec<Domain>> {
        let query =
            format!("SELECT {DOMAIN_COLUMNS} FROM domains WHERE name = ?1 ORDER BY version");
        let domains = sqlx::query_as::<_, Domain>(&query)
            .bind(name)
            .fetch_all(&self.pool)
            .await?;

        Ok(domains)
    }

    /// List the active versions of one domain, optionally in one environment
    pub async fn list_active_by_name(
        &self,
        name: &str,
        deployed: Option<Environment>,
    ) -> Result<Vec<Domain>> {
        let domains = match deployed {
            Some(env) => {
                let query = format!(
                    "SELECT {DOMAIN_COLUMNS} FROM domains \
                     WHERE name = ?1 AND active = 1 AND deployed = ?2 ORDER BY version"
                );
                sqlx::query_as::<_, Domain>(&query)
                    .bind(name)
                    .bind(env)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let query = format!(
                    "SELECT {DOMAIN_COLUMNS} FROM domains \
                     WHERE name = ?1 AND active = 1 ORDER BY version"
                );
                sqlx::query_as::<_, Domain>(&query)
                    .bind(name)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(domains)
    }

    /// Find one domain version
    pub async fn find(&self, name: &str, version: &str) -> Result<Option<Domain>> {
        let query =
            format!("SELECT {DOMAIN_COLUMNS} FROM domains WHERE name = ?1 AND version = ?2");
        let domain = sqlx::query_as::<_, Domain>(&query)
            .bind(name)
            .bind(version)
            .fetch_optional(&self.pool)
            .await?;

        Ok(domain)
    }
}
