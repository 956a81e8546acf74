//! Transaction helpers for the lifecycle domain
//!
//! Every mutating operation opens one transaction and threads it through
//! these functions. Nothing here commits.

use super::domains::DOMAIN_COLUMNS;
use super::image_domains::IMAGE_DOMAIN_COLUMNS;
use super::images::IMAGE_COLUMNS;
use crate::domain::entities::{Domain, Environment, Image, ImageDomain};
use crate::domain::snapshot::ImageList;
use crate::domain::state::DomainVersionState;
use sqlx::types::Json;
use sqlx::{Sqlite, Transaction};

// ============================================================================
// image_domain
// ============================================================================

/// Find the mapping for an image name within a transaction
pub async fn find_image_domain_tx(
    tx: &mut Transaction<'_, Sqlite>,
    image: &str,
) -> Result<Option<ImageDomain>, sqlx::Error> {
    let query = format!("SELECT {IMAGE_DOMAIN_COLUMNS} FROM image_domain WHERE image = ?1");
    sqlx::query_as::<_, ImageDomain>(&query)
        .bind(image)
        .fetch_optional(&mut **tx)
        .await
}

/// Insert a new image-domain mapping within a transaction
pub async fn insert_image_domain_tx(
    tx: &mut Transaction<'_, Sqlite>,
    mapping: &ImageDomain,
) -> Result<ImageDomain, sqlx::Error> {
    let query = format!(
        "INSERT INTO image_domain ({IMAGE_DOMAIN_COLUMNS}) VALUES (?1, ?2, ?3) \
         RETURNING {IMAGE_DOMAIN_COLUMNS}"
    );
    sqlx::query_as::<_, ImageDomain>(&query)
        .bind(&mapping.image)
        .bind(&mapping.domain)
        .bind(&mapping.domains)
        .fetch_one(&mut **tx)
        .await
}

/// Write back the current domain and history of a mapping
pub async fn update_image_domain_tx(
    tx: &mut Transaction<'_, Sqlite>,
    mapping: &ImageDomain,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE image_domain SET domain = ?2, domains = ?3 WHERE image = ?1")
        .bind(&mapping.image)
        .bind(&mapping.domain)
        .bind(&mapping.domains)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}

/// Append `domain` to the history of a mapping and make it current.
///
/// Returns the updated mapping, or `None` if the image name is unknown.
pub async fn reassign_image_domain_tx(
    tx: &mut Transaction<'_, Sqlite>,
    image: &str,
    domain: &str,
) -> Result<Option<ImageDomain>, sqlx::Error> {
    let Some(mut mapping) = find_image_domain_tx(tx, image).await? else {
        return Ok(None);
    };
    mapping.reassign(domain);
    update_image_domain_tx(tx, &mapping).await?;
    Ok(Some(mapping))
}

/// Rename the mapping for an image name
pub async fn rename_image_domain_tx(
    tx: &mut Transaction<'_, Sqlite>,
    old_name: &str,
    new_name: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE image_domain SET image = ?2 WHERE image = ?1")
        .bind(old_name)
        .bind(new_name)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}

/// Delete the mapping for an image name
pub async fn delete_image_domain_tx(
    tx: &mut Transaction<'_, Sqlite>,
    image: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM image_domain WHERE image = ?1")
        .bind(image)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}

/// List mappings whose current domain is `domain`
pub async fn list_image_domains_by_domain_tx(
    tx: &mut Transaction<'_, Sqlite>,
    domain: &str,
) -> Result<Vec<ImageDomain>, sqlx::Error> {
    let query = format!(
        "SELECT {IMAGE_DOMAIN_COLUMNS} FROM image_domain WHERE domain = ?1 ORDER BY image"
    );
    sqlx::query_as::<_, ImageDomain>(&query)
        .bind(domain)
        .fetch_all(&mut **tx)
        .await
}

/// Count image names currently assigned to `domain`
pub async fn count_image_domains_by_domain_tx(
    tx: &mut Transaction<'_, Sqlite>,
    domain: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM image_domain WHERE domain = ?1")
        .bind(domain)
        .fetch_one(&mut **tx)
        .await
}

// ============================================================================
// images
// ============================================================================

/// Insert an image version within a transaction
pub async fn insert_image_tx(
    tx: &mut Transaction<'_, Sqlite>,
    image: &Image,
) -> Result<Image, sqlx::Error> {
    let query = format!(
        "INSERT INTO images ({IMAGE_COLUMNS}) VALUES (?1, ?2, ?3, ?4) RETURNING {IMAGE_COLUMNS}"
    );
    sqlx::query_as::<_, Image>(&query)
        .bind(&image.name)
        .bind(&image.version)
        .bind(&image.domain)
        .bind(image.tested)
        .fetch_one(&mut **tx)
        .await
}

/// Find one image version within a transaction
pub async fn find_image_tx(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
    version: &str,
) -> Result<Option<Image>, sqlx::Error> {
    let query = format!("SELECT {IMAGE_COLUMNS} FROM images WHERE name = ?1 AND version = ?2");
    sqlx::query_as::<_, Image>(&query)
        .bind(name)
        .bind(version)
        .fetch_optional(&mut **tx)
        .await
}

/// List every version of an image name
pub async fn list_images_by_name_tx(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
) -> Result<Vec<Image>, sqlx::Error> {
    let query = format!("SELECT {IMAGE_COLUMNS} FROM images WHERE name = ?1 ORDER BY version");
    sqlx::query_as::<_, Image>(&query)
        .bind(name)
        .fetch_all(&mut **tx)
        .await
}

/// List every image version assigned to `domain`
pub async fn list_images_by_domain_tx(
    tx: &mut Transaction<'_, Sqlite>,
    domain: &str,
) -> Result<Vec<Image>, sqlx::Error> {
    let query =
        format!("SELECT {IMAGE_COLUMNS} FROM images WHERE domain = ?1 ORDER BY name, version");
    sqlx::query_as::<_, Image>(&query)
        .bind(domain)
        .fetch_all(&mut **tx)
        .await
}

/// Set the tested flag of one image version
pub async fn set_image_tested_tx(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
    version: &str,
    tested: bool,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE images SET tested = ?3 WHERE name = ?1 AND version = ?2")
        .bind(name)
        .bind(version)
        .bind(tested)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}

/// Point every version of an image name at `domain`
pub async fn set_images_domain_tx(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
    domain: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE images SET domain = ?2 WHERE name = ?1")
        .bind(name)
        .bind(domain)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}

/// Rename every version of an image
pub async fn rename_images_tx(
    tx: &mut Transaction<'_, Sqlite>,
    old_name: &str,
    new_name: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE images SET name = ?2 WHERE name = ?1")
        .bind(old_name)
        .bind(new_name)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}

/// Delete every version of an image
pub async fn delete_images_tx(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM images WHERE name = ?1")
        .bind(name)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}

/// Move every image version from one domain name to another
pub async fn reassign_images_domain_tx(
    tx: &mut Transaction<'_, Sqlite>,
    old_domain: &str,
    new_domain: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE images SET domain = ?2 WHERE domain = ?1")
        .bind(old_domain)
        .bind(new_domain)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}

// ============================================================================
// domains
// ============================================================================

/// Find one domain version within a transaction
pub async fn find_domain_tx(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
    version: &str,
) -> Result<Option<Domain>, sqlx::Error> {
    let query =
        format!("SELECT {DOMAIN_COLUMNS} FROM domains WHERE name = ?1 AND version = ?2");
    sqlx::query_as::<_, Domain>(&query)
        .bind(name)
        .bind(version)
        .fetch_optional(&mut **tx)
        .await
}

/// List every domain version, for store-wide snapshot rewrites
pub async fn list_domains_tx(
    tx: &mut Transaction<'_, Sqlite>,
) -> Result<Vec<Domain>, sqlx::Error> {
    let query = format!("SELECT {DOMAIN_COLUMNS} FROM domains ORDER BY name, version");
    sqlx::query_as::<_, Domain>(&query)
        .fetch_all(&mut **tx)
        .await
}

/// List every version of one domain
pub async fn list_domains_by_name_tx(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
) -> Result<Vec<Domain>, sqlx::Error> {
    let query =
        format!("SELECT {DOMAIN_COLUMNS} FROM domains WHERE name = ?1 ORDER BY version");
    sqlx::query_as::<_, Domain>(&query)
        .bind(name)
        .fetch_all(&mut **tx)
        .await
}

/// List every version of one domain deployed to `deployed`
pub async fn list_domains_by_name_and_env_tx(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
    deployed: Environment,
) -> Result<Vec<Domain>, sqlx::Error> {
    let query = format!(
        "SELECT {DOMAIN_COLUMNS} FROM domains WHERE name = ?1 AND deployed = ?2 ORDER BY version"
    );
    sqlx::query_as::<_, Domain>(&query)
        .bind(name)
        .bind(deployed)
        .fetch_all(&mut **tx)
        .await
}

/// Find the active version of a domain in one environment
pub async fn find_active_domain_tx(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
    deployed: Environment,
) -> Result<Option<Domain>, sqlx::Error> {
    let query = format!(
        "SELECT {DOMAIN_COLUMNS} FROM domains WHERE name = ?1 AND deployed = ?2 AND active = 1"
    );
    sqlx::query_as::<_, Domain>(&query)
        .bind(name)
        .bind(deployed)
        .fetch_optional(&mut **tx)
        .await
}

/// Insert a domain version within a transaction
pub async fn insert_domain_tx(
    tx: &mut Transaction<'_, Sqlite>,
    domain: &Domain,
) -> Result<Domain, sqlx::Error> {
    let query = format!(
        "INSERT INTO domains ({DOMAIN_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
         RETURNING {DOMAIN_COLUMNS}"
    );
    sqlx::query_as::<_, Domain>(&query)
        .bind(&domain.name)
        .bind(&domain.version)
        .bind(domain.deployed)
        .bind(domain.tested)
        .bind(domain.active)
        .bind(&domain.images)
        .fetch_one(&mut **tx)
        .await
}

/// Replace the image snapshot list of one domain version
pub async fn update_domain_images_tx(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
    version: &str,
    images: &ImageList,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE domains SET images = ?3 WHERE name = ?1 AND version = ?2")
        .bind(name)
        .bind(version)
        .bind(Json(images))
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}

/// Set the tested column of one domain version
pub async fn set_domain_tested_tx(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
    version: &str,
    tested: bool,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE domains SET tested = ?3 WHERE name = ?1 AND version = ?2")
        .bind(name)
        .bind(version)
        .bind(tested)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}

/// Persist a state machine result for one domain version.
///
/// Callers must deactivate the destination `(name, deployed)` first when the
/// new state is active.
pub async fn write_domain_state_tx(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
    version: &str,
    state: &DomainVersionState,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE domains SET deployed = ?3, active = ?4, tested = ?5 \
         WHERE name = ?1 AND version = ?2",
    )
    .bind(name)
    .bind(version)
    .bind(Environment::from_state(state.deployed))
    .bind(state.active)
    .bind(state.tested)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected())
}

/// Rename every version of a domain
pub async fn rename_domains_tx(
    tx: &mut Transaction<'_, Sqlite>,
    old_name: &str,
    new_name: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE domains SET name = ?2 WHERE name = ?1")
        .bind(old_name)
        .bind(new_name)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}

/// Delete one domain version
pub async fn delete_domain_version_tx(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
    version: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM domains WHERE name = ?1 AND version = ?2")
        .bind(name)
        .bind(version)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}

/// Delete every version of a domain
pub async fn delete_domains_tx(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM domains WHERE name = ?1")
        .bind(name)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}
