//! Cross-table propagation
//!
//! Image and domain mutations ripple into the other table's denormalized
//! lists inside the caller's transaction. Propagation is best-effort: it
//! rewrites what it can see in this transaction and never repairs later.

use sqlx::{Sqlite, Transaction};

use crate::domain::entities::{Domain, Environment};
use crate::domain::snapshot::{ImageList, ImageSnapshot};
use crate::repository::transactions::{
    find_active_domain_tx, list_domains_by_name_tx, list_domains_tx,
    list_image_domains_by_domain_tx, reassign_images_domain_tx, update_domain_images_tx,
    update_image_domain_tx,
};

/// Apply `edit` to each domain's image list, persisting the ones it changed.
async fn rewrite_snapshots_tx<F>(
    tx: &mut Transaction<'_, Sqlite>,
    domains: Vec<Domain>,
    mut edit: F,
) -> Result<u64, sqlx::Error>
where
    F: FnMut(&mut ImageList) -> bool + Send,
{
    let mut changed = 0;
    for mut domain in domains {
        if edit(&mut domain.images.0) {
            update_domain_images_tx(tx, &domain.name, &domain.version, &domain.images.0).await?;
            changed += 1;
        }
    }
    Ok(changed)
}

/// Merge a new image version into the active dev version of `domain`.
///
/// Returns the `name:version` key of the domain version that was updated.
pub async fn merge_into_active_dev_domain_tx(
    tx: &mut Transaction<'_, Sqlite>,
    domain: &str,
    snapshot: ImageSnapshot,
) -> Result<Option<String>, sqlx::Error> {
    let Some(mut target) = find_active_domain_tx(tx, domain, Environment::Dev).await? else {
        return Ok(None);
    };

    target.images.0.upsert(snapshot);
    update_domain_images_tx(tx, &target.name, &target.version, &target.images.0).await?;
    Ok(Some(target.key()))
}

/// Set the tested flag on `image:version` in every version of `domain`
pub async fn set_tested_in_domain_tx(
    tx: &mut Transaction<'_, Sqlite>,
    domain: &str,
    image: &str,
    version: &str,
    tested: bool,
) -> Result<u64, sqlx::Error> {
    let domains = list_domains_by_name_tx(tx, domain).await?;
    rewrite_snapshots_tx(tx, domains, |images| images.set_tested(image, version, tested)).await
}

/// Rename an image entry in every domain version, any environment
pub async fn rename_image_in_domains_tx(
    tx: &mut Transaction<'_, Sqlite>,
    old_name: &str,
    new_name: &str,
) -> Result<u64, sqlx::Error> {
    let domains = list_domains_tx(tx).await?;
    rewrite_snapshots_tx(tx, domains, |images| images.rename(old_name, new_name)).await
}

/// Drop an image entry from every domain version, any environment
pub async fn remove_image_from_domains_tx(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
) -> Result<u64, sqlx::Error> {
    let domains = list_domains_tx(tx).await?;
    rewrite_snapshots_tx(tx, domains, |images| images.remove(name)).await
}

/// Repoint image mappings and image rows from one domain name to another.
///
/// Returns `(mappings updated, image versions updated)`.
pub async fn rename_domain_references_tx(
    tx: &mut Transaction<'_, Sqlite>,
    old_name: &str,
    new_name: &str,
) -> Result<(u64, u64), sqlx::Error> {
    let mappings = list_image_domains_by_domain_tx(tx, old_name).await?;
    let mut remapped = 0;
    for mut mapping in mappings {
        mapping.reassign(new_name);
        remapped += update_image_domain_tx(tx, &mapping).await?;
    }

    let images = reassign_images_domain_tx(tx, old_name, new_name).await?;
    Ok((remapped, images))
}
