//! Image operations

use tracing::{debug, info};
use vermgr_common::{Error, Result};

use super::propagate::{
    merge_into_active_dev_domain_tx, remove_image_from_domains_tx, rename_image_in_domains_tx,
    set_tested_in_domain_tx,
};
use super::{ImageDeleted, LifecycleStore};
use crate::domain::entities::{Image, ImageDomain};
use crate::domain::snapshot::ImageSnapshot;
use crate::repository::transactions::{
    delete_image_domain_tx, delete_images_tx, find_image_domain_tx, find_image_tx,
    insert_image_domain_tx, insert_image_tx, list_images_by_name_tx, reassign_image_domain_tx,
    rename_image_domain_tx, rename_images_tx, set_image_tested_tx, set_images_domain_tx,
};

fn image_not_found(name: &str) -> Error {
    Error::NotFound(format!("Image {name} not found"))
}

impl LifecycleStore {
    /// Register an image name under `domain`.
    ///
    /// Idempotent: an existing mapping is returned unchanged.
    pub async fn register_image(&self, name: &str, domain: &str) -> Result<ImageDomain> {
        let mut tx = self.repos.begin().await?;
        if let Some(existing) = find_image_domain_tx(&mut tx, name).await? {
            debug!(image = %name, domain = %existing.domain, "Image already registered");
            return Ok(existing);
        }

        let created = insert_image_domain_tx(&mut tx, &ImageDomain::new(name, domain)).await?;
        tx.commit().await?;

        info!(image = %name, domain = %domain, "Image registered");
        Ok(created)
    }

    /// Create a new, untested version of a registered image.
    ///
    /// The version is also merged into the active dev version of the image's
    /// domain, if there is one. Other environments are left alone.
    pub async fn create_image_version(&self, name: &str, version: &str) -> Result<Image> {
        let mut tx = self.repos.begin().await?;
        let mapping = find_image_domain_tx(&mut tx, name)
            .await?
            .ok_or_else(|| image_not_found(name))?;

        if find_image_tx(&mut tx, name, version).await?.is_some() {
            return Err(Error::Conflict(format!(
                "Image {name}:{version} already exists"
            )));
        }

        let image = insert_image_tx(&mut tx, &Image::new(name, version, &mapping.domain)).await?;
        let merged =
            merge_into_active_dev_domain_tx(&mut tx, &mapping.domain, ImageSnapshot::from(&image))
                .await?;
        tx.commit().await?;

        if let Some(key) = merged {
            debug!(image = %name, version = %version, domain = %key, "Merged into active dev domain");
        }
        info!(image = %name, version = %version, domain = %image.domain, "Image version created");
        Ok(image)
    }

    /// Record a test result for one image version.
    ///
    /// Rewrites the matching entry in every version of the image's current
    /// domain, then the image row itself.
    pub async fn set_image_tested(&self, name: &str, version: &str, tested: bool) -> Result<Image> {
        let mut tx = self.repos.begin().await?;
        let mapping = find_image_domain_tx(&mut tx, name)
            .await?
            .ok_or_else(|| image_not_found(name))?;

        let domains = set_tested_in_domain_tx(&mut tx, &mapping.domain, name, version, tested).await?;
        set_image_tested_tx(&mut tx, name, version, tested).await?;

        let image = find_image_tx(&mut tx, name, version)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Image {name}:{version} not found")))?;
        tx.commit().await?;

        info!(image = %name, version = %version, tested, domains, "Image tested flag set");
        Ok(image)
    }

    /// Move an image name to another domain.
    ///
    /// Existing domain snapshots are not touched.
    pub async fn update_image_domain(&self, name: &str, domain: &str) -> Result<Vec<Image>> {
        let mut tx = self.repos.begin().await?;
        reassign_image_domain_tx(&mut tx, name, domain)
            .await?
            .ok_or_else(|| image_not_found(name))?;

        let versions = set_images_domain_tx(&mut tx, name, domain).await?;
        let images = list_images_by_name_tx(&mut tx, name).await?;
        tx.commit().await?;

        info!(image = %name, domain = %domain, versions, "Image domain updated");
        Ok(images)
    }

    /// Rename an image everywhere it appears.
    ///
    /// Domain snapshots are rewritten first, while rows still carry the old
    /// name. Versions and tested flags are preserved.
    pub async fn rename_image(&self, old_name: &str, new_name: &str) -> Result<Vec<Image>> {
        let mut tx = self.repos.begin().await?;
        if find_image_domain_tx(&mut tx, old_name).await?.is_none() {
            return Err(image_not_found(old_name));
        }
        if old_name != new_name && find_image_domain_tx(&mut tx, new_name).await?.is_some() {
            return Err(Error::Conflict(format!("Image {new_name} already exists")));
        }

        let domains = rename_image_in_domains_tx(&mut tx, old_name, new_name).await?;
        rename_image_domain_tx(&mut tx, old_name, new_name).await?;
        let versions = rename_images_tx(&mut tx, old_name, new_name).await?;
        let images = list_images_by_name_tx(&mut tx, new_name).await?;
        tx.commit().await?;

        info!(from = %old_name, to = %new_name, versions, domains, "Image renamed");
        Ok(images)
    }

    /// Delete an image name with all of its versions.
    pub async fn delete_image(&self, name: &str) -> Result<ImageDeleted> {
        let mut tx = self.repos.begin().await?;
        if find_image_domain_tx(&mut tx, name).await?.is_none() {
            return Err(image_not_found(name));
        }

        let domains = remove_image_from_domains_tx(&mut tx, name).await?;
        let versions_removed = delete_images_tx(&mut tx, name).await?;
        delete_image_domain_tx(&mut tx, name).await?;
        tx.commit().await?;

        info!(image = %name, versions_removed, domains, "Image deleted");
        Ok(ImageDeleted {
            deleted: true,
            name: name.to_string(),
            versions_removed,
        })
    }
}
