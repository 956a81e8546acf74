//! Domain operations and promotion

use std::collections::HashSet;

use tracing::{debug, info, warn};
use vermgr_common::{Error, Result};

use super::propagate::rename_domain_references_tx;
use super::{
    DomainActivation, DomainDeleted, DomainImagesUpdate, DomainPromotion, DomainTested,
    DomainVersionDeleted, LifecycleStore,
};
use crate::domain::entities::{Domain, Environment};
use crate::domain::snapshot::{ImageList, ImageSnapshot};
use crate::domain::state::{DeploymentEvent, DeploymentStateMachine};
use crate::repository::transactions::{
    count_image_domains_by_domain_tx, delete_domain_version_tx,
    delete_domains_tx, find_domain_tx, find_image_tx, insert_domain_tx,
    list_domains_by_name_and_env_tx, list_domains_by_name_tx, list_images_by_domain_tx,
    rename_domains_tx, set_domain_tested_tx, update_domain_images_tx, write_domain_state_tx,
};

/// Drop repeated `(name, version)` keys, keeping first-seen order
fn unique_keys<'a>(keys: impl IntoIterator<Item = (&'a str, &'a str)>) -> Vec<(&'a str, &'a str)> {
    let mut seen = HashSet::new();
    keys.into_iter().filter(|key| seen.insert(*key)).collect()
}

impl LifecycleStore {
    /// Create a new domain version in dev.
    ///
    /// Any dev version of the same name is deactivated. The new version pins
    /// the latest version of every image currently assigned to the domain.
    pub async fn create_domain(&self, name: &str, version: &str) -> Result<Domain> {
        let mut tx = self.repos.begin().await?;
        if find_domain_tx(&mut tx, name, version).await?.is_some() {
            return Err(Error::Conflict(format!(
                "Domain {name}:{version} already exists"
            )));
        }

        let deactivated = Self::deactivate_group_tx(&mut tx, name, Environment::Dev).await?;
        let assigned = list_images_by_domain_tx(&mut tx, name).await?;
        let domain = Domain::new(name, version, ImageList::latest_per_name(&assigned));
        let created = insert_domain_tx(&mut tx, &domain).await?;
        tx.commit().await?;

        info!(
            domain = %name,
            version = %version,
            images = created.images.0.len(),
            deactivated,
            "Domain version created"
        );
        Ok(created)
    }

    /// Merge image references into domain versions.
    ///
    /// Each reference takes its tested flag from the image row; references to
    /// unknown image versions and unknown target domains are skipped.
    pub async fn update_domains(&self, updates: &[DomainImagesUpdate]) -> Result<Vec<Domain>> {
        let mut tx = self.repos.begin().await?;
        let mut touched = Vec::new();

        for update in updates {
            let Some(mut domain) = find_domain_tx(&mut tx, &update.name, &update.version).await?
            else {
                debug!(domain = %update.name, version = %update.version, "Skipping unknown domain");
                continue;
            };

            let mut snapshots = Vec::with_capacity(update.images.len());
            for image_ref in &update.images {
                match find_image_tx(&mut tx, &image_ref.name, &image_ref.version).await? {
                    Some(image) => snapshots.push(ImageSnapshot::from(&image)),
                    None => debug!(
                        image = %image_ref.name,
                        version = %image_ref.version,
                        "Skipping unknown image version"
                    ),
                }
            }

            domain.images.0.merge(snapshots);
            update_domain_images_tx(&mut tx, &domain.name, &domain.version, &domain.images.0)
                .await?;
            touched.push((update.name.as_str(), update.version.as_str()));
        }

        let updated = Self::reload_tx(&mut tx, unique_keys(touched)).await?;
        tx.commit().await?;

        info!(count = updated.len(), "Domain images updated");
        Ok(updated)
    }

    /// Set the tested column on domain versions. Image lists are untouched.
    pub async fn set_domains_tested(&self, items: &[DomainTested]) -> Result<Vec<Domain>> {
        let mut tx = self.repos.begin().await?;
        let mut touched = Vec::new();

        for item in items {
            let Some(domain) = find_domain_tx(&mut tx, &item.name, &item.version).await? else {
                debug!(domain = %item.name, version = %item.version, "Skipping unknown domain");
                continue;
            };
            let next = DeploymentStateMachine::transition(
                domain.state(),
                DeploymentEvent::MarkTested(item.tested),
            )?;
            set_domain_tested_tx(&mut tx, &item.name, &item.version, next.tested).await?;
            touched.push((item.name.as_str(), item.version.as_str()));
        }

        let updated = Self::reload_tx(&mut tx, unique_keys(touched)).await?;
        tx.commit().await?;

        info!(count = updated.len(), "Domain tested flags set");
        Ok(updated)
    }

    /// Make the given versions active in their current environments.
    ///
    /// First every version sharing `(name, deployed)` with a target is
    /// deactivated, then the targets are activated. When a batch names two
    /// versions of the same `(name, deployed)`, the later one wins.
    /// Returns every row in the affected `(name, deployed)` groups.
    pub async fn set_domains_active(&self, items: &[DomainActivation]) -> Result<Vec<Domain>> {
        let mut tx = self.repos.begin().await?;

        let mut targets: Vec<((String, Environment), Domain)> = Vec::new();
        for item in items {
            let Some(domain) = find_domain_tx(&mut tx, &item.name, &item.version).await? else {
                debug!(domain = %item.name, version = %item.version, "Skipping unknown domain");
                continue;
            };
            let group = (domain.name.clone(), domain.deployed);
            match targets.iter_mut().find(|(key, _)| *key == group) {
                Some(slot) => slot.1 = domain,
                None => targets.push((group, domain)),
            }
        }

        for ((name, deployed), _) in &targets {
            Self::deactivate_group_tx(&mut tx, name, *deployed).await?;
        }
        for (_, domain) in &targets {
            let next = DeploymentStateMachine::transition(domain.state(), DeploymentEvent::Activate)?;
            write_domain_state_tx(&mut tx, &domain.name, &domain.version, &next).await?;
            debug!(domain = %domain.key(), env = %domain.deployed, "Domain version activated");
        }

        let mut rows = Vec::new();
        for ((name, deployed), _) in &targets {
            rows.extend(list_domains_by_name_and_env_tx(&mut tx, name, *deployed).await?);
        }
        tx.commit().await?;

        info!(groups = targets.len(), "Domain versions activated");
        Ok(rows)
    }

    /// Promote domain versions one environment forward.
    ///
    /// Targets are applied in order, each reading its current environment,
    /// so a version named twice moves twice. Unknown targets are skipped.
    pub async fn promote_domains(&self, items: &[DomainPromotion]) -> Result<Vec<Domain>> {
        let mut tx = self.repos.begin().await?;
        let mut promoted = Vec::new();

        for item in items {
            let Some(domain) = find_domain_tx(&mut tx, &item.name, &item.version).await? else {
                debug!(domain = %item.name, version = %item.version, "Skipping unknown domain");
                continue;
            };

            let next = DeploymentStateMachine::transition(domain.state(), DeploymentEvent::Promote)?;
            let target = Environment::from_state(next.deployed);
            Self::deactivate_group_tx(&mut tx, &domain.name, target).await?;
            write_domain_state_tx(&mut tx, &domain.name, &domain.version, &next).await?;

            info!(
                domain = %domain.name,
                version = %domain.version,
                from = %domain.deployed,
                to = %target,
                "Domain version promoted"
            );
            promoted.push((item.name.as_str(), item.version.as_str()));
        }

        let rows = Self::reload_tx(&mut tx, unique_keys(promoted)).await?;
        tx.commit().await?;
        Ok(rows)
    }

    /// Rename every version of a domain and repoint images assigned to it.
    pub async fn rename_domain(&self, old_name: &str, new_name: &str) -> Result<Vec<Domain>> {
        let mut tx = self.repos.begin().await?;
        if old_name != new_name && !list_domains_by_name_tx(&mut tx, new_name).await?.is_empty() {
            return Err(Error::Conflict(format!("Domain {new_name} already exists")));
        }

        let versions = rename_domains_tx(&mut tx, old_name, new_name).await?;
        if versions == 0 {
            return Err(Error::NotFound(format!("Domain {old_name} not found")));
        }

        let (mappings, images) = rename_domain_references_tx(&mut tx, old_name, new_name).await?;
        let domains = list_domains_by_name_tx(&mut tx, new_name).await?;
        tx.commit().await?;

        info!(from = %old_name, to = %new_name, versions, mappings, images, "Domain renamed");
        Ok(domains)
    }

    /// Delete one domain version
    pub async fn delete_domain_version(
        &self,
        name: &str,
        version: &str,
    ) -> Result<DomainVersionDeleted> {
        let mut tx = self.repos.begin().await?;
        if delete_domain_version_tx(&mut tx, name, version).await? == 0 {
            return Err(Error::NotFound(format!("Domain {name}:{version} not found")));
        }
        tx.commit().await?;

        info!(domain = %name, version = %version, "Domain version deleted");
        Ok(DomainVersionDeleted {
            deleted: true,
            name: name.to_string(),
            version: version.to_string(),
        })
    }

    /// Delete every version of a domain.
    ///
    /// Refused while any image name is still assigned to the domain.
    pub async fn delete_domain(&self, name: &str) -> Result<DomainDeleted> {
        let mut tx = self.repos.begin().await?;
        if list_domains_by_name_tx(&mut tx, name).await?.is_empty() {
            return Err(Error::NotFound(format!("Domain {name} not found")));
        }

        let in_use = count_image_domains_by_domain_tx(&mut tx, name).await?;
        if in_use > 0 {
            warn!(domain = %name, images = in_use, "Refusing to delete domain in use");
            return Err(Error::Conflict(format!(
                "Domain {name} is in use by {in_use} images"
            )));
        }

        let versions_removed = delete_domains_tx(&mut tx, name).await?;
        tx.commit().await?;

        info!(domain = %name, versions_removed, "Domain deleted");
        Ok(DomainDeleted {
            deleted: true,
            name: name.to_string(),
            versions_removed,
        })
    }

    /// Deactivate the active versions of `name` in `deployed`.
    ///
    /// Returns how many rows changed.
    async fn deactivate_group_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        name: &str,
        deployed: Environment,
    ) -> Result<u64> {
        let mut deactivated = 0;
        for domain in list_domains_by_name_and_env_tx(tx, name, deployed).await? {
            if !domain.active {
                continue;
            }
            let next =
                DeploymentStateMachine::transition(domain.state(), DeploymentEvent::Deactivate)?;
            deactivated += write_domain_state_tx(tx, &domain.name, &domain.version, &next).await?;
        }
        Ok(deactivated)
    }

    /// Re-read domain versions inside the transaction, skipping vanished keys
    async fn reload_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        keys: Vec<(&str, &str)>,
    ) -> Result<Vec<Domain>> {
        let mut rows = Vec::with_capacity(keys.len());
        for (name, version) in keys {
            if let Some(domain) = find_domain_tx(tx, name, version).await? {
                rows.push(domain);
            }
        }
        Ok(rows)
    }
}
