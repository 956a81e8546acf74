//! Denormalized snapshot lists and their merge rules
//!
//! `Domain.images` and `ImageDomain.domains` are caches owned by the engine.
//! They are keyed lists: at most one entry per image name (resp. domain
//! name), insertion order preserved. All read-modify-write logic lives here so
//! it can be exercised without a store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::entities::Image;

/// One pinned image inside a domain version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSnapshot {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub tested: bool,
}

impl ImageSnapshot {
    pub fn new(name: impl Into<String>, version: impl Into<String>, tested: bool) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            tested,
        }
    }
}

impl From<&Image> for ImageSnapshot {
    fn from(image: &Image) -> Self {
        Self::new(&image.name, &image.version, image.tested)
    }
}

/// Ordered image list keyed by image name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageList(Vec<ImageSnapshot>);

impl ImageList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest version of every distinct image name.
    ///
    /// Versions are timestamp strings, so the lexicographically greatest one
    /// wins. Entries come out sorted by image name.
    pub fn latest_per_name<'a>(images: impl IntoIterator<Item = &'a Image>) -> Self {
        let mut latest: BTreeMap<&str, &Image> = BTreeMap::new();
        for image in images {
            match latest.get(image.name.as_str()) {
                Some(current) if current.version >= image.version => {}
                _ => {
                    latest.insert(image.name.as_str(), image);
                }
            }
        }
        Self(latest.values().map(|image| ImageSnapshot::from(*image)).collect())
    }

    pub fn entries(&self) -> &[ImageSnapshot] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ImageSnapshot> {
        self.0.iter().find(|entry| entry.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Replace the entry with the same image name in place, or append.
    pub fn upsert(&mut self, snapshot: ImageSnapshot) {
        match self.0.iter_mut().find(|entry| entry.name == snapshot.name) {
            Some(entry) => *entry = snapshot,
            None => self.0.push(snapshot),
        }
    }

    /// Upsert every snapshot in order; the last one per name wins.
    pub fn merge(&mut self, snapshots: impl IntoIterator<Item = ImageSnapshot>) {
        for snapshot in snapshots {
            self.upsert(snapshot);
        }
    }

    /// Set `tested` on the entry pinning exactly `name:version`.
    ///
    /// Never creates entries. Returns whether anything matched.
    pub fn set_tested(&mut self, name: &str, version: &str, tested: bool) -> bool {
        match self
            .0
            .iter_mut()
            .find(|entry| entry.name == name && entry.version == version)
        {
            Some(entry) => {
                entry.tested = tested;
                true
            }
            None => false,
        }
    }

    /// Rename the entry for `old_name`, keeping its version and tested flag.
    pub fn rename(&mut self, old_name: &str, new_name: &str) -> bool {
        let mut changed = false;
        for entry in self.0.iter_mut().filter(|entry| entry.name == old_name) {
            entry.name = new_name.to_string();
            changed = true;
        }
        changed
    }

    /// Drop the entry for `name`. Returns whether anything was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|entry| entry.name != name);
        self.0.len() != before
    }
}

impl From<Vec<ImageSnapshot>> for ImageList {
    fn from(entries: Vec<ImageSnapshot>) -> Self {
        let mut list = Self::new();
        list.merge(entries);
        list
    }
}

impl IntoIterator for ImageList {
    type Item = ImageSnapshot;
    type IntoIter = std::vec::IntoIter<ImageSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Append-only, deduplicated history of domains an image has belonged to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainHistory(Vec<String>);

impl DomainHistory {
    pub fn starting_with(domain: impl Into<String>) -> Self {
        Self(vec![domain.into()])
    }

    pub fn entries(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.0.iter().any(|d| d == domain)
    }

    /// Record `domain` unless it is already present.
    pub fn append_if_absent(&mut self, domain: &str) -> bool {
        if self.contains(domain) {
            return false;
        }
        self.0.push(domain.to_string());
        true
    }
}
