//! `RootPackageFile`: the in-memory mapping container that atomic operations
//! mutate.
//!
//! Persistence (reading/writing the backing JSON file) is out of scope and
//! delegated to an external layer; this facade only owns the in-memory
//! indexed collection and the serializable record shape that layer would
//! round-trip mappings through.

use serde::{Deserialize, Serialize};

use crate::mapping::ResourceMapping;

/// The persistence shape of a single mapping entry, as consumed from the
/// external package-file layer: an ordered list of these records.
///
/// This crate neither reads nor writes this shape to disk; it exists so a
/// caller's JSON layer has something concrete to serialize
/// [`ResourceMapping`]s into and reconstruct them from.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MappingRecord {
    /// The mapping's repository path.
    pub repository_path: String,
    /// The mapping's path references, in order.
    pub path_references: Vec<String>,
}

impl From<&ResourceMapping> for MappingRecord {
    fn from(mapping: &ResourceMapping) -> Self {
        Self {
            repository_path: mapping.repository_path().to_string(),
            path_references: mapping.path_references(),
        }
    }
}

/// In-memory container of [`ResourceMapping`]s, indexed by repository path.
///
/// Iteration order is insertion order; adding a mapping for a path that's
/// already present replaces the prior entry in place (its position in
/// iteration order is preserved, matching the replace-in-place semantics a
/// JSON object keyed by path would have).
#[derive(Default)]
pub struct RootPackageFile {
    entries: Vec<(String, ResourceMapping)>,
}

impl RootPackageFile {
    /// Build an empty root package file.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a mapping exists for `repository_path`.
    #[must_use]
    pub fn has_resource_mapping(&self, repository_path: &str) -> bool {
        self.position(repository_path).is_some()
    }

    /// The mapping at `repository_path`, if any.
    #[must_use]
    pub fn get_resource_mapping(&self, repository_path: &str) -> Option<ResourceMapping> {
        self.position(repository_path)
            .map(|i| self.entries[i].1.clone())
    }

    /// Insert `mapping`, replacing any existing mapping at the same
    /// repository path in place.
    pub fn add_resource_mapping(&mut self, mapping: ResourceMapping) {
        let key = mapping.repository_path().to_string();
        if let Some(i) = self.position(&key) {
            self.entries[i].1 = mapping;
        } else {
            self.entries.push((key, mapping));
        }
    }

    /// Remove and return the mapping at `repository_path`, if any.
    pub fn remove_resource_mapping(&mut self, repository_path: &str) -> Option<ResourceMapping> {
        let i = self.position(repository_path)?;
        Some(self.entries.remove(i).1)
    }

    /// Iterate over every mapping, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceMapping> {
        self.entries.iter().map(|(_, m)| m)
    }

    fn position(&self, repository_path: &str) -> Option<usize> {
        self.entries.iter().position(|(path, _)| path == repository_path)
    }
}
