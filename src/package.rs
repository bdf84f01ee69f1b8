//! The package registry: lookup of installed packages by name.
//!
//! This is the core's only view into package discovery, which is otherwise
//! out of scope. Anything implementing [`Package`] and [`PackageCollection`]
//! can be handed to [`crate::mapping::ResourceMapping::load`]; the
//! [`PackageRegistry`]/[`SimplePackage`] pair is a ready-to-use in-memory
//! implementation for callers who don't already have their own.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::MappingError;

/// An installed package: a name and the filesystem directory it was
/// installed into.
pub trait Package {
    /// What: Expose the package's conventional name.
    ///
    /// Inputs: None (reads `self`).
    ///
    /// Output:
    /// - The package name, conventionally `vendor/name`.
    ///
    /// Details:
    /// - Used both as the registry key and as the `package`/`containing_package`
    ///   fields on [`MappingError`] and mapping queries.
    fn name(&self) -> &str;

    /// What: Expose the package's install directory.
    ///
    /// Inputs: None (reads `self`).
    ///
    /// Output:
    /// - The absolute filesystem directory the package was installed into.
    ///
    /// Details:
    /// - References are resolved relative to this path; it is never
    ///   stat-ed or validated by this trait itself.
    fn install_path(&self) -> &Path;
}

/// Lookup of known packages by name.
///
/// Implementations are expected to provide O(1) amortized lookup; the core
/// calls `contains`/`get` once per `@package:` reference during `load`.
pub trait PackageCollection {
    /// What: Check whether a package by this name is known.
    ///
    /// Inputs:
    /// - `name`: Package name to look up.
    ///
    /// Output:
    /// - `true` if a package by this name is registered.
    ///
    /// Details:
    /// - Called once per `@package:` reference before `get`, so a
    ///   missing-package error can be reported without needing `get` to
    ///   also carry the referencing string.
    fn contains(&self, name: &str) -> bool;

    /// What: Look up a package by name.
    ///
    /// Inputs:
    /// - `name`: Package name to look up.
    ///
    /// Output:
    /// - `Ok(&dyn Package)` if found.
    ///
    /// Details:
    /// - The `reference` field of a returned [`MappingError::NoSuchPackage`]
    ///   is left empty; callers that need it attached (as `load` does)
    ///   replace it with the original reference string.
    ///
    /// # Errors
    /// Returns [`MappingError::NoSuchPackage`] if no package by this name is
    /// known.
    fn get(&self, name: &str) -> Result<&dyn Package, MappingError>;

    /// What: Iterate over every known package.
    ///
    /// Inputs: None (reads `self`).
    ///
    /// Output:
    /// - A boxed iterator yielding each registered package.
    ///
    /// Details:
    /// - Iteration order is unspecified; callers that need a stable order
    ///   sort the result themselves.
    fn iter(&self) -> Box<dyn Iterator<Item = &dyn Package> + '_>;
}

/// A concrete, owned [`Package`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimplePackage {
    name: String,
    install_path: PathBuf,
}

impl SimplePackage {
    /// What: Build a package from its name and install directory.
    ///
    /// Inputs:
    /// - `name`: Package name, conventionally `vendor/name`.
    /// - `install_path`: Absolute filesystem directory the package lives in.
    ///
    /// Output:
    /// - A `SimplePackage` instance.
    ///
    /// Details:
    /// - Performs no validation of either argument; `install_path` need not
    ///   exist yet.
    pub fn new(name: impl Into<String>, install_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            install_path: install_path.into(),
        }
    }
}

impl Package for SimplePackage {
    fn name(&self) -> &str {
        &self.name
    }

    fn install_path(&self) -> &Path {
        &self.install_path
    }
}

/// A `HashMap`-backed [`PackageCollection`] with O(1) amortized lookup.
#[derive(Debug, Default)]
pub struct PackageRegistry {
    packages: HashMap<String, SimplePackage>,
}

impl PackageRegistry {
    /// What: Build an empty registry.
    ///
    /// Inputs: None.
    ///
    /// Output:
    /// - A `PackageRegistry` with no registered packages.
    ///
    /// Details:
    /// - Equivalent to `PackageRegistry::default()`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// What: Register a package.
    ///
    /// Inputs:
    /// - `package`: The package to register.
    ///
    /// Output: None (mutates `self`).
    ///
    /// Details:
    /// - Replaces any prior entry with the same name.
    pub fn insert(&mut self, package: SimplePackage) {
        self.packages.insert(package.name().to_string(), package);
    }
}

impl FromIterator<SimplePackage> for PackageRegistry {
    fn from_iter<I: IntoIterator<Item = SimplePackage>>(iter: I) -> Self {
        let mut registry = Self::new();
        for package in iter {
            registry.insert(package);
        }
        registry
    }
}

impl PackageCollection for PackageRegistry {
    /// What: Check whether `name` is registered.
    ///
    /// Inputs:
    /// - `name`: Package name to look up.
    ///
    /// Output:
    /// - `true` if present in the underlying map.
    ///
    /// Details:
    /// - O(1) amortized via `HashMap::contains_key`.
    fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    /// What: Look up `name` in the registry.
    ///
    /// Inputs:
    /// - `name`: Package name to look up.
    ///
    /// Output:
    /// - `Ok(&dyn Package)` if registered.
    ///
    /// Details:
    /// - The returned error's `reference` field is always empty; see
    ///   [`PackageCollection::get`].
    ///
    /// # Errors
    /// Returns [`MappingError::NoSuchPackage`] if `name` isn't registered.
    fn get(&self, name: &str) -> Result<&dyn Package, MappingError> {
        self.packages
            .get(name)
            .map(|p| p as &dyn Package)
            .ok_or_else(|| MappingError::NoSuchPackage {
                package: name.to_string(),
                reference: String::new(),
            })
    }

    /// What: Iterate over every registered package.
    ///
    /// Inputs: None.
    ///
    /// Output:
    /// - A boxed iterator over the registry's values.
    ///
    /// Details:
    /// - Iteration order follows `HashMap` iteration order (unspecified).
    fn iter(&self) -> Box<dyn Iterator<Item = &dyn Package> + '_> {
        Box::new(self.packages.values().map(|p| p as &dyn Package))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_and_get_round_trip() {
        let mut registry = PackageRegistry::new();
        registry.insert(SimplePackage::new("acme/blog", "/pkg/blog"));

        assert!(registry.contains("acme/blog"));
        assert!(!registry.contains("acme/missing"));

        let found = registry.get("acme/blog").unwrap();
        assert_eq!(found.name(), "acme/blog");
        assert_eq!(found.install_path(), Path::new("/pkg/blog"));
    }

    #[test]
    fn get_missing_package_fails() {
        let registry = PackageRegistry::new();
        let err = registry.get("acme/missing").unwrap_err();
        assert_eq!(
            err,
            MappingError::NoSuchPackage {
                package: "acme/missing".to_string(),
                reference: String::new(),
            }
        );
    }

    #[test]
    fn insert_replaces_existing() {
        let mut registry = PackageRegistry::new();
        registry.insert(SimplePackage::new("acme/blog", "/pkg/blog-v1"));
        registry.insert(SimplePackage::new("acme/blog", "/pkg/blog-v2"));
        assert_eq!(
            registry.get("acme/blog").unwrap().install_path(),
            Path::new("/pkg/blog-v2")
        );
    }

    #[test]
    fn iter_visits_every_package() {
        let registry: PackageRegistry = vec![
            SimplePackage::new("acme/blog", "/pkg/blog"),
            SimplePackage::new("acme/theme", "/pkg/theme"),
        ]
        .into_iter()
        .collect();

        let mut names: Vec<&str> = registry.iter().map(Package::name).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["acme/blog", "acme/theme"]);
    }
}
