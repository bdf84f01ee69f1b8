//! `ResourceMapping`: binds a repository path to one or more path references,
//! owns the load/unload lifecycle, and drives the three-state machine
//! (`Enabled` / `NotFound` / `Conflict`) off its filesystem resolution and
//! conflict membership.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::{Rc, Weak};

use crate::conflict::Conflict;
use crate::error::MappingError;
use crate::package::{Package, PackageCollection};
use crate::path::{RepositoryPath, is_base_path};

/// The state a mapping occupies: `Unloaded` iff it has never been loaded (or
/// has since been unloaded); otherwise exactly one of `Enabled`, `NotFound`,
/// `Conflict`, recomputed deterministically by `refresh_state` on every
/// mutation that can affect it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingState {
    /// Not currently loaded; `containing_package` is absent.
    Unloaded,
    /// Loaded, at least one reference resolved, no conflicts.
    Enabled,
    /// Loaded, but every reference failed to resolve, no conflicts.
    NotFound,
    /// Loaded and at least one other mapping claims an overlapping path.
    Conflict,
}

impl std::fmt::Display for MappingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Unloaded => "unloaded",
            Self::Enabled => "enabled",
            Self::NotFound => "not-found",
            Self::Conflict => "conflict",
        };
        f.write_str(label)
    }
}

/// Grammar of a path reference: either a path relative to the containing
/// package, or `@package:path` relative to a named package.
enum ParsedReference<'a> {
    /// Relative to the containing package's install path.
    Local(&'a str),
    /// Relative to the named package's install path.
    Remote {
        /// The named package.
        package: &'a str,
        /// Path relative to that package's install directory.
        relative: &'a str,
    },
}

/// What: Split a raw reference string per the path-reference grammar.
///
/// Inputs:
/// - `reference`: The raw string a mapping was constructed with.
///
/// Output:
/// - A `ParsedReference` describing whether it's local or names another
///   package.
///
/// Details:
/// - A reference starting with `@` but containing no `:` is treated as a
///   local path verbatim — the grammar explicitly allows this rather than
///   treating a bare `@` prefix as malformed.
fn parse_reference(reference: &str) -> ParsedReference<'_> {
    if let Some(rest) = reference.strip_prefix('@') {
        if let Some(colon) = rest.find(':') {
            return ParsedReference::Remote {
                package: &rest[..colon],
                relative: &rest[colon + 1..],
            };
        }
    }
    ParsedReference::Local(reference)
}

/// What: Resolve one reference to an absolute filesystem path.
///
/// Inputs:
/// - `reference`: The raw reference string to resolve.
/// - `containing_package`: The package a local reference resolves against.
/// - `packages`: The collection a `@package:` reference resolves against.
///
/// Output:
/// - The resolved, absolute filesystem path.
///
/// Details:
/// - Does not stat the result; existence is checked by the caller.
///
/// # Errors
/// Returns [`MappingError::NoSuchPackage`] if a `@package:` reference names
/// a package `packages` doesn't know.
fn resolve_reference(
    reference: &str,
    containing_package: &dyn Package,
    packages: &dyn PackageCollection,
) -> Result<PathBuf, MappingError> {
    match parse_reference(reference) {
        ParsedReference::Local(relative) => Ok(PathBuf::from(format!(
            "{}/{relative}",
            containing_package.install_path().display()
        ))),
        ParsedReference::Remote { package, relative } => {
            if !packages.contains(package) {
                return Err(MappingError::NoSuchPackage {
                    package: package.to_string(),
                    reference: reference.to_string(),
                });
            }
            let target = packages.get(package).map_err(|_| MappingError::NoSuchPackage {
                package: package.to_string(),
                reference: reference.to_string(),
            })?;
            Ok(PathBuf::from(format!(
                "{}/{relative}",
                target.install_path().display()
            )))
        }
    }
}

/// Shared, interior-mutable state behind a [`ResourceMapping`] handle.
///
/// Kept private to this module; other modules that need to hold a
/// non-owning reference to a mapping (namely [`crate::conflict::Conflict`])
/// do so through the opaque [`Weak`] returned by `ResourceMapping::downgrade`.
pub(crate) struct ResourceMappingInner {
    repository_path: RepositoryPath,
    path_references: Vec<String>,
    filesystem_paths: Vec<PathBuf>,
    containing_package: Option<String>,
    load_errors: Vec<MappingError>,
    conflicts: Vec<(RepositoryPath, Conflict)>,
    state: MappingState,
}

/// A mapping from a repository path to one or more path references, plus the
/// load/unload lifecycle and conflict membership that follow from it.
///
/// `ResourceMapping` is a cheap-to-clone handle (an `Rc`) over shared
/// interior-mutable state; clones observe the same underlying mapping, which
/// is what lets [`Conflict`] and [`crate::detector::ConflictDetector`] hold
/// independent references to the same entity.
#[derive(Clone)]
pub struct ResourceMapping(pub(crate) Rc<RefCell<ResourceMappingInner>>);

impl ResourceMapping {
    /// What: Construct a detached (`Unloaded`) mapping.
    ///
    /// Inputs:
    /// - `repository_path`: The repository path this mapping binds.
    /// - `path_references`: One or more raw reference strings, resolved on
    ///   `load`.
    ///
    /// Output:
    /// - A new `ResourceMapping` in the `Unloaded` state.
    ///
    /// Details:
    /// - Validates structure only; filesystem resolution happens in `load`.
    ///
    /// # Errors
    /// Returns [`MappingError::InvalidPath`] if `repository_path` is
    /// malformed, or [`MappingError::InvalidReferences`] if
    /// `path_references` is empty or contains an empty string.
    pub fn new(
        repository_path: impl AsRef<str>,
        path_references: Vec<String>,
    ) -> Result<Self, MappingError> {
        let repository_path = RepositoryPath::new(repository_path)?;
        if path_references.is_empty() {
            return Err(MappingError::InvalidReferences(
                "at least one path reference is required".to_string(),
            ));
        }
        if path_references.iter().any(String::is_empty) {
            return Err(MappingError::InvalidReferences(
                "path references must not be empty strings".to_string(),
            ));
        }
        Ok(Self(Rc::new(RefCell::new(ResourceMappingInner {
            repository_path,
            path_references,
            filesystem_paths: Vec::new(),
            containing_package: None,
            load_errors: Vec::new(),
            conflicts: Vec::new(),
            state: MappingState::Unloaded,
        }))))
    }

    /// What: Report the repository path this mapping binds.
    ///
    /// Inputs: None (reads `self`).
    ///
    /// Output:
    /// - The mapping's repository path.
    ///
    /// Details:
    /// - Immutable after construction.
    #[must_use]
    pub fn repository_path(&self) -> RepositoryPath {
        self.0.borrow().repository_path.clone()
    }

    /// What: Report the raw path references this mapping was constructed
    /// with.
    ///
    /// Inputs: None (reads `self`).
    ///
    /// Output:
    /// - The reference strings, in construction order.
    ///
    /// Details:
    /// - Immutable after construction; `load` resolves these but never
    ///   rewrites them.
    #[must_use]
    pub fn path_references(&self) -> Vec<String> {
        self.0.borrow().path_references.clone()
    }

    /// What: Report the mapping's current lifecycle state.
    ///
    /// Inputs: None (reads `self`).
    ///
    /// Output:
    /// - The current `MappingState`.
    ///
    /// Details:
    /// - Kept in sync by `refresh_state` on every mutation that can affect
    ///   it; never stale between calls.
    #[must_use]
    pub fn state(&self) -> MappingState {
        self.0.borrow().state
    }

    /// What: Report whether the mapping is currently loaded.
    ///
    /// Inputs: None (reads `self`).
    ///
    /// Output:
    /// - `true` for any state but `Unloaded`.
    ///
    /// Details: None beyond the state comparison.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.0.borrow().state != MappingState::Unloaded
    }

    /// What: Report whether the mapping is loaded and `Enabled`.
    ///
    /// Inputs: None (reads `self`).
    ///
    /// Output:
    /// - `true` iff `state() == MappingState::Enabled`.
    ///
    /// Details: None beyond the state comparison.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.state() == MappingState::Enabled
    }

    /// What: Report whether the mapping is loaded and `NotFound`.
    ///
    /// Inputs: None (reads `self`).
    ///
    /// Output:
    /// - `true` iff `state() == MappingState::NotFound`.
    ///
    /// Details: None beyond the state comparison.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.state() == MappingState::NotFound
    }

    /// What: Report whether the mapping is loaded and `Conflict`.
    ///
    /// Inputs: None (reads `self`).
    ///
    /// Output:
    /// - `true` iff `state() == MappingState::Conflict`.
    ///
    /// Details: None beyond the state comparison.
    #[must_use]
    pub fn is_conflicting(&self) -> bool {
        self.state() == MappingState::Conflict
    }

    /// What: Resolve every path reference and transition out of `Unloaded`.
    ///
    /// Inputs:
    /// - `containing_package`: The package local references resolve against.
    /// - `packages`: The collection `@package:` references resolve against.
    /// - `fail_fast`: Whether the first resolution error aborts the load.
    ///
    /// Output:
    /// - `Ok(())`, leaving the mapping `Enabled` or `NotFound`.
    ///
    /// Details:
    /// - References are resolved in input order.
    /// - A `@name:path` reference whose package is unknown produces
    ///   [`MappingError::NoSuchPackage`]; a resolved path that doesn't exist
    ///   on disk produces [`MappingError::FileNotFound`].
    /// - When `fail_fast` is `false` (the default policy), both are
    ///   collected into `load_errors` and resolution continues; when `true`,
    ///   the first such error aborts the load and the mapping is left
    ///   `Unloaded` with no observable side effects.
    ///
    /// # Errors
    /// Returns [`MappingError::AlreadyLoaded`] if the mapping isn't
    /// `Unloaded`. With `fail_fast`, also returns the first
    /// `NoSuchPackage`/`FileNotFound` encountered.
    pub fn load(
        &self,
        containing_package: &dyn Package,
        packages: &dyn PackageCollection,
        fail_fast: bool,
    ) -> Result<(), MappingError> {
        let repository_path = self.repository_path();
        if self.state() != MappingState::Unloaded {
            return Err(MappingError::AlreadyLoaded {
                repository_path: repository_path.to_string(),
            });
        }

        let references = self.path_references();
        let mut filesystem_paths = Vec::with_capacity(references.len());
        let mut load_errors = Vec::new();

        for reference in &references {
            match resolve_reference(reference, containing_package, packages) {
                Ok(resolved) if resolved.exists() => {
                    tracing::debug!(%reference, path = %resolved.display(), "resolved path reference");
                    filesystem_paths.push(resolved);
                }
                Ok(resolved) => {
                    let error = MappingError::FileNotFound {
                        reference: reference.clone(),
                        repository_path: repository_path.to_string(),
                        package: containing_package.name().to_string(),
                        resolved: resolved.display().to_string(),
                    };
                    if fail_fast {
                        return Err(error);
                    }
                    tracing::warn!(%reference, "path reference resolved to a missing file");
                    load_errors.push(error);
                }
                Err(error) => {
                    if fail_fast {
                        return Err(error);
                    }
                    tracing::warn!(%reference, %error, "failed to resolve path reference");
                    load_errors.push(error);
                }
            }
        }

        let mut inner = self.0.borrow_mut();
        inner.filesystem_paths = filesystem_paths;
        inner.load_errors = load_errors;
        inner.containing_package = Some(containing_package.name().to_string());
        drop(inner);
        self.refresh_state();
        Ok(())
    }

    /// What: Detach all conflicts and return the mapping to `Unloaded`.
    ///
    /// Inputs: None (reads and mutates `self`).
    ///
    /// Output:
    /// - `Ok(())`, leaving the mapping `Unloaded` with no resolved paths,
    ///   load errors, or conflicts.
    ///
    /// Details:
    /// - Calls `remove_mapping` on every attached conflict before clearing
    ///   state, so conflict membership never goes stale.
    ///
    /// # Errors
    /// Returns [`MappingError::NotLoaded`] if already `Unloaded`.
    pub fn unload(&self) -> Result<(), MappingError> {
        let repository_path = self.repository_path();
        if self.state() == MappingState::Unloaded {
            return Err(MappingError::NotLoaded {
                repository_path: repository_path.to_string(),
            });
        }

        let snapshot: Vec<Conflict> = {
            let mut inner = self.0.borrow_mut();
            let snapshot = inner.conflicts.iter().map(|(_, c)| c.clone()).collect();
            inner.conflicts.clear();
            snapshot
        };
        for conflict in &snapshot {
            conflict.remove_mapping(self);
        }

        let mut inner = self.0.borrow_mut();
        inner.filesystem_paths.clear();
        inner.load_errors.clear();
        inner.containing_package = None;
        inner.state = MappingState::Unloaded;
        drop(inner);
        tracing::debug!(repository_path = %repository_path, "mapping unloaded");
        Ok(())
    }

    /// What: Attach `conflict` to this mapping.
    ///
    /// Inputs:
    /// - `conflict`: The conflict to attach, keyed by its own repository
    ///   path.
    ///
    /// Output:
    /// - `Ok(())` on success.
    ///
    /// Details:
    /// - If a different conflict already occupies that key, it is detached
    ///   first via its own `remove_mapping`.
    /// - A no-op if `conflict` is already the occupant.
    /// - This is the sole legitimate caller of `Conflict::add_mapping`; see
    ///   that method's documentation.
    ///
    /// # Errors
    /// Returns [`MappingError::NotLoaded`] if unloaded, or
    /// [`MappingError::PathNotWithin`] if `conflict`'s path is not
    /// base-related to this mapping's path.
    pub fn add_conflict(&self, conflict: &Conflict) -> Result<(), MappingError> {
        let repository_path = self.repository_path();
        if self.state() == MappingState::Unloaded {
            return Err(MappingError::NotLoaded {
                repository_path: repository_path.to_string(),
            });
        }

        let conflict_path = conflict.repository_path();
        if !is_base_path(&repository_path, &conflict_path) {
            return Err(MappingError::PathNotWithin {
                conflict_path: conflict_path.to_string(),
                mapping_path: repository_path.to_string(),
            });
        }

        let existing = self
            .0
            .borrow()
            .conflicts
            .iter()
            .find(|(p, _)| *p == conflict_path)
            .map(|(_, c)| c.clone());

        if let Some(existing) = existing {
            if existing == *conflict {
                return Ok(());
            }
            existing.remove_mapping(self);
        }

        {
            let mut inner = self.0.borrow_mut();
            if let Some(entry) = inner.conflicts.iter_mut().find(|(p, _)| *p == conflict_path) {
                entry.1 = conflict.clone();
            } else {
                inner.conflicts.push((conflict_path, conflict.clone()));
            }
        }
        conflict.add_mapping(self);
        self.refresh_state();
        Ok(())
    }

    /// What: Detach `conflict` from this mapping.
    ///
    /// Inputs:
    /// - `conflict`: The conflict to detach.
    ///
    /// Output:
    /// - `Ok(())` on success.
    ///
    /// Details:
    /// - Only detaches `conflict` if it currently occupies its own path's
    ///   slot; a no-op if some other conflict occupies that slot, or none
    ///   does.
    ///
    /// # Errors
    /// Returns [`MappingError::NotLoaded`] if unloaded.
    pub fn remove_conflict(&self, conflict: &Conflict) -> Result<(), MappingError> {
        let repository_path = self.repository_path();
        if self.state() == MappingState::Unloaded {
            return Err(MappingError::NotLoaded {
                repository_path: repository_path.to_string(),
            });
        }

        let path = conflict.repository_path();
        let occupies_slot = self
            .0
            .borrow()
            .conflicts
            .iter()
            .any(|(p, c)| *p == path && c == conflict);

        if occupies_slot {
            self.0.borrow_mut().conflicts.retain(|(p, _)| *p != path);
            conflict.remove_mapping(self);
            self.refresh_state();
        }
        Ok(())
    }

    /// What: Report the resolved filesystem paths.
    ///
    /// Inputs: None (reads `self`).
    ///
    /// Output:
    /// - The resolved paths, in input order.
    ///
    /// Details:
    /// - Only references that both resolved and existed on disk at load
    ///   time are present; failures are in `load_errors` instead.
    ///
    /// # Errors
    /// Returns [`MappingError::NotLoaded`] if unloaded.
    pub fn filesystem_paths(&self) -> Result<Vec<PathBuf>, MappingError> {
        let inner = self.0.borrow();
        if inner.state == MappingState::Unloaded {
            return Err(MappingError::NotLoaded {
                repository_path: inner.repository_path.to_string(),
            });
        }
        Ok(inner.filesystem_paths.clone())
    }

    /// What: Report the soft load errors collected during the last `load`.
    ///
    /// Inputs: None (reads `self`).
    ///
    /// Output:
    /// - The errors collected, in reference order; empty unless `fail_fast`
    ///   was `false` and at least one reference failed.
    ///
    /// Details:
    /// - These are data, not propagated failures; the mapping is still
    ///   `Enabled`/`NotFound`/`Conflict` regardless of their presence.
    ///
    /// # Errors
    /// Returns [`MappingError::NotLoaded`] if unloaded.
    pub fn load_errors(&self) -> Result<Vec<MappingError>, MappingError> {
        let inner = self.0.borrow();
        if inner.state == MappingState::Unloaded {
            return Err(MappingError::NotLoaded {
                repository_path: inner.repository_path.to_string(),
            });
        }
        Ok(inner.load_errors.clone())
    }

    /// What: Report the package this mapping was loaded from.
    ///
    /// Inputs: None (reads `self`).
    ///
    /// Output:
    /// - `Some(name)` of the containing package; always `Some` once loaded.
    ///
    /// Details:
    /// - Set by `load` and cleared by `unload`.
    ///
    /// # Errors
    /// Returns [`MappingError::NotLoaded`] if unloaded.
    pub fn containing_package(&self) -> Result<Option<String>, MappingError> {
        let inner = self.0.borrow();
        if inner.state == MappingState::Unloaded {
            return Err(MappingError::NotLoaded {
                repository_path: inner.repository_path.to_string(),
            });
        }
        Ok(inner.containing_package.clone())
    }

    /// What: List the conflicts attached to this mapping.
    ///
    /// Inputs: None (reads `self`).
    ///
    /// Output:
    /// - The attached conflicts, in insertion order of their repository
    ///   paths.
    ///
    /// Details:
    /// - Populated by `add_conflict` and pruned by `remove_conflict`/
    ///   `unload`.
    ///
    /// # Errors
    /// Returns [`MappingError::NotLoaded`] if unloaded.
    pub fn conflicts(&self) -> Result<Vec<Conflict>, MappingError> {
        let inner = self.0.borrow();
        if inner.state == MappingState::Unloaded {
            return Err(MappingError::NotLoaded {
                repository_path: inner.repository_path.to_string(),
            });
        }
        Ok(inner.conflicts.iter().map(|(_, c)| c.clone()).collect())
    }

    /// What: List every mapping this one conflicts with.
    ///
    /// Inputs: None (reads `self`).
    ///
    /// Output:
    /// - The union of every attached conflict's members, excluding this
    ///   mapping, deduplicated by identity.
    ///
    /// Details:
    /// - Identity, not structural equality, is what's deduplicated — two
    ///   mappings with the same repository path and references are still
    ///   distinct entries if they're distinct handles.
    ///
    /// # Errors
    /// Returns [`MappingError::NotLoaded`] if unloaded.
    pub fn conflicting_mappings(&self) -> Result<Vec<ResourceMapping>, MappingError> {
        let conflicts = self.conflicts()?;
        let mut seen = std::collections::HashSet::new();
        seen.insert(Rc::as_ptr(&self.0) as usize);
        let mut result = Vec::new();
        for conflict in conflicts {
            for mapping in conflict.mappings() {
                let key = Rc::as_ptr(&mapping.0) as usize;
                if seen.insert(key) {
                    result.push(mapping);
                }
            }
        }
        Ok(result)
    }

    /// What: List the packages this mapping conflicts with.
    ///
    /// Inputs: None (reads `self`).
    ///
    /// Output:
    /// - [`Self::conflicting_mappings`] projected through their containing
    ///   packages, deduplicated by name.
    ///
    /// Details:
    /// - A conflicting mapping with no containing package (shouldn't occur
    ///   for a loaded mapping) is silently skipped rather than erroring.
    ///
    /// # Errors
    /// Returns [`MappingError::NotLoaded`] if unloaded.
    pub fn conflicting_packages(&self) -> Result<Vec<String>, MappingError> {
        let mut packages = Vec::new();
        for mapping in self.conflicting_mappings()? {
            if let Some(package) = mapping.containing_package()? {
                if !packages.contains(&package) {
                    packages.push(package);
                }
            }
        }
        Ok(packages)
    }

    /// What: Recompute `state` from current data.
    ///
    /// Inputs: None (reads and mutates `self`).
    ///
    /// Output: None (mutates `state`).
    ///
    /// Details:
    /// - Total, deterministic, infallible function of `conflicts`/
    ///   `filesystem_paths`; callers must only invoke this while loaded.
    fn refresh_state(&self) {
        let mut inner = self.0.borrow_mut();
        inner.state = if !inner.conflicts.is_empty() {
            MappingState::Conflict
        } else if inner.filesystem_paths.is_empty() {
            MappingState::NotFound
        } else {
            MappingState::Enabled
        };
    }

    /// What: Produce a non-owning reference to this mapping.
    ///
    /// Inputs: None (reads `self`).
    ///
    /// Output:
    /// - A `Weak` handle.
    ///
    /// Details:
    /// - Used by [`Conflict`] to track membership without keeping this
    ///   mapping alive past `unload`/drop.
    pub(crate) fn downgrade(&self) -> Weak<RefCell<ResourceMappingInner>> {
        Rc::downgrade(&self.0)
    }

    /// What: Upgrade a weak reference back into a handle.
    ///
    /// Inputs:
    /// - `weak`: A reference previously produced by `downgrade`.
    ///
    /// Output:
    /// - `Some(ResourceMapping)` if the mapping is still alive, `None`
    ///   otherwise.
    ///
    /// Details: None beyond the upgrade itself.
    pub(crate) fn from_weak(weak: &Weak<RefCell<ResourceMappingInner>>) -> Option<Self> {
        weak.upgrade().map(Self)
    }

    /// What: Expose the underlying `Rc` for identity comparisons.
    ///
    /// Inputs: None (reads `self`).
    ///
    /// Output:
    /// - A clone of the underlying `Rc`.
    ///
    /// Details:
    /// - Used by sibling modules (namely [`Conflict`]) that need
    ///   `Rc::ptr_eq` without going through `PartialEq`.
    pub(crate) fn rc(&self) -> Rc<RefCell<ResourceMappingInner>> {
        self.0.clone()
    }
}

impl PartialEq for ResourceMapping {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ResourceMapping {}

impl std::fmt::Debug for ResourceMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.0.borrow();
        f.debug_struct("ResourceMapping")
            .field("repository_path", &inner.repository_path)
            .field("state", &inner.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{PackageRegistry, SimplePackage};
    use tempfile::TempDir;

    fn registry_with(packages: &[(&str, &std::path::Path)]) -> PackageRegistry {
        packages
            .iter()
            .map(|(name, path)| SimplePackage::new(*name, *path))
            .collect()
    }

    #[test]
    fn rejects_empty_references() {
        assert!(ResourceMapping::new("/app", vec![]).is_err());
    }

    #[test]
    fn rejects_empty_reference_string() {
        assert!(ResourceMapping::new("/app", vec![String::new()]).is_err());
    }

    #[test]
    fn load_simple_reference_all_present() {
        let blog = TempDir::new().unwrap();
        std::fs::create_dir(blog.path().join("views")).unwrap();
        let pkg = SimplePackage::new("acme/blog", blog.path());
        let registry = PackageRegistry::new();

        let mapping = ResourceMapping::new("/app", vec!["views".to_string()]).unwrap();
        mapping.load(&pkg, &registry, false).unwrap();

        assert_eq!(mapping.state(), MappingState::Enabled);
        assert_eq!(
            mapping.filesystem_paths().unwrap(),
            vec![blog.path().join("views")]
        );
        assert!(mapping.load_errors().unwrap().is_empty());
    }

    #[test]
    fn load_cross_package_reference() {
        let blog = TempDir::new().unwrap();
        let theme = TempDir::new().unwrap();
        std::fs::create_dir(theme.path().join("assets")).unwrap();

        let blog_pkg = SimplePackage::new("acme/blog", blog.path());
        let registry = registry_with(&[("acme/theme", theme.path())]);

        let mapping =
            ResourceMapping::new("/ui", vec!["@acme/theme:assets".to_string()]).unwrap();
        mapping.load(&blog_pkg, &registry, false).unwrap();

        assert_eq!(
            mapping.filesystem_paths().unwrap(),
            vec![theme.path().join("assets")]
        );
    }

    #[test]
    fn load_missing_file_soft_vs_fail_fast() {
        let blog = TempDir::new().unwrap();
        let pkg = SimplePackage::new("acme/blog", blog.path());
        let registry = PackageRegistry::new();

        let soft = ResourceMapping::new("/app", vec!["views".to_string()]).unwrap();
        soft.load(&pkg, &registry, false).unwrap();
        assert_eq!(soft.state(), MappingState::NotFound);
        assert!(soft.filesystem_paths().unwrap().is_empty());
        assert_eq!(soft.load_errors().unwrap().len(), 1);

        let hard = ResourceMapping::new("/app", vec!["views".to_string()]).unwrap();
        let err = hard.load(&pkg, &registry, true).unwrap_err();
        assert!(matches!(err, MappingError::FileNotFound { .. }));
        assert_eq!(hard.state(), MappingState::Unloaded);
    }

    #[test]
    fn load_unknown_package_soft_vs_fail_fast() {
        let blog = TempDir::new().unwrap();
        let pkg = SimplePackage::new("acme/blog", blog.path());
        let registry = PackageRegistry::new();

        let soft = ResourceMapping::new("/x", vec!["@acme/missing:dir".to_string()]).unwrap();
        soft.load(&pkg, &registry, false).unwrap();
        assert_eq!(soft.state(), MappingState::NotFound);
        assert!(matches!(
            soft.load_errors().unwrap()[0],
            MappingError::NoSuchPackage { .. }
        ));

        let hard = ResourceMapping::new("/x", vec!["@acme/missing:dir".to_string()]).unwrap();
        let err = hard.load(&pkg, &registry, true).unwrap_err();
        assert!(matches!(err, MappingError::NoSuchPackage { .. }));
    }

    #[test]
    fn queries_fail_when_unloaded() {
        let mapping = ResourceMapping::new("/app", vec!["views".to_string()]).unwrap();
        assert!(mapping.filesystem_paths().is_err());
        assert!(mapping.load_errors().is_err());
        assert!(mapping.containing_package().is_err());
        assert!(mapping.conflicts().is_err());
        assert!(mapping.unload().is_err());
    }

    #[test]
    fn already_loaded_rejected() {
        let blog = TempDir::new().unwrap();
        std::fs::create_dir(blog.path().join("views")).unwrap();
        let pkg = SimplePackage::new("acme/blog", blog.path());
        let registry = PackageRegistry::new();

        let mapping = ResourceMapping::new("/app", vec!["views".to_string()]).unwrap();
        mapping.load(&pkg, &registry, false).unwrap();
        let err = mapping.load(&pkg, &registry, false).unwrap_err();
        assert!(matches!(err, MappingError::AlreadyLoaded { .. }));
    }

    #[test]
    fn add_conflict_rejects_unrelated_path() {
        let blog = TempDir::new().unwrap();
        std::fs::create_dir(blog.path().join("views")).unwrap();
        let pkg = SimplePackage::new("acme/blog", blog.path());
        let registry = PackageRegistry::new();

        let mapping = ResourceMapping::new("/app", vec!["views".to_string()]).unwrap();
        mapping.load(&pkg, &registry, false).unwrap();

        let unrelated = Conflict::new(RepositoryPath::new("/other").unwrap());
        let err = mapping.add_conflict(&unrelated).unwrap_err();
        assert!(matches!(err, MappingError::PathNotWithin { .. }));
    }

    #[test]
    fn add_conflict_flips_state_and_unload_clears_it() {
        let blog = TempDir::new().unwrap();
        let theme = TempDir::new().unwrap();
        std::fs::create_dir(blog.path().join("shared")).unwrap();
        std::fs::create_dir(theme.path().join("shared")).unwrap();

        let blog_pkg = SimplePackage::new("acme/blog", blog.path());
        let theme_pkg = SimplePackage::new("acme/theme", theme.path());
        let registry = PackageRegistry::new();

        let m1 = ResourceMapping::new("/shared", vec!["shared".to_string()]).unwrap();
        let m2 = ResourceMapping::new("/shared", vec!["shared".to_string()]).unwrap();
        m1.load(&blog_pkg, &registry, false).unwrap();
        m2.load(&theme_pkg, &registry, false).unwrap();

        let conflict = Conflict::new(RepositoryPath::new("/shared").unwrap());
        m1.add_conflict(&conflict).unwrap();
        m2.add_conflict(&conflict).unwrap();

        assert_eq!(m1.state(), MappingState::Conflict);
        assert_eq!(m2.state(), MappingState::Conflict);
        assert_eq!(conflict.mappings().len(), 2);

        m1.unload().unwrap();
        assert!(m1.conflicts().is_err());
        assert_eq!(conflict.mappings().len(), 1);
        assert!(conflict.is_inert());
    }

    #[test]
    fn conflicting_mappings_dedups_across_multiple_conflicts() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("a")).unwrap();
        let pkg = SimplePackage::new("acme/a", dir.path());
        let registry = PackageRegistry::new();

        let m1 = ResourceMapping::new("/shared", vec!["a".to_string()]).unwrap();
        let m2 = ResourceMapping::new("/shared", vec!["a".to_string()]).unwrap();
        let m3 = ResourceMapping::new("/shared", vec!["a".to_string()]).unwrap();
        for m in [&m1, &m2, &m3] {
            m.load(&pkg, &registry, false).unwrap();
        }

        let conflict = Conflict::new(RepositoryPath::new("/shared").unwrap());
        for m in [&m1, &m2, &m3] {
            m.add_conflict(&conflict).unwrap();
        }

        let others = m1.conflicting_mappings().unwrap();
        assert_eq!(others.len(), 2);
        assert!(others.iter().any(|m| *m == m2));
        assert!(others.iter().any(|m| *m == m3));
    }
}
