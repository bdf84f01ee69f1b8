//! `ConflictDetector`: scans a set of loaded mappings and (re)computes the
//! conflicts implied by their repository paths.

use std::collections::{HashMap, HashSet};

use crate::conflict::Conflict;
use crate::mapping::ResourceMapping;

/// Computes and tracks [`Conflict`]s across repeated scans of a mapping set.
///
/// A detector is stateful: it remembers which repository paths it has
/// already attached a conflict for, so that a later scan in which a path
/// drops back below two claimants can detach that conflict from its
/// remaining member (rather than leaving a stale, inert conflict object
/// floating with nothing pointing a detector back at it).
#[derive(Default)]
pub struct ConflictDetector {
    tracked: HashMap<String, Conflict>,
}

impl ConflictDetector {
    /// What: Build a detector with no tracked conflicts.
    ///
    /// Inputs: None.
    ///
    /// Output:
    /// - An empty `ConflictDetector`.
    ///
    /// Details:
    /// - Equivalent to `ConflictDetector::default()`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// What: Recompute conflicts over a snapshot of mappings.
    ///
    /// Inputs:
    /// - `mappings`: The mappings to scan; unloaded entries are ignored.
    ///
    /// Output:
    /// - The conflicts still active after this scan, in arbitrary order.
    ///
    /// Details:
    /// - For every repository path claimed by two or more loaded mappings,
    ///   reuses or creates a [`Conflict`] and reconciles its membership to
    ///   exactly the current claimant set via `add_conflict`/`remove_conflict`.
    /// - Any previously tracked path that no longer qualifies has
    ///   `remove_conflict` called on all of its members and is dropped from
    ///   tracking.
    /// - Conflicts are keyed by repository path only, so two independent
    ///   scans of the same mapping snapshot always agree on (path,
    ///   member-set) content even if they disagree on order.
    pub fn refresh(&mut self, mappings: &[ResourceMapping]) -> Vec<Conflict> {
        let mut claimants: HashMap<String, Vec<ResourceMapping>> = HashMap::new();
        for mapping in mappings {
            if !mapping.is_loaded() {
                continue;
            }
            claimants
                .entry(mapping.repository_path().to_string())
                .or_default()
                .push(mapping.clone());
        }

        let mut active_paths = HashSet::new();

        for (path, current) in &claimants {
            if current.len() < 2 {
                continue;
            }
            active_paths.insert(path.clone());

            let repository_path = current[0].repository_path();
            let conflict = self
                .tracked
                .entry(path.clone())
                .or_insert_with(|| Conflict::new(repository_path))
                .clone();

            let previous_members = conflict.mappings();

            for mapping in current {
                if !previous_members.contains(mapping) {
                    // Safe to ignore: these mappings are loaded and the
                    // conflict's path equals their own, which is always
                    // base-related to itself.
                    let _ = mapping.add_conflict(&conflict);
                }
            }
            for mapping in &previous_members {
                if !current.contains(mapping) {
                    let _ = mapping.remove_conflict(&conflict);
                }
            }
        }

        let stale_paths: Vec<String> = self
            .tracked
            .keys()
            .filter(|path| !active_paths.contains(*path))
            .cloned()
            .collect();

        for path in stale_paths {
            if let Some(conflict) = self.tracked.remove(&path) {
                for mapping in conflict.mappings() {
                    let _ = mapping.remove_conflict(&conflict);
                }
            }
        }

        tracing::info!(active = active_paths.len(), "conflict detector refresh complete");
        self.tracked.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::MappingState;
    use crate::package::{PackageRegistry, SimplePackage};
    use tempfile::TempDir;

    #[test]
    fn detects_conflict_between_two_packages() {
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

        let mut detector = ConflictDetector::new();
        let conflicts = detector.refresh(&[m1.clone(), m2.clone()]);

        assert_eq!(conflicts.len(), 1);
        assert_eq!(m1.state(), MappingState::Conflict);
        assert_eq!(m2.state(), MappingState::Conflict);
    }

    #[test]
    fn unloading_one_side_resolves_the_conflict() {
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

        let mut detector = ConflictDetector::new();
        detector.refresh(&[m1.clone(), m2.clone()]);
        assert_eq!(m1.state(), MappingState::Conflict);

        m1.unload().unwrap();
        let conflicts = detector.refresh(&[m1.clone(), m2.clone()]);

        assert!(conflicts.is_empty());
        assert_eq!(m2.state(), MappingState::Enabled);
    }

    #[test]
    fn no_conflict_for_distinct_paths() {
        let blog = TempDir::new().unwrap();
        std::fs::create_dir(blog.path().join("views")).unwrap();
        std::fs::create_dir(blog.path().join("assets")).unwrap();
        let pkg = SimplePackage::new("acme/blog", blog.path());
        let registry = PackageRegistry::new();

        let m1 = ResourceMapping::new("/views", vec!["views".to_string()]).unwrap();
        let m2 = ResourceMapping::new("/assets", vec!["assets".to_string()]).unwrap();
        m1.load(&pkg, &registry, false).unwrap();
        m2.load(&pkg, &registry, false).unwrap();

        let mut detector = ConflictDetector::new();
        let conflicts = detector.refresh(&[m1.clone(), m2.clone()]);

        assert!(conflicts.is_empty());
        assert_eq!(m1.state(), MappingState::Enabled);
        assert_eq!(m2.state(), MappingState::Enabled);
    }

    #[test]
    fn repeated_scans_of_same_snapshot_agree_on_content() {
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

        let mut detector = ConflictDetector::new();
        let first = detector.refresh(&[m1.clone(), m2.clone()]);
        let second = detector.refresh(&[m1.clone(), m2.clone()]);

        assert_eq!(first.len(), second.len());
        assert_eq!(
            first[0].repository_path(),
            second[0].repository_path()
        );
    }
}
