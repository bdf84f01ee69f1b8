//! `RepositoryPathConflict`: the bipartite edge between a repository path and
//! the mappings that claim it.
//!
//! A conflict is shared between its member mappings; lifetime is governed by
//! whichever mapping still holds it. The conflict's own member set is
//! back-reference-only (via [`Weak`]) so that holding a conflict never keeps
//! a mapping alive past `unload`. Mutating that member set is the
//! responsibility of the owning mapping's `add_conflict`/`remove_conflict` —
//! see [`crate::mapping::ResourceMapping`] — not of this type directly.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::mapping::{ResourceMapping, ResourceMappingInner};
use crate::path::RepositoryPath;

struct ConflictInner {
    repository_path: RepositoryPath,
    mappings: Vec<Weak<RefCell<ResourceMappingInner>>>,
}

/// A shared handle to a conflict: two or more mappings claiming the same
/// repository path.
///
/// Cloning a `Conflict` clones the handle (cheap, reference-counted), not the
/// underlying conflict; clones observe the same membership.
#[derive(Clone)]
pub struct Conflict(Rc<RefCell<ConflictInner>>);

impl Conflict {
    /// What: Create a new, empty conflict at the given repository path.
    ///
    /// Inputs:
    /// - `repository_path`: The path this conflict is anchored at.
    ///
    /// Output:
    /// - A `Conflict` handle with no members.
    ///
    /// Details:
    /// - An empty conflict is inert; callers attach members via the owning
    ///   mapping's `add_conflict`, not directly.
    #[must_use]
    pub fn new(repository_path: RepositoryPath) -> Self {
        Self(Rc::new(RefCell::new(ConflictInner {
            repository_path,
            mappings: Vec::new(),
        })))
    }

    /// What: Report the repository path this conflict is anchored at.
    ///
    /// Inputs: None (reads `self`).
    ///
    /// Output:
    /// - The conflict's repository path.
    ///
    /// Details:
    /// - Immutable for the conflict's lifetime.
    #[must_use]
    pub fn repository_path(&self) -> RepositoryPath {
        self.0.borrow().repository_path.clone()
    }

    /// What: Insert a mapping into this conflict's member set.
    ///
    /// Inputs:
    /// - `mapping`: The mapping to add.
    ///
    /// Output: None (mutates `self`).
    ///
    /// Details:
    /// - Idempotent: adding an already-present mapping is a no-op.
    /// - Does not touch the mapping's own `conflicts` map — the caller
    ///   (`ResourceMapping::add_conflict`) is responsible for that half of
    ///   the bipartite edge.
    /// - `pub(crate)` rather than `pub`: `ResourceMapping` is the sole
    ///   legitimate caller. Calling this directly from outside the crate
    ///   would desync the bipartite graph (a mapping would appear in
    ///   `conflict.mappings()` with nothing in its own `conflicts` pointing
    ///   back).
    pub(crate) fn add_mapping(&self, mapping: &ResourceMapping) {
        let mut inner = self.0.borrow_mut();
        self.prune(&mut inner.mappings);
        let already_present = inner
            .mappings
            .iter()
            .any(|weak| is_same_mapping(weak, mapping));
        if !already_present {
            inner.mappings.push(mapping.downgrade());
        }
    }

    /// What: Remove a mapping from this conflict's member set.
    ///
    /// Inputs:
    /// - `mapping`: The mapping to remove.
    ///
    /// Output: None (mutates `self`).
    ///
    /// Details:
    /// - Idempotent: removing an absent mapping is a no-op.
    /// - `pub(crate)` for the same reason as `add_mapping`: only
    ///   `ResourceMapping` may call it.
    pub(crate) fn remove_mapping(&self, mapping: &ResourceMapping) {
        let mut inner = self.0.borrow_mut();
        inner
            .mappings
            .retain(|weak| !is_same_mapping(weak, mapping));
        self.prune(&mut inner.mappings);
    }

    /// What: List the conflict's current, live members.
    ///
    /// Inputs: None (reads `self`).
    ///
    /// Output:
    /// - Member mappings still alive, in insertion order.
    ///
    /// Details:
    /// - A member whose `Rc` has been dropped (unloaded and discarded) is
    ///   silently excluded rather than surfaced as an error.
    #[must_use]
    pub fn mappings(&self) -> Vec<ResourceMapping> {
        self.0
            .borrow()
            .mappings
            .iter()
            .filter_map(ResourceMapping::from_weak)
            .collect()
    }

    /// What: Report whether this conflict should be discarded.
    ///
    /// Inputs: None (reads `self`).
    ///
    /// Output:
    /// - `true` when fewer than two mappings currently claim this conflict.
    ///
    /// Details:
    /// - A detector uses this to decide when to detach a conflict from its
    ///   last remaining member.
    #[must_use]
    pub fn is_inert(&self) -> bool {
        self.mappings().len() < 2
    }

    /// What: Drop dead weak references from the member list.
    ///
    /// Inputs:
    /// - `mappings`: The member list to prune in place.
    ///
    /// Output: None (mutates `mappings`).
    ///
    /// Details:
    /// - A reference is dead once its mapping has been unloaded and
    ///   dropped; `Weak::strong_count` distinguishes live from dead.
    fn prune(&self, mappings: &mut Vec<Weak<RefCell<ResourceMappingInner>>>) {
        mappings.retain(|weak| weak.strong_count() > 0);
    }
}

impl PartialEq for Conflict {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Conflict {}

impl std::fmt::Debug for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conflict")
            .field("repository_path", &self.repository_path())
            .field("member_count", &self.mappings().len())
            .finish()
    }
}

/// What: Test whether a weak member reference points at `mapping`.
///
/// Inputs:
/// - `weak`: A member reference from a conflict's internal list.
/// - `mapping`: The mapping to compare identity against.
///
/// Output:
/// - `true` if `weak` upgrades and is the same `Rc` as `mapping`.
///
/// Details:
/// - A dead `weak` (already dropped) compares unequal rather than panicking.
fn is_same_mapping(weak: &Weak<RefCell<ResourceMappingInner>>, mapping: &ResourceMapping) -> bool {
    weak.upgrade()
        .is_some_and(|rc| Rc::ptr_eq(&rc, &mapping.rc()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::ResourceMapping;

    #[test]
    fn add_mapping_is_idempotent() {
        let conflict = Conflict::new(RepositoryPath::new("/shared").unwrap());
        let mapping = ResourceMapping::new("/shared", vec!["views".to_string()]).unwrap();

        conflict.add_mapping(&mapping);
        conflict.add_mapping(&mapping);
        assert_eq!(conflict.mappings().len(), 1);
    }

    #[test]
    fn remove_mapping_is_idempotent() {
        let conflict = Conflict::new(RepositoryPath::new("/shared").unwrap());
        let mapping = ResourceMapping::new("/shared", vec!["views".to_string()]).unwrap();

        conflict.add_mapping(&mapping);
        conflict.remove_mapping(&mapping);
        conflict.remove_mapping(&mapping);
        assert!(conflict.mappings().is_empty());
    }

    #[test]
    fn inert_below_two_members() {
        let conflict = Conflict::new(RepositoryPath::new("/shared").unwrap());
        let m1 = ResourceMapping::new("/shared", vec!["a".to_string()]).unwrap();
        let m2 = ResourceMapping::new("/shared", vec!["b".to_string()]).unwrap();

        assert!(conflict.is_inert());
        conflict.add_mapping(&m1);
        assert!(conflict.is_inert());
        conflict.add_mapping(&m2);
        assert!(!conflict.is_inert());
    }
}
