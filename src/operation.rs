//! The atomic-operation protocol: execute/rollback command objects for
//! root-package-file edits, composable into a rollback-guaranteed
//! transaction.

use crate::error::MappingError;
use crate::mapping::ResourceMapping;
use crate::root_package_file::RootPackageFile;

/// A single mutation on a [`RootPackageFile`] that can undo itself.
///
/// `rollback` must be safe to call even when `execute` turned out to be a
/// no-op (e.g. removing a key that wasn't present): in that case it does
/// nothing. Callers are expected to call `rollback` at most once per
/// successful `execute`; operations don't need to guard beyond that.
pub trait AtomicOperation {
    /// What: Perform the mutation, capturing whatever state `rollback` needs.
    ///
    /// Inputs:
    /// - `file`: The root package file to mutate.
    ///
    /// Output:
    /// - `Ok(())` on success.
    ///
    /// Details:
    /// - A failing `execute` must leave `file` unchanged so the caller
    ///   doesn't need to roll this step back.
    ///
    /// # Errors
    /// Implementations may fail for operation-specific reasons.
    fn execute(&mut self, file: &mut RootPackageFile) -> Result<(), MappingError>;

    /// What: Reverse the effect of the matching `execute`.
    ///
    /// Inputs:
    /// - `file`: The root package file to mutate back.
    ///
    /// Output: None (mutates `file`).
    ///
    /// Details:
    /// - Uses only state captured by the prior `execute` call; must be safe
    ///   to call even when `execute` turned out to be a no-op.
    fn rollback(&mut self, file: &mut RootPackageFile);
}

/// Remove the mapping at a repository path, if present.
///
/// The canonical atomic operation: on execute, snapshots whatever mapping
/// occupied the path (if any) before removing it; on rollback, reinserts
/// that snapshot. Removing a path with nothing mapped is a no-op whose
/// rollback is also a no-op.
pub struct RemoveMappingFromRootPackageFile {
    repository_path: String,
    undo: Option<ResourceMapping>,
}

impl RemoveMappingFromRootPackageFile {
    /// What: Target the mapping at `repository_path` for removal.
    ///
    /// Inputs:
    /// - `repository_path`: Path of the mapping to remove on `execute`.
    ///
    /// Output:
    /// - A `RemoveMappingFromRootPackageFile` with no captured undo state
    ///   yet.
    ///
    /// Details:
    /// - Capturing the mapping to restore happens in `execute`, not here.
    pub fn new(repository_path: impl Into<String>) -> Self {
        Self {
            repository_path: repository_path.into(),
            undo: None,
        }
    }
}

impl AtomicOperation for RemoveMappingFromRootPackageFile {
    /// What: Remove the mapping at `repository_path`, if present.
    ///
    /// Inputs:
    /// - `file`: The root package file to remove from.
    ///
    /// Output:
    /// - `Ok(())`; always succeeds.
    ///
    /// Details:
    /// - Snapshots whatever mapping occupied the path (if any) into `undo`
    ///   before removing it. Removing an empty path is a no-op whose
    ///   rollback is also a no-op.
    fn execute(&mut self, file: &mut RootPackageFile) -> Result<(), MappingError> {
        self.undo = file.remove_resource_mapping(&self.repository_path);
        Ok(())
    }

    /// What: Reinsert the mapping captured by `execute`, if any.
    ///
    /// Inputs:
    /// - `file`: The root package file to restore the mapping into.
    ///
    /// Output: None (mutates `file`).
    ///
    /// Details:
    /// - A no-op if `execute` captured nothing (the path was already empty)
    ///   or if `rollback` has already consumed the captured mapping.
    fn rollback(&mut self, file: &mut RootPackageFile) {
        if let Some(mapping) = self.undo.take() {
            file.add_resource_mapping(mapping);
        }
    }
}

/// Add (or replace) the mapping at a repository path.
///
/// The dual of [`RemoveMappingFromRootPackageFile`]: on execute, snapshots
/// whatever mapping previously occupied the path (if any) before installing
/// the new one; on rollback, restores that snapshot, or removes the new
/// mapping entirely if the path was previously empty.
pub struct AddMappingToRootPackageFile {
    mapping: Option<ResourceMapping>,
    previous: Option<ResourceMapping>,
}

impl AddMappingToRootPackageFile {
    /// What: Target `mapping` for insertion at its own repository path.
    ///
    /// Inputs:
    /// - `mapping`: The mapping to insert on `execute`.
    ///
    /// Output:
    /// - An `AddMappingToRootPackageFile` with no captured previous-value
    ///   state yet.
    ///
    /// Details:
    /// - Capturing whatever mapping previously occupied the path happens in
    ///   `execute`, not here.
    #[must_use]
    pub fn new(mapping: ResourceMapping) -> Self {
        Self {
            mapping: Some(mapping),
            previous: None,
        }
    }
}

impl AtomicOperation for AddMappingToRootPackageFile {
    /// What: Insert (or replace) the target mapping at its repository path.
    ///
    /// Inputs:
    /// - `file`: The root package file to insert into.
    ///
    /// Output:
    /// - `Ok(())`; always succeeds.
    ///
    /// Details:
    /// - Snapshots whatever mapping previously occupied the path (if any)
    ///   into `previous` before installing the new one.
    /// - A second `execute` call is a no-op: the target mapping was already
    ///   taken by the first call.
    fn execute(&mut self, file: &mut RootPackageFile) -> Result<(), MappingError> {
        let Some(mapping) = self.mapping.take() else {
            return Ok(());
        };
        let repository_path = mapping.repository_path().to_string();
        self.previous = file.get_resource_mapping(&repository_path);
        file.add_resource_mapping(mapping);
        Ok(())
    }

    /// What: Undo the effect of `execute`.
    ///
    /// Inputs:
    /// - `file`: The root package file to restore.
    ///
    /// Output: None (mutates `file`).
    ///
    /// Details:
    /// - Restores whatever mapping `execute` captured in `previous`, or
    ///   removes the newly inserted mapping entirely if the path was
    ///   previously empty.
    /// - A no-op if `execute` never ran (`self.mapping` is still `Some`).
    fn rollback(&mut self, file: &mut RootPackageFile) {
        let Some(mapping) = &self.mapping else {
            return;
        };
        let repository_path = mapping.repository_path().to_string();
        match self.previous.take() {
            Some(previous) => file.add_resource_mapping(previous),
            None => {
                file.remove_resource_mapping(&repository_path);
            }
        }
    }
}

/// A sequence of [`AtomicOperation`]s executed in order, rolled back in
/// reverse order from the first failure.
///
/// Execute/rollback of a transaction must not be interleaved with other
/// mutations on the same [`RootPackageFile`]; serializing that is the
/// orchestrator's responsibility, not this type's.
#[derive(Default)]
pub struct Transaction {
    operations: Vec<Box<dyn AtomicOperation>>,
}

impl Transaction {
    /// What: Build an empty transaction.
    ///
    /// Inputs: None.
    ///
    /// Output:
    /// - A `Transaction` with no operations queued.
    ///
    /// Details:
    /// - Equivalent to `Transaction::default()`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// What: Append an operation to the end of the sequence.
    ///
    /// Inputs:
    /// - `operation`: The operation to queue.
    ///
    /// Output:
    /// - `&mut Self`, for chaining further `push` calls.
    ///
    /// Details:
    /// - Operations execute in push order and roll back in reverse order.
    pub fn push(&mut self, operation: Box<dyn AtomicOperation>) -> &mut Self {
        self.operations.push(operation);
        self
    }

    /// What: Execute every queued operation in order.
    ///
    /// Inputs:
    /// - `file`: The root package file to mutate.
    ///
    /// Output:
    /// - `Ok(())` if every operation succeeded.
    ///
    /// Details:
    /// - On the first failure, rolls back every already-completed step in
    ///   reverse order before returning; `file` is left as if the
    ///   transaction had never run.
    ///
    /// # Errors
    /// Returns the error from the first operation whose `execute` fails.
    pub fn execute(&mut self, file: &mut RootPackageFile) -> Result<(), MappingError> {
        let mut completed = 0;
        for operation in &mut self.operations {
            match operation.execute(file) {
                Ok(()) => completed += 1,
                Err(error) => {
                    tracing::warn!(
                        step = completed,
                        %error,
                        "transaction step failed, rolling back completed steps"
                    );
                    for operation in self.operations[..completed].iter_mut().rev() {
                        operation.rollback(file);
                    }
                    return Err(error);
                }
            }
        }
        Ok(())
    }
}
