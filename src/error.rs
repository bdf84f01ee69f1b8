//! Unified error type for the resource mapping core.

use thiserror::Error;

/// Unified error type for all resource-mapping-core operations.
///
/// Every variant corresponds to one row of the error surface: construction
/// errors are raised unconditionally, load errors are either propagated
/// (`fail_fast`) or cached verbatim as data on a mapping's `load_errors`, and
/// the remaining variants are programmer errors raised by misuse of the
/// state machine or conflict graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// Repository path is not absolute, contains `.`/`..` segments, has a
    /// trailing slash other than the root, or is otherwise malformed.
    #[error("invalid repository path `{0}`")]
    InvalidPath(String),

    /// Path reference set was empty, or one of its entries was empty.
    #[error("invalid path references: {0}")]
    InvalidReferences(String),

    /// `load` was called on a mapping that is already loaded.
    #[error("mapping for `{repository_path}` is already loaded")]
    AlreadyLoaded {
        /// Repository path of the mapping.
        repository_path: String,
    },

    /// A query, conflict operation, or `unload` was called on a mapping that
    /// is not currently loaded.
    #[error("mapping for `{repository_path}` is not loaded")]
    NotLoaded {
        /// Repository path of the mapping.
        repository_path: String,
    },

    /// A `@package:path` reference named a package the registry doesn't know.
    #[error("reference `{reference}` names unknown package `{package}`")]
    NoSuchPackage {
        /// Name of the package that could not be found.
        package: String,
        /// The reference that named it.
        reference: String,
    },

    /// A resolved filesystem path does not exist.
    #[error(
        "reference `{reference}` for repository path `{repository_path}` in package `{package}` resolved to missing path `{resolved}`"
    )]
    FileNotFound {
        /// The reference that was resolved.
        reference: String,
        /// Repository path of the mapping that owns the reference.
        repository_path: String,
        /// Containing package name.
        package: String,
        /// The resolved absolute path that was missing.
        resolved: String,
    },

    /// `add_conflict` was called with a conflict whose path is not
    /// base-related to the mapping's own repository path.
    #[error("conflict path `{conflict_path}` is not within mapping path `{mapping_path}`")]
    PathNotWithin {
        /// The conflict's repository path.
        conflict_path: String,
        /// The mapping's repository path.
        mapping_path: String,
    },
}

/// Result type alias for resource-mapping-core operations.
pub type Result<T> = std::result::Result<T, MappingError>;
