//! Mapping/conflict/transaction core for composing a repository namespace
//! out of filesystem directories spread across installed packages.
//!
//! A [`mapping::ResourceMapping`] binds a repository path (e.g. `/app/views`)
//! to one or more path references, each resolved either into the mapping's
//! containing package or, via an `@vendor/name:` prefix, into any other
//! package known to a [`package::PackageCollection`]. When two packages'
//! mappings claim an overlapping repository path, a
//! [`detector::ConflictDetector`] records that as a first-class
//! [`conflict::Conflict`], and every affected mapping's state reflects it.
//! Mutations to a [`root_package_file::RootPackageFile`] go through the
//! [`operation::AtomicOperation`] protocol, so a failing multi-step edit
//! leaves the in-memory model exactly as it found it.
//!
//! What this crate does *not* do: read or write the package file to disk,
//! discover packages on the filesystem, watch for changes, persist conflict
//! state, or serve the composed namespace to clients. Those are external
//! collaborators; this crate defines the shapes they plug into.
//!
//! # Example
//!
//! ```
//! use resource_mapping_core::detector::ConflictDetector;
//! use resource_mapping_core::mapping::ResourceMapping;
//! use resource_mapping_core::package::{PackageRegistry, SimplePackage};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let tmp = tempfile::TempDir::new()?;
//! # std::fs::create_dir(tmp.path().join("views"))?;
//! let blog = SimplePackage::new("acme/blog", tmp.path());
//! let packages = PackageRegistry::new();
//!
//! let mapping = ResourceMapping::new("/app", vec!["views".to_string()])?;
//! mapping.load(&blog, &packages, false)?;
//! assert!(mapping.is_enabled());
//!
//! let mut detector = ConflictDetector::new();
//! let conflicts = detector.refresh(&[mapping]);
//! assert!(conflicts.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod conflict;
pub mod detector;
pub mod error;
pub mod mapping;
pub mod operation;
pub mod package;
pub mod path;
pub mod root_package_file;

pub use conflict::Conflict;
pub use detector::ConflictDetector;
pub use error::{MappingError as Error, Result};
pub use mapping::{MappingState, ResourceMapping};
pub use operation::{
    AddMappingToRootPackageFile, AtomicOperation, RemoveMappingFromRootPackageFile, Transaction,
};
pub use package::{Package, PackageCollection, PackageRegistry, SimplePackage};
pub use path::{RepositoryPath, is_base_path};
pub use root_package_file::{MappingRecord, RootPackageFile};
