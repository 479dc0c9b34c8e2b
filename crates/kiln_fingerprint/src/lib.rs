//! File collection fingerprinting for incremental builds.
//!
//! A work unit declares its file inputs as [`PropertySpec`]s. Each property
//! names a normalization strategy; the [`NormalizerRegistry`] maps that name to
//! a [`FileCollectionFingerprinter`], which snapshots the property's files into
//! an immutable [`Fingerprint`]. The [`WorkFingerprinter`] runs this for every
//! property of a work unit and assembles the results into a name-sorted
//! [`CacheKeyMap`], the value compared against a previous build to decide
//! whether the work must run again.

#![warn(missing_docs)]

pub mod cache_key;
pub mod error;
pub mod file_set;
pub mod fingerprint;
pub mod normalizer;
pub mod property;
pub mod registry;
pub mod work;

pub use cache_key::{CacheKeyMap, PropertyChanges};
pub use error::FingerprintError;
pub use file_set::{FileKind, FileSet, RootSnapshot, SnapshotEntry};
pub use fingerprint::{Fingerprint, FingerprintEntry};
pub use normalizer::{
    FileCollectionFingerprinter, NormalizationPolicy, NormalizerSelector, NormalizingFingerprinter,
};
pub use property::{PropertySpec, ValidationAction};
pub use registry::{NormalizerRegistry, NormalizerRegistryBuilder};
pub use work::WorkFingerprinter;
