//! Error types for fingerprinting operations.

use std::path::PathBuf;

/// Errors that can occur while fingerprinting a work unit's file properties.
///
/// Every variant aborts the whole fingerprinting request. A partially built
/// cache key is never returned, so callers can treat any error as "this work
/// unit has no valid cache key right now" and pick their own recovery.
#[derive(Debug, thiserror::Error)]
pub enum FingerprintError {
    /// A property names a normalizer that has no registered fingerprinter.
    #[error("no fingerprinter registered for normalizer '{selector}' (property '{property}')")]
    UnregisteredNormalizer {
        /// The unresolved normalizer selector.
        selector: String,
        /// The property that referenced it.
        property: String,
    },

    /// Two properties of the same work unit share a name.
    #[error("duplicate property name '{name}' declared by {owner}")]
    DuplicatePropertyName {
        /// Display name of the work unit that declared the properties.
        owner: String,
        /// The repeated property name.
        name: String,
    },

    /// A file or directory could not be read while computing a fingerprint.
    #[error("failed to read {path} while fingerprinting: {source}")]
    FileReadFailure {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

impl FingerprintError {
    pub(crate) fn read_failure(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileReadFailure {
            path: path.into(),
            source,
        }
    }
}
