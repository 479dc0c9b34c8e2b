//! Immutable fingerprints of normalized file collections.

use kiln_common::{ContentHash, HashBuilder};
use serde::{Deserialize, Serialize};

use crate::file_set::FileKind;

/// One normalized entry of a fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FingerprintEntry {
    /// The path identity produced by the normalizer.
    pub normalized_path: String,
    /// Entry kind.
    pub kind: FileKind,
    /// Content digest (or kind signature for directories and missing roots).
    pub content_hash: ContentHash,
}

/// Snapshot of one file collection under one normalization policy.
///
/// Entries are held in their final order and the combined [`hash`](Self::hash)
/// covers that sequence. Two fingerprints are equal exactly when both their
/// entries and combined hash match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    entries: Vec<FingerprintEntry>,
    hash: ContentHash,
}

impl Fingerprint {
    /// Returns the fingerprint of an empty file collection.
    pub fn empty() -> Self {
        Self::from_ordered(Vec::new())
    }

    /// Builds a fingerprint after sorting entries by path, kind, and digest.
    pub fn from_unordered(mut entries: Vec<FingerprintEntry>) -> Self {
        entries.sort();
        Self::from_ordered(entries)
    }

    /// Builds a fingerprint keeping entries in the order given.
    ///
    /// Only order-sensitive normalizers should call this directly.
    pub fn from_ordered(entries: Vec<FingerprintEntry>) -> Self {
        let mut builder = HashBuilder::new();
        builder.put_u64(entries.len() as u64);
        for entry in &entries {
            builder
                .put_str(&entry.normalized_path)
                .put_u8(entry.kind.tag())
                .put_hash(&entry.content_hash);
        }
        Self {
            hash: builder.finish(),
            entries,
        }
    }

    /// Returns the entries in fingerprint order.
    pub fn entries(&self) -> &[FingerprintEntry] {
        &self.entries
    }

    /// Returns the combined digest of all entries.
    pub fn hash(&self) -> ContentHash {
        self.hash
    }

    /// Returns `true` if the fingerprint has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self::empty()
    }
}
