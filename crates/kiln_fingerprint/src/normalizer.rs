//! Normalization strategies and the fingerprinter capability.
//!
//! A normalizer decides which part of an entry's location belongs in the
//! fingerprint. Moving a project directory changes every `absolute-path`
//! fingerprint but none of the `relative-path` ones; renaming a jar changes a
//! `name-only` fingerprint but not a `classpath` one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FingerprintError;
use crate::file_set::{FileKind, FileSet, RootSnapshot, SnapshotEntry};
use crate::fingerprint::{Fingerprint, FingerprintEntry};

/// Tag naming a normalization strategy, chosen by a property declaration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizerSelector(String);

impl NormalizerSelector {
    /// Selector for [`NormalizationPolicy::AbsolutePath`].
    pub const ABSOLUTE_PATH: &'static str = "absolute-path";
    /// Selector for [`NormalizationPolicy::RelativePath`].
    pub const RELATIVE_PATH: &'static str = "relative-path";
    /// Selector for [`NormalizationPolicy::NameOnly`].
    pub const NAME_ONLY: &'static str = "name-only";
    /// Selector for [`NormalizationPolicy::IgnoreDirectories`].
    pub const IGNORE_DIRECTORIES: &'static str = "ignore-directories";
    /// Selector for [`NormalizationPolicy::Classpath`].
    pub const CLASSPATH: &'static str = "classpath";
    /// Selector for [`NormalizationPolicy::IgnoredPath`].
    pub const IGNORED_PATH: &'static str = "ignored-path";

    /// Creates a selector from any tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Returns the tag text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizerSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NormalizerSelector {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// Fingerprints a file collection under one fixed normalization policy.
///
/// Implementations must be deterministic: the same on-disk content and the
/// same file set always produce an equal [`Fingerprint`]. An empty file set
/// produces an empty fingerprint, never an error.
pub trait FileCollectionFingerprinter: Send + Sync {
    /// Returns the selector this fingerprinter is registered under.
    fn normalizer(&self) -> NormalizerSelector;

    /// Reads the file set and returns its fingerprint.
    fn fingerprint(&self, files: &FileSet) -> Result<Fingerprint, FingerprintError>;
}

/// The built-in path normalization policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NormalizationPolicy {
    /// Identity is the full path as declared.
    AbsolutePath,
    /// Identity is the path relative to the containing root.
    RelativePath,
    /// Identity is the final path component.
    NameOnly,
    /// Like [`RelativePath`](Self::RelativePath) with directory entries dropped.
    IgnoreDirectories,
    /// Root order is significant; directories and missing roots are dropped and
    /// file roots contribute only their content.
    Classpath,
    /// Content only; every file has an empty identity.
    IgnoredPath,
}

impl NormalizationPolicy {
    /// All built-in policies.
    pub const ALL: [NormalizationPolicy; 6] = [
        NormalizationPolicy::AbsolutePath,
        NormalizationPolicy::RelativePath,
        NormalizationPolicy::NameOnly,
        NormalizationPolicy::IgnoreDirectories,
        NormalizationPolicy::Classpath,
        NormalizationPolicy::IgnoredPath,
    ];

    /// Returns the selector tag for this policy.
    pub fn selector(self) -> &'static str {
        match self {
            NormalizationPolicy::AbsolutePath => NormalizerSelector::ABSOLUTE_PATH,
            NormalizationPolicy::RelativePath => NormalizerSelector::RELATIVE_PATH,
            NormalizationPolicy::NameOnly => NormalizerSelector::NAME_ONLY,
            NormalizationPolicy::IgnoreDirectories => NormalizerSelector::IGNORE_DIRECTORIES,
            NormalizationPolicy::Classpath => NormalizerSelector::CLASSPATH,
            NormalizationPolicy::IgnoredPath => NormalizerSelector::IGNORED_PATH,
        }
    }

    /// Whether entries keep root order instead of being sorted.
    pub fn is_order_sensitive(self) -> bool {
        matches!(self, NormalizationPolicy::Classpath)
    }

    /// Maps one snapshot entry to its normalized identity, or `None` to drop it.
    fn normalize_entry(self, entry: &SnapshotEntry) -> Option<String> {
        match self {
            NormalizationPolicy::AbsolutePath => {
                Some(entry.absolute_path.to_string_lossy().into_owned())
            }
            NormalizationPolicy::RelativePath => Some(entry.relative_path.clone()),
            NormalizationPolicy::NameOnly => Some(entry.file_name()),
            NormalizationPolicy::IgnoreDirectories => match entry.kind {
                FileKind::Directory => None,
                _ => Some(entry.relative_path.clone()),
            },
            NormalizationPolicy::Classpath => match entry.kind {
                FileKind::Directory | FileKind::Missing => None,
                FileKind::File if entry.is_root => Some(String::new()),
                FileKind::File => Some(entry.relative_path.clone()),
            },
            NormalizationPolicy::IgnoredPath => match entry.kind {
                FileKind::Directory => None,
                _ => Some(String::new()),
            },
        }
    }

    /// Normalizes snapshots into a fingerprint.
    ///
    /// Order-sensitive policies keep the declared root order and sort only
    /// within each root, by normalized path.
    pub fn apply(self, snapshots: &[RootSnapshot]) -> Fingerprint {
        if !self.is_order_sensitive() {
            let entries = snapshots
                .iter()
                .flat_map(|snapshot| self.normalize_root(snapshot))
                .collect();
            return Fingerprint::from_unordered(entries);
        }

        let mut entries = Vec::new();
        for snapshot in snapshots {
            let mut root_entries = self.normalize_root(snapshot);
            root_entries.sort();
            entries.extend(root_entries);
        }
        Fingerprint::from_ordered(entries)
    }

    fn normalize_root(self, snapshot: &RootSnapshot) -> Vec<FingerprintEntry> {
        snapshot
            .entries
            .iter()
            .filter_map(|entry| {
                self.normalize_entry(entry)
                    .map(|normalized_path| FingerprintEntry {
                        normalized_path,
                        kind: entry.kind,
                        content_hash: entry.content_hash,
                    })
            })
            .collect()
    }
}

/// A fingerprinter that snapshots the file set and applies a built-in policy.
#[derive(Debug, Clone, Copy)]
pub struct NormalizingFingerprinter {
    policy: NormalizationPolicy,
}

impl NormalizingFingerprinter {
    /// Creates a fingerprinter for the given policy.
    pub fn new(policy: NormalizationPolicy) -> Self {
        Self { policy }
    }

    /// Returns the policy this fingerprinter applies.
    pub fn policy(&self) -> NormalizationPolicy {
        self.policy
    }
}

impl FileCollectionFingerprinter for NormalizingFingerprinter {
    fn normalizer(&self) -> NormalizerSelector {
        NormalizerSelector::new(self.policy.selector())
    }

    fn fingerprint(&self, files: &FileSet) -> Result<Fingerprint, FingerprintError> {
        if files.is_empty() {
            return Ok(Fingerprint::empty());
        }
        let snapshots = files.snapshot()?;
        Ok(self.policy.apply(&snapshots))
    }
}
