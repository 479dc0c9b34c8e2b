//! File sets and their on-disk snapshots.
//!
//! A [`FileSet`] is the resolved value of one declared file property: a list
//! of root paths, each either a file or a directory tree. Snapshotting walks
//! the roots and records every entry with its kind and content digest. Walk
//! order is sorted by file name at every level, so the result never depends on
//! the order the operating system lists directory contents in.

use std::path::{Path, PathBuf};

use kiln_common::ContentHash;
use serde::{Deserialize, Serialize};

use crate::error::FingerprintError;

/// Marker digested in place of content for directory entries.
const DIRECTORY_SIGNATURE: &[u8] = b"kiln:directory";

/// Marker digested in place of content for roots that do not exist.
const MISSING_SIGNATURE: &[u8] = b"kiln:missing";

/// The kind of a snapshotted file system entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileKind {
    /// A regular file; its digest covers the file content.
    File,
    /// A directory; its digest is a fixed signature.
    Directory,
    /// A declared root that does not exist.
    Missing,
}

impl FileKind {
    /// Returns a stable single-byte tag used when combining digests.
    pub fn tag(self) -> u8 {
        match self {
            FileKind::File => 0,
            FileKind::Directory => 1,
            FileKind::Missing => 2,
        }
    }
}

/// The resolved files of one declared property.
///
/// Roots are kept in declaration order. Most normalizers sort entries by
/// their normalized path, but order-sensitive ones (such as `classpath`) use
/// the root order as part of the fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    roots: Vec<PathBuf>,
}

impl FileSet {
    /// Creates an empty file set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a root path.
    pub fn push(&mut self, root: impl Into<PathBuf>) {
        self.roots.push(root.into());
    }

    /// Returns the roots in declaration order.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Returns `true` if the set declares no roots.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Returns the number of declared roots.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Walks every root and records its entries.
    ///
    /// A root that does not exist produces a single [`FileKind::Missing`]
    /// entry. Any other I/O error aborts the snapshot.
    pub fn snapshot(&self) -> Result<Vec<RootSnapshot>, FingerprintError> {
        self.roots.iter().map(|root| snapshot_root(root)).collect()
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for FileSet {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self {
            roots: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// One entry discovered while walking a root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    /// Full path of the entry as declared (not canonicalized).
    pub absolute_path: PathBuf,
    /// Path relative to the root, `/`-separated.
    ///
    /// A file root uses its own file name; a directory root uses `""`.
    pub relative_path: String,
    /// Entry kind.
    pub kind: FileKind,
    /// Content digest for files, a fixed signature otherwise.
    pub content_hash: ContentHash,
    /// Whether this entry is the root itself.
    pub is_root: bool,
}

impl SnapshotEntry {
    /// Returns the final component of the entry's path.
    pub fn file_name(&self) -> String {
        self.absolute_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// All entries found beneath a single root, root entry first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootSnapshot {
    /// The declared root path.
    pub root: PathBuf,
    /// Entries in walk order.
    pub entries: Vec<SnapshotEntry>,
}

/// Snapshots a single root path.
fn snapshot_root(root: &Path) -> Result<RootSnapshot, FingerprintError> {
    tracing::trace!(root = %root.display(), "snapshotting root");

    let metadata = match std::fs::metadata(root) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(RootSnapshot {
                root: root.to_path_buf(),
                entries: vec![SnapshotEntry {
                    absolute_path: root.to_path_buf(),
                    relative_path: file_name_of(root),
                    kind: FileKind::Missing,
                    content_hash: ContentHash::from_bytes(MISSING_SIGNATURE),
                    is_root: true,
                }],
            });
        }
        Err(e) => return Err(FingerprintError::read_failure(root, e)),
    };

    let mut entries = Vec::new();
    if metadata.is_dir() {
        entries.push(SnapshotEntry {
            absolute_path: root.to_path_buf(),
            relative_path: String::new(),
            kind: FileKind::Directory,
            content_hash: ContentHash::from_bytes(DIRECTORY_SIGNATURE),
            is_root: true,
        });
        walk_dir(root, "", &mut entries)?;
    } else {
        entries.push(SnapshotEntry {
            absolute_path: root.to_path_buf(),
            relative_path: file_name_of(root),
            kind: FileKind::File,
            content_hash: hash_file(root)?,
            is_root: true,
        });
    }

    Ok(RootSnapshot {
        root: root.to_path_buf(),
        entries,
    })
}

/// Recursively walks a directory in sorted name order.
fn walk_dir(
    dir: &Path,
    prefix: &str,
    entries: &mut Vec<SnapshotEntry>,
) -> Result<(), FingerprintError> {
    let listing = std::fs::read_dir(dir).map_err(|e| FingerprintError::read_failure(dir, e))?;
    let mut children = Vec::new();
    for entry in listing {
        let entry = entry.map_err(|e| FingerprintError::read_failure(dir, e))?;
        children.push(entry.path());
    }
    children.sort();

    for path in children {
        let name = file_name_of(&path);
        let relative_path = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };

        // Follows symlinks, so a link to a directory is walked like one.
        let metadata = match std::fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Dangling link: the link itself is still listed.
                std::fs::symlink_metadata(&path)
                    .map_err(|_| FingerprintError::read_failure(&path, e))?;
                entries.push(SnapshotEntry {
                    absolute_path: path,
                    relative_path,
                    kind: FileKind::Missing,
                    content_hash: ContentHash::from_bytes(MISSING_SIGNATURE),
                    is_root: false,
                });
                continue;
            }
            Err(e) => return Err(FingerprintError::read_failure(&path, e)),
        };
        if metadata.is_dir() {
            entries.push(SnapshotEntry {
                absolute_path: path.clone(),
                relative_path: relative_path.clone(),
                kind: FileKind::Directory,
                content_hash: ContentHash::from_bytes(DIRECTORY_SIGNATURE),
                is_root: false,
            });
            walk_dir(&path, &relative_path, entries)?;
        } else {
            entries.push(SnapshotEntry {
                content_hash: hash_file(&path)?,
                absolute_path: path,
                relative_path,
                kind: FileKind::File,
                is_root: false,
            });
        }
    }
    Ok(())
}

fn hash_file(path: &Path) -> Result<ContentHash, FingerprintError> {
    ContentHash::from_file(path).map_err(|e| FingerprintError::read_failure(path, e))
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
