//! Name-sorted cache keys and change detection between builds.

use std::collections::BTreeMap;

use kiln_common::{ContentHash, HashBuilder};
use serde::{Deserialize, Serialize};

use crate::fingerprint::Fingerprint;

/// Immutable mapping from property name to fingerprint, sorted by name.
///
/// Iteration order depends only on the property names, never on the order
/// in which properties were declared or fingerprinted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKeyMap {
    properties: BTreeMap<String, Fingerprint>,
}

impl CacheKeyMap {
    pub(crate) fn from_sorted(properties: BTreeMap<String, Fingerprint>) -> Self {
        Self { properties }
    }

    /// Returns a cache key with no properties.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the fingerprint recorded for `name`.
    pub fn get(&self, name: &str) -> Option<&Fingerprint> {
        self.properties.get(name)
    }

    /// Iterates `(name, fingerprint)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Fingerprint)> {
        self.properties
            .iter()
            .map(|(name, fingerprint)| (name.as_str(), fingerprint))
    }

    /// Iterates property names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Returns the number of properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns `true` if no properties were fingerprinted.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Combined digest over every property name and fingerprint hash.
    pub fn hash(&self) -> ContentHash {
        let mut builder = HashBuilder::new();
        builder.put_u64(self.properties.len() as u64);
        for (name, fingerprint) in &self.properties {
            builder.put_str(name).put_hash(&fingerprint.hash());
        }
        builder.finish()
    }

    /// Compares this (current) key against a previously stored one.
    pub fn changes_since(&self, previous: &CacheKeyMap) -> PropertyChanges {
        let mut changes = PropertyChanges::default();

        for (name, fingerprint) in &self.properties {
            match previous.properties.get(name) {
                Some(old) if old == fingerprint => changes.unchanged.push(name.clone()),
                Some(_) => changes.modified.push(name.clone()),
                None => changes.added.push(name.clone()),
            }
        }
        changes.removed = previous
            .properties
            .keys()
            .filter(|name| !self.properties.contains_key(*name))
            .cloned()
            .collect();

        changes
    }
}

impl<'a> IntoIterator for &'a CacheKeyMap {
    type Item = (&'a String, &'a Fingerprint);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Fingerprint>;

    fn into_iter(self) -> Self::IntoIter {
        self.properties.iter()
    }
}

/// Result of comparing two cache keys, property by property.
///
/// Every list is in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PropertyChanges {
    /// Properties present now but not previously.
    pub added: Vec<String>,
    /// Properties present previously but not now.
    pub removed: Vec<String>,
    /// Properties whose fingerprint differs.
    pub modified: Vec<String>,
    /// Properties whose fingerprint is identical.
    pub unchanged: Vec<String>,
}

impl PropertyChanges {
    /// Returns `true` if the work unit is up to date.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    /// Number of properties that make the work unit out of date.
    pub fn out_of_date_count(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }
}
