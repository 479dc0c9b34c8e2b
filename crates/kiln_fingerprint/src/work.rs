//! Fingerprinting every declared file property of a work unit.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::cache_key::CacheKeyMap;
use crate::error::FingerprintError;
use crate::normalizer::FileCollectionFingerprinter;
use crate::property::PropertySpec;
use crate::registry::NormalizerRegistry;

/// Maps a work unit's file properties to fingerprints and assembles the
/// resulting cache key.
///
/// Holds no mutable state; one instance can serve any number of threads.
#[derive(Clone)]
pub struct WorkFingerprinter {
    registry: Arc<NormalizerRegistry>,
}

impl WorkFingerprinter {
    /// Creates an orchestrator backed by `registry`.
    pub fn new(registry: Arc<NormalizerRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the registry used for selector lookups.
    pub fn registry(&self) -> &NormalizerRegistry {
        &self.registry
    }

    /// Fingerprints every property and returns the name-sorted cache key.
    ///
    /// Properties may arrive in any order. Duplicate names and unregistered
    /// normalizers are rejected before any file is read. The first read
    /// failure aborts the call; no partial key is ever returned.
    pub fn fingerprint_all<'a, I>(
        &self,
        owner: &dyn fmt::Display,
        properties: I,
    ) -> Result<CacheKeyMap, FingerprintError>
    where
        I: IntoIterator<Item = &'a PropertySpec>,
    {
        let mut resolved: BTreeMap<&str, (&PropertySpec, &dyn FileCollectionFingerprinter)> =
            BTreeMap::new();
        for spec in properties {
            match resolved.entry(spec.name()) {
                Entry::Vacant(slot) => {
                    let fingerprinter = self.registry.lookup(spec.normalizer(), spec.name())?;
                    slot.insert((spec, fingerprinter));
                }
                Entry::Occupied(_) => {
                    return Err(FingerprintError::DuplicatePropertyName {
                        owner: owner.to_string(),
                        name: spec.name().to_string(),
                    });
                }
            }
        }

        let mut fingerprints = BTreeMap::new();
        for (name, (spec, fingerprinter)) in resolved {
            tracing::debug!(property = %spec, %owner, "fingerprinting property");
            let fingerprint = fingerprinter.fingerprint(spec.files())?;
            fingerprints.insert(name.to_string(), fingerprint);
        }
        Ok(CacheKeyMap::from_sorted(fingerprints))
    }
}

impl Default for WorkFingerprinter {
    fn default() -> Self {
        Self::new(Arc::new(NormalizerRegistry::with_builtin()))
    }
}
