//! Registry mapping normalizer selectors to fingerprinters.
//!
//! The registry is assembled once at start-up through a
//! [`NormalizerRegistryBuilder`] and is read-only afterwards, so it can be
//! shared across threads behind an `Arc` without locking.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::FingerprintError;
use crate::normalizer::{
    FileCollectionFingerprinter, NormalizationPolicy, NormalizerSelector, NormalizingFingerprinter,
};

/// Immutable lookup table from selector to fingerprinter.
pub struct NormalizerRegistry {
    fingerprinters: HashMap<NormalizerSelector, Arc<dyn FileCollectionFingerprinter>>,
}

impl NormalizerRegistry {
    /// Starts building a registry with no fingerprinters.
    pub fn builder() -> NormalizerRegistryBuilder {
        NormalizerRegistryBuilder::default()
    }

    /// Creates a registry holding every built-in normalization policy.
    pub fn with_builtin() -> Self {
        Self::builder().register_builtin().build()
    }

    /// Returns the fingerprinter registered for `selector`.
    ///
    /// `property` is only used to make the error message point at the
    /// declaration that referenced the unknown selector.
    pub fn lookup(
        &self,
        selector: &NormalizerSelector,
        property: &str,
    ) -> Result<&dyn FileCollectionFingerprinter, FingerprintError> {
        self.fingerprinters
            .get(selector)
            .map(|fingerprinter| fingerprinter.as_ref())
            .ok_or_else(|| FingerprintError::UnregisteredNormalizer {
                selector: selector.to_string(),
                property: property.to_string(),
            })
    }

    /// Returns `true` if a fingerprinter is registered for `selector`.
    pub fn contains(&self, selector: &NormalizerSelector) -> bool {
        self.fingerprinters.contains_key(selector)
    }

    /// Returns all registered selectors in sorted order.
    pub fn selectors(&self) -> Vec<&NormalizerSelector> {
        let mut selectors: Vec<_> = self.fingerprinters.keys().collect();
        selectors.sort();
        selectors
    }

    /// Returns the number of registered fingerprinters.
    pub fn len(&self) -> usize {
        self.fingerprinters.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.fingerprinters.is_empty()
    }
}

impl Default for NormalizerRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

/// Start-up builder for a [`NormalizerRegistry`].
#[derive(Default)]
pub struct NormalizerRegistryBuilder {
    fingerprinters: HashMap<NormalizerSelector, Arc<dyn FileCollectionFingerprinter>>,
}

impl NormalizerRegistryBuilder {
    /// Registers a fingerprinter under its own selector.
    ///
    /// A later registration for the same selector replaces the earlier one,
    /// which is how a built-in policy is overridden.
    pub fn register(mut self, fingerprinter: Arc<dyn FileCollectionFingerprinter>) -> Self {
        let selector = fingerprinter.normalizer();
        if self
            .fingerprinters
            .insert(selector.clone(), fingerprinter)
            .is_some()
        {
            tracing::debug!(%selector, "replacing registered fingerprinter");
        }
        self
    }

    /// Registers one [`NormalizingFingerprinter`] per built-in policy.
    pub fn register_builtin(self) -> Self {
        NormalizationPolicy::ALL
            .into_iter()
            .fold(self, |builder, policy| {
                builder.register(Arc::new(NormalizingFingerprinter::new(policy)))
            })
    }

    /// Freezes the registry.
    pub fn build(self) -> NormalizerRegistry {
        NormalizerRegistry {
            fingerprinters: self.fingerprinters,
        }
    }
}
