//! Registered transforms and their execution.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiln_common::{ContentHash, HashBuilder};
use kiln_fingerprint::{CacheKeyMap, PropertySpec, WorkFingerprinter};
use serde::Serialize;

use crate::discovery::{slots_for, DiscoveredSlots};
use crate::error::{BoxError, ExecutionStage, TransformError};
use crate::outputs::validate_outputs;
use crate::schema::TypeSchema;

/// An artifact transform implementation.
///
/// The type is constructed fresh for every execution from its parameters,
/// receives its slot values through the setters named in its schema, and is
/// dropped once the action returns.
pub trait Transform: Sized + 'static {
    /// Auxiliary, non-file configuration. Serialized to compute the
    /// registration's secondary-inputs hash.
    type Parameters: Clone + Serialize + Send + Sync + 'static;

    /// Describes the settable properties of this type.
    fn schema() -> TypeSchema<Self>;

    /// Builds an instance from configured parameters.
    fn instantiate(parameters: Self::Parameters) -> Result<Self, BoxError>;

    /// Runs the transform and returns the files it produced.
    fn transform(&mut self) -> Result<Vec<PathBuf>, BoxError>;
}

/// Discovers the declared input file properties of a configured instance.
pub trait PropertyWalker<T> {
    /// Returns the instance's input file properties.
    fn input_file_properties(&self, instance: &T) -> Vec<PropertySpec>;
}

impl<T, F> PropertyWalker<T> for F
where
    F: Fn(&T) -> Vec<PropertySpec>,
{
    fn input_file_properties(&self, instance: &T) -> Vec<PropertySpec> {
        self(instance)
    }
}

type ConfigureAction<P> = Arc<dyn Fn(&mut P) + Send + Sync>;

/// A transform type registered with its parameters.
///
/// Slot discovery happens once per type; the registration only keeps a
/// shared handle to the result.
pub struct TransformRegistration<T: Transform> {
    display_name: String,
    parameters: T::Parameters,
    configure: Option<ConfigureAction<T::Parameters>>,
    secondary_inputs_hash: ContentHash,
    slots: Arc<DiscoveredSlots<T>>,
}

impl<T: Transform> TransformRegistration<T> {
    /// Registers `T` with fixed parameters.
    pub fn new(parameters: T::Parameters) -> Result<Self, TransformError> {
        Self::build(parameters, None)
    }

    /// Registers `T` with parameters adjusted by `configure` before every
    /// instantiation.
    pub fn with_configuration<F>(parameters: T::Parameters, configure: F) -> Result<Self, TransformError>
    where
        F: Fn(&mut T::Parameters) + Send + Sync + 'static,
    {
        Self::build(parameters, Some(Arc::new(configure)))
    }

    fn build(
        parameters: T::Parameters,
        configure: Option<ConfigureAction<T::Parameters>>,
    ) -> Result<Self, TransformError> {
        let display_name = T::schema().short_name().to_string();

        let mut configured = parameters.clone();
        if let Some(configure) = &configure {
            configure(&mut configured);
        }
        let encoded = bincode::serde::encode_to_vec(&configured, bincode::config::standard())
            .map_err(|e| TransformError::InvalidParameters {
                transform: display_name.clone(),
                reason: e.to_string(),
            })?;
        let secondary_inputs_hash = HashBuilder::new()
            .put_str(std::any::type_name::<T>())
            .put_hash(&ContentHash::from_bytes(&encoded))
            .finish();

        Ok(Self {
            display_name,
            parameters,
            configure,
            secondary_inputs_hash,
            slots: slots_for::<T>(),
        })
    }

    /// Overrides the name used in logs and errors.
    pub fn named(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Name used in logs and errors.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Digest of the transform type and its configured parameters.
    pub fn secondary_inputs_hash(&self) -> ContentHash {
        self.secondary_inputs_hash
    }

    /// Slots discovered on `T`.
    pub fn slots(&self) -> &DiscoveredSlots<T> {
        &self.slots
    }

    /// Instantiates, injects, runs the transform, and validates its outputs.
    pub fn execute(
        &self,
        primary_input: &Path,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, TransformError> {
        tracing::debug!(
            transform = %self.display_name,
            input = %primary_input.display(),
            output_dir = %output_dir.display(),
            "executing transform"
        );
        let mut instance = self.instantiate()?;
        self.inject(&mut instance, primary_input, Some(output_dir))?;
        let outputs = instance
            .transform()
            .map_err(|e| self.failed(ExecutionStage::Execute, e))?;
        validate_outputs(&self.display_name, primary_input, Some(output_dir), &outputs)?;
        Ok(outputs)
    }

    /// Computes the cache key of the transform's inputs without running it.
    ///
    /// Only the primary input is injected; the workspace slot stays unset.
    pub fn fingerprint_inputs_only(
        &self,
        primary_input: &Path,
        walker: &dyn PropertyWalker<T>,
        fingerprinter: &WorkFingerprinter,
        owner: &dyn fmt::Display,
    ) -> Result<CacheKeyMap, TransformError> {
        let mut instance = self.instantiate()?;
        self.inject(&mut instance, primary_input, None)?;

        let properties = walker.input_file_properties(&instance);
        fingerprinter
            .fingerprint_all(owner, &properties)
            .map_err(|source| TransformError::Fingerprint {
                transform: self.display_name.clone(),
                source,
            })
    }

    fn instantiate(&self) -> Result<T, TransformError> {
        let mut parameters = self.parameters.clone();
        if let Some(configure) = &self.configure {
            configure(&mut parameters);
        }
        T::instantiate(parameters).map_err(|e| self.failed(ExecutionStage::Instantiate, e))
    }

    fn inject(
        &self,
        instance: &mut T,
        primary_input: &Path,
        output_dir: Option<&Path>,
    ) -> Result<(), TransformError> {
        if let (Some(slot), Some(dir)) = (&self.slots.workspace, output_dir) {
            (slot.setter)(instance, dir.to_path_buf())
                .map_err(|e| self.failed(ExecutionStage::Inject, e))?;
        }
        if let Some(slot) = &self.slots.primary_input {
            (slot.setter)(instance, primary_input.to_path_buf())
                .map_err(|e| self.failed(ExecutionStage::Inject, e))?;
        }
        Ok(())
    }

    fn failed(&self, stage: ExecutionStage, source: BoxError) -> TransformError {
        tracing::warn!(transform = %self.display_name, %stage, error = %source, "transform failed");
        TransformError::ExecutionFailed {
            transform: self.display_name.clone(),
            stage,
            source,
        }
    }
}

impl<T: Transform> fmt::Debug for TransformRegistration<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformRegistration")
            .field("display_name", &self.display_name)
            .field("secondary_inputs_hash", &self.secondary_inputs_hash)
            .field("slots", &*self.slots)
            .finish()
    }
}
