//! Configuration types deserialized from `kiln.toml`.

use std::collections::BTreeMap;
use std::path::Path;

use kiln_fingerprint::{FileSet, NormalizerSelector, PropertySpec, ValidationAction};
use serde::Deserialize;

use crate::error::ConfigError;

/// The top-level project configuration parsed from `kiln.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Core project metadata.
    pub project: ProjectMeta,
    /// Work units keyed by name.
    #[serde(default)]
    pub units: BTreeMap<String, UnitConfig>,
}

impl ProjectConfig {
    /// Looks up a work unit by name.
    pub fn unit(&self, name: &str) -> Result<&UnitConfig, ConfigError> {
        self.units
            .get(name)
            .ok_or_else(|| ConfigError::UnknownUnit(name.to_string()))
    }
}

/// Core project metadata required in every `kiln.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// The project version string.
    #[serde(default)]
    pub version: String,
    /// A brief description of the project.
    #[serde(default)]
    pub description: String,
}

/// A unit of work whose file inputs are fingerprinted.
#[derive(Debug, Default, Deserialize)]
pub struct UnitConfig {
    /// A brief description of what the unit does.
    #[serde(default)]
    pub description: String,
    /// Declared input file properties, in any order.
    #[serde(default)]
    pub inputs: Vec<InputProperty>,
}

impl UnitConfig {
    /// Builds the unit's property specs, resolving relative file paths
    /// against `base_dir`.
    pub fn property_specs(&self, base_dir: &Path) -> Vec<PropertySpec> {
        self.inputs
            .iter()
            .map(|input| input.to_spec(base_dir))
            .collect()
    }
}

/// One declared input file property.
#[derive(Debug, Clone, Deserialize)]
pub struct InputProperty {
    /// Property name, unique within the unit.
    pub name: String,
    /// Normalizer selector tag (e.g. `"relative-path"`).
    #[serde(default = "default_normalizer")]
    pub normalizer: NormalizerSelector,
    /// File and directory roots, relative to the project directory unless absolute.
    #[serde(default)]
    pub files: Vec<String>,
    /// Validation applied to the files.
    #[serde(default)]
    pub validation: ValidationAction,
}

impl InputProperty {
    /// Converts this declaration to a [`PropertySpec`].
    pub fn to_spec(&self, base_dir: &Path) -> PropertySpec {
        let files: FileSet = self.files.iter().map(|f| base_dir.join(f)).collect();
        PropertySpec::new(self.name.as_str(), self.normalizer.clone(), files)
            .with_validation(self.validation)
    }
}

fn default_normalizer() -> NormalizerSelector {
    NormalizerSelector::new(NormalizerSelector::ABSOLUTE_PATH)
}
