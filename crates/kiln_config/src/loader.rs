//! Configuration file loading and validation.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::types::ProjectConfig;

/// Name of the project configuration file.
pub const CONFIG_FILE_NAME: &str = "kiln.toml";

/// Loads and validates a `kiln.toml` configuration from a project directory.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE_NAME);
    let content = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
        path: config_path.clone(),
        source,
    })?;
    load_config_from_str(&content)
}

/// Parses and validates a `kiln.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Walks up from `start` to the nearest directory containing `kiln.toml`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(CONFIG_FILE_NAME).is_file())
        .map(Path::to_path_buf)
}

/// Validates that required fields are present and non-empty.
///
/// Duplicate property names are left to the fingerprinter, which reports
/// them with the owning unit.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }
    for (unit_name, unit) in &config.units {
        if unit_name.is_empty() || unit_name.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidUnitName(unit_name.clone()));
        }
        for (index, input) in unit.inputs.iter().enumerate() {
            if input.name.is_empty() {
                return Err(ConfigError::MissingField(format!(
                    "units.{unit_name}.inputs[{index}].name"
                )));
            }
            if input.normalizer.as_str().is_empty() {
                return Err(ConfigError::EmptyNormalizer {
                    unit: unit_name.clone(),
                    property: input.name.clone(),
                });
            }
        }
    }
    Ok(())
}
