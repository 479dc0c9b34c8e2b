//! Error types for `kiln.toml` loading and validation.

use std::path::PathBuf;

/// Errors raised while reading or checking a project configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Path of the configuration file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The TOML content does not match the configuration schema.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A required field is absent or empty.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A unit key is empty or contains whitespace.
    #[error("invalid unit name '{0}': unit names must be non-empty and contain no whitespace")]
    InvalidUnitName(String),

    /// An input property names no normalizer.
    #[error("property '{property}' of unit '{unit}' has an empty normalizer")]
    EmptyNormalizer {
        /// Owning unit.
        unit: String,
        /// The property declaring the empty selector.
        property: String,
    },

    /// A unit requested by name is not declared.
    #[error("unknown unit '{0}'")]
    UnknownUnit(String),
}
