//! Parsing and validation of `kiln.toml` project configuration files.
//!
//! The configuration declares the project's work units and, for each unit,
//! its input file properties: a name, a normalizer selector, the files, and
//! an optional validation action. Paths are kept as written; resolving them
//! against the project directory is left to the caller.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{find_project_root, load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
