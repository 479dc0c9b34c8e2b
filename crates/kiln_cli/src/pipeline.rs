//! Shared steps of the fingerprint and status commands.
//!
//! 1. Find the project root (walk up looking for `kiln.toml`)
//! 2. Load config via `kiln_config`
//! 3. Build each selected unit's property specs against the project directory
//! 4. Run the declared validation actions
//! 5. Fingerprint every unit with the built-in normalizers

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use kiln_config::ProjectConfig;
use kiln_fingerprint::{CacheKeyMap, WorkFingerprinter};
use serde::{Deserialize, Serialize};

use crate::GlobalArgs;

/// Cache keys of a project's work units, as written by `kiln fingerprint --output`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheKeyReport {
    /// Project name from `kiln.toml`.
    pub project: String,
    /// Cache key per work unit, in name order.
    pub units: BTreeMap<String, CacheKeyMap>,
}

impl CacheKeyReport {
    /// Reads a report previously written as JSON.
    pub fn read(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read report {}: {e}", path.display()))?;
        let report = serde_json::from_str(&content)
            .map_err(|e| format!("invalid report {}: {e}", path.display()))?;
        Ok(report)
    }

    /// Writes the report as pretty-printed JSON.
    pub fn write(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Resolves the project directory from `--config` or the current directory.
pub fn resolve_project_root(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(ref config_path) = global.config {
        let p = PathBuf::from(config_path);
        if p.is_file() {
            Ok(p.parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".")))
        } else {
            Ok(p)
        }
    } else {
        let cwd = std::env::current_dir()?;
        kiln_config::find_project_root(&cwd).ok_or_else(|| {
            format!(
                "could not find {} in {} or any parent directory",
                kiln_config::CONFIG_FILE_NAME,
                cwd.display()
            )
            .into()
        })
    }
}

/// Returns the names of the units to process: one named unit or all of them.
pub fn select_units<'a>(
    config: &'a ProjectConfig,
    only: Option<&'a str>,
) -> Result<Vec<&'a str>, Box<dyn std::error::Error>> {
    match only {
        Some(name) => {
            config.unit(name)?;
            Ok(vec![name])
        }
        None => Ok(config.units.keys().map(String::as_str).collect()),
    }
}

/// Fingerprints the selected units of `config`.
///
/// Validation failures and fingerprinting errors abort the whole run; no
/// partial report is produced.
pub fn fingerprint_units(
    config: &ProjectConfig,
    project_dir: &Path,
    only: Option<&str>,
) -> Result<CacheKeyReport, Box<dyn std::error::Error>> {
    let fingerprinter = WorkFingerprinter::default();
    let mut units = BTreeMap::new();

    for name in select_units(config, only)? {
        let unit = config.unit(name)?;
        let specs = unit.property_specs(project_dir);
        for spec in &specs {
            spec.validate()
                .map_err(|message| format!("unit '{name}': {message}"))?;
        }

        let owner = format!("unit '{name}'");
        let key = fingerprinter.fingerprint_all(&owner, &specs)?;
        tracing::debug!(unit = name, properties = key.len(), hash = %key.hash(), "fingerprinted unit");
        units.insert(name.to_string(), key);
    }

    Ok(CacheKeyReport {
        project: config.project.name.clone(),
        units,
    })
}
