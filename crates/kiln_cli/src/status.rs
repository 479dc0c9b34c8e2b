//! `kiln status`: compare current inputs against a saved report.

use std::collections::BTreeMap;

use kiln_fingerprint::{CacheKeyMap, PropertyChanges};
use serde::Serialize;

use crate::pipeline::{fingerprint_units, resolve_project_root, CacheKeyReport};
use crate::{GlobalArgs, ReportFormat, StatusArgs};

/// Up-to-date check result of one work unit.
#[derive(Debug, Serialize)]
pub struct UnitStatus {
    /// `true` when the unit was absent from the saved report.
    pub new_unit: bool,
    /// Property-level differences against the saved key.
    pub changes: PropertyChanges,
}

impl UnitStatus {
    /// Returns `true` if the unit must re-execute.
    pub fn is_out_of_date(&self) -> bool {
        self.new_unit || !self.changes.is_empty()
    }
}

/// Runs the `kiln status` command.
///
/// Returns exit code 0 when every checked unit is up to date, 1 otherwise.
pub fn run(args: &StatusArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project_dir = resolve_project_root(global)?;
    let config = kiln_config::load_config(&project_dir)?;
    let previous = CacheKeyReport::read(&project_dir.join(&args.against))?;
    let current = fingerprint_units(&config, &project_dir, args.unit.as_deref())?;

    let statuses = compare(&current, &previous);
    let out_of_date = statuses.values().filter(|s| s.is_out_of_date()).count();

    match args.format {
        ReportFormat::Text => {
            if !global.quiet {
                print!("{}", render_text(&statuses));
                eprintln!(
                    "   Result: {} of {} unit(s) out of date",
                    out_of_date,
                    statuses.len()
                );
            }
        }
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&statuses)?),
    }

    Ok(if out_of_date > 0 { 1 } else { 0 })
}

/// Compares every unit of `current` with the same unit in `previous`.
pub fn compare(current: &CacheKeyReport, previous: &CacheKeyReport) -> BTreeMap<String, UnitStatus> {
    let empty = CacheKeyMap::empty();
    current
        .units
        .iter()
        .map(|(name, key)| {
            let old = previous.units.get(name);
            let status = UnitStatus {
                new_unit: old.is_none(),
                changes: key.changes_since(old.unwrap_or(&empty)),
            };
            tracing::debug!(unit = %name, out_of_date = status.is_out_of_date(), "checked unit");
            (name.clone(), status)
        })
        .collect()
}

fn render_text(statuses: &BTreeMap<String, UnitStatus>) -> String {
    let mut out = String::new();
    for (name, status) in statuses {
        if !status.is_out_of_date() {
            out.push_str(&format!("{name}  up to date\n"));
            continue;
        }
        let mut reasons = Vec::new();
        if status.new_unit {
            reasons.push("new unit".to_string());
        }
        for (label, names) in [
            ("added", &status.changes.added),
            ("removed", &status.changes.removed),
            ("modified", &status.changes.modified),
        ] {
            if !names.is_empty() {
                reasons.push(format!("{label} {}", names.join(", ")));
            }
        }
        out.push_str(&format!("{name}  out of date: {}\n", reasons.join("; ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_fingerprint::{FileSet, PropertySpec, WorkFingerprinter};
    use std::fs;

    fn report(units: Vec<(&str, CacheKeyMap)>) -> CacheKeyReport {
        CacheKeyReport {
            project: "app".to_string(),
            units: units
                .into_iter()
                .map(|(name, key)| (name.to_string(), key))
                .collect(),
        }
    }

    fn key_of(files: &[&std::path::Path]) -> CacheKeyMap {
        let set: FileSet = files.iter().copied().collect();
        WorkFingerprinter::default()
            .fingerprint_all(&"unit", &[PropertySpec::input_files("inputs", set)])
            .unwrap()
    }

    #[test]
    fn identical_reports_are_up_to_date() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "a").unwrap();

        let current = report(vec![("compile", key_of(&[&file]))]);
        let previous = report(vec![("compile", key_of(&[&file]))]);
        let statuses = compare(&current, &previous);
        assert!(!statuses["compile"].is_out_of_date());
        assert_eq!(render_text(&statuses), "compile  up to date\n");
    }

    #[test]
    fn edited_file_marks_unit_modified() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "a").unwrap();
        let previous = report(vec![("compile", key_of(&[&file]))]);

        fs::write(&file, "b").unwrap();
        let current = report(vec![("compile", key_of(&[&file]))]);

        let statuses = compare(&current, &previous);
        assert_eq!(statuses["compile"].changes.modified, vec!["inputs"]);
        assert_eq!(
            render_text(&statuses),
            "compile  out of date: modified inputs\n"
        );
    }

    #[test]
    fn unit_missing_from_previous_is_new() {
        let current = report(vec![("jar", key_of(&[]))]);
        let previous = report(vec![]);
        let statuses = compare(&current, &previous);
        let status = &statuses["jar"];
        assert!(status.new_unit);
        assert_eq!(status.changes.added, vec!["inputs"]);
        assert!(render_text(&statuses).starts_with("jar  out of date: new unit; added inputs"));
    }

    #[test]
    fn units_only_in_previous_are_ignored() {
        let current = report(vec![]);
        let previous = report(vec![("old", key_of(&[]))]);
        assert!(compare(&current, &previous).is_empty());
    }
}
