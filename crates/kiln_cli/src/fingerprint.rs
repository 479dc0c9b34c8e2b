//! `kiln fingerprint`: compute and print each unit's cache key.

use crate::pipeline::{fingerprint_units, resolve_project_root, CacheKeyReport};
use crate::{FingerprintArgs, GlobalArgs, ReportFormat};

/// Runs the `kiln fingerprint` command.
///
/// Returns exit code 0 on success; any validation or read failure is an error.
pub fn run(args: &FingerprintArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project_dir = resolve_project_root(global)?;
    let config = kiln_config::load_config(&project_dir)?;

    if !global.quiet && args.format == ReportFormat::Text {
        eprintln!(
            "   Fingerprinting {} ({} unit(s))",
            config.project.name,
            args.unit.as_ref().map_or(config.units.len(), |_| 1)
        );
    }

    let report = fingerprint_units(&config, &project_dir, args.unit.as_deref())?;

    if let Some(ref output) = args.output {
        let path = project_dir.join(output);
        report.write(&path)?;
        if !global.quiet {
            eprintln!("   Wrote {}", path.display());
        }
    }

    match args.format {
        ReportFormat::Text => {
            if !global.quiet {
                print!("{}", render_text(&report));
            }
        }
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(0)
}

/// Renders one line per unit followed by one indented line per property.
pub fn render_text(report: &CacheKeyReport) -> String {
    let mut out = String::new();
    for (unit, key) in &report.units {
        out.push_str(&format!("{unit}  {}\n", key.hash()));
        for (name, fingerprint) in key {
            out.push_str(&format!(
                "    {name}  {}  ({} entries)\n",
                fingerprint.hash(),
                fingerprint.len()
            ));
        }
    }
    out
}
