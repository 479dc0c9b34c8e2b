//! Kiln CLI: input fingerprinting for incremental builds.
//!
//! Provides `kiln fingerprint` to compute the cache key of every work unit
//! declared in `kiln.toml`, and `kiln status` to compare freshly computed
//! keys against a previously saved report.

#![warn(missing_docs)]

mod fingerprint;
mod pipeline;
mod status;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Kiln: input fingerprinting for incremental builds.
#[derive(Parser, Debug)]
#[command(name = "kiln", version, about = "Kiln incremental build fingerprinting")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `kiln.toml` configuration file or project directory.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute the input cache key of each work unit.
    Fingerprint(FingerprintArgs),
    /// Compare current inputs against a saved cache-key report.
    Status(StatusArgs),
}

/// Arguments for the `kiln fingerprint` subcommand.
#[derive(Parser, Debug)]
pub struct FingerprintArgs {
    /// Only fingerprint the named work unit.
    #[arg(short, long)]
    pub unit: Option<String>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Write the JSON report to this file.
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Arguments for the `kiln status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Report previously written by `kiln fingerprint --output`.
    #[arg(long)]
    pub against: String,

    /// Only check the named work unit.
    #[arg(short, long)]
    pub unit: Option<String>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };
    init_tracing(&global);

    let result = match cli.command {
        Command::Fingerprint(ref args) => fingerprint::run(args, &global),
        Command::Status(ref args) => status::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the stderr log subscriber.
///
/// `--verbose` and `--quiet` override `KILN_LOG`; the fallback level is `warn`.
fn init_tracing(global: &GlobalArgs) {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(global))
        .with_writer(std::io::stderr)
        .init();
}

fn log_filter(global: &GlobalArgs) -> EnvFilter {
    if global.verbose {
        EnvFilter::new("debug")
    } else if global.quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_env("KILN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    }
}
