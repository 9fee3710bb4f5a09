mod output;

use anyhow::{Context, Result};
use clap::Parser;
use omnitrail_core::{Algorithm, Trail};
use output::OutputWriter;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[cfg(windows)]
const PATH_LIST_SEPARATOR: char = ';';
#[cfg(not(windows))]
const PATH_LIST_SEPARATOR: char = ':';

/// Omnitrail - content-addressed identities for files and directory trees
#[derive(Parser)]
#[command(name = "omnitrail")]
#[command(about = "Compute gitoid identities and an artifact dependency graph for a path", long_about = None)]
#[command(version)]
struct Cli {
    /// File or directory to scan
    path: PathBuf,

    /// Print one compact JSON document instead of the ADG listing
    #[arg(long)]
    json: bool,

    /// Hash algorithm to enable (sha1, sha256); repeat for several
    #[arg(long = "algorithm", value_parser = parse_algorithm)]
    algorithms: Vec<Algorithm>,

    /// Allow symlinks resolving under this prefix; the scanned path is always allowed
    #[arg(long, env = "OMNITRAIL_ALLOW", value_delimiter = PATH_LIST_SEPARATOR)]
    allow: Vec<PathBuf>,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: LevelFilter,
}

fn parse_algorithm(s: &str) -> std::result::Result<Algorithm, String> {
    Algorithm::parse(s).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    let writer = OutputWriter::new(cli.json);
    match run(&cli, &writer) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            writer.write_error(&err, 1);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(level: LevelFilter) {
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);
    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .init();
}

fn build_trail(cli: &Cli) -> Result<Trail> {
    let mut builder = Trail::builder().allow(&cli.path);
    if !cli.algorithms.is_empty() {
        builder = builder.algorithms(cli.algorithms.iter().copied());
    }
    for prefix in cli.allow.iter().filter(|p| !p.as_os_str().is_empty()) {
        builder = builder.allow(prefix);
    }
    builder.build().context("Failed to configure trail")
}

fn run(cli: &Cli, writer: &OutputWriter) -> Result<()> {
    let mut trail = build_trail(cli)?;

    trail
        .add(&cli.path)
        .with_context(|| format!("Failed to scan {}", cli.path.display()))?;

    writer.write_trail(&trail)
}
