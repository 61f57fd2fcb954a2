//! giftflow - classify mystery gift saves and convert them per game code
//!
//! Reads an input tree, classifies every matching file against the event
//! table and mapping rules, and runs MysteryGiftConvert once per destination
//! code. One report line per input goes to stdout; logs go to stderr and to
//! `<home>/logs/giftflow.log`.

use anyhow::Result;
use clap::Parser;
use giftflow::dispatch::{DEFAULT_EXTENSIONS, DEFAULT_WORKERS};
use giftflow_logging::{init_logging, LogConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

mod cli;

#[derive(Parser, Debug)]
#[command(
    name = "giftflow",
    version,
    about = "Classify mystery gift save files and convert them per destination game code"
)]
struct Cli {
    /// Root to scan recursively for input files
    #[arg(long)]
    input_root: PathBuf,

    /// Root under which per-code output directories are created
    #[arg(long)]
    output_root: PathBuf,

    /// Path to the MysteryGiftConvert executable
    #[arg(long = "bin-mgc", env = "GIFTFLOW_CONVERTER")]
    bin_mgc: PathBuf,

    /// Comma-separated input extensions (case-insensitive)
    #[arg(long, default_value = DEFAULT_EXTENSIONS)]
    exts: String,

    /// Worker pool size
    #[arg(long, default_value_t = DEFAULT_WORKERS, value_parser = parse_workers)]
    workers: usize,

    /// YAML file with pattern -> game code rules
    #[arg(long)]
    mapping: Option<PathBuf>,

    /// CSV table of events (EventName, GameCodes, Regions, Year)
    #[arg(long)]
    events_csv: Option<PathBuf>,

    /// Reserved: let mapping rules override event matches (currently no effect)
    #[arg(long)]
    enable_mapping_override: bool,

    /// Extension of the files the converter generates
    #[arg(long, default_value = giftflow::convert::DEFAULT_OUTPUT_EXTENSION)]
    output_ext: String,

    /// Parent directory for per-conversion scratch workspaces
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Kill a conversion after this many seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: Option<u64>,

    /// Exit with status 1 when any conversion failed
    #[arg(long)]
    strict: bool,

    /// Print the run as one JSON document instead of report lines
    #[arg(long)]
    json: bool,

    /// Enable verbose logging (debug to stderr)
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn parse_workers(raw: &str) -> std::result::Result<usize, String> {
    let workers: usize = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a whole number", raw))?;
    if workers == 0 {
        return Err("must be at least 1".to_string());
    }
    Ok(workers)
}

fn run_command(cli: Cli) -> Result<bool> {
    let strict = cli.strict;
    let summary = cli::convert::run(cli::convert::ConvertArgs {
        input_root: cli.input_root,
        output_root: cli.output_root,
        converter: cli.bin_mgc,
        exts: cli.exts,
        workers: cli.workers,
        mapping: cli.mapping,
        events_csv: cli.events_csv,
        mapping_override: cli.enable_mapping_override,
        output_ext: cli.output_ext,
        scratch_dir: cli.scratch_dir,
        timeout_secs: cli.timeout_secs,
        json: cli.json,
    })?;

    if summary.failed > 0 {
        info!(
            "{} of {} conversions failed{}",
            summary.failed,
            summary.conversions,
            if strict { " (strict: exiting with 1)" } else { "" }
        );
    }
    Ok(!(strict && summary.failed > 0))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_mode = cli.json;

    let _log_guard = match init_logging(LogConfig {
        app_name: "giftflow",
        verbose: cli.verbose,
    }) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("Warning: logging unavailable: {:#}", err);
            None
        }
    };

    match run_command(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            if json_mode {
                cli::error::print_json_error(&err);
            } else {
                eprintln!("{:?}", err);
            }
            ExitCode::from(1)
        }
    }
}
