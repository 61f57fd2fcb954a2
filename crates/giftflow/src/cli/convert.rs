//! The convert run: load configuration, discover inputs, dispatch, report.

use super::error::HelpfulError;
use super::output::{ReportSink, RunDocument};
use anyhow::{Context, Result};
use giftflow::catalog::Catalog;
use giftflow::convert::ConverterConfig;
use giftflow::dispatch::{DispatchConfig, Dispatcher, ExtensionSet, RunSummary};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug)]
pub struct ConvertArgs {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub converter: PathBuf,
    pub exts: String,
    pub workers: usize,
    pub mapping: Option<PathBuf>,
    pub events_csv: Option<PathBuf>,
    pub mapping_override: bool,
    pub output_ext: String,
    pub scratch_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub json: bool,
}

/// Run a conversion pass. Returns the run totals; per-item failures are
/// reported, not returned as errors.
pub fn run(args: ConvertArgs) -> Result<RunSummary> {
    let extensions = ExtensionSet::parse(&args.exts);
    if extensions.is_empty() {
        return Err(HelpfulError::no_extensions(&args.exts).into());
    }

    let catalog = Catalog::load(args.mapping.as_deref(), args.events_csv.as_deref())
        .map_err(HelpfulError::from)?
        .with_mapping_override(args.mapping_override);
    if catalog.mapping_override() {
        info!("Mapping override enabled (event matches still take precedence)");
    }

    let converter = resolve_converter(&args.converter)?;
    if converter.components().count() > 1 && !converter.is_file() {
        warn!(
            "Converter {} does not exist; every conversion will fail",
            converter.display()
        );
    }

    let converter_config = ConverterConfig::new(converter)
        .with_output_extension(&args.output_ext)
        .with_timeout(args.timeout_secs.map(Duration::from_secs));
    let converter_config = match &args.scratch_dir {
        Some(dir) => converter_config.with_scratch_root(dir),
        None => converter_config,
    };

    let config = DispatchConfig::new(&args.input_root, &args.output_root, converter_config)
        .with_extensions(extensions.clone())
        .with_workers(args.workers);
    let dispatcher = Dispatcher::new(config, &catalog);

    let inputs = dispatcher.discover().map_err(HelpfulError::from)?;
    info!(
        "Found {} inputs under {} ({} workers)",
        inputs.len(),
        args.input_root.display(),
        args.workers
    );

    let mut sink = if args.json {
        ReportSink::Json(Box::new(RunDocument::new(
            &args.input_root,
            &args.output_root,
            &extensions,
            inputs.len(),
        )))
    } else {
        ReportSink::Text
    };
    sink.begin(inputs.len(), &extensions)
        .context("Failed to write report")?;

    let mut write_error = None;
    let summary = dispatcher
        .dispatch(inputs, |report| {
            if write_error.is_none() {
                if let Err(err) = sink.report(&report) {
                    write_error = Some(err);
                }
            }
        })
        .map_err(HelpfulError::from)?;

    if let Some(err) = write_error {
        return Err(err).context("Failed to write report");
    }
    sink.finish(summary).context("Failed to write report")?;

    Ok(summary)
}

/// Anchor relative converter paths with a directory part to the current
/// directory, since the converter is launched from inside a scratch dir.
/// Bare names are left for `PATH` lookup.
fn resolve_converter(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() || path.components().count() <= 1 {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|err| {
        HelpfulError::converter_unresolvable(path, &format!("current directory unavailable: {}", err))
    })?;
    Ok(cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_converter_name_is_kept() {
        assert_eq!(
            resolve_converter(Path::new("MysteryGiftConvert")).unwrap(),
            PathBuf::from("MysteryGiftConvert")
        );
    }

    #[test]
    fn test_absolute_converter_is_kept() {
        assert_eq!(
            resolve_converter(Path::new("/opt/mgc/bin/mgc")).unwrap(),
            PathBuf::from("/opt/mgc/bin/mgc")
        );
    }

    #[test]
    fn test_relative_converter_is_anchored() {
        let resolved = resolve_converter(Path::new("tools/mgc")).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("tools/mgc"));
    }
}
