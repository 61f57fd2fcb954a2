//! Dispatcher
//!
//! Discovers inputs, classifies each one and fans the resulting
//! (file, destination code) items out to a fixed-size pool of worker threads.
//!
//! One job per input file. A worker classifies the file, then converts it for
//! every destination code in declared order, so a file's outcomes always come
//! back together and in code order. Reports are streamed back over a channel
//! in completion order.

use super::discover::{find_inputs, ExtensionSet};
use super::error::{DispatchError, Result};
use super::report::{ConversionOutcome, FileReport, MatchKind, RunSummary};
use crate::catalog::Catalog;
use crate::classify::{classify_with, tokenize, Classification};
use crate::convert::{ConversionError, ConversionInvoker, ConverterConfig};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Component, Path, PathBuf};
use std::sync::{mpsc, Mutex};
use std::thread;
use tracing::{debug, info, warn};

/// Worker pool size when none is given
pub const DEFAULT_WORKERS: usize = 4;

/// Settings for one dispatch run.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub extensions: ExtensionSet,
    pub converter: ConverterConfig,
    pub workers: usize,
}

impl DispatchConfig {
    pub fn new(
        input_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
        converter: ConverterConfig,
    ) -> Self {
        Self {
            input_root: input_root.into(),
            output_root: output_root.into(),
            extensions: ExtensionSet::default(),
            converter,
            workers: DEFAULT_WORKERS,
        }
    }

    pub fn with_extensions(mut self, extensions: ExtensionSet) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}

/// Runs classification and conversion against a shared, read-only catalog.
pub struct Dispatcher<'c> {
    config: DispatchConfig,
    catalog: &'c Catalog,
    invoker: ConversionInvoker,
}

impl<'c> Dispatcher<'c> {
    pub fn new(config: DispatchConfig, catalog: &'c Catalog) -> Self {
        let invoker = ConversionInvoker::new(config.converter.clone());
        Self {
            config,
            catalog,
            invoker,
        }
    }

    /// Enumerate inputs. Fails only when the input root cannot be read.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        find_inputs(&self.config.input_root, &self.config.extensions)
    }

    /// Classify one file and convert it for each destination code.
    ///
    /// Never fails: every conversion error becomes an outcome.
    pub fn process_file(&self, input: &Path) -> FileReport {
        let tokens = tokenize(input);
        let classification = classify_with(&tokens, self.catalog);

        let matched = match &classification {
            Classification::Event(event) => {
                debug!("{} matched event '{}'", input.display(), event.name);
                MatchKind::Event {
                    name: event.name.clone(),
                }
            }
            Classification::Fallback(code) => {
                debug!("{} fell back to {}", input.display(), code);
                MatchKind::Fallback
            }
        };

        let outcomes = classification
            .codes()
            .into_iter()
            .map(|code| self.convert_one(input, code))
            .collect();

        FileReport {
            input: input.to_path_buf(),
            matched,
            outcomes,
        }
    }

    fn convert_one(&self, input: &Path, code: &str) -> ConversionOutcome {
        self.guarded(input, code, |destination| self.invoker.convert(input, destination))
    }

    /// Run `convert` for one item, turning a bad code or a panic into a
    /// failed outcome.
    fn guarded<F>(&self, input: &Path, code: &str, convert: F) -> ConversionOutcome
    where
        F: FnOnce(&Path) -> std::result::Result<String, ConversionError>,
    {
        let status = if is_valid_code(code) {
            let destination = self.config.output_root.join(code);
            panic::catch_unwind(AssertUnwindSafe(|| convert(&destination)))
                .unwrap_or_else(|payload| {
                    Err(ConversionError::Panicked {
                        source_file: input.to_path_buf(),
                        message: panic_message(payload.as_ref()),
                    })
                })
        } else {
            Err(ConversionError::InvalidDestination {
                code: code.to_string(),
            })
        };

        if let Err(err) = &status {
            warn!("{} -> {}: {}", input.display(), code, err);
        }

        ConversionOutcome {
            input: input.to_path_buf(),
            destination_code: code.to_string(),
            status,
        }
    }

    /// Process `inputs` on the worker pool, handing each report to
    /// `on_report` as it completes.
    pub fn dispatch<F>(&self, inputs: Vec<PathBuf>, mut on_report: F) -> Result<RunSummary>
    where
        F: FnMut(FileReport),
    {
        let mut summary = RunSummary::default();
        if inputs.is_empty() {
            return Ok(summary);
        }

        let worker_count = self.config.workers.max(1).min(inputs.len());
        debug!(
            "Dispatching {} inputs to {} workers",
            inputs.len(),
            worker_count
        );

        let (job_tx, job_rx) = mpsc::channel::<PathBuf>();
        for input in inputs {
            // The receiver is alive until the end of this function.
            let _ = job_tx.send(input);
        }
        drop(job_tx);
        let jobs = Mutex::new(job_rx);

        thread::scope(|scope| {
            let (report_tx, report_rx) = mpsc::channel::<FileReport>();

            let mut spawned = 0;
            for id in 0..worker_count {
                let report_tx = report_tx.clone();
                let jobs = &jobs;
                let result = thread::Builder::new()
                    .name(format!("giftflow-worker-{}", id))
                    .spawn_scoped(scope, move || {
                        while let Some(input) = next_job(jobs) {
                            let report = self.process_file(&input);
                            if report_tx.send(report).is_err() {
                                break;
                            }
                        }
                    });
                match result {
                    Ok(_) => spawned += 1,
                    Err(err) if spawned == 0 => return Err(DispatchError::WorkerSpawn(err)),
                    Err(err) => {
                        warn!("Running with {} workers: {}", spawned, err);
                        break;
                    }
                }
            }
            drop(report_tx);

            for report in report_rx {
                summary.record(&report);
                on_report(report);
            }
            Ok(())
        })?;

        info!(
            "Processed {} files: {} conversions, {} succeeded, {} failed",
            summary.files, summary.conversions, summary.succeeded, summary.failed
        );
        Ok(summary)
    }

    /// Discover and process everything, returning reports in completion order.
    pub fn run(&self) -> Result<Vec<FileReport>> {
        let inputs = self.discover()?;
        let mut reports = Vec::with_capacity(inputs.len());
        self.dispatch(inputs, |report| reports.push(report))?;
        Ok(reports)
    }
}

/// Run a whole pipeline and return one report line per input file.
pub fn run(
    input_root: &Path,
    output_root: &Path,
    extensions: &ExtensionSet,
    converter: &Path,
    workers: usize,
    catalog: &Catalog,
) -> Result<Vec<String>> {
    let config = DispatchConfig::new(input_root, output_root, ConverterConfig::new(converter))
        .with_extensions(extensions.clone())
        .with_workers(workers);
    let reports = Dispatcher::new(config, catalog).run()?;
    Ok(reports.iter().map(FileReport::line).collect())
}

fn next_job(jobs: &Mutex<mpsc::Receiver<PathBuf>>) -> Option<PathBuf> {
    let receiver = match jobs.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    receiver.recv().ok()
}

/// A code must name exactly one directory directly under the output root.
fn is_valid_code(code: &str) -> bool {
    let mut components = Path::new(code).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
