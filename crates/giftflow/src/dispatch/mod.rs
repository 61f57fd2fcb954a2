//! Dispatch - discovery, worker pool and per-file reporting

pub mod discover;
pub mod dispatcher;
pub mod error;
pub mod report;

pub use discover::{check_input_root, find_inputs, ExtensionSet, DEFAULT_EXTENSIONS};
pub use dispatcher::{run, DispatchConfig, Dispatcher, DEFAULT_WORKERS};
pub use error::DispatchError;
pub use report::{ConversionOutcome, FileRecord, FileReport, MatchKind, OutcomeRecord, RunSummary};
