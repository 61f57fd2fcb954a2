//! Error types for converter invocations

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single (file, destination code) conversion.
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Converter binary not found: {}", converter.display())]
    ConverterNotFound { converter: PathBuf },

    #[error("Conversion failed for {}: {detail}", source_file.display())]
    ExecutionFailed { source_file: PathBuf, detail: String },

    #[error("Conversion timed out for {} after {}s", source_file.display(), timeout.as_secs())]
    TimedOut {
        source_file: PathBuf,
        timeout: Duration,
    },

    #[error("No .{extension} file generated for {}", source_file.display())]
    NoOutput {
        source_file: PathBuf,
        extension: String,
    },

    #[error(
        "Multiple .{extension} files generated for {}: {}",
        source_file.display(),
        found.join(", ")
    )]
    AmbiguousOutput {
        source_file: PathBuf,
        extension: String,
        found: Vec<String>,
    },

    #[error("Failed to prepare {}: {source}", path.display())]
    Workspace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to move {} to {}: {source}", artifact.display(), destination.display())]
    Relocate {
        artifact: PathBuf,
        destination: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid destination code '{code}'")]
    InvalidDestination { code: String },

    #[error("Conversion of {} panicked: {message}", source_file.display())]
    Panicked { source_file: PathBuf, message: String },
}

impl ConversionError {
    /// Stable short name, used in JSON reports.
    pub fn kind(&self) -> &'static str {
        match self {
            ConversionError::ConverterNotFound { .. } => "converter_not_found",
            ConversionError::ExecutionFailed { .. } => "execution_failed",
            ConversionError::TimedOut { .. } => "timed_out",
            ConversionError::NoOutput { .. } => "no_output",
            ConversionError::AmbiguousOutput { .. } => "ambiguous_output",
            ConversionError::Workspace { .. } => "workspace",
            ConversionError::Relocate { .. } => "relocate",
            ConversionError::InvalidDestination { .. } => "invalid_destination",
            ConversionError::Panicked { .. } => "panicked",
        }
    }
}
