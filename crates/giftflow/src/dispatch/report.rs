//! Per-file conversion reports.
//!
//! One [`FileReport`] per discovered input, holding one [`ConversionOutcome`]
//! per destination code in the order the codes were converted.

use crate::convert::ConversionError;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// How the destination codes were chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchKind {
    Event { name: String },
    Fallback,
}

/// Result of converting one input for one destination code.
#[derive(Debug)]
pub struct ConversionOutcome {
    pub input: PathBuf,
    pub destination_code: String,
    pub status: Result<String, ConversionError>,
}

impl ConversionOutcome {
    pub fn is_success(&self) -> bool {
        self.status.is_ok()
    }

    /// Generated artifact name, on success.
    pub fn output_name(&self) -> Option<&str> {
        self.status.as_ref().ok().map(String::as_str)
    }

    pub fn error(&self) -> Option<&ConversionError> {
        self.status.as_ref().err()
    }
}

/// Everything that happened to one input file.
#[derive(Debug)]
pub struct FileReport {
    pub input: PathBuf,
    pub matched: MatchKind,
    pub outcomes: Vec<ConversionOutcome>,
}

impl FileReport {
    pub fn is_fallback(&self) -> bool {
        self.matched == MatchKind::Fallback
    }

    pub fn event_name(&self) -> Option<&str> {
        match &self.matched {
            MatchKind::Event { name } => Some(name),
            MatchKind::Fallback => None,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &ConversionOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// The report line: one segment per code, joined with `; `.
    pub fn line(&self) -> String {
        let name = display_name(&self.input);
        let suffix = if self.is_fallback() { " (fallback)" } else { "" };
        self.outcomes
            .iter()
            .map(|outcome| match &outcome.status {
                Ok(generated) => format!(
                    "{} -> {}/{}{}",
                    name, outcome.destination_code, generated, suffix
                ),
                Err(err) => format!(
                    "ERR {} -> {}{}: {}",
                    name, outcome.destination_code, suffix, err
                ),
            })
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn to_record(&self) -> FileRecord {
        FileRecord {
            input: self.input.display().to_string(),
            matched: if self.is_fallback() { "fallback" } else { "event" },
            event: self.event_name().map(str::to_string),
            outcomes: self
                .outcomes
                .iter()
                .map(|outcome| OutcomeRecord {
                    code: outcome.destination_code.clone(),
                    status: if outcome.is_success() { "ok" } else { "error" },
                    output: outcome.output_name().map(str::to_string),
                    error_kind: outcome.error().map(ConversionError::kind),
                    error: outcome.error().map(|e| e.to_string()),
                })
                .collect(),
        }
    }
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line())
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Serializable form of a [`FileReport`].
#[derive(Debug, Serialize)]
pub struct FileRecord {
    pub input: String,
    #[serde(rename = "match")]
    pub matched: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    pub outcomes: Vec<OutcomeRecord>,
}

#[derive(Debug, Serialize)]
pub struct OutcomeRecord {
    pub code: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Totals over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub files: usize,
    pub event_files: usize,
    pub fallback_files: usize,
    pub conversions: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn record(&mut self, report: &FileReport) {
        self.files += 1;
        if report.is_fallback() {
            self.fallback_files += 1;
        } else {
            self.event_files += 1;
        }
        for outcome in &report.outcomes {
            self.conversions += 1;
            if outcome.is_success() {
                self.succeeded += 1;
            } else {
                self.failed += 1;
            }
        }
    }
}
