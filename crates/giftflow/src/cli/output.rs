//! Output formatting for the giftflow CLI
//!
//! Text mode prints a header, then one line per input as reports complete.
//! JSON mode buffers every report and prints a single document at the end.

use giftflow::dispatch::{ExtensionSet, FileRecord, FileReport, RunSummary};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

/// `[giftflow] Found <N> inputs with <exts>`
pub fn header_line(count: usize, extensions: &ExtensionSet) -> String {
    format!("[giftflow] Found {} inputs with {}", count, extensions)
}

/// Whole-run JSON document
#[derive(Debug, Serialize)]
pub struct RunDocument {
    pub input_root: String,
    pub output_root: String,
    pub extensions: Vec<String>,
    pub inputs: usize,
    pub reports: Vec<FileRecord>,
    pub summary: RunSummary,
}

impl RunDocument {
    pub fn new(input_root: &Path, output_root: &Path, extensions: &ExtensionSet, inputs: usize) -> Self {
        Self {
            input_root: input_root.display().to_string(),
            output_root: output_root.display().to_string(),
            extensions: extensions.iter().map(|e| format!(".{}", e)).collect(),
            inputs,
            reports: Vec::with_capacity(inputs),
            summary: RunSummary::default(),
        }
    }
}

/// Where reports go while a run is in progress.
pub enum ReportSink {
    Text,
    Json(Box<RunDocument>),
}

impl ReportSink {
    pub fn begin(&mut self, count: usize, extensions: &ExtensionSet) -> io::Result<()> {
        match self {
            ReportSink::Text => {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{}", header_line(count, extensions))?;
                stdout.flush()
            }
            ReportSink::Json(_) => Ok(()),
        }
    }

    pub fn report(&mut self, report: &FileReport) -> io::Result<()> {
        match self {
            ReportSink::Text => {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{}", report)?;
                stdout.flush()
            }
            ReportSink::Json(document) => {
                document.reports.push(report.to_record());
                Ok(())
            }
        }
    }

    pub fn finish(self, summary: RunSummary) -> io::Result<()> {
        match self {
            ReportSink::Text => Ok(()),
            ReportSink::Json(mut document) => {
                document.summary = summary;
                let json = serde_json::to_string_pretty(&document)
                    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{}", json)?;
                stdout.flush()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_line() {
        let exts = ExtensionSet::parse(".pcd,.wc4");
        assert_eq!(
            header_line(3, &exts),
            "[giftflow] Found 3 inputs with [.pcd, .wc4]"
        );
    }

    #[test]
    fn test_document_lists_dotted_extensions() {
        let doc = RunDocument::new(
            Path::new("/in"),
            Path::new("/out"),
            &ExtensionSet::parse("pcd"),
            0,
        );
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["extensions"][0], ".pcd");
        assert_eq!(value["summary"]["files"], 0);
    }
}
