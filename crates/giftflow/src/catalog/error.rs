//! Error types for catalog loading

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Catalog error type
///
/// Only files that exist can produce these; a missing mapping or events
/// file degrades to an empty catalog instead.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid mapping file {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid events CSV {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid mapping file {}: {message}", path.display())]
    Mapping { path: PathBuf, message: String },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CatalogError>;
