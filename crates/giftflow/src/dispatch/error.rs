//! Fatal dispatch errors. Per-file failures never show up here.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Input root not found: {}", path.display())]
    InputRootMissing { path: PathBuf },

    #[error("Input root is not a directory: {}", path.display())]
    InputRootNotDirectory { path: PathBuf },

    #[error("Cannot read input root {}: {source}", path.display())]
    InputRootUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to start worker thread: {0}")]
    WorkerSpawn(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, DispatchError>;
