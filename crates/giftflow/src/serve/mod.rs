//! Serve - read-only HTTP access to the conversion output tree
//!
//! Routes:
//! - `GET /`               landing page
//! - `GET /browse`         HTML listing with download links
//! - `GET /api/files`      JSON listing
//! - `GET /dlc/*path`      single file download
//! - `GET /download-zip`   the whole tree as `dlc.zip`
//! - `GET /health`         liveness probe

pub mod archive;
pub mod error;
pub mod files;
pub mod health;

pub use error::ServeError;
pub use files::{list_files, FileEntry};
pub use health::health_routes;

use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;

/// Default output tree served when none is configured
pub const DEFAULT_OUTPUT_DIR: &str = "/work/DLC";

/// Default listen address
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

/// Application state shared across HTTP handlers
#[derive(Debug, Clone)]
pub struct AppState {
    /// Root of the converted output tree
    pub output_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: Arc::new(output_dir.into()),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/", get(files::index))
        .route("/browse", get(files::browse))
        .route("/api/files", get(files::api_files))
        .route("/dlc/*path", get(files::download))
        .route("/download-zip", get(archive::download_zip))
        .merge(health_routes())
        .with_state(state)
}
