//! Zip download of the whole output tree

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use super::error::ServeError;
use super::files::list_files;
use super::AppState;

/// Attachment name of the archive
pub const ARCHIVE_NAME: &str = "dlc.zip";

/// Deflate every file under `root` into an in-memory zip, entries named by
/// their `/`-separated relative path.
pub fn build_archive(root: &Path) -> Result<Vec<u8>, ServeError> {
    let files = list_files(root)?;

    let mut archive = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut archive));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        for file in &files {
            let content = fs::read(root.join(&file.path))?;
            zip.start_file(file.path.as_str(), options)?;
            zip.write_all(&content)?;
        }

        zip.finish()?;
    }

    debug!("Archived {} files ({} bytes)", files.len(), archive.len());
    Ok(archive)
}

/// GET /download-zip
pub async fn download_zip(State(state): State<AppState>) -> Result<Response, ServeError> {
    let root = state.output_dir.clone();
    let archive = tokio::task::spawn_blocking(move || build_archive(&root)).await??;

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", ARCHIVE_NAME),
            ),
        ],
        archive,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    #[test]
    fn test_archive_contains_relative_entries() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("EUR1")).unwrap();
        fs::write(dir.path().join("EUR1/a.myg"), b"gift").unwrap();
        fs::write(dir.path().join("top.myg"), b"top").unwrap();

        let bytes = build_archive(dir.path()).unwrap();
        let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(zip.len(), 2);

        let mut content = String::new();
        zip.by_name("EUR1/a.myg")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "gift");
    }

    #[test]
    fn test_empty_tree_is_valid_archive() {
        let dir = TempDir::new().unwrap();
        let bytes = build_archive(&dir.path().join("missing")).unwrap();
        let zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(zip.len(), 0);
    }
}
