//! Listing, browsing and single-file download

use axum::{
    extract::{Path as UrlPath, State},
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use std::fmt::Write as _;
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use tracing::warn;

use super::error::ServeError;
use super::AppState;

/// Characters escaped in `/dlc/` links: everything but unreserved ones and `/`.
const DLC_PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
  <head><title>DLC Download</title></head>
  <body>
    <h1>DLC Download</h1>
    <a href="/download-zip"><button>Download myg ZIP</button></a>
    <a href="/browse"><button>Browse</button></a>
  </body>
</html>
"#;

/// One file under the output tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// Path relative to the output root, `/`-separated
    pub path: String,
    pub size: u64,
}

#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub root: String,
    pub files: Vec<FileEntry>,
}

/// Every regular file under `root`, sorted by relative path.
///
/// A missing root is an empty tree.
pub fn list_files(root: &Path) -> io::Result<Vec<FileEntry>> {
    if !root.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        files.push(FileEntry {
            path: to_url_path(relative),
            size: entry.metadata().map_err(io::Error::from)?.len(),
        });
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

/// Resolve a request path below `root`, rejecting anything that could escape it.
pub fn resolve_under(root: &Path, requested: &str) -> Option<PathBuf> {
    let relative = Path::new(requested);
    let mut components = relative.components().peekable();
    components.peek()?;
    if !components.all(|c| matches!(c, Component::Normal(_))) {
        return None;
    }
    Some(root.join(relative))
}

/// GET /
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /browse
pub async fn browse(State(state): State<AppState>) -> Result<Html<String>, ServeError> {
    let files = load_listing(&state).await?;

    let mut html = String::from("<h1>Browse DLC</h1><ul>");
    for file in &files {
        let _ = write!(
            html,
            r#"<li><a href="/dlc/{}">{}</a></li>"#,
            utf8_percent_encode(&file.path, DLC_PATH),
            escape_html(&file.path)
        );
    }
    html.push_str("</ul>");
    Ok(Html(html))
}

/// GET /api/files
pub async fn api_files(
    State(state): State<AppState>,
) -> Result<Json<FileListResponse>, ServeError> {
    let files = load_listing(&state).await?;
    Ok(Json(FileListResponse {
        root: state.output_dir.display().to_string(),
        files,
    }))
}

/// GET /dlc/*path
pub async fn download(
    State(state): State<AppState>,
    UrlPath(requested): UrlPath<String>,
) -> Result<Response, ServeError> {
    let path = resolve_under(&state.output_dir, &requested)
        .ok_or_else(|| ServeError::InvalidPath(requested.clone()))?;

    let real = match confine(&state.output_dir, &path).await {
        Ok(Some(real)) => real,
        Ok(None) => {
            warn!("Refusing {}: resolves outside the output root", path.display());
            return Err(ServeError::NotFound(requested));
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(ServeError::NotFound(requested))
        }
        Err(err) => return Err(err.into()),
    };

    let metadata = tokio::fs::metadata(&real).await?;
    if !metadata.is_file() {
        return Err(ServeError::NotFound(requested));
    }

    let bytes = tokio::fs::read(&real).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().replace('"', ""))
        .unwrap_or_default();

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", name),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Canonical form of `path`, if it is still under `root` once symlinks are
/// resolved.
async fn confine(root: &Path, path: &Path) -> io::Result<Option<PathBuf>> {
    let root = tokio::fs::canonicalize(root).await?;
    let real = tokio::fs::canonicalize(path).await?;
    Ok(real.starts_with(&root).then_some(real))
}

async fn load_listing(state: &AppState) -> Result<Vec<FileEntry>, ServeError> {
    let root = state.output_dir.clone();
    let files = tokio::task::spawn_blocking(move || list_files(&root)).await??;
    Ok(files)
}

pub(crate) fn to_url_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
