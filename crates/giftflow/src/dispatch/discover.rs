//! Input discovery: recursive walk filtered by file extension.

use super::error::{DispatchError, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Source extensions picked up when `--exts` is not given
pub const DEFAULT_EXTENSIONS: &str = ".pcd,.pgt,.pgf,.wc4,.wc5";

/// Case-insensitive set of file extensions, stored lowercase without dots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSet {
    extensions: Vec<String>,
}

impl ExtensionSet {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for ext in extensions {
            let ext = ext.as_ref().trim().trim_start_matches('.').to_lowercase();
            if !ext.is_empty() && !out.contains(&ext) {
                out.push(ext);
            }
        }
        Self { extensions: out }
    }

    /// Parse a comma-separated list such as `.pcd,.WC4, pgt`.
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| {
                let ext = ext.to_string_lossy().to_lowercase();
                self.extensions.iter().any(|e| *e == ext)
            })
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }
}

impl Default for ExtensionSet {
    fn default() -> Self {
        Self::parse(DEFAULT_EXTENSIONS)
    }
}

impl fmt::Display for ExtensionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dotted: Vec<String> = self.extensions.iter().map(|e| format!(".{}", e)).collect();
        write!(f, "[{}]", dotted.join(", "))
    }
}

/// Check that `root` is a readable directory.
pub fn check_input_root(root: &Path) -> Result<()> {
    if !root.exists() {
        return Err(DispatchError::InputRootMissing {
            path: root.to_path_buf(),
        });
    }
    if !root.is_dir() {
        return Err(DispatchError::InputRootNotDirectory {
            path: root.to_path_buf(),
        });
    }
    fs::read_dir(root).map_err(|source| DispatchError::InputRootUnreadable {
        path: root.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Every file under `root` whose extension is in `extensions`, sorted by path.
///
/// Unreadable entries below the root are logged and skipped; an unreadable
/// root is fatal.
pub fn find_inputs(root: &Path, extensions: &ExtensionSet) -> Result<Vec<PathBuf>> {
    check_input_root(root)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                if err.depth() == 0 {
                    let source = err
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "walk failed"));
                    return Err(DispatchError::InputRootUnreadable {
                        path: root.to_path_buf(),
                        source,
                    });
                }
                warn!("Skipping unreadable entry: {}", err);
                continue;
            }
        };

        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if extensions.matches(path) {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    debug!("Discovered {} inputs under {}", files.len(), root.display());
    Ok(files)
}
