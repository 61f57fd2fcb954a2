//! Per-conversion scratch workspace.
//!
//! The converter writes its output next to its input with a name it picks
//! itself, so every invocation gets a private directory. The directory is
//! removed when the `ScratchSpace` is dropped, on every exit path.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SCRATCH_PREFIX: &str = ".giftflow-";

pub struct ScratchSpace {
    dir: TempDir,
}

impl ScratchSpace {
    /// Create a scratch directory under `parent`, or the system temp dir.
    ///
    /// The resulting path is always absolute.
    pub fn create(parent: Option<&Path>) -> io::Result<Self> {
        let dir = match parent {
            Some(parent) => {
                let parent = if parent.is_absolute() {
                    parent.to_path_buf()
                } else {
                    std::env::current_dir()?.join(parent)
                };
                fs::create_dir_all(&parent)?;
                tempfile::Builder::new()
                    .prefix(SCRATCH_PREFIX)
                    .tempdir_in(&parent)?
            }
            None => tempfile::Builder::new().prefix(SCRATCH_PREFIX).tempdir()?,
        };
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Copy `source` into the scratch root, keeping its file name.
    pub fn stage(&self, source: &Path) -> io::Result<PathBuf> {
        let name = source.file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} has no file name", source.display()),
            )
        })?;
        let staged = self.path().join(name);
        fs::copy(source, &staged)?;
        Ok(staged)
    }

    /// Regular files in the scratch root with the given extension,
    /// excluding `staged`. Sorted by name.
    pub fn outputs(&self, extension: &str, staged: &Path) -> io::Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        for entry in fs::read_dir(self.path())? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if path == staged {
                continue;
            }
            if path.extension() == Some(OsStr::new(extension)) {
                found.push(path);
            }
        }
        found.sort();
        Ok(found)
    }

    /// Remove the directory now and report failures.
    pub fn close(self) -> io::Result<()> {
        self.dir.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_removed_on_drop() {
        let path = {
            let scratch = ScratchSpace::create(None).unwrap();
            fs::write(scratch.path().join("leftover.myg"), b"x").unwrap();
            scratch.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_scratch_under_custom_parent() {
        let parent = TempDir::new().unwrap();
        let nested = parent.path().join("work").join("scratch");
        let scratch = ScratchSpace::create(Some(&nested)).unwrap();
        assert!(scratch.path().starts_with(&nested));
        assert!(scratch
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(SCRATCH_PREFIX));
        let path = scratch.path().to_path_buf();
        scratch.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_stage_and_list_outputs() {
        let input_dir = TempDir::new().unwrap();
        let source = input_dir.path().join("gift.myg");
        fs::write(&source, b"input").unwrap();

        let scratch = ScratchSpace::create(None).unwrap();
        let staged = scratch.stage(&source).unwrap();
        assert_eq!(fs::read(&staged).unwrap(), b"input");

        fs::write(scratch.path().join("b.myg"), b"").unwrap();
        fs::write(scratch.path().join("a.myg"), b"").unwrap();
        fs::write(scratch.path().join("a.MYG"), b"").unwrap();
        fs::write(scratch.path().join("notes.txt"), b"").unwrap();
        fs::create_dir(scratch.path().join("dir.myg")).unwrap();

        let names: Vec<String> = scratch
            .outputs("myg", &staged)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.myg", "b.myg"]);
    }
}
