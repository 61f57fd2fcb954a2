//! Conversion Invoker
//!
//! Runs the external converter on one input file and moves the single
//! artifact it produces into a destination directory.
//!
//! ```text
//! source file ──copy──> scratch/<name>
//!                         │
//!                         └── converter <scratch/name>   (cwd = scratch)
//!                               │
//!                               └── scratch/<generated>.myg ──move──> destination/
//! ```
//!
//! Postconditions are checked in order: launch/exit status, then the number
//! of generated artifacts (zero and many are both failures), then the move.

use super::error::ConversionError;
use super::scratch::ScratchSpace;
use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Suffix of artifacts produced by MysteryGiftConvert
pub const DEFAULT_OUTPUT_EXTENSION: &str = "myg";

/// How often a timed conversion polls the child for exit
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Number of trailing stderr lines kept in failure messages
const STDERR_TAIL_LINES: usize = 5;

/// Upper bound on captured converter output read back per stream
const CAPTURE_LIMIT: u64 = 64 * 1024;

/// Converter invocation settings
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// Path (or PATH-resolved name) of the converter executable
    pub executable: PathBuf,
    /// Extension of generated artifacts, without the dot
    pub output_extension: String,
    /// Parent directory for scratch workspaces (default: system temp dir)
    pub scratch_root: Option<PathBuf>,
    /// Kill the converter after this long (default: wait indefinitely)
    pub timeout: Option<Duration>,
}

impl ConverterConfig {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            output_extension: DEFAULT_OUTPUT_EXTENSION.to_string(),
            scratch_root: None,
            timeout: None,
        }
    }

    pub fn with_output_extension(mut self, extension: impl AsRef<str>) -> Self {
        self.output_extension = extension.as_ref().trim().trim_start_matches('.').to_string();
        self
    }

    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Runs the converter in isolated scratch workspaces.
#[derive(Debug, Clone)]
pub struct ConversionInvoker {
    config: ConverterConfig,
}

impl ConversionInvoker {
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Convert `source_file` and move the result into `destination_dir`.
    ///
    /// Returns the artifact's file name exactly as the converter chose it.
    pub fn convert(
        &self,
        source_file: &Path,
        destination_dir: &Path,
    ) -> Result<String, ConversionError> {
        fs::create_dir_all(destination_dir).map_err(|source| ConversionError::Workspace {
            path: destination_dir.to_path_buf(),
            source,
        })?;

        let scratch = ScratchSpace::create(self.config.scratch_root.as_deref()).map_err(|source| {
            ConversionError::Workspace {
                path: self
                    .config
                    .scratch_root
                    .clone()
                    .unwrap_or_else(std::env::temp_dir),
                source,
            }
        })?;

        let staged = scratch
            .stage(source_file)
            .map_err(|source| ConversionError::Workspace {
                path: source_file.to_path_buf(),
                source,
            })?;

        debug!(
            "Converting {} in {} -> {}",
            source_file.display(),
            scratch.path().display(),
            destination_dir.display()
        );
        self.run_converter(source_file, &staged, scratch.path())?;

        let extension = &self.config.output_extension;
        let mut outputs =
            scratch
                .outputs(extension, &staged)
                .map_err(|source| ConversionError::Workspace {
                    path: scratch.path().to_path_buf(),
                    source,
                })?;

        let artifact = match outputs.len() {
            0 => {
                return Err(ConversionError::NoOutput {
                    source_file: source_file.to_path_buf(),
                    extension: extension.clone(),
                })
            }
            1 => outputs.remove(0),
            _ => {
                return Err(ConversionError::AmbiguousOutput {
                    source_file: source_file.to_path_buf(),
                    extension: extension.clone(),
                    found: outputs.iter().map(|p| file_name_of(p)).collect(),
                })
            }
        };

        let generated = file_name_of(&artifact);
        let target = destination_dir.join(&generated);
        relocate(&artifact, &target).map_err(|source| ConversionError::Relocate {
            artifact: artifact.clone(),
            destination: target.clone(),
            source,
        })?;

        if let Err(err) = scratch.close() {
            warn!("Failed to remove scratch directory: {}", err);
        }

        debug!("Generated {}", target.display());
        Ok(generated)
    }

    fn run_converter(
        &self,
        source_file: &Path,
        staged: &Path,
        workdir: &Path,
    ) -> Result<(), ConversionError> {
        let executable = &self.config.executable;
        // Output goes to files, not pipes: a background process left behind by
        // the converter may keep them open after the converter itself exits.
        let mut stdout_log = capture_file()?;
        let mut stderr_log = capture_file()?;

        let mut child = match Command::new(executable)
            .arg(staged)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(stdio_for(&stdout_log)?)
            .stderr(stdio_for(&stderr_log)?)
            .spawn()
        {
            Ok(child) => child,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(ConversionError::ConverterNotFound {
                    converter: executable.clone(),
                })
            }
            Err(err) => {
                return Err(ConversionError::ExecutionFailed {
                    source_file: source_file.to_path_buf(),
                    detail: format!("failed to launch {}: {}", executable.display(), err),
                })
            }
        };

        let waited = match self.config.timeout {
            None => child.wait().map(Some),
            Some(timeout) => wait_with_deadline(&mut child, timeout),
        };

        let status = match waited {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ConversionError::TimedOut {
                    source_file: source_file.to_path_buf(),
                    timeout: self.config.timeout.unwrap_or_default(),
                });
            }
            Err(err) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ConversionError::ExecutionFailed {
                    source_file: source_file.to_path_buf(),
                    detail: format!("failed to wait for {}: {}", executable.display(), err),
                });
            }
        };

        let stdout = read_capture(&mut stdout_log);
        let stderr = read_capture(&mut stderr_log);

        let stdout = String::from_utf8_lossy(&stdout);
        if !stdout.trim().is_empty() {
            debug!("converter stdout for {}: {}", source_file.display(), stdout.trim());
        }

        if !status.success() {
            return Err(ConversionError::ExecutionFailed {
                source_file: source_file.to_path_buf(),
                detail: describe_failure(executable, status, &String::from_utf8_lossy(&stderr)),
            });
        }

        Ok(())
    }
}

/// Convert with default settings.
pub fn convert(
    executable: &Path,
    source_file: &Path,
    destination_dir: &Path,
) -> Result<String, ConversionError> {
    ConversionInvoker::new(ConverterConfig::new(executable)).convert(source_file, destination_dir)
}

fn wait_with_deadline(child: &mut Child, timeout: Duration) -> io::Result<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(timeout - elapsed));
    }
}

/// Anonymous temp file that receives one converter output stream.
fn capture_file() -> Result<File, ConversionError> {
    tempfile::tempfile().map_err(|source| ConversionError::Workspace {
        path: std::env::temp_dir(),
        source,
    })
}

fn stdio_for(file: &File) -> Result<Stdio, ConversionError> {
    file.try_clone()
        .map(Stdio::from)
        .map_err(|source| ConversionError::Workspace {
            path: std::env::temp_dir(),
            source,
        })
}

/// Read back the last [`CAPTURE_LIMIT`] bytes of a capture file.
fn read_capture(file: &mut File) -> Vec<u8> {
    let mut buf = Vec::new();
    let len = file.metadata().map(|m| m.len()).unwrap_or(0);
    let start = len.saturating_sub(CAPTURE_LIMIT);
    if file.seek(SeekFrom::Start(start)).is_ok() {
        let _ = file.take(CAPTURE_LIMIT).read_to_end(&mut buf);
    }
    buf
}

fn describe_failure(executable: &Path, status: ExitStatus, stderr: &str) -> String {
    let tail: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let start = tail.len().saturating_sub(STDERR_TAIL_LINES);
    let tail = tail[start..].join(" | ");

    if tail.is_empty() {
        format!("{} exited with {}", executable.display(), status)
    } else {
        format!("{} exited with {}: {}", executable.display(), status, tail)
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Move a file, falling back to copy + remove across filesystems.
///
/// A failed copy leaves nothing behind at `target`.
fn relocate(artifact: &Path, target: &Path) -> io::Result<()> {
    match fs::rename(artifact, target) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            debug!(
                "rename {} -> {} failed ({}); copying instead",
                artifact.display(),
                target.display(),
                rename_err
            );
            if let Err(copy_err) = fs::copy(artifact, target) {
                let _ = fs::remove_file(target);
                return Err(copy_err);
            }
            let _ = fs::remove_file(artifact);
            Ok(())
        }
    }
}
