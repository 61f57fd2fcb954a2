//! Helpful error types for the giftflow CLI
//!
//! Every error includes:
//! - What went wrong
//! - Context about the situation
//! - Suggestions for how to fix it

use giftflow::catalog::CatalogError;
use giftflow::dispatch::DispatchError;
use std::fmt;
use std::path::Path;

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    /// The main error message
    pub message: String,
    /// Additional context about what was happening
    pub context: Option<String>,
    /// Suggestions for how to fix the error
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_suggestions(
        mut self,
        suggestions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.suggestions.extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    // === Common error constructors ===

    /// Input root does not exist
    pub fn path_not_found(path: &Path) -> Self {
        Self::new(format!("Path not found: {}", path.display()))
            .with_context("The input root does not exist on the filesystem")
            .with_suggestions([
                format!("TRY: Check that the path exists: ls -la {}", path.display()),
                "TRY: Check for typos in --input-root".to_string(),
            ])
    }

    /// Input root exists but is not a directory
    pub fn not_a_directory(path: &Path) -> Self {
        Self::new(format!("Not a directory: {}", path.display()))
            .with_context("--input-root must be a directory that is scanned recursively")
            .with_suggestion(format!(
                "TRY: Use the parent directory: --input-root {}",
                path.parent()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| ".".to_string())
            ))
    }

    /// Input root cannot be listed
    pub fn cannot_read_dir(path: &Path, reason: &str) -> Self {
        Self::new(format!("Cannot read directory: {}", path.display()))
            .with_context(reason.to_string())
            .with_suggestions([
                format!("TRY: Check directory permissions: ls -ld {}", path.display()),
                "TRY: Run as a user that can read the input tree".to_string(),
            ])
    }

    /// Mapping or events file exists but cannot be used
    pub fn config_error(path: &Path, details: &str) -> Self {
        Self::new(format!("Invalid configuration file: {}", path.display()))
            .with_context(details.to_string())
            .with_suggestions([
                "TRY: Mapping files are YAML with a 'gamecode' map of pattern: CODE".to_string(),
                "TRY: Event tables are CSV with EventName,GameCodes,Regions,Year columns"
                    .to_string(),
                "TRY: Omit the flag to run with an empty configuration".to_string(),
            ])
    }

    /// `--exts` parsed to nothing
    pub fn no_extensions(raw: &str) -> Self {
        Self::new(format!("No file extensions in --exts '{}'", raw))
            .with_context("At least one extension is needed to select inputs")
            .with_suggestion("TRY: --exts .pcd,.wc4")
    }

    /// Converter path cannot be resolved
    pub fn converter_unresolvable(path: &Path, reason: &str) -> Self {
        Self::new(format!("Cannot resolve converter path: {}", path.display()))
            .with_context(reason.to_string())
            .with_suggestion("TRY: Pass an absolute path with --bin-mgc")
    }
}

impl From<DispatchError> for HelpfulError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::InputRootMissing { path } => Self::path_not_found(&path),
            DispatchError::InputRootNotDirectory { path } => Self::not_a_directory(&path),
            DispatchError::InputRootUnreadable { path, source } => {
                Self::cannot_read_dir(&path, &source.to_string())
            }
            other => Self::new(other.to_string()),
        }
    }
}

impl From<CatalogError> for HelpfulError {
    fn from(err: CatalogError) -> Self {
        let path = match &err {
            CatalogError::Read { path, .. }
            | CatalogError::Yaml { path, .. }
            | CatalogError::Csv { path, .. }
            | CatalogError::Mapping { path, .. } => path.clone(),
        };
        Self::config_error(&path, &err.to_string())
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

/// Print an error as a JSON object on stdout, for `--json` runs.
pub fn print_json_error(err: &anyhow::Error) {
    let (message, context, suggestions) = match err.downcast_ref::<HelpfulError>() {
        Some(helpful) => (
            helpful.message.clone(),
            helpful.context.clone(),
            helpful.suggestions.clone(),
        ),
        None => (format!("{:#}", err), None, Vec::new()),
    };
    let value = serde_json::json!({
        "error": message,
        "context": context,
        "suggestions": suggestions,
    });
    println!("{}", value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_helpful_error_display() {
        let err = HelpfulError::new("Something went wrong")
            .with_context("While converting")
            .with_suggestion("Try again");

        let display = format!("{}", err);
        assert!(display.contains("ERROR: Something went wrong"));
        assert!(display.contains("CONTEXT: While converting"));
        assert!(display.contains("Try again"));
    }

    #[test]
    fn test_dispatch_error_conversion() {
        let err: HelpfulError = DispatchError::InputRootMissing {
            path: PathBuf::from("/nonexistent/saves"),
        }
        .into();

        let display = format!("{}", err);
        assert!(display.contains("/nonexistent/saves"));
        assert!(display.contains("TRY:"));
    }

    #[test]
    fn test_catalog_error_conversion() {
        let err: HelpfulError = CatalogError::Mapping {
            path: PathBuf::from("/etc/giftflow/mapping.yaml"),
            message: "'gamecode' must be a mapping".to_string(),
        }
        .into();

        assert!(err.message.contains("mapping.yaml"));
        assert!(err.context.unwrap().contains("gamecode"));
    }
}
