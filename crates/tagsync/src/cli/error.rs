//! Helpful error types for CLI commands
//!
//! Every error includes:
//! - What went wrong
//! - Context about the situation
//! - Suggestions for how to fix it

use std::fmt;
use std::path::Path;
use tagsync::{ComponentFailure, TagSyncError};

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
    /// Create a new helpful error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add a suggestion for fixing the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add multiple suggestions
    pub fn with_suggestions(mut self, suggestions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.suggestions.extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    // === Common error constructors ===

    /// Project root does not exist
    pub fn root_not_found(path: &Path) -> Self {
        Self::new(format!("Project root not found: {}", path.display()))
            .with_context("The directory to scan does not exist")
            .with_suggestions([
                format!("TRY: Check that the path exists: ls -la {}", path.display()),
                "TRY: Pass the repository root with --root <DIR>".to_string(),
            ])
    }

    /// Project root is a file
    pub fn root_not_a_directory(path: &Path) -> Self {
        Self::new(format!("Not a directory: {}", path.display()))
            .with_context("The project root must be a directory")
            .with_suggestion(format!(
                "TRY: Use the parent directory: --root {}",
                path.parent()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| ".".to_string())
            ))
    }

    /// --component names something that is not configured
    pub fn unknown_component(name: &str, known: &str) -> Self {
        Self::new(format!("Unknown component: '{}'", name))
            .with_context(format!("Configured components: {}", known))
            .with_suggestions([
                "TRY: Omit --component to process every component".to_string(),
                "TRY: Check the [[component]] entries in tagsync.toml".to_string(),
            ])
    }

    /// Config file could not be loaded
    pub fn invalid_config(err: &TagSyncError) -> Self {
        Self::new(format!("Invalid configuration: {}", err))
            .with_context("tagsync.toml could not be loaded")
            .with_suggestions([
                "TRY: Each [[component]] needs name, image and version_file".to_string(),
                "TRY: Allowed [scan] keys: ignore_dirs, include_extensions, exclude_files, follow_symlinks"
                    .to_string(),
            ])
    }

    /// Verify found stale references
    pub fn version_mismatches(count: usize) -> Self {
        Self::new(format!(
            "{} version mismatch{} found",
            count,
            if count == 1 { "" } else { "es" }
        ))
        .with_context("Image references do not match their component's version file")
        .with_suggestion("TRY: Rewrite them to the current versions: tagsync update")
    }

    /// Some components could not be processed at all
    pub fn components_failed(failures: &[ComponentFailure]) -> Self {
        let names: Vec<&str> = failures.iter().map(|f| f.component.as_str()).collect();
        let mut err = Self::new(format!(
            "{} component{} could not be processed: {}",
            failures.len(),
            if failures.len() == 1 { "" } else { "s" },
            names.join(", ")
        ));
        if let Some(first) = failures.first() {
            err = err.with_context(first.error.clone());
        }
        err.with_suggestions([
            "TRY: Make sure each component's version file exists and holds a single tag",
            "TRY: Run with -v for details",
        ])
    }

    /// Map a library error from a verify/update pass
    pub fn from_engine(err: TagSyncError) -> Self {
        match err {
            TagSyncError::UnknownComponent { ref name, ref known } => {
                Self::unknown_component(name, known)
            }
            ref other if other.is_config_error() => Self::invalid_config(other),
            other => Self::new(other.to_string()),
        }
    }

    /// Machine-readable form used by `--json`
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.message,
            "context": self.context,
            "suggestions": self.suggestions,
        })
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

/// Print any CLI error as a JSON object on stderr.
pub fn print_json_error(err: &anyhow::Error) {
    let value = match err.downcast_ref::<HelpfulError>() {
        Some(helpful) => helpful.to_json(),
        None => serde_json::json!({
            "error": err.to_string(),
            "context": serde_json::Value::Null,
            "suggestions": Vec::<String>::new(),
        }),
    };
    eprintln!("{}", value);
}
