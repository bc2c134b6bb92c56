//! Error types for custom-filter.
//!
//! The filter itself never fails: a non-text input is passed through, not
//! reported. The errors below belong to the host side (playbook loading,
//! template rendering, module execution and configuration).

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for custom-filter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for custom-filter.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Playbook Errors
    // ========================================================================
    /// Error parsing a playbook file.
    #[error("Failed to parse playbook '{path}': {message}")]
    PlaybookParse {
        /// Path to the playbook file
        path: PathBuf,
        /// Error message
        message: String,
        /// Source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error validating playbook structure.
    #[error("Playbook validation failed: {0}")]
    PlaybookValidation(String),

    // ========================================================================
    // Task Errors
    // ========================================================================
    /// Task execution failed.
    #[error("Task '{task}' failed on host '{host}': {message}")]
    TaskFailed {
        /// Task name
        task: String,
        /// Target host
        host: String,
        /// Error message
        message: String,
    },

    // ========================================================================
    // Module Errors
    // ========================================================================
    /// Module not found.
    #[error("Module '{0}' not found")]
    ModuleNotFound(String),

    /// Invalid module arguments.
    #[error("Invalid arguments for module '{module}': {message}")]
    ModuleArgs {
        /// Module name
        module: String,
        /// Error message
        message: String,
    },

    // ========================================================================
    // Template Errors
    // ========================================================================
    /// Template syntax error.
    #[error("Template syntax error in '{template}': {message}")]
    TemplateSyntax {
        /// Template source or name
        template: String,
        /// Error message
        message: String,
    },

    /// Template rendering error.
    #[error("Template rendering failed for '{template}': {message}")]
    TemplateRender {
        /// Template source or name
        template: String,
        /// Error message
        message: String,
    },

    // ========================================================================
    // Plugin Errors
    // ========================================================================
    /// A filter module named in configuration is not registered.
    #[error("Filter module '{0}' not found")]
    FilterModuleNotFound(String),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // IO and Serialization Errors
    // ========================================================================
    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Template error.
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
}

impl Error {
    /// Creates a new playbook parse error.
    pub fn playbook_parse(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::PlaybookParse {
            path: path.into(),
            message: message.into(),
            source,
        }
    }

    /// Creates a new task failed error.
    pub fn task_failed(
        task: impl Into<String>,
        host: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::TaskFailed {
            task: task.into(),
            host: host.into(),
            message: message.into(),
        }
    }

    /// Creates a new module args error.
    pub fn module_args(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ModuleArgs {
            module: module.into(),
            message: message.into(),
        }
    }

    /// Creates a new template render error.
    pub fn template_render(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TemplateRender {
            template: template.into(),
            message: message.into(),
        }
    }

    /// Classifies a minijinja error as a syntax or a render failure.
    pub fn from_template(template: &str, err: &minijinja::Error) -> Self {
        let message = err.to_string();
        match err.kind() {
            minijinja::ErrorKind::SyntaxError => Self::TemplateSyntax {
                template: template.to_string(),
                message,
            },
            _ => Self::template_render(template, message),
        }
    }

    /// Returns the error code for CLI exit status.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::TaskFailed { .. } | Error::ModuleArgs { .. } => 2,
            Error::PlaybookParse { .. } | Error::PlaybookValidation(_) => 4,
            Error::FilterModuleNotFound(_) | Error::Config(_) => 5,
            _ => 1,
        }
    }
}
