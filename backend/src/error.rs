//! Error types for the CultURIze conversion pipeline.
//!
//! - [`ParseError`] - CSV parsing failures that abort a whole run
//! - [`ConfigError`] - Invalid runtime settings
//! - [`ReportError`] - HTML report writing errors
//! - [`PublishError`] - Git publishing errors
//! - [`PipelineError`] - Top-level orchestration errors
//! - [`ServerError`] - HTTP API errors
//!
//! Row-level problems (invalid PID, bad URL, duplicates...) are *not*
//! errors: they are recorded on the row as [`crate::models::ErrorCode`]s
//! and surface through the report.

use thiserror::Error;

use crate::models::ErrorCode;

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Parse-level failures. Any of these aborts the run without partial output.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The input text has zero length.
    #[error("The file is empty")]
    EmptyInput,

    /// Every record was malformed or the file only holds a header.
    #[error("No valid row found in the CSV file")]
    NoValidRows,

    /// Two or more rows share the same (document type, PID) identity.
    #[error("Duplicate redirections found: {}", .0.join(", "))]
    DuplicatesFound(Vec<String>),

    /// The CSV reader could not make sense of the input.
    #[error("Error while parsing the CSV file: {0}")]
    MalformedCsv(String),

    /// Strict mode: a row was rejected and invalid data is not ignored.
    #[error("Row {index} was rejected: {}", format_codes(.errors))]
    RejectedRow { index: usize, errors: Vec<ErrorCode> },

    /// Failed to read the CSV file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

fn format_codes(codes: &[ErrorCode]) -> String {
    if codes.is_empty() {
        return "row is disabled".to_string();
    }
    codes
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading settings from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}: {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },
}

// =============================================================================
// Report Errors
// =============================================================================

/// Errors while writing the HTML report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Publishing Errors
// =============================================================================

/// Errors from the Git publishing collaborator.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The repository URL does not name an owner and a repository.
    #[error("Invalid repository URL: {0}")]
    InvalidRepoUrl(String),

    /// The target subdirectory is not of the form `dir(/dir)*`.
    #[error("Invalid subdirectory: {0}")]
    InvalidSubdir(String),

    /// The local clone is missing where it is expected.
    #[error("No git repository at {}", .0.display())]
    MissingClone(std::path::PathBuf),

    /// A git invocation exited with a non-zero status.
    #[error("git {command} failed: {stderr}")]
    GitCommand { command: String, stderr: String },

    /// IO error (spawning git, writing the config file).
    #[error("Publishing IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level errors returned by the convert / validate / publish use cases.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("CSV error: {0}")]
    Parse(#[from] ParseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    /// The request itself is unusable (missing file, wrong extension...).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for report writing.
pub type ReportResult<T> = Result<T, ReportError>;

/// Result type for publishing operations.
pub type PublishResult<T> = Result<T, PublishError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
