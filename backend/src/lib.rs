//! # CultURIze - persistent identifier redirects from a spreadsheet
//!
//! CultURIze turns a CSV sheet mapping persistent identifiers (PIDs) to
//! target URLs into Apache or Nginx rewrite rules, validates every row
//! along the way, and can publish the result to a Git repository.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌────────────┐   ┌──────────────────┐
//! │ CSV file │──▶│  Parser  │──▶│ Duplicates │──▶│ Apache / Nginx   │
//! │ (,/;)    │   │ (rows)   │   │ (E07)      │   │ or HTML report   │
//! └──────────┘   └──────────┘   └────────────┘   └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use culturize::{convert_text, RedirectConfig, Target};
//!
//! let csv = "PID,document type,URL,enabled\npid,doctype,https://test.test,1\n";
//! let result = convert_text(csv, Target::Apache, "", &RedirectConfig::default())?;
//! assert_eq!(result.num_lines_accepted, 1);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Column registry and runtime settings
//! - [`models`] - Rows, error codes, column letters
//! - [`parser`] - CSV decoding and row collection
//! - [`validation`] - Field rules, duplicate detection, URL probing
//! - [`render`] - Apache and Nginx configuration
//! - [`report`] - HTML diagnostics
//! - [`publish`] - Git publishing
//! - [`pipeline`] - Convert / validate / publish use cases
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Parsing and validation
pub mod parser;
pub mod validation;

// Output
pub mod render;
pub mod report;

// Publishing
pub mod publish;

// Use cases
pub mod pipeline;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, ParseError, PipelineError, PublishError, ReportError, ServerError,
};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{
    response_class, ProbeOptions, PublishOptions, RedirectConfig, ResponseClass, Settings,
    COL_DOCTYPE, COL_ENABLED, COL_PID, COL_URL,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{column_letter, ConversionResult, ErrorCode, RawRecord, Row, RowCounter};

// =============================================================================
// Re-exports - Parsing and validation
// =============================================================================

pub use parser::{create_rows, decode_bytes, detect_delimiter, read_csv_file, ParseOptions};
pub use validation::{check_urls, detect_duplicates, UrlProber};

// =============================================================================
// Re-exports - Output
// =============================================================================

pub use render::{render, render_apache, render_nginx, ApacheOptions, Target};
pub use report::{render_row, write_report, Action, HtmlMode};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use pipeline::{
    convert_csv, convert_text, publish, validate_csv, validate_text, ActionOutcome,
    PublishRequest, ValidateOptions,
};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server};
}
