//! Domain models for the CultURIze pipeline.
//!
//! - [`Row`] - One redirect record with its validation state
//! - [`RawRecord`] - A CSV record zipped against the header
//! - [`RowCounter`] - Index sequence for one parse run
//! - [`ErrorCode`] - Row-level error taxonomy (E01 to E07)
//! - [`ConversionResult`] - Output of a conversion run

pub mod row;

use serde::Serialize;

pub use row::{RawRecord, Row, RowCounter, DUPLICATE_MARKER};

// =============================================================================
// Error codes
// =============================================================================

/// Row-level error codes. A row can carry several at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCode {
    /// PID contains characters outside `[A-Za-z0-9_-]`.
    #[serde(rename = "E01")]
    InvalidPid,
    /// Document type contains invalid characters.
    #[serde(rename = "E02")]
    InvalidDocType,
    /// Document type is empty and empty types are not allowed.
    #[serde(rename = "E03")]
    MissingDocType,
    /// URL is not a well-formed absolute web URL.
    #[serde(rename = "E04")]
    InvalidUrl,
    /// Enabled field is not `0` or `1`.
    #[serde(rename = "E05")]
    InvalidEnabled,
    /// URL did not answer a HEAD request with 200.
    #[serde(rename = "E06")]
    UnreachableUrl,
    /// (document type, PID) duplicates an earlier row.
    #[serde(rename = "E07")]
    Duplicate,
}

impl ErrorCode {
    /// The short code, e.g. `"E04"`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPid => "E01",
            Self::InvalidDocType => "E02",
            Self::MissingDocType => "E03",
            Self::InvalidUrl => "E04",
            Self::InvalidEnabled => "E05",
            Self::UnreachableUrl => "E06",
            Self::Duplicate => "E07",
        }
    }

    /// Human-readable explanation used in reports.
    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidPid => "PID contains invalid characters",
            Self::InvalidDocType => "Document type contains invalid characters",
            Self::MissingDocType => "No document type specified",
            Self::InvalidUrl => "Invalid URL",
            Self::InvalidEnabled => "Enabled is not 0 or 1",
            Self::UnreachableUrl => "URL unavailable",
            Self::Duplicate => "Duplicate document type / PID combination",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

// =============================================================================
// Column letters
// =============================================================================

/// Spreadsheet column label for a 1-based column position.
///
/// 1 → `A`, 26 → `Z`, 27 → `AA`, 52 → `AZ`, 53 → `BA`. Position 0 yields
/// an empty string.
pub fn column_letter(position: usize) -> String {
    let mut n = position;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

// =============================================================================
// Conversion result
// =============================================================================

/// Output of one conversion run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    /// Generated configuration text.
    pub config: String,
    pub num_lines_accepted: usize,
    pub num_lines_rejected: usize,
    /// All rows, for reporting.
    pub rows: Vec<Row>,
}
