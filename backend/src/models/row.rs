//! One CSV redirect record and its validation state.
//!
//! Rows are built from a [`RawRecord`] by a [`RowCounter`], which hands out
//! indices in reading order and only consumes one when a row is actually
//! created. Structural checks run once, in the constructor; duplicate
//! marking and URL probing mutate the row afterwards without touching
//! [`Row::is_valid`].

use serde::Serialize;

use super::{column_letter, ErrorCode};
use crate::config::{COL_DOCTYPE, COL_ENABLED, COL_PID, COL_URL};
use crate::validation::rules::{is_valid_enabled, is_valid_identifier, is_web_uri};
use crate::validation::UrlProber;

/// Cell marker pushed to `affected_cells` for duplicate errors.
pub const DUPLICATE_MARKER: &str = "duplicate";

// =============================================================================
// Raw record
// =============================================================================

/// A CSV data record zipped against the header row.
///
/// Field order is the physical column order of the source file. Records
/// shorter than the header simply lack the trailing columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: Vec<(String, String)>,
}

impl RawRecord {
    /// Zip header names with values; surplus values are dropped.
    pub fn new<H, V>(headers: &[H], values: &[V]) -> Self
    where
        H: AsRef<str>,
        V: AsRef<str>,
    {
        let fields = headers
            .iter()
            .zip(values.iter())
            .map(|(h, v)| (h.as_ref().to_string(), v.as_ref().to_string()))
            .collect();
        Self { fields }
    }

    /// Build a record from explicit `(column, value)` pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Value and 1-based column position of `column`, if present.
    pub fn get(&self, column: &str) -> Option<(usize, &str)> {
        self.fields
            .iter()
            .position(|(name, _)| name == column)
            .map(|i| (i + 1, self.fields[i].1.as_str()))
    }
}

/// The four tracked fields, once their presence has been confirmed.
struct RowFields<'a> {
    pid: (usize, &'a str),
    doc_type: Option<(usize, &'a str)>,
    url: (usize, &'a str),
    enabled: (usize, &'a str),
}

impl<'a> RowFields<'a> {
    fn extract(record: &'a RawRecord, allow_no_doctype: bool) -> Option<Self> {
        let pid = record.get(COL_PID)?;
        let url = record.get(COL_URL)?;
        let enabled = record.get(COL_ENABLED)?;
        let doc_type = record.get(COL_DOCTYPE);
        if doc_type.is_none() && !allow_no_doctype {
            return None;
        }
        Some(Self { pid, doc_type, url, enabled })
    }
}

// =============================================================================
// Row counter
// =============================================================================

/// Index sequence scoped to one parse run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowCounter {
    next: usize,
}

impl RowCounter {
    /// First data row of a spreadsheet (row 1 holds the header).
    pub const SPREADSHEET_FIRST_ROW: usize = 2;

    pub fn new(start: usize) -> Self {
        Self { next: start }
    }

    /// Counter whose indices match spreadsheet row numbers.
    pub fn spreadsheet() -> Self {
        Self::new(Self::SPREADSHEET_FIRST_ROW)
    }

    /// Index the next created row will receive.
    pub fn peek(&self) -> usize {
        self.next
    }

    /// Create a row from `record`, consuming an index only on success.
    ///
    /// Returns `None` for malformed records: PID, URL or enabled column
    /// missing, or document type missing while it is required.
    pub fn create_row(&mut self, record: &RawRecord, allow_no_doctype: bool) -> Option<Row> {
        let fields = RowFields::extract(record, allow_no_doctype)?;
        let row = Row::from_fields(self.next, fields, allow_no_doctype);
        self.next += 1;
        Some(row)
    }
}

impl Default for RowCounter {
    fn default() -> Self {
        Self::new(1)
    }
}

// =============================================================================
// Row
// =============================================================================

/// A redirect record with its validation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    index: usize,
    pid: String,
    doc_type: String,
    url: String,
    enabled: String,
    /// Column letters for PID, document type, URL and enabled.
    columns: [String; 4],
    errors: Vec<ErrorCode>,
    affected_cells: Vec<String>,
    valid: bool,
    url_checked: bool,
    url_working: bool,
    duplicate_of: Option<usize>,
}

impl Row {
    fn from_fields(index: usize, fields: RowFields<'_>, allow_no_doctype: bool) -> Self {
        let column_of = |pos: Option<usize>| pos.map(column_letter).unwrap_or_default();
        let columns = [
            column_of(Some(fields.pid.0)),
            column_of(fields.doc_type.map(|(pos, _)| pos)),
            column_of(Some(fields.url.0)),
            column_of(Some(fields.enabled.0)),
        ];

        let mut row = Self {
            index,
            pid: fields.pid.1.trim().to_string(),
            doc_type: fields
                .doc_type
                .map(|(_, v)| v.trim().to_string())
                .unwrap_or_default(),
            url: fields.url.1.trim().to_string(),
            enabled: fields.enabled.1.trim().to_string(),
            columns,
            errors: Vec::new(),
            affected_cells: Vec::new(),
            valid: false,
            url_checked: false,
            url_working: false,
            duplicate_of: None,
        };
        row.valid = row.run_structural_checks(allow_no_doctype);
        row
    }

    /// Checks run in a fixed order and accumulate; every failure is recorded.
    fn run_structural_checks(&mut self, allow_no_doctype: bool) -> bool {
        if !is_valid_identifier(&self.pid) {
            self.flag(ErrorCode::InvalidPid, 0);
        }

        if !self.doc_type.is_empty() {
            if !is_valid_identifier(&self.doc_type) {
                self.flag(ErrorCode::InvalidDocType, 1);
            }
        } else if !allow_no_doctype {
            self.flag(ErrorCode::MissingDocType, 1);
        }

        if !is_web_uri(&self.url) {
            self.flag(ErrorCode::InvalidUrl, 2);
        }

        if !is_valid_enabled(&self.enabled) {
            self.flag(ErrorCode::InvalidEnabled, 3);
        }

        self.errors.is_empty()
    }

    fn flag(&mut self, code: ErrorCode, field: usize) {
        self.errors.push(code);
        self.affected_cells
            .push(format!("{}{}", self.columns[field], self.index));
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn pid(&self) -> &str {
        &self.pid
    }

    pub fn doc_type(&self) -> &str {
        &self.doc_type
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn enabled(&self) -> &str {
        &self.enabled
    }

    /// Column letters for PID, document type, URL and enabled.
    pub fn columns(&self) -> &[String; 4] {
        &self.columns
    }

    pub fn errors(&self) -> &[ErrorCode] {
        &self.errors
    }

    pub fn has_error(&self, code: ErrorCode) -> bool {
        self.errors.contains(&code)
    }

    pub fn affected_cells(&self) -> &[String] {
        &self.affected_cells
    }

    /// Result of the structural checks made at construction.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn url_checked(&self) -> bool {
        self.url_checked
    }

    pub fn url_working(&self) -> bool {
        self.url_working
    }

    /// Index of the earlier row this one duplicates.
    pub fn duplicate_of(&self) -> Option<usize> {
        self.duplicate_of
    }

    /// Whether this row produces a redirect rule.
    pub fn is_valid_and_enabled(&self) -> bool {
        self.valid && self.enabled == "1"
    }

    /// Row carries no error code at all, including duplicate and probe errors.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Identity used for duplicate detection: `docType/pid`.
    pub fn identity(&self, case_insensitive: bool) -> String {
        let key = format!("{}/{}", self.doc_type, self.pid);
        if case_insensitive {
            key.to_uppercase()
        } else {
            key
        }
    }

    /// Record that this row duplicates row `other_index`.
    ///
    /// Must be called at most once per row: a second call appends E07 again.
    pub fn mark_as_duplicate_of(&mut self, other_index: usize) {
        self.errors.push(ErrorCode::Duplicate);
        self.duplicate_of = Some(other_index);
        self.affected_cells.push(DUPLICATE_MARKER.to_string());
    }

    /// Whether a reachability probe makes sense for this row.
    pub fn needs_probe(&self) -> bool {
        !self.has_error(ErrorCode::InvalidUrl)
    }

    /// Store the outcome of a reachability probe.
    pub fn record_probe(&mut self, working: bool) {
        self.url_checked = true;
        self.url_working = working;
        if !working {
            self.errors.push(ErrorCode::UnreachableUrl);
        }
    }

    /// Probe the target URL with a HEAD request.
    ///
    /// No-op when the URL is syntactically invalid. Never fails: network
    /// errors and timeouts are recorded as E06.
    pub async fn check_url(&mut self, prober: &UrlProber) {
        if !self.needs_probe() {
            return;
        }
        let working = prober.probe(&self.url).await;
        self.record_probe(working);
    }
}
