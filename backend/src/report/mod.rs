//! HTML diagnostics for validated rows.
//!
//! [`render_row`] turns one row into a `<tr>` fragment. The same fragment
//! is written to the standalone report file ([`writer`]) and streamed to
//! live report subscribers.

pub mod writer;

use serde::{Deserialize, Serialize};

use crate::models::{ErrorCode, Row};

pub use writer::{report_path, write_report, Action};

/// How interpolated field values are written into markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HtmlMode {
    /// Markup-significant characters are escaped.
    #[default]
    Escaped,
    /// Values are written as-is.
    Verbatim,
}

impl HtmlMode {
    fn apply<'a>(&self, value: &'a str) -> std::borrow::Cow<'a, str> {
        match self {
            HtmlMode::Escaped => escape_html(value),
            HtmlMode::Verbatim => std::borrow::Cow::Borrowed(value),
        }
    }
}

/// Escape `&`, `<`, `>`, `"` and `'`.
pub fn escape_html(value: &str) -> std::borrow::Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return std::borrow::Cow::Borrowed(value);
    }

    let mut out = String::with_capacity(value.len() + 16);
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    std::borrow::Cow::Owned(out)
}

fn cell(value: &str) -> String {
    format!("<td>{}</td>", value)
}

fn error_cell(title: &str, value: &str) -> String {
    format!("<td class=\"error\" title=\"{}\">{}</td>", title, value)
}

/// Render one row as a table-row fragment.
///
/// Cells: index, enabled, document type, PID, URL, affected cells, URL
/// check. The fragment only depends on the row state, so rendering an
/// unchanged row twice yields identical output.
pub fn render_row(row: &Row, mode: HtmlMode) -> String {
    let enabled = mode.apply(row.enabled());
    let doc_type = mode.apply(row.doc_type());
    let pid = mode.apply(row.pid());
    let url = mode.apply(row.url());
    let affected = mode.apply(&row.affected_cells().join(",")).into_owned();

    let enabled_cell = if row.has_error(ErrorCode::InvalidEnabled) {
        error_cell("not 0 or 1", &enabled)
    } else {
        cell(&enabled)
    };

    let doc_type_cell = if row.has_error(ErrorCode::InvalidDocType) {
        error_cell("Invalid characters", &doc_type)
    } else if row.has_error(ErrorCode::MissingDocType) {
        error_cell("No document type specified", &doc_type)
    } else {
        cell(&doc_type)
    };

    let pid_cell = if row.has_error(ErrorCode::InvalidPid) {
        error_cell("Invalid characters", &pid)
    } else {
        cell(&pid)
    };

    let url_cell = if row.has_error(ErrorCode::InvalidUrl) {
        error_cell(&url, "invalid URL")
    } else {
        format!("<td title=\"{}\">valid URL</td>", url)
    };

    let affected_cell = match row.duplicate_of() {
        Some(first) if row.has_error(ErrorCode::Duplicate) => error_cell(
            &format!("doctype, pid combination is duplicate of row {}", first),
            &affected,
        ),
        _ => cell(&affected),
    };

    let check_cell = match (row.url_checked(), row.url_working()) {
        (false, _) => "<td class=\"check\" title=\"URL not tested\">?</td>",
        (true, true) => "<td class=\"check\">OK</td>",
        (true, false) => "<td class=\"check error\" title=\"URL unavailable\">NOK</td>",
    };

    let class = if row.errors().is_empty() { "valid" } else { "invalid" };

    format!(
        "<tr class=\"{}\"><td>{}</td>{}{}{}{}{}{}</tr>\n",
        class,
        row.index(),
        enabled_cell,
        doc_type_cell,
        pid_cell,
        url_cell,
        affected_cell,
        check_cell
    )
}
