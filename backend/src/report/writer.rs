//! Standalone HTML report file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::{render_row, HtmlMode};
use crate::error::ReportResult;
use crate::models::Row;

/// The use case a report is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Publish,
    Validate,
}

impl Action {
    /// Whether `row` counts as accepted in this action's tally.
    ///
    /// Publishing accepts every row that yields a rule. Validation only
    /// accepts rows without any error code, including probe and duplicate
    /// errors.
    pub fn accepts(&self, row: &Row) -> bool {
        match self {
            Action::Publish => row.is_valid_and_enabled(),
            Action::Validate => row.is_clean(),
        }
    }

    /// Count `(accepted, rejected)` rows.
    pub fn tally(&self, rows: &[Row]) -> (usize, usize) {
        let accepted = rows.iter().filter(|r| self.accepts(r)).count();
        (accepted, rows.len() - accepted)
    }

    /// Summary sentence shown above the table.
    pub fn summary(&self, accepted: usize, rejected: usize) -> String {
        match self {
            Action::Publish => format!(
                "Converted <span id=\"accepted\">{}</span> rows and rejected <span id=\"rejected\">{}</span>.",
                accepted, rejected
            ),
            Action::Validate => format!(
                "Checked <span id=\"accepted\">{}</span> rows and found <span id=\"rejected\">{}</span> errors.",
                accepted + rejected,
                rejected
            ),
        }
    }
}

const HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>CultURIze conversion report</title>
    <style>
        html { font-size: 1em; }
        body { width: 100%; font-family: "Montserrat", "Geneva", sans-serif; }
        h1 { color: #15B28E; font-size: 2.8rem; }
        p { font-size: 1.2rem; }
        #hcontainer, #tcontainer { margin: 1.5rem auto; width: 90%; }
        #bcontainer { display: flex; flex-direction: row; }
        button { background-color: #1CD2A7; border-radius: 8rem; padding: 0.5rem 1rem;
                 font-size: 1rem; color: white; border: none; margin-right: 0.5rem; }
        button:hover { background-color: rgb(81, 180, 157); }
        table { width: 100%; border: 1px dashed black; border-spacing: 0; table-layout: fixed; }
        th, td { border-bottom: 1px solid #8E8F92; border-right: 1px solid #8E8F92; padding: 0.5rem; }
        td:nth-child(2), td:last-child { text-align: center; }
        .invalid, .error { background-color: #efd1d1; }
        .invalid td { color: red; font-weight: bold; }
        .error { font-size: 1.1rem; border: 2px solid red; }
        #tresults tr > *:nth-child(1) { display: none; }
    </style>
</head>
<body>
    <div id="hcontainer">
        <h1>CSV Validation report</h1>
        <div id="rcontainer">
"#;

const TABLE_START: &str = r#"        </div>
        <div id="bcontainer">
            <button id="show-errors" class="filter-button"><span>Only show errors</span></button>
            <button id="show-all" class="filter-button"><span>Show all</span></button>
        </div>
    </div>
    <div id="tcontainer">
        <table id="tresults">
            <tbody id="tbody">
            <tr id="theader">
                <th>ID</th>
                <th>Enabled</th>
                <th>Document Type</th>
                <th>PID</th>
                <th>URL</th>
                <th>Affected cells</th>
                <th>URL check</th>
            </tr>
"#;

const FOOTER: &str = r#"            </tbody>
        </table>
    </div>
    <script>
        function setValidRowsDisplay(value) {
            var lst = document.getElementsByClassName("valid");
            for (var i = 0; i < lst.length; i++) {
                lst[i].style.display = value;
            }
        }
        document.getElementById("show-errors").onclick = function () { setValidRowsDisplay("none"); };
        document.getElementById("show-all").onclick = function () { setValidRowsDisplay(""); };
    </script>
</body>
</html>
"#;

/// Report location for `csv_path`: `<name>-<timestamp>-report.html` next to it.
pub fn report_path(csv_path: &Path, timestamp: DateTime<Local>) -> PathBuf {
    let file_name = csv_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "redirects.csv".to_string());
    let name = format!(
        "{}-{}-report.html",
        file_name,
        timestamp.format("%Y-%m-%d_%H-%M-%S")
    );

    match csv_path.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// Write the complete report for `rows` to `path`.
///
/// Returns the `(accepted, rejected)` tally printed in the summary.
pub fn write_report(
    action: Action,
    rows: &[Row],
    path: &Path,
    mode: HtmlMode,
) -> ReportResult<(usize, usize)> {
    let (accepted, rejected) = action.tally(rows);

    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(HEAD.as_bytes())?;
    writeln!(out, "            <p>{}</p>", action.summary(accepted, rejected))?;
    out.write_all(TABLE_START.as_bytes())?;
    for row in rows {
        out.write_all(render_row(row, mode).as_bytes())?;
    }
    out.write_all(FOOTER.as_bytes())?;
    out.flush()?;

    Ok((accepted, rejected))
}
