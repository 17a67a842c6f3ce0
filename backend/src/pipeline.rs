//! High-level use cases: convert, validate and publish a redirect sheet.
//!
//! Every use case parses first and aborts on a parse-level failure
//! before producing any output. Steps are reported through the log
//! broadcaster; validated rows are streamed to the live report channel.
//!
//! # Example
//!
//! ```rust,ignore
//! use culturize::pipeline::convert_csv;
//! use culturize::{RedirectConfig, Target};
//!
//! let result = convert_csv("redirects.csv".as_ref(), Target::Apache, "", &RedirectConfig::default())?;
//! println!("{} rules", result.num_lines_accepted);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use crate::api::logs::{log_info, log_info_indent, log_success, log_warning, ReportEvent, REPORT_BROADCASTER};
use crate::config::{ProbeOptions, RedirectConfig, Settings};
use crate::error::{PipelineError, PipelineResult};
use crate::models::{ConversionResult, Row, RowCounter};
use crate::parser::{create_rows, detect_delimiter, read_csv_file, ParseOptions};
use crate::publish::{is_valid_subdir, with_base_subdir, GitRepoManager, RepoDetails};
use crate::render::{render, Target};
use crate::report::{render_row, report_path, write_report, Action, HtmlMode};
use crate::validation::{check_urls, UrlProber};

// =============================================================================
// Options and outcomes
// =============================================================================

/// Options for a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Probe every syntactically valid URL.
    pub check_urls: bool,
    /// Maximum number of probes in flight.
    pub concurrency: usize,
    /// Per-probe timeout.
    pub timeout: Duration,
}

impl ValidateOptions {
    pub fn from_probe(probe: &ProbeOptions, check_urls: bool) -> Self {
        Self {
            check_urls,
            concurrency: probe.concurrency,
            timeout: probe.timeout,
        }
    }
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self::from_probe(&ProbeOptions::default(), true)
    }
}

/// A request to publish a CSV file to a repository.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub csv_path: PathBuf,
    /// Directory inside the repository receiving the config file.
    pub subdir: String,
    pub repo_url: String,
    pub branch: String,
    pub commit_message: String,
    pub target: Target,
    pub html_mode: HtmlMode,
}

/// Result of a validate or publish run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutcome {
    pub action: Action,
    /// Where the HTML report was written.
    pub report_path: Option<PathBuf>,
    pub accepted: usize,
    pub rejected: usize,
}

// =============================================================================
// Live report
// =============================================================================

/// Streams row fragments with running tallies to the report channel.
pub struct LiveReport {
    job_id: String,
    action: Action,
    mode: HtmlMode,
    accepted: usize,
    rejected: usize,
}

impl LiveReport {
    /// Announce a run of `total` rows.
    pub fn start(action: Action, total: usize, mode: HtmlMode) -> Self {
        let job_id = Uuid::new_v4().to_string();
        REPORT_BROADCASTER.publish(ReportEvent::Started {
            job_id: job_id.clone(),
            total,
        });
        Self {
            job_id,
            action,
            mode,
            accepted: 0,
            rejected: 0,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Tally `row` and publish its fragment; returns the fragment.
    pub fn push(&mut self, row: &Row) -> String {
        if self.action.accepts(row) {
            self.accepted += 1;
        } else {
            self.rejected += 1;
        }
        let html = render_row(row, self.mode);
        REPORT_BROADCASTER.publish(ReportEvent::Row {
            job_id: self.job_id.clone(),
            html: html.clone(),
            accepted: self.accepted,
            rejected: self.rejected,
        });
        html
    }

    /// Publish the final tallies.
    pub fn finish(self) -> (usize, usize) {
        REPORT_BROADCASTER.publish(ReportEvent::Finished {
            job_id: self.job_id,
            accepted: self.accepted,
            rejected: self.rejected,
        });
        (self.accepted, self.rejected)
    }
}

// =============================================================================
// Convert
// =============================================================================

/// Convert CSV text into a configuration for `target`.
///
/// Duplicates are fatal here: two rules for one path cannot both apply.
pub fn convert_text(
    text: &str,
    target: Target,
    subdir: &str,
    config: &RedirectConfig,
) -> PipelineResult<ConversionResult> {
    log_info(format!("Detected separator: '{}'", detect_delimiter(text)));

    let options = ParseOptions::from_config(config, false).starting_at(RowCounter::SPREADSHEET_FIRST_ROW);
    let mut accepted = 0;
    let mut rejected = 0;
    let rows = create_rows(text, &options, |_| accepted += 1, |_| rejected += 1)?;

    let rendered = render(&rows, target, subdir, config);
    log_success(format!(
        "Generated {} configuration: {} rules, {} rows rejected",
        target, accepted, rejected
    ));

    Ok(ConversionResult {
        config: rendered,
        num_lines_accepted: accepted,
        num_lines_rejected: rejected,
        rows,
    })
}

/// Read `path` and convert it, see [`convert_text`].
pub fn convert_csv(
    path: &Path,
    target: Target,
    subdir: &str,
    config: &RedirectConfig,
) -> PipelineResult<ConversionResult> {
    log_info(format!("Reading {}", path.display()));
    let decoded = read_csv_file(path)?;
    log_info_indent(format!("Encoding: {}", decoded.encoding), 1);
    convert_text(&decoded.text, target, subdir, config)
}

// =============================================================================
// Validate
// =============================================================================

/// Parse `text` for validation.
///
/// Duplicates are tolerated and marked E07, and rejected rows never abort
/// the run: surfacing them is the point of validating.
pub fn parse_for_validation(text: &str, config: &RedirectConfig) -> PipelineResult<Vec<Row>> {
    log_info("Parsing CSV");
    let options = ParseOptions {
        ignore_on_invalid_data: true,
        ..ParseOptions::from_config(config, true)
    }
    .starting_at(RowCounter::SPREADSHEET_FIRST_ROW);

    let rows = create_rows(text, &options, |_| {}, |_| {})?;
    log_success(format!("Parsed {} rows", rows.len()));
    Ok(rows)
}

/// Probe URLs when asked, handing every row to `on_row` once its checks
/// are complete. Dropping the future cancels pending probes.
pub async fn check_rows<F>(rows: &mut [Row], options: &ValidateOptions, mut on_row: F)
where
    F: FnMut(&Row),
{
    if options.check_urls {
        let prober = UrlProber::new(options.timeout);
        log_info(format!(
            "Checking URLs ({} at a time, {} ms timeout)",
            options.concurrency.max(1),
            prober.timeout().as_millis()
        ));
        let issued = check_urls(rows, &prober, options.concurrency, &mut on_row).await;
        log_success(format!("Checked {} URLs", issued));
    } else {
        log_warning("URL check skipped");
        rows.iter().for_each(&mut on_row);
    }
}

/// [`parse_for_validation`] followed by [`check_rows`].
pub async fn validate_text<F>(
    text: &str,
    config: &RedirectConfig,
    options: &ValidateOptions,
    on_row: F,
) -> PipelineResult<Vec<Row>>
where
    F: FnMut(&Row),
{
    let mut rows = parse_for_validation(text, config)?;
    check_rows(&mut rows, options, on_row).await;
    Ok(rows)
}

/// Validate a CSV file and write its HTML report.
///
/// The report goes to `report` when given, otherwise next to the CSV.
pub async fn validate_csv(
    path: &Path,
    config: &RedirectConfig,
    options: &ValidateOptions,
    report: Option<&Path>,
    html_mode: HtmlMode,
) -> PipelineResult<ActionOutcome> {
    check_csv_path(path)?;
    log_info(format!("Reading {}", path.display()));
    let decoded = read_csv_file(path)?;

    let mut rows = parse_for_validation(&decoded.text, config)?;
    let mut live = LiveReport::start(Action::Validate, rows.len(), html_mode);
    check_rows(&mut rows, options, |row| {
        live.push(row);
    })
    .await;
    live.finish();

    log_info("Writing report");
    let report_file = report
        .map(Path::to_path_buf)
        .unwrap_or_else(|| report_path(path, chrono::Local::now()));
    let (accepted, rejected) = write_report(Action::Validate, &rows, &report_file, html_mode)?;
    log_success(format!("Report written to {}", report_file.display()));

    Ok(ActionOutcome {
        action: Action::Validate,
        report_path: Some(report_file),
        accepted,
        rejected,
    })
}

// =============================================================================
// Publish
// =============================================================================

fn check_csv_path(path: &Path) -> PipelineResult<()> {
    if !path.exists() {
        return Err(PipelineError::InvalidInput(format!(
            "The file \"{}\" does not exist",
            path.display()
        )));
    }
    if path.extension().and_then(|e| e.to_str()) != Some("csv") {
        return Err(PipelineError::InvalidInput(format!(
            "The file \"{}\" is not a .csv file",
            path.display()
        )));
    }
    Ok(())
}

/// Check a publish request and resolve its final subdirectory.
fn check_request(request: &PublishRequest, base_subdir: &str) -> PipelineResult<String> {
    RepoDetails::parse(&request.repo_url)?;

    let subdir = with_base_subdir(base_subdir, request.subdir.trim_matches('/'));
    if !subdir.is_empty() && !is_valid_subdir(&subdir) {
        return Err(PipelineError::InvalidInput(format!(
            "\"{}\" is not a valid path",
            subdir
        )));
    }
    if request.branch.trim().is_empty() {
        return Err(PipelineError::InvalidInput("No branch given".to_string()));
    }

    check_csv_path(&request.csv_path)?;
    Ok(subdir)
}

/// Convert, commit and push the configuration, then write the report.
///
/// Conversion runs before any Git command, so a broken sheet never
/// touches the repository.
pub async fn publish(request: PublishRequest, settings: &Settings) -> PipelineResult<ActionOutcome> {
    log_info("Checking input");
    let subdir = check_request(&request, &settings.publish.base_subdir)?;

    log_info("Converting file");
    let result = convert_csv(&request.csv_path, request.target, &subdir, &settings.redirect)?;
    log_info_indent(
        format!(
            "{} characters generated from {} rows ({} rejected)",
            result.config.len(),
            result.num_lines_accepted,
            result.num_lines_rejected
        ),
        1,
    );

    log_info("Preparing Git");
    let manager = GitRepoManager::prepare(
        &request.repo_url,
        &request.branch,
        settings.publish.github_token.as_deref(),
        &settings.publish.repo_dir,
    )
    .await?;

    log_info("Saving the configuration file");
    let saved = manager.save_string_to_file(&result.config, request.target.file_name(), &subdir)?;
    log_info_indent(saved.display().to_string(), 1);

    log_info("Pushing changes");
    manager.push_changes(&request.commit_message).await?;

    log_info("Writing report");
    let mut live = LiveReport::start(Action::Publish, result.rows.len(), request.html_mode);
    for row in &result.rows {
        live.push(row);
    }
    live.finish();

    let report_file = report_path(&request.csv_path, chrono::Local::now());
    write_report(Action::Publish, &result.rows, &report_file, request.html_mode)?;
    log_success("Done !");

    Ok(ActionOutcome {
        action: Action::Publish,
        report_path: Some(report_file),
        accepted: result.num_lines_accepted,
        rejected: result.num_lines_rejected,
    })
}
