//! Column registry and runtime settings.
//!
//! Column names are fixed at compile time. Everything else is read from the
//! environment (a `.env` file is honoured) by [`Settings::from_env`] and can
//! be overridden by CLI flags.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Column Registry
// =============================================================================

/// The identifier of the object.
pub const COL_PID: &str = "PID";

/// The URL it should resolve to.
pub const COL_URL: &str = "URL";

/// The 0/1 field that says if the redirection is active.
pub const COL_ENABLED: &str = "enabled";

/// The document type field.
pub const COL_DOCTYPE: &str = "document type";

/// Document type redirected when the client accepts `text/html`.
pub const ACCEPT_HTML_DOCTYPE: &str = "data";

/// Document type redirected when the client accepts `image/*`.
pub const ACCEPT_IMAGE_DOCTYPE: &str = "representation";

/// Response class a document type is served as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseClass {
    Html,
    Image,
}

/// Map a document type to the response class it is accepted for.
///
/// Unknown document types have no acceptance rule.
pub fn response_class(doc_type: &str) -> Option<ResponseClass> {
    match doc_type {
        ACCEPT_HTML_DOCTYPE => Some(ResponseClass::Html),
        ACCEPT_IMAGE_DOCTYPE => Some(ResponseClass::Image),
        _ => None,
    }
}

// =============================================================================
// Redirect configuration
// =============================================================================

/// Options that control validation and rule generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectConfig {
    /// HTTP status used in Apache `R=` flags.
    pub redirection_code: u16,
    /// Emit `NC` and compare duplicates case-insensitively.
    pub case_insensitive_redirs: bool,
    /// Emit `NE` (no escaping of the target URL).
    pub no_escape: bool,
    /// Rows may omit the document type.
    pub allow_no_doctype: bool,
    /// Keep going when a row is rejected instead of failing the parse.
    pub ignore_on_invalid_data: bool,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            redirection_code: 302,
            case_insensitive_redirs: true,
            no_escape: true,
            allow_no_doctype: true,
            ignore_on_invalid_data: true,
        }
    }
}

/// Options for the Git publishing step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOptions {
    /// Prepended to every requested subdirectory.
    pub base_subdir: String,
    /// Where local clones live.
    pub repo_dir: PathBuf,
    /// Token used to authenticate HTTPS pushes.
    pub github_token: Option<String>,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            base_subdir: String::new(),
            repo_dir: PathBuf::from(DEFAULT_REPO_DIR),
            github_token: None,
        }
    }
}

/// Options for URL reachability probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOptions {
    pub timeout: Duration,
    /// Maximum number of probes in flight.
    pub concurrency: usize,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
            concurrency: DEFAULT_PROBE_CONCURRENCY,
        }
    }
}

/// Directory where repositories are cloned (relative to current dir)
const DEFAULT_REPO_DIR: &str = ".culturize/repos";

const DEFAULT_PROBE_TIMEOUT_MS: u64 = 2000;

const DEFAULT_PROBE_CONCURRENCY: usize = 8;

/// All runtime settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub redirect: RedirectConfig,
    pub publish: PublishOptions,
    pub probe: ProbeOptions,
}

impl Settings {
    /// Load settings from `CULTURIZE_*` environment variables.
    ///
    /// Missing variables keep their defaults.
    pub fn from_env() -> ConfigResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(v) = lookup("CULTURIZE_REDIRECTION_CODE") {
            settings.redirect.redirection_code = parse_redirection_code(&v)?;
        }
        if let Some(v) = lookup("CULTURIZE_CASE_INSENSITIVE") {
            settings.redirect.case_insensitive_redirs = parse_bool("CULTURIZE_CASE_INSENSITIVE", &v)?;
        }
        if let Some(v) = lookup("CULTURIZE_NO_ESCAPE") {
            settings.redirect.no_escape = parse_bool("CULTURIZE_NO_ESCAPE", &v)?;
        }
        if let Some(v) = lookup("CULTURIZE_ALLOW_NO_DOCTYPE") {
            settings.redirect.allow_no_doctype = parse_bool("CULTURIZE_ALLOW_NO_DOCTYPE", &v)?;
        }
        if let Some(v) = lookup("CULTURIZE_IGNORE_ON_INVALID") {
            settings.redirect.ignore_on_invalid_data = parse_bool("CULTURIZE_IGNORE_ON_INVALID", &v)?;
        }

        if let Some(v) = lookup("CULTURIZE_BASE_SUBDIR") {
            settings.publish.base_subdir = v.trim().to_string();
        }
        if let Some(v) = lookup("CULTURIZE_REPO_DIR") {
            settings.publish.repo_dir = PathBuf::from(v);
        }
        settings.publish.github_token = lookup("GITHUB_TOKEN").filter(|t| !t.trim().is_empty());

        if let Some(v) = lookup("CULTURIZE_PROBE_TIMEOUT_MS") {
            let ms = parse_number::<u64>("CULTURIZE_PROBE_TIMEOUT_MS", &v)?;
            settings.probe.timeout = Duration::from_millis(ms);
        }
        if let Some(v) = lookup("CULTURIZE_PROBE_CONCURRENCY") {
            let n = parse_number::<usize>("CULTURIZE_PROBE_CONCURRENCY", &v)?;
            if n == 0 {
                return Err(invalid("CULTURIZE_PROBE_CONCURRENCY", &v, "must be at least 1"));
            }
            settings.probe.concurrency = n;
        }

        Ok(settings)
    }
}

fn invalid(key: &str, value: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    }
}

fn parse_bool(key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value, "expected a boolean")),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| invalid(key, value, "expected a number"))
}

fn parse_redirection_code(value: &str) -> ConfigResult<u16> {
    let code = parse_number::<u16>("CULTURIZE_REDIRECTION_CODE", value)?;
    if !(300..400).contains(&code) {
        return Err(invalid(
            "CULTURIZE_REDIRECTION_CODE",
            value,
            "expected a 3xx status",
        ));
    }
    Ok(code)
}
