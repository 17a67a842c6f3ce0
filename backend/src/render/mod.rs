//! Web-server configuration renderers.
//!
//! Both dialects emit one rule per row that [`Row::is_valid_and_enabled`],
//! in row order, and silently skip every other row. Output is a pure
//! function of the accepted rows and the options.

pub mod apache;
pub mod nginx;

use serde::{Deserialize, Serialize};

use crate::config::RedirectConfig;
use crate::models::Row;

pub use apache::{render_apache, ApacheOptions};
pub use nginx::render_nginx;

/// Web server the configuration is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Apache,
    Nginx,
}

impl Target {
    /// File name the generated configuration is saved under.
    pub fn file_name(&self) -> &'static str {
        match self {
            Target::Apache => ".htaccess",
            Target::Nginx => "nginx_redirect.conf",
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Apache => f.write_str("apache"),
            Target::Nginx => f.write_str("nginx"),
        }
    }
}

impl std::str::FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "apache" => Ok(Target::Apache),
            "nginx" => Ok(Target::Nginx),
            other => Err(format!("Unknown target '{}', expected apache or nginx", other)),
        }
    }
}

/// Render `rows` for `target`.
///
/// `subdir` only applies to Nginx; Apache rules are relative to the
/// directory holding the `.htaccess` file.
pub fn render(rows: &[Row], target: Target, subdir: &str, config: &RedirectConfig) -> String {
    match target {
        Target::Apache => render_apache(rows, &ApacheOptions::from(config)),
        Target::Nginx => render_nginx(rows, subdir),
    }
}

/// Join non-empty path segments with `/`.
pub(crate) fn join_segments(segments: &[&str]) -> String {
    segments
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/")
}
