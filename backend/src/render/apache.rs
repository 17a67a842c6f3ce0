//! Apache `mod_rewrite` rules for a `.htaccess` file.

use crate::config::RedirectConfig;
use crate::models::Row;

use super::join_segments;

const HEADER: &str = "Options +FollowSymLinks\nRewriteEngine on\n\n";

/// Flags that shape each `RewriteRule`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApacheOptions {
    pub redirection_code: u16,
    /// Add `NC` (case-insensitive match).
    pub case_insensitive: bool,
    /// Add `NE` (do not escape the target).
    pub no_escape: bool,
}

impl From<&RedirectConfig> for ApacheOptions {
    fn from(config: &RedirectConfig) -> Self {
        Self {
            redirection_code: config.redirection_code,
            case_insensitive: config.case_insensitive_redirs,
            no_escape: config.no_escape,
        }
    }
}

impl Default for ApacheOptions {
    fn default() -> Self {
        Self::from(&RedirectConfig::default())
    }
}

impl ApacheOptions {
    fn flags(&self) -> String {
        let mut flags = vec![format!("R={}", self.redirection_code)];
        if self.case_insensitive {
            flags.push("NC".to_string());
        }
        if self.no_escape {
            flags.push("NE".to_string());
        }
        flags.push("L".to_string());
        format!("[{}]", flags.join(","))
    }
}

/// Render the `.htaccess` content for `rows`.
pub fn render_apache(rows: &[Row], options: &ApacheOptions) -> String {
    let flags = options.flags();
    let mut out = String::from(HEADER);

    for row in rows.iter().filter(|r| r.is_valid_and_enabled()) {
        let pattern = join_segments(&[row.doc_type(), row.pid()]);
        // `%N` would be read as a back-reference
        let target = row.url().replace('%', "\\%");
        out.push_str(&format!("RewriteRule {}$ {} {}\n", pattern, target, flags));
    }

    out
}
