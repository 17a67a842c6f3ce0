//! Validation beyond single-row construction.
//!
//! - [`rules`] - Field checks (identifier charset, web URL, enabled flag)
//! - [`duplicates`] - Cross-row duplicate detection
//! - [`probe`] - URL reachability probing

pub mod duplicates;
pub mod probe;
pub mod rules;

pub use duplicates::{conflicting_rules, detect_duplicates};
pub use probe::{check_urls, UrlProber};
pub use rules::{is_valid_enabled, is_valid_identifier, is_web_uri};
