//! Field-level checks used when a row is constructed.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Letters, digits, dashes and underscores.
static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("identifier pattern is valid"));

/// PID and document type charset check.
pub fn is_valid_identifier(value: &str) -> bool {
    IDENTIFIER.is_match(value)
}

/// Absolute `http`/`https` URL with a host.
pub fn is_web_uri(value: &str) -> bool {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return false;
    }
    match Url::parse(value) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}

/// The enabled column must be exactly `"1"` or `"0"`.
pub fn is_valid_enabled(value: &str) -> bool {
    value == "1" || value == "0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier() {
        assert!(is_valid_identifier("123-E"));
        assert!(is_valid_identifier("abc_DEF-09"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("..invalid"));
        assert!(!is_valid_identifier("a b"));
        assert!(!is_valid_identifier("a/b"));
        assert!(!is_valid_identifier("é"));
    }

    #[test]
    fn test_web_uri() {
        assert!(is_web_uri("https://test.test"));
        assert!(is_web_uri("http://test.test/123-E"));
        assert!(is_web_uri("https://example.org/path?q=1%20x#frag"));
        assert!(!is_web_uri(""));
        assert!(!is_web_uri("blabla"));
        assert!(!is_web_uri("..invalid"));
        assert!(!is_web_uri("ftp://example.org/file"));
        assert!(!is_web_uri("mailto:someone@example.org"));
        assert!(!is_web_uri("http://exa mple.org"));
    }

    #[test]
    fn test_enabled() {
        assert!(is_valid_enabled("1"));
        assert!(is_valid_enabled("0"));
        assert!(!is_valid_enabled("x"));
        assert!(!is_valid_enabled("01"));
        assert!(!is_valid_enabled(""));
    }
}
