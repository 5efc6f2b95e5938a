//! Bracketed comments in HTML/XML (`<!-- -->`) and CSS (`/* */`).
//!
//! Whole-buffer, non-greedy matching. The `regex` crate never backtracks,
//! so this stays linear in the input.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::comments::license::{LicenseDialect, is_license};
use crate::error::{ScanError, ScanResult};

static HTML_COMMENT: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->"));

static CSS_COMMENT: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/"));

fn pattern(re: &'static LazyLock<Result<Regex, regex::Error>>) -> ScanResult<&'static Regex> {
    re.as_ref().map_err(|e| ScanError::Pattern(e.to_string()))
}

/// HTML and XML. Conditional comments (`<!--[if IE]>...<![endif]-->`) are
/// markup, not commentary, and are always kept.
pub fn strip_html(text: &str, preserve_license: bool) -> ScanResult<String> {
    let re = pattern(&HTML_COMMENT)?;

    let out = re.replace_all(text, |caps: &Captures<'_>| {
        let comment = &caps[0];
        let conditional = comment.starts_with("<!--[if") || comment.ends_with("<![endif]-->");
        if conditional || (preserve_license && is_license(comment, LicenseDialect::Plain)) {
            comment.to_string()
        } else {
            String::new()
        }
    });

    Ok(out.into_owned())
}

pub fn strip_css(text: &str, preserve_license: bool) -> ScanResult<String> {
    let re = pattern(&CSS_COMMENT)?;

    let out = re.replace_all(text, |caps: &Captures<'_>| {
        let comment = &caps[0];
        if preserve_license && is_license(comment, LicenseDialect::Block) {
            comment.to_string()
        } else {
            String::new()
        }
    });

    Ok(out.into_owned())
}
