//! Per-language comment scanners.
//!
//! Every scanner is a pure function of the text and a license flag. They
//! report internal faults as [`ScanError`](crate::error::ScanError); [`strip_comments`] is the only
//! boundary and it fails open, handing back the input untouched.

pub mod c_family;
pub mod hash;
pub mod json;
pub mod license;
pub mod markup;
pub mod python;
pub mod quotes;
pub mod ruby;
pub mod sql;

use tracing::warn;

use crate::error::ScanResult;
use crate::language::{Family, Language};

use self::c_family::CSyntax;
use self::hash::HashDialect;

/// Knobs shared by every scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripOptions {
    /// Keep comments the license classifier recognises.
    pub preserve_license: bool,
    /// Leave blank lines where comments were. When `false`, every line that
    /// is blank after stripping is dropped (SQL ignores this, see [`sql`]).
    pub keep_empty_lines: bool,
}

impl Default for StripOptions {
    fn default() -> Self {
        Self {
            preserve_license: false,
            keep_empty_lines: true,
        }
    }
}

/// Strip comments from `text`. Never fails: on an internal fault the input
/// is returned unchanged.
pub fn strip_comments(text: &str, language: Language, opts: &StripOptions) -> String {
    match try_strip_comments(text, language, opts) {
        Ok(out) => out,
        Err(err) => {
            warn!(%language, error = %err, "comment scan failed, leaving text unchanged");
            text.to_string()
        }
    }
}

/// Like [`strip_comments`] but surfaces scan faults instead of failing open.
pub fn try_strip_comments(
    text: &str,
    language: Language,
    opts: &StripOptions,
) -> ScanResult<String> {
    let preserve = opts.preserve_license;

    let stripped = match language.family() {
        Family::CLike => c_family::strip(text, CSyntax::for_language(language), preserve)?,
        Family::Python => python::strip(text, preserve)?,
        Family::Ruby => ruby::strip(text, preserve)?,
        Family::Hash => hash::strip(text, HashDialect::for_language(language), preserve)?,
        Family::Sql => return sql::strip(text, preserve),
        Family::Markup => markup::strip_html(text, preserve)?,
        Family::Css => markup::strip_css(text, preserve)?,
        Family::Json => json::strip(text)?,
    };

    if opts.keep_empty_lines {
        Ok(stripped)
    } else {
        Ok(collapse_blank_lines(&stripped))
    }
}

/// Drop every line that is empty after trimming, leading and trailing
/// ones included. A final newline survives if the input had one.
pub fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for line in text.split('\n').filter(|l| !l.trim().is_empty()) {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
    }

    if !out.is_empty() && text.ends_with('\n') {
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_drops_blank_and_whitespace_lines() {
        assert_eq!(collapse_blank_lines("\n\na\n   \n\tb\n\n"), "a\nb\n");
        assert_eq!(collapse_blank_lines("a\n\nb"), "a\nb");
        assert_eq!(collapse_blank_lines("\n \n"), "");
    }

    #[test]
    fn remove_empty_lines_applies_after_stripping() {
        let opts = StripOptions {
            keep_empty_lines: false,
            ..Default::default()
        };
        let out = strip_comments("// hi\n\nconst x = 5;\n", Language::JavaScript, &opts);
        assert_eq!(out, "const x = 5;\n");
    }

    #[test]
    fn empty_and_blank_inputs_are_fine_for_every_language() {
        for lang in Language::ALL {
            assert_eq!(strip_comments("", lang, &StripOptions::default()), "");
            assert_eq!(strip_comments("   ", lang, &StripOptions::default()).trim(), "");
        }
    }
}
