//! Route text to the right scanner and estimate how much was removed.

use std::path::Path;

use tracing::debug;

use crate::comments::{StripOptions, strip_comments};
use crate::detect::LanguageTable;
use crate::language::Language;

/// One call's worth of input besides the text itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemovalRequest<'a> {
    /// Explicit language. When absent the table resolves one from `path`
    /// and then from the content.
    pub language: Option<Language>,
    pub path: Option<&'a Path>,
    pub options: StripOptions,
    /// Count what would be removed but hand the text back untouched.
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalResult {
    pub text: String,
    pub language: Option<Language>,
    /// Approximate: non-blank lines before minus non-blank lines after.
    pub removed_count: usize,
}

pub fn remove_comments(
    text: &str,
    request: &RemovalRequest<'_>,
    table: &LanguageTable,
) -> RemovalResult {
    let Some(language) = request
        .language
        .or_else(|| table.detect(request.path, text))
    else {
        debug!(path = ?request.path, "no language resolved, leaving text unchanged");
        return RemovalResult {
            text: text.to_string(),
            language: None,
            removed_count: 0,
        };
    };

    let stripped = strip_comments(text, language, &request.options);
    let removed_count = estimate_removed(text, &stripped);
    debug!(%language, removed_count, dry_run = request.dry_run, "stripped comments");

    RemovalResult {
        text: if request.dry_run {
            text.to_string()
        } else {
            stripped
        },
        language: Some(language),
        removed_count,
    }
}

/// Non-blank line delta between `before` and `after`.
///
/// Comments that share a line with code do not move the line count, so when
/// the delta is zero but a non-blank line did change the estimate is 1.
pub fn estimate_removed(before: &str, after: &str) -> usize {
    let delta = non_blank_lines(before)
        .count()
        .saturating_sub(non_blank_lines(after).count());

    if delta == 0 && non_blank_lines(before).ne(non_blank_lines(after)) {
        1
    } else {
        delta
    }
}

fn non_blank_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').map(str::trim).filter(|l| !l.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(language: Language) -> RemovalRequest<'static> {
        RemovalRequest {
            language: Some(language),
            ..Default::default()
        }
    }

    #[test]
    fn counts_removed_comment_lines() {
        let table = LanguageTable::new();
        let out = remove_comments("// a\n// b\nx();\n", &request(Language::JavaScript), &table);
        assert_eq!(out.text, "\n\nx();\n");
        assert_eq!(out.removed_count, 2);
        assert_eq!(out.language, Some(Language::JavaScript));
    }

    #[test]
    fn dry_run_leaves_text_alone_but_counts() {
        let table = LanguageTable::new();
        let req = RemovalRequest {
            dry_run: true,
            ..request(Language::Python)
        };
        let src = "# hello\nx = 1";
        let out = remove_comments(src, &req, &table);
        assert_eq!(out.text, src);
        assert_eq!(out.removed_count, 1);
    }

    #[test]
    fn trailing_comment_counts_as_one() {
        assert_eq!(estimate_removed("x = 1 # c\n", "x = 1\n"), 1);
        assert_eq!(estimate_removed("x = 1\n", "x = 1\n"), 0);
        assert_eq!(estimate_removed("a\n\n\nb", "a\nb"), 0);
    }

    #[test]
    fn unresolved_language_is_a_miss_not_an_error() {
        let table = LanguageTable::new();
        let out = remove_comments("just words", &RemovalRequest::default(), &table);
        assert_eq!(out.text, "just words");
        assert_eq!(out.language, None);
        assert_eq!(out.removed_count, 0);
    }

    #[test]
    fn language_is_detected_from_path() {
        let table = LanguageTable::new();
        let req = RemovalRequest {
            path: Some(Path::new("schema.sql")),
            ..Default::default()
        };
        let out = remove_comments("-- c\nSELECT 1;", &req, &table);
        assert_eq!(out.language, Some(Language::Sql));
        assert_eq!(out.text, "SELECT 1;");
    }
}
