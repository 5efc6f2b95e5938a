//! SQL: `--` line comments and `/* */` block comments.
//!
//! Blank-line handling here is SQL's own and ignores
//! [`StripOptions::keep_empty_lines`](crate::comments::StripOptions):
//! a line emptied by stripping is dropped, except lines inside a multi-line
//! block comment, which stay behind as empty placeholders. Lines that were
//! blank to begin with are left alone.
//!
//! A license `/*` (when preserving) keeps the rest of its line verbatim,
//! comments after it included. If it does not close there, following lines
//! are copied up to its `*/`.

use crate::comments::license::{LicenseDialect, is_license};
use crate::comments::quotes::QuoteState;
use crate::error::{ScanResult, slice};

/// `'text'`, `"ident"` and MySQL's `` `ident` ``.
const SQL_QUOTES: &[char] = &['\'', '"', '`'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    None,
    Dropped,
    /// A license block copied verbatim until its `*/`.
    Kept,
}

pub fn strip(text: &str, preserve_license: bool) -> ScanResult<String> {
    let mut out: Vec<String> = Vec::new();
    let mut quote = QuoteState::new();
    let mut block = Block::None;

    for raw in text.split('\n') {
        let (line, cr) = match raw.strip_suffix('\r') {
            Some(body) => (body, "\r"),
            None => (raw, ""),
        };
        let started_in_block = block == Block::Dropped;
        let mut kept = String::with_capacity(line.len());
        let mut removed = false;
        let mut i = 0;

        while i < line.len() {
            let rest = slice(line, i, line.len())?;
            let Some(c) = rest.chars().next() else {
                break;
            };

            match block {
                Block::Dropped => {
                    if rest.starts_with("*/") {
                        block = Block::None;
                        i += 2;
                    } else {
                        i += c.len_utf8();
                    }
                    continue;
                }
                Block::Kept => {
                    if rest.starts_with("*/") {
                        kept.push_str("*/");
                        block = Block::None;
                        i += 2;
                    } else {
                        kept.push(c);
                        i += c.len_utf8();
                    }
                    continue;
                }
                Block::None => {}
            }

            if !quote.in_string() && !quote.escaping() {
                if rest.starts_with("/*") {
                    if preserve_license && is_license(rest, LicenseDialect::Plain) {
                        // The rest of the line is kept as written, unscanned.
                        kept.push_str(rest);
                        if !rest[2..].contains("*/") {
                            block = Block::Kept;
                        }
                        break;
                    } else {
                        block = Block::Dropped;
                        removed = true;
                    }
                    i += 2;
                    continue;
                }

                if rest.starts_with("--") {
                    if preserve_license && is_license(rest, LicenseDialect::Plain) {
                        kept.push_str(rest);
                    } else {
                        removed = true;
                    }
                    break;
                }
            }

            quote.advance(c, SQL_QUOTES);
            kept.push(c);
            i += c.len_utf8();
        }

        if removed {
            let len = kept.trim_end().len();
            kept.truncate(len);
        }

        if kept.trim().is_empty() {
            if line.trim().is_empty() {
                out.push(raw.to_string());
            } else if started_in_block || block == Block::Dropped {
                out.push(String::new());
            }
            continue;
        }

        kept.push_str(cr);
        out.push(kept);
    }

    Ok(out.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql(src: &str) -> String {
        strip(src, false).unwrap()
    }

    #[test]
    fn line_comments_are_removed() {
        assert_eq!(sql("-- c\nSELECT 1; -- trailing"), "SELECT 1;");
    }

    #[test]
    fn markers_inside_strings_are_kept() {
        let src = "SELECT '-- not' AS a, 'It''s /* x */' FROM t; -- c";
        assert_eq!(sql(src), "SELECT '-- not' AS a, 'It''s /* x */' FROM t;");
    }

    #[test]
    fn multi_line_block_leaves_placeholders() {
        let src = "SELECT 1;\n/* a\nb\n*/\nSELECT 2;";
        assert_eq!(sql(src), "SELECT 1;\n\n\n\nSELECT 2;");
    }

    #[test]
    fn inline_block_comment() {
        assert_eq!(sql("SELECT /* cols */ a FROM t;"), "SELECT  a FROM t;");
        assert_eq!(sql("/* one-liner */\nSELECT 1;"), "SELECT 1;");
    }

    #[test]
    fn code_after_block_close_survives() {
        assert_eq!(sql("/* a\n*/ SELECT 1; -- c"), "\n SELECT 1;");
    }

    #[test]
    fn original_blank_lines_stay() {
        let src = "SELECT 1;\n\nSELECT 2;\n";
        assert_eq!(sql(src), src);
    }

    #[test]
    fn strings_may_span_lines() {
        let src = "SELECT 'a\n-- not a comment\n' FROM t;";
        assert_eq!(sql(src), src);
    }

    #[test]
    fn license_comments_are_kept_when_requested() {
        let src = "/* Copyright 2024\n   Acme */\n-- license: MIT\n-- drop\nSELECT 1;";
        let out = strip(src, true).unwrap();
        assert_eq!(out, "/* Copyright 2024\n   Acme */\n-- license: MIT\nSELECT 1;");
    }

    #[test]
    fn license_block_keeps_the_rest_of_its_line() {
        let src = "/* Copyright 2024 */ SELECT 1; -- x\nSELECT 2; -- y";
        assert_eq!(strip(src, true).unwrap(), "/* Copyright 2024 */ SELECT 1; -- x\nSELECT 2;");
        assert_eq!(sql(src), " SELECT 1;\nSELECT 2;");
    }

    #[test]
    fn crlf_line_endings_are_kept() {
        assert_eq!(sql("SELECT 1; -- c\r\nSELECT 2;\r\n"), "SELECT 1;\r\nSELECT 2;\r\n");
    }
}
