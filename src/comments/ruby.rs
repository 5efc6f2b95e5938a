//! Ruby: `#` comments, `=begin`/`=end` blocks and heredoc bodies.
//!
//! Regex (`/.../`) and percent (`%r{}`, `%w[]`, `%q()`, ...) literals are
//! skipped when they close on the line they open on, so `#{}` inside them is
//! not a comment. A `/` counts as a regex opener only after an operator or
//! keyword, the same heuristic the C-family scanner uses. Literals of either
//! kind that span lines are not tracked.

use crate::comments::hash::{Line, comment_line, cut_trailing};
use crate::comments::license::{LicenseDialect, is_license};
use crate::comments::quotes::{HASH_QUOTES, find_close, find_unquoted};
use crate::error::ScanResult;

const LICENSE: LicenseDialect = LicenseDialect::Script;

#[derive(Debug)]
struct EmbeddedDoc<'a> {
    lines: Vec<&'a str>,
    licensed_at_open: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Heredoc {
    id: String,
    /// `<<~` and `<<-` allow an indented terminator.
    indented: bool,
}

impl Heredoc {
    fn ends_at(&self, line: &str) -> bool {
        if self.indented {
            line.trim() == self.id
        } else {
            line.trim_end_matches('\r') == self.id
        }
    }
}

pub fn strip(text: &str, preserve_license: bool) -> ScanResult<String> {
    let mut out: Vec<&str> = Vec::new();
    let mut doc: Option<EmbeddedDoc<'_>> = None;
    let mut heredoc: Option<Heredoc> = None;

    for (idx, line) in text.split('\n').enumerate() {
        if let Some(h) = &heredoc {
            out.push(line);
            if h.ends_at(line) {
                heredoc = None;
            }
            continue;
        }

        if let Some(mut open) = doc.take() {
            open.lines.push(line);
            if !line.trim_start().starts_with("=end") {
                doc = Some(open);
                continue;
            }
            let keep = preserve_license
                && (open.licensed_at_open || is_license(&open.lines.join("\n"), LICENSE));
            if keep {
                out.extend(open.lines);
            }
            continue;
        }

        if line.trim_start().starts_with("=begin") {
            doc = Some(EmbeddedDoc {
                lines: vec![line],
                licensed_at_open: preserve_license && is_license(line, LICENSE),
            });
            continue;
        }

        let kept = match comment_line(line, idx == 0, LICENSE, preserve_license) {
            Some(Line::Keep(kept)) => {
                out.push(kept);
                continue;
            }
            Some(Line::Drop) => continue,
            None => match find_comment(line) {
                Some(at) => cut_trailing(line, at, LICENSE, preserve_license)?,
                None => line,
            },
        };

        heredoc = heredoc_start(kept);
        out.push(kept);
    }

    // `=begin` without `=end` is left as written.
    if let Some(open) = doc {
        out.extend(open.lines);
    }

    Ok(out.join("\n"))
}

/// Keywords after which a `/` opens a regex rather than dividing.
const REGEX_KEYWORDS: &[&str] = &[
    "if", "elsif", "unless", "while", "until", "when", "and", "or", "not", "return", "then",
    "do", "else", "in",
];

/// Byte index of the `#` that starts a trailing comment, if any.
fn find_comment(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut regex_ok = true;
    let mut i = 0;

    while let Some(&b) = bytes.get(i) {
        match b {
            b'#' => return Some(i),
            b'"' | b'\'' | b'`' => {
                let quote = match b {
                    b'"' => "\"",
                    b'\'' => "'",
                    _ => "`",
                };
                i = find_close(line, i + 1, quote, true).unwrap_or(bytes.len());
                regex_ok = false;
            }
            b'/' if regex_ok => match find_close(line, i + 1, "/", true) {
                Some(end) => {
                    i = end;
                    regex_ok = false;
                }
                None => i += 1,
            },
            b'%' => match percent_literal(bytes, i, regex_ok) {
                Some(end) => {
                    i = end;
                    regex_ok = false;
                }
                None => {
                    i += 1;
                    regex_ok = true;
                }
            },
            b')' | b']' | b'}' => {
                i += 1;
                regex_ok = false;
            }
            c if is_word_start(c) => {
                let start = i;
                while bytes.get(i).copied().is_some_and(is_word_byte) {
                    i += 1;
                }
                let word = line.get(start..i).unwrap_or_default();
                regex_ok = REGEX_KEYWORDS.contains(&word);
            }
            c if c.is_ascii_whitespace() => i += 1,
            _ => {
                i += 1;
                regex_ok = true;
            }
        }
    }

    None
}

fn is_word_start(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'@' | b'$') || b >= 0x80
}

/// Method names may end in `?` or `!`.
fn is_word_byte(b: u8) -> bool {
    is_word_start(b) || matches!(b, b'?' | b'!')
}

/// End (exclusive) of a `%` literal starting at `at` that closes on this line.
/// A bare `%(...)` needs an operator before it, otherwise it is modulo.
fn percent_literal(bytes: &[u8], at: usize, regex_ok: bool) -> Option<usize> {
    let mut i = at + 1;
    let typed = matches!(
        bytes.get(i),
        Some(b'q' | b'Q' | b'w' | b'W' | b'i' | b'I' | b'r' | b's' | b'x')
    );
    if typed {
        i += 1;
    } else if !regex_ok {
        return None;
    }

    let open = *bytes.get(i)?;
    if open.is_ascii_alphanumeric() || open.is_ascii_whitespace() || open == b'=' {
        return None;
    }
    let close = match open {
        b'(' => b')',
        b'[' => b']',
        b'{' => b'}',
        b'<' => b'>',
        other => other,
    };

    let mut depth = 0usize;
    i += 1;
    while let Some(&b) = bytes.get(i) {
        if b == b'\\' {
            i += 2;
            continue;
        }
        if b == close {
            if depth == 0 {
                return Some(i + 1);
            }
            depth -= 1;
        } else if b == open {
            depth += 1;
        }
        i += 1;
    }

    None
}

/// Find a heredoc opener (`<<~ID`, `<<-ID`, `<<ID`, `<<~'ID'`) in a code line.
fn heredoc_start(code: &str) -> Option<Heredoc> {
    let mut from = 0;

    while let Some(at) = find_unquoted(code, from, '<', HASH_QUOTES) {
        from = at + 1;
        let Some(rest) = code[at..].strip_prefix("<<") else {
            continue;
        };

        let (indented, rest) = match rest.strip_prefix(['~', '-']) {
            Some(r) => (true, r),
            None => (false, rest),
        };

        let quote = rest.chars().next().filter(|c| matches!(c, '\'' | '"' | '`'));
        let body = quote.map_or(rest, |q| &rest[q.len_utf8()..]);
        let id: String = body
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect();

        if id.is_empty() {
            continue;
        }
        if let Some(q) = quote {
            if !body[id.len()..].starts_with(q) {
                continue;
            }
        } else if !indented && !id.starts_with(|c: char| c.is_ascii_uppercase()) {
            // `a <<b` is a shift far more often than a lowercase heredoc.
            continue;
        }

        return Some(Heredoc { id, indented });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rb(src: &str) -> String {
        strip(src, false).unwrap()
    }

    #[test]
    fn line_and_embedded_doc_comments() {
        let src = "# c\nputs 'hi' # trailing\n=begin\ndoc\n=end\nx = 1";
        assert_eq!(rb(src), "puts 'hi'\nx = 1");
    }

    #[test]
    fn license_embedded_doc_is_kept_when_requested() {
        let src = "=begin\nCopyright 2024\n=end\nx = 1";
        assert_eq!(strip(src, true).unwrap(), src);
        assert_eq!(rb(src), "x = 1");
    }

    #[test]
    fn license_marker_on_begin_line_keeps_block() {
        let src = "=begin SPDX-Identifier: MIT\nplain text\n=end";
        assert_eq!(strip(src, true).unwrap(), src);
    }

    #[test]
    fn trailing_license_comment_keeps_whole_line() {
        let src = "x = 1 # license: MIT";
        assert_eq!(strip(src, true).unwrap(), src);
        assert_eq!(rb(src), "x = 1");
    }

    #[test]
    fn heredoc_body_is_content() {
        let src = "sql = <<~SQL\n  # not a comment\n  SELECT 1\n  SQL\nputs sql # c";
        assert_eq!(rb(src), "sql = <<~SQL\n  # not a comment\n  SELECT 1\n  SQL\nputs sql");
    }

    #[test]
    fn interpolation_inside_string_is_not_a_comment() {
        assert_eq!(rb("puts \"#{name} # x\" # c"), "puts \"#{name} # x\"");
    }

    #[test]
    fn regex_literals_hide_interpolation() {
        assert_eq!(rb("ok = line =~ /^#{prefix}/ # c"), "ok = line =~ /^#{prefix}/");
        assert_eq!(rb("return /#\\d+/ if x"), "return /#\\d+/ if x");
        assert_eq!(rb("half = total / 2 # c"), "half = total / 2");
        assert_eq!(rb("m = x ? /#a/ : nil # c"), "m = x ? /#a/ : nil");
    }

    #[test]
    fn percent_literals_hide_hashes() {
        assert_eq!(rb("re = %r{#{base}/x} # c"), "re = %r{#{base}/x}");
        assert_eq!(rb("words = %w[a# b#] # c"), "words = %w[a# b#]");
        assert_eq!(rb("s = %q(a (#) b) # c"), "s = %q(a (#) b)");
        assert_eq!(rb("r = a % b # c"), "r = a % b");
    }

    #[test]
    fn shift_operator_is_not_a_heredoc() {
        assert_eq!(rb("a << b # c\n# d"), "a << b");
        assert_eq!(heredoc_start("a << b"), None);
        assert_eq!(heredoc_start("list <<item"), None);
    }

    #[test]
    fn heredoc_openers() {
        assert_eq!(
            heredoc_start("x = <<-'EOS'"),
            Some(Heredoc {
                id: "EOS".into(),
                indented: true
            })
        );
        assert_eq!(
            heredoc_start("f(<<TEXT)"),
            Some(Heredoc {
                id: "TEXT".into(),
                indented: false
            })
        );
    }
}
