//! Python: `#` comments plus docstrings.
//!
//! A triple-quoted literal is a docstring when it opens its line and the
//! nearest preceding code line is a block header (`def`, `class`,
//! `async def`, or anything ending in `:`), or when it is the first code in
//! the module. Docstrings are removed; every other triple-quoted literal is
//! code and is copied verbatim, `#` sequences included.
//!
//! Only the nearest code line counts, so a second literal directly under a
//! docstring is kept on the first pass. Once the docstring is gone it sits
//! under the header itself and a second pass removes it too.

use crate::comments::hash::{Line, comment_line, cut_trailing};
use crate::comments::license::{LicenseDialect, is_license};
use crate::comments::quotes::{HASH_QUOTES, QuoteState, find_close};
use crate::error::{ScanResult, slice};

const LICENSE: LicenseDialect = LicenseDialect::Script;

/// String prefixes that may precede a triple quote.
const PREFIX_CHARS: &[char] = &['r', 'R', 'b', 'B', 'u', 'U', 'f', 'F'];

pub fn strip(text: &str, preserve_license: bool) -> ScanResult<String> {
    let mut scanner = Scanner {
        preserve_license,
        out: Vec::new(),
        prev: Prev::Start,
        open: None,
    };

    for (idx, line) in text.split('\n').enumerate() {
        scanner.line(line, idx == 0)?;
    }

    Ok(scanner.finish())
}

/// What the nearest preceding code line was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prev {
    Start,
    Header,
    Other,
}

#[derive(Debug)]
struct OpenString<'a> {
    quote: &'static str,
    docstring: bool,
    buffered: Vec<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Comment(usize),
    Triple {
        start: usize,
        quote_at: usize,
        quote: &'static str,
    },
}

struct Scanner<'a> {
    preserve_license: bool,
    out: Vec<&'a str>,
    prev: Prev,
    open: Option<OpenString<'a>>,
}

impl<'a> Scanner<'a> {
    fn line(&mut self, line: &'a str, first_line: bool) -> ScanResult<()> {
        if let Some(mut open) = self.open.take() {
            let Some(close_end) = find_close(line, 0, open.quote, true) else {
                if open.docstring {
                    open.buffered.push(line);
                } else {
                    self.out.push(line);
                }
                self.open = Some(open);
                return Ok(());
            };

            if open.docstring {
                open.buffered.push(line);
                let text = open.buffered.join("\n");
                if self.preserve_license && is_license(&text, LICENSE) {
                    self.out.extend(open.buffered);
                }
                self.prev = Prev::Other;
                return Ok(());
            }

            return self.code(line, close_end);
        }

        match comment_line(line, first_line, LICENSE, self.preserve_license) {
            Some(Line::Keep(kept)) => self.out.push(kept),
            Some(Line::Drop) => {}
            None => self.code(line, 0)?,
        }
        Ok(())
    }

    /// Scan `line` from `from` for the next comment or triple quote.
    fn code(&mut self, line: &'a str, mut from: usize) -> ScanResult<()> {
        loop {
            match next_event(line, from) {
                None => {
                    self.emit(line);
                    return Ok(());
                }
                Some(Event::Comment(at)) => {
                    let kept = cut_trailing(line, at, LICENSE, self.preserve_license)?;
                    self.emit(kept);
                    return Ok(());
                }
                Some(Event::Triple {
                    start,
                    quote_at,
                    quote,
                }) => {
                    let docstring = start == indent_of(line) && self.prev != Prev::Other;

                    match find_close(line, quote_at + 3, quote, true) {
                        Some(close_end) if docstring => {
                            let literal = slice(line, start, close_end)?;
                            if self.preserve_license && is_license(literal, LICENSE) {
                                self.out.push(line);
                            }
                            self.prev = Prev::Other;
                            return Ok(());
                        }
                        Some(close_end) => from = close_end,
                        None => {
                            if !docstring {
                                self.out.push(line);
                                self.prev = Prev::Other;
                            }
                            self.open = Some(OpenString {
                                quote,
                                docstring,
                                buffered: if docstring { vec![line] } else { Vec::new() },
                            });
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    fn emit(&mut self, kept: &'a str) {
        let code = kept.trim();
        if code.is_empty() {
            self.out.push(kept);
            return;
        }

        self.prev = if is_block_header(code) {
            Prev::Header
        } else {
            Prev::Other
        };
        self.out.push(kept);
    }

    fn finish(mut self) -> String {
        // An unterminated docstring is left as it was.
        if let Some(open) = self.open.take() {
            self.out.extend(open.buffered);
        }
        self.out.join("\n")
    }
}

fn is_block_header(code: &str) -> bool {
    code.ends_with(':')
        || code.starts_with("def ")
        || code.starts_with("class ")
        || code.starts_with("async def ")
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn next_event(line: &str, from: usize) -> Option<Event> {
    let tail = line.get(from..)?;
    let mut state = QuoteState::new();

    for (offset, c) in tail.char_indices() {
        if !state.in_string() && !state.escaping() {
            let at = from + offset;
            let rest = &tail[offset..];
            for quote in ["\"\"\"", "'''"] {
                if rest.starts_with(quote) {
                    return Some(Event::Triple {
                        start: literal_start(line, at),
                        quote_at: at,
                        quote,
                    });
                }
            }
            if c == '#' {
                return Some(Event::Comment(at));
            }
        }
        state.advance(c, HASH_QUOTES);
    }

    None
}

/// Walk back over a string prefix (`r`, `rb`, `f`, ...) to where the literal begins.
fn literal_start(line: &str, quote_at: usize) -> usize {
    let head = &line[..quote_at];
    let prefix_len = head
        .chars()
        .rev()
        .take_while(|c| PREFIX_CHARS.contains(c))
        .count();
    if prefix_len == 0 || prefix_len > 2 {
        return quote_at;
    }

    let start = quote_at - prefix_len;
    let preceded_by_ident = line[..start]
        .chars()
        .next_back()
        .is_some_and(|c| c.is_alphanumeric() || c == '_');
    if preceded_by_ident { quote_at } else { start }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn py(src: &str) -> String {
        strip(src, false).unwrap()
    }

    #[test]
    fn hash_comment_lines_are_dropped() {
        assert_eq!(py("# hello\nx = 1"), "x = 1");
    }

    #[test]
    fn single_line_docstring_after_def() {
        let src = "def f():\n    \"\"\"Doc.\"\"\"\n    return 1\n";
        assert_eq!(py(src), "def f():\n    return 1\n");
    }

    #[test]
    fn multi_line_docstring_hides_hashes() {
        let src = "class A:\n    '''\n    Doc # not comment\n    '''\n    x = 1  # c\n";
        assert_eq!(py(src), "class A:\n    x = 1\n");
    }

    #[test]
    fn ordinary_triple_quoted_string_is_code() {
        let src = "s = \"\"\"\n# not a comment\n\"\"\"  # c\nprint(s)";
        assert_eq!(py(src), "s = \"\"\"\n# not a comment\n\"\"\"\nprint(s)");
    }

    #[test]
    fn triple_quote_not_after_header_is_kept() {
        let src = "x = 1\n\"\"\"not a docstring\"\"\"\n";
        assert_eq!(py(src), src);
    }

    #[test]
    fn hash_inside_strings() {
        assert_eq!(py("url = 'http://x/#a'  # c"), "url = 'http://x/#a'");
        assert_eq!(
            py("print(f\"{x!r} # {y}\")  # c"),
            "print(f\"{x!r} # {y}\")"
        );
    }

    #[test]
    fn module_docstring_is_removed() {
        assert_eq!(py("\"\"\"Module doc.\"\"\"\nimport os"), "import os");
    }

    #[test]
    fn prefixed_docstring() {
        let src = "def f():\n    r'''raw\n    doc'''\n    pass";
        assert_eq!(py(src), "def f():\n    pass");
    }

    #[test]
    fn license_docstring_is_kept_when_requested() {
        let src = "def f():\n    \"\"\"Copyright 2024 Acme\"\"\"\n    pass";
        assert_eq!(strip(src, true).unwrap(), src);
        assert_eq!(py(src), "def f():\n    pass");
    }

    #[test]
    fn multi_line_license_docstring_is_kept_when_requested() {
        let src = "\"\"\"\nSPDX-Identifier: MIT\n\"\"\"\nimport os";
        assert_eq!(strip(src, true).unwrap(), src);
        assert_eq!(py(src), "import os");
    }

    #[test]
    fn shebang_survives() {
        let src = "#!/usr/bin/env python\n# c\nx = 1";
        assert_eq!(py(src), "#!/usr/bin/env python\nx = 1");
    }

    #[test]
    fn literal_under_a_docstring_needs_a_second_pass() {
        let src = "def f():\n    \"\"\"Doc.\"\"\"\n    \"\"\"Second\"\"\"";
        let once = py(src);
        assert_eq!(once, "def f():\n    \"\"\"Second\"\"\"");
        assert_eq!(py(&once), "def f():");
    }

    #[test]
    fn unterminated_docstring_is_left_alone() {
        let src = "def f():\n    \"\"\"never closed\n    x = 1";
        assert_eq!(py(src), src);
    }

    #[test]
    fn literal_start_walks_back_over_prefixes() {
        assert_eq!(literal_start("    rb'''", 6), 4);
        assert_eq!(literal_start("    f'''", 5), 4);
        assert_eq!(literal_start("bar'''", 3), 3);
    }
}
