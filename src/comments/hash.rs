//! `#` comments, line by line.
//!
//! This is the baseline for every hash-comment language: YAML and TOML use
//! it directly, the Python and Ruby scanners layer their block constructs on
//! top of [`comment_line`] and [`cut_trailing`].
//!
//! Multi-line content is tracked per dialect: YAML block scalars and TOML
//! `"""`/`'''` strings are copied through untouched.

use crate::comments::license::{LicenseDialect, is_license};
use crate::comments::quotes::find_close;
use crate::error::{ScanResult, slice};
use crate::language::Language;

const LICENSE: LicenseDialect = LicenseDialect::Plain;

const BASIC_TRIPLE: &str = "\"\"\"";
const LITERAL_TRIPLE: &str = "'''";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashDialect {
    Yaml,
    Toml,
}

impl HashDialect {
    pub fn for_language(language: Language) -> Self {
        match language {
            Language::Yaml => HashDialect::Yaml,
            _ => HashDialect::Toml,
        }
    }
}

/// What a line turns into after stripping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Line<'a> {
    Keep(&'a str),
    Drop,
}

/// Classify a line that is nothing but a comment (or a shebang).
/// Returns `None` when the line carries code.
pub(crate) fn comment_line<'a>(
    line: &'a str,
    first_line: bool,
    license: LicenseDialect,
    preserve_license: bool,
) -> Option<Line<'a>> {
    if first_line && line.starts_with("#!") {
        return Some(Line::Keep(line));
    }

    let trimmed = line.trim_start();
    if !trimmed.starts_with('#') {
        return None;
    }

    if preserve_license && is_license(trimmed, license) {
        Some(Line::Keep(line))
    } else {
        Some(Line::Drop)
    }
}

/// Cut the trailing comment starting at `at`. A license comment keeps the
/// whole original line when preservation is on.
pub(crate) fn cut_trailing<'a>(
    line: &'a str,
    at: usize,
    license: LicenseDialect,
    preserve_license: bool,
) -> ScanResult<&'a str> {
    let comment = slice(line, at, line.len())?;
    if preserve_license && is_license(comment, license) {
        return Ok(line);
    }

    let code = slice(line, 0, at)?.trim_end();
    Ok(code)
}

pub fn strip(text: &str, dialect: HashDialect, preserve_license: bool) -> ScanResult<String> {
    let mut out: Vec<&str> = Vec::new();
    let mut block_scalar: Option<usize> = None;
    let mut open_string: Option<&'static str> = None;

    for (idx, line) in text.split('\n').enumerate() {
        if let Some(parent) = block_scalar {
            if line.trim().is_empty() || indent_of(line) > parent {
                out.push(line);
                continue;
            }
            block_scalar = None;
        }

        if let Some(quote) = open_string.take() {
            let Some(end) = find_close(line, 0, quote, quote == BASIC_TRIPLE) else {
                open_string = Some(quote);
                out.push(line);
                continue;
            };
            out.push(toml_code(line, end, &mut open_string, preserve_license)?);
            continue;
        }

        let kept = match comment_line(line, idx == 0, LICENSE, preserve_license) {
            Some(Line::Drop) => continue,
            Some(Line::Keep(kept)) => kept,
            None => match dialect {
                HashDialect::Yaml => match find_yaml_comment(line) {
                    Some(at) => cut_trailing(line, at, LICENSE, preserve_license)?,
                    None => line,
                },
                HashDialect::Toml => toml_code(line, 0, &mut open_string, preserve_license)?,
            },
        };

        if dialect == HashDialect::Yaml && opens_block_scalar(kept) {
            block_scalar = Some(indent_of(line));
        }
        out.push(kept);
    }

    Ok(out.join("\n"))
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// How the code part of a TOML line ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TomlScan {
    Plain,
    Comment(usize),
    /// A multi-line string opens and runs past the end of the line.
    Opens(&'static str),
}

/// Strip the TOML line from `from` on, noting a multi-line string that
/// stays open.
fn toml_code<'a>(
    line: &'a str,
    from: usize,
    open_string: &mut Option<&'static str>,
    preserve_license: bool,
) -> ScanResult<&'a str> {
    match scan_toml(line, from) {
        TomlScan::Plain => Ok(line),
        TomlScan::Comment(at) => cut_trailing(line, at, LICENSE, preserve_license),
        TomlScan::Opens(quote) => {
            *open_string = Some(quote);
            Ok(line)
        }
    }
}

/// Basic strings (`"`) take backslash escapes, literal strings (`'`) do not.
fn scan_toml(line: &str, from: usize) -> TomlScan {
    let bytes = line.as_bytes();
    let mut i = from;

    while let Some(&b) = bytes.get(i) {
        let (single, triple, escapes) = match b {
            b'#' => return TomlScan::Comment(i),
            b'"' => ("\"", BASIC_TRIPLE, true),
            b'\'' => ("'", LITERAL_TRIPLE, false),
            _ => {
                i += 1;
                continue;
            }
        };

        if bytes[i..].starts_with(triple.as_bytes()) {
            let Some(end) = find_close(line, i + 3, triple, escapes) else {
                return TomlScan::Opens(triple);
            };
            // Up to two quotes may sit right before the closing delimiter.
            let extra = bytes[end..].iter().take(2).take_while(|&&c| c == b).count();
            i = end + extra;
        } else {
            i = find_close(line, i + 1, single, escapes).unwrap_or(bytes.len());
        }
    }

    TomlScan::Plain
}

/// YAML only starts a comment at `#` preceded by whitespace (or at column
/// 0), and only opens a quoted scalar at the start of a value. Inside a
/// single-quoted scalar `''` is an escaped quote.
fn find_yaml_comment(line: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escape_next = false;
    let mut prev: Option<char> = None;
    let mut chars = line.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match quote {
            Some('"') if escape_next => escape_next = false,
            Some('"') if c == '\\' => escape_next = true,
            Some('\'') if c == '\'' && chars.peek().is_some_and(|&(_, n)| n == '\'') => {
                chars.next();
            }
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => {
                let at_value_start =
                    prev.is_none_or(|p| p.is_whitespace() || matches!(p, ':' | '[' | '{' | ',' | '-'));
                if (c == '"' || c == '\'') && at_value_start {
                    quote = Some(c);
                } else if c == '#' && prev.is_none_or(char::is_whitespace) {
                    return Some(i);
                }
            }
        }
        prev = Some(c);
    }

    None
}

/// `key: |`, `- >-`, `|2+` and friends start a literal/folded block.
fn opens_block_scalar(code: &str) -> bool {
    let trimmed = code.trim_end();
    let head = trimmed.trim_end_matches(|c: char| c == '+' || c == '-' || c.is_ascii_digit());
    let Some(before) = head.strip_suffix('|').or_else(|| head.strip_suffix('>')) else {
        return false;
    };
    let before = before.trim_end();
    before.is_empty() || before.ends_with(':') || before.ends_with('-')
}
