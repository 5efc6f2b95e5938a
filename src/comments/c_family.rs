//! `//` and `/* */` comments for the C-like family.
//!
//! A single pass over the whole buffer. Code is copied lazily: the scanner
//! remembers where the pending code span starts and only writes it out when
//! a comment interrupts it, so string, template and regex literals are
//! skipped over without ever being copied piecemeal.
//!
//! Block comments do not nest. The first `*/` closes the comment no matter
//! how many `/*` appeared inside it.
//!
//! Regex literals are told apart from division by the class of the previous
//! significant token. That is a heuristic and can be fooled by adversarial
//! code (`a\n/re/.test(b)` after an identifier is read as division).

use crate::comments::license::{LicenseDialect, PRESERVED_OPENER, is_license};
use crate::error::{ScanResult, slice};
use crate::language::Language;

/// Literal forms a language supports beyond plain `"..."`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CSyntax {
    /// `'...'` is a string or char literal.
    pub single_quote_strings: bool,
    /// `'x'` is a char literal but `'a` is a lifetime.
    pub rust_chars: bool,
    /// `r"..."`, `r#"..."#`, `br"..."`.
    pub rust_raw_strings: bool,
    /// `"..."` may run across newlines.
    pub multiline_strings: bool,
    /// Backtick template literals with `${}` interpolation.
    pub template_literals: bool,
    /// Backtick raw strings without escapes or interpolation.
    pub backtick_raw: bool,
    /// `/re/flags` literals.
    pub regex_literals: bool,
    /// C# `@"..."` verbatim strings.
    pub verbatim_strings: bool,
    /// C++ `R"delim(...)delim"`.
    pub cpp_raw_strings: bool,
    /// `"""..."""` text blocks.
    pub text_blocks: bool,
}

impl CSyntax {
    pub fn c() -> Self {
        Self {
            single_quote_strings: true,
            ..Default::default()
        }
    }

    pub fn cpp() -> Self {
        Self {
            cpp_raw_strings: true,
            ..Self::c()
        }
    }

    pub fn csharp() -> Self {
        Self {
            verbatim_strings: true,
            text_blocks: true,
            ..Self::c()
        }
    }

    pub fn java() -> Self {
        Self {
            text_blocks: true,
            ..Self::c()
        }
    }

    pub fn go() -> Self {
        Self {
            backtick_raw: true,
            ..Self::c()
        }
    }

    pub fn rust() -> Self {
        Self {
            rust_chars: true,
            rust_raw_strings: true,
            multiline_strings: true,
            ..Default::default()
        }
    }

    pub fn swift() -> Self {
        Self {
            text_blocks: true,
            ..Default::default()
        }
    }

    pub fn javascript() -> Self {
        Self {
            single_quote_strings: true,
            template_literals: true,
            regex_literals: true,
            ..Default::default()
        }
    }

    pub fn for_language(language: Language) -> Self {
        match language {
            Language::Cpp => Self::cpp(),
            Language::CSharp => Self::csharp(),
            Language::Java => Self::java(),
            Language::Go => Self::go(),
            Language::Rust => Self::rust(),
            Language::Swift => Self::swift(),
            Language::JavaScript | Language::TypeScript => Self::javascript(),
            _ => Self::c(),
        }
    }
}

/// Keywords after which a `/` starts a regex literal rather than a division.
const REGEX_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
    "yield",
    "await",
];

/// Class of the previous significant token, for regex-vs-division.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prev {
    Start,
    Operator,
    Keyword,
    Value,
}

enum TemplateEnd {
    Closed,
    Interpolation,
    Eof,
}

pub fn strip(src: &str, syntax: CSyntax, preserve_license: bool) -> ScanResult<String> {
    Scanner::new(src, syntax, preserve_license).run()
}

struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    syntax: CSyntax,
    preserve_license: bool,
    pos: usize,
    flushed: usize,
    out: String,
    /// Open `${` interpolations, each with its inner `{` depth.
    braces: Vec<usize>,
    prev: Prev,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str, syntax: CSyntax, preserve_license: bool) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            syntax,
            preserve_license,
            pos: 0,
            flushed: 0,
            out: String::with_capacity(src.len()),
            braces: Vec::new(),
            prev: Prev::Start,
        }
    }

    fn run(mut self) -> ScanResult<String> {
        let mut in_template = false;

        loop {
            if in_template {
                match self.template_body() {
                    TemplateEnd::Closed => {
                        in_template = false;
                        self.prev = Prev::Value;
                    }
                    TemplateEnd::Interpolation => {
                        in_template = false;
                        self.braces.push(0);
                        self.prev = Prev::Operator;
                    }
                    TemplateEnd::Eof => break,
                }
                continue;
            }

            let Some(&b) = self.bytes.get(self.pos) else {
                break;
            };
            let next = self.peek(1);

            match b {
                b'/' if next == Some(b'/') => self.line_comment()?,
                b'/' if next == Some(b'*') => self.block_comment()?,
                b'/' if self.syntax.regex_literals && self.regex_allowed() => {
                    if !self.regex_literal() {
                        self.pos += 1;
                        self.prev = Prev::Operator;
                    }
                }
                b'"' => self.double_quoted(),
                b'\'' => self.single_quoted()?,
                b'`' if self.syntax.template_literals => {
                    self.pos += 1;
                    in_template = true;
                }
                b'`' if self.syntax.backtick_raw => {
                    self.pos += 1;
                    self.skip_past(b'`');
                    self.prev = Prev::Value;
                }
                b'@' if self.syntax.verbatim_strings && self.at_verbatim_start() => {
                    self.verbatim_string();
                }
                b'{' => {
                    if let Some(depth) = self.braces.last_mut() {
                        *depth += 1;
                    }
                    self.pos += 1;
                    self.prev = Prev::Operator;
                }
                b'}' => {
                    self.pos += 1;
                    self.prev = Prev::Operator;
                    match self.braces.last_mut() {
                        Some(0) => {
                            self.braces.pop();
                            in_template = true;
                        }
                        Some(depth) => *depth -= 1,
                        None => {}
                    }
                }
                b')' | b']' => {
                    self.pos += 1;
                    self.prev = Prev::Value;
                }
                c if is_ident_byte(c) => self.word()?,
                c if c.is_ascii_whitespace() => self.pos += 1,
                _ => {
                    self.pos += 1;
                    self.prev = Prev::Operator;
                }
            }
        }

        self.flush_to(self.bytes.len())?;
        Ok(self.out)
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn flush_to(&mut self, end: usize) -> ScanResult<()> {
        let end = end.min(self.bytes.len());
        if end > self.flushed {
            self.out.push_str(slice(self.src, self.flushed, end)?);
        }
        self.flushed = end;
        Ok(())
    }

    fn line_comment(&mut self) -> ScanResult<()> {
        let start = self.pos;
        let newline = memchr_from(self.bytes, start, b'\n').unwrap_or(self.bytes.len());
        let end = if newline > start && self.bytes[newline - 1] == b'\r' {
            newline - 1
        } else {
            newline
        };
        let text = slice(self.src, start, end)?;

        self.flush_to(start)?;
        if self.preserve_license && is_license(text, LicenseDialect::Block) {
            self.out.push_str(&preserved_line_comment(text));
        } else {
            trim_trailing_blanks(&mut self.out);
        }

        self.pos = end;
        self.flushed = end;
        Ok(())
    }

    fn block_comment(&mut self) -> ScanResult<()> {
        let start = self.pos;
        let end = find_from(self.bytes, start + 2, b"*/")
            .map(|i| i + 2)
            .unwrap_or(self.bytes.len());
        let text = slice(self.src, start, end)?;

        self.flush_to(start)?;

        if self.preserve_license && is_license(text, LicenseDialect::Block) {
            self.out.push_str(&preserved_block_comment(text));
            self.pos = end;
            self.flushed = end;
            return Ok(());
        }

        let mut resume = end;
        let rest_of_line = blank_run(self.bytes, end);
        let line_ends = matches!(self.bytes.get(rest_of_line), None | Some(b'\n' | b'\r'));

        if line_ends {
            // Nothing but blanks follows: drop them and any blanks before.
            trim_trailing_blanks(&mut self.out);
            resume = rest_of_line;
        } else if self.out.as_bytes().last().copied().is_some_and(is_ident_byte)
            && self.bytes.get(end).copied().is_some_and(is_ident_byte)
        {
            // `int/**/x` must not fuse into one token.
            self.out.push(' ');
        }

        self.pos = resume;
        self.flushed = resume;
        Ok(())
    }

    fn regex_allowed(&self) -> bool {
        matches!(self.prev, Prev::Start | Prev::Operator | Prev::Keyword)
    }

    /// Skip a `/re/flags` literal. Returns `false` (and moves nothing) when
    /// no closing `/` exists on the line.
    fn regex_literal(&mut self) -> bool {
        let mut i = self.pos + 1;
        let mut in_class = false;

        loop {
            match self.bytes.get(i) {
                None | Some(b'\n') => return false,
                Some(b'\\') => i += 2,
                Some(b'[') => {
                    in_class = true;
                    i += 1;
                }
                Some(b']') => {
                    in_class = false;
                    i += 1;
                }
                Some(b'/') if !in_class => break,
                Some(_) => i += 1,
            }
        }

        i += 1;
        while self.bytes.get(i).is_some_and(u8::is_ascii_alphabetic) {
            i += 1;
        }

        self.pos = i;
        self.prev = Prev::Value;
        true
    }

    fn double_quoted(&mut self) {
        if self.syntax.text_blocks && self.bytes[self.pos..].starts_with(b"\"\"\"") {
            self.pos += 3;
            while self.pos < self.bytes.len() {
                match self.bytes[self.pos] {
                    b'\\' => self.pos += 2,
                    b'"' if self.bytes[self.pos..].starts_with(b"\"\"\"") => {
                        self.pos += 3;
                        break;
                    }
                    _ => self.pos += 1,
                }
            }
            self.pos = self.pos.min(self.bytes.len());
        } else {
            self.quoted(b'"', self.syntax.multiline_strings);
        }
        self.prev = Prev::Value;
    }

    fn single_quoted(&mut self) -> ScanResult<()> {
        if self.syntax.rust_chars {
            self.rust_char_or_lifetime()?;
        } else if self.syntax.single_quote_strings {
            self.quoted(b'\'', false);
            self.prev = Prev::Value;
        } else {
            self.pos += 1;
            self.prev = Prev::Operator;
        }
        Ok(())
    }

    /// Skip a `q`-delimited literal with backslash escapes. Unless
    /// `multiline`, an unescaped newline ends it without being consumed.
    fn quoted(&mut self, q: u8, multiline: bool) {
        self.pos += 1;
        while let Some(&b) = self.bytes.get(self.pos) {
            match b {
                b'\\' => self.pos += 2,
                b'\n' if !multiline => break,
                _ if b == q => {
                    self.pos += 1;
                    break;
                }
                _ => self.pos += 1,
            }
        }
        self.pos = self.pos.min(self.bytes.len());
    }

    fn rust_char_or_lifetime(&mut self) -> ScanResult<()> {
        if self.peek(1) == Some(b'\\') {
            self.quoted(b'\'', false);
            self.prev = Prev::Value;
            return Ok(());
        }

        let rest = slice(self.src, self.pos + 1, self.bytes.len())?;
        if let Some(c) = rest.chars().next() {
            let close = self.pos + 1 + c.len_utf8();
            if self.bytes.get(close) == Some(&b'\'') {
                self.pos = close + 1;
                self.prev = Prev::Value;
                return Ok(());
            }
        }

        // Lifetime or label: the identifier that follows is ordinary code.
        self.pos += 1;
        Ok(())
    }

    fn at_verbatim_start(&self) -> bool {
        match self.peek(1) {
            Some(b'"') => true,
            Some(b'$') => self.peek(2) == Some(b'"'),
            _ => false,
        }
    }

    /// `@"..."`: no escapes, `""` is a literal quote, newlines allowed.
    fn verbatim_string(&mut self) {
        self.pos = memchr_from(self.bytes, self.pos, b'"').map_or(self.bytes.len(), |i| i + 1);
        while let Some(&b) = self.bytes.get(self.pos) {
            self.pos += 1;
            if b == b'"' {
                if self.bytes.get(self.pos) == Some(&b'"') {
                    self.pos += 1;
                } else {
                    break;
                }
            }
        }
        self.prev = Prev::Value;
    }

    fn skip_past(&mut self, terminator: u8) {
        self.pos = memchr_from(self.bytes, self.pos, terminator).map_or(self.bytes.len(), |i| i + 1);
    }

    fn template_body(&mut self) -> TemplateEnd {
        while let Some(&b) = self.bytes.get(self.pos) {
            match b {
                b'\\' => self.pos += 2,
                b'`' => {
                    self.pos += 1;
                    return TemplateEnd::Closed;
                }
                b'$' if self.peek(1) == Some(b'{') => {
                    self.pos += 2;
                    return TemplateEnd::Interpolation;
                }
                _ => self.pos += 1,
            }
        }
        self.pos = self.pos.min(self.bytes.len());
        TemplateEnd::Eof
    }

    fn word(&mut self) -> ScanResult<()> {
        let start = self.pos;

        if self.syntax.rust_raw_strings
            && let Some(len) = rust_raw_string_len(&self.bytes[start..])
        {
            self.pos += len;
            self.prev = Prev::Value;
            return Ok(());
        }

        if self.syntax.cpp_raw_strings
            && let Some(len) = cpp_raw_string_len(&self.bytes[start..])
        {
            self.pos += len;
            self.prev = Prev::Value;
            return Ok(());
        }

        while self.bytes.get(self.pos).copied().is_some_and(is_ident_byte) {
            self.pos += 1;
        }

        let word = slice(self.src, start, self.pos)?;
        self.prev = if REGEX_KEYWORDS.contains(&word) {
            Prev::Keyword
        } else {
            Prev::Value
        };
        Ok(())
    }
}

/// Rewrite a license line comment into the preserved block form.
fn preserved_line_comment(text: &str) -> String {
    let body = text.trim_start_matches('/');
    let body = body.strip_prefix('!').unwrap_or(body);

    if body.contains("*/") {
        return text.to_string();
    }

    format!("{PRESERVED_OPENER}{} */", body.trim_end())
}

/// Normalize a license block comment's opener to `/*!`.
fn preserved_block_comment(text: &str) -> String {
    if text.starts_with(PRESERVED_OPENER) {
        return text.to_string();
    }

    let body = text
        .strip_prefix("/**")
        .filter(|rest| !rest.starts_with('/'))
        .or_else(|| text.strip_prefix("/*"))
        .unwrap_or(text);

    format!("{PRESERVED_OPENER}{body}")
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

fn trim_trailing_blanks(out: &mut String) {
    let kept = out.trim_end_matches([' ', '\t']).len();
    out.truncate(kept);
}

/// Index of the first byte at or after `from` that is not a space or tab.
fn blank_run(bytes: &[u8], from: usize) -> usize {
    let mut i = from;
    while matches!(bytes.get(i), Some(b' ' | b'\t')) {
        i += 1;
    }
    i
}

fn memchr_from(bytes: &[u8], from: usize, needle: u8) -> Option<usize> {
    bytes
        .get(from..)?
        .iter()
        .position(|&b| b == needle)
        .map(|i| from + i)
}

fn find_from(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| from + i)
}

/// Length of a Rust raw (byte) string starting at `bytes[0]`, if one starts there.
fn rust_raw_string_len(bytes: &[u8]) -> Option<usize> {
    let mut i = match bytes {
        [b'r', ..] => 1,
        [b'b', b'r', ..] => 2,
        _ => return None,
    };

    let hashes = bytes[i..].iter().take_while(|&&b| b == b'#').count();
    i += hashes;
    if bytes.get(i) != Some(&b'"') {
        return None;
    }
    i += 1;

    while i < bytes.len() {
        if bytes[i] == b'"' && bytes[i + 1..].iter().take(hashes).filter(|&&b| b == b'#').count() == hashes {
            return Some(i + 1 + hashes);
        }
        i += 1;
    }

    Some(bytes.len())
}

/// Length of a C++ raw string (`R"d(...)d"`, optionally `u8R`/`uR`/`UR`/`LR`).
fn cpp_raw_string_len(bytes: &[u8]) -> Option<usize> {
    let prefix = [&b"u8R\""[..], b"uR\"", b"UR\"", b"LR\"", b"R\""]
        .into_iter()
        .find(|p| bytes.starts_with(p))?;

    let delim_start = prefix.len();
    let open = bytes[delim_start..]
        .iter()
        .take(17)
        .position(|&b| b == b'(')
        .map(|i| delim_start + i)?;
    let delim = &bytes[delim_start..open];
    if delim.iter().any(|&b| b == b' ' || b == b'\\' || b == b')' || b == b'\n') {
        return None;
    }

    let mut closing = Vec::with_capacity(delim.len() + 2);
    closing.push(b')');
    closing.extend_from_slice(delim);
    closing.push(b'"');

    Some(find_from(bytes, open + 1, &closing).map_or(bytes.len(), |i| i + closing.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn js(src: &str) -> String {
        strip(src, CSyntax::javascript(), false).unwrap()
    }

    #[test]
    fn line_comment_leaves_an_empty_line() {
        assert_eq!(js("// hi\nconst x = 5;"), "\nconst x = 5;");
    }

    #[test]
    fn trailing_line_comment_trims_blanks_before_it() {
        assert_eq!(js("let a = 1;   // note\nlet b;"), "let a = 1;\nlet b;");
    }

    #[test]
    fn crlf_is_kept_after_line_comment() {
        assert_eq!(js("a(); // x\r\nb();"), "a();\r\nb();");
    }

    #[test]
    fn comment_markers_in_strings_are_code() {
        let src = r#"const s = "// not a comment"; const t = '/* nor */';"#;
        assert_eq!(js(src), src);
    }

    #[test]
    fn block_comment_spanning_lines_is_removed() {
        let src = "a();\n/* one\n two */\nb();";
        assert_eq!(js(src), "a();\n\nb();");
    }

    #[test]
    fn block_comments_do_not_nest() {
        assert_eq!(js("x /* a /* b */ y */"), "x  y */");
    }

    #[test]
    fn inline_block_comment_between_identifiers_keeps_tokens_apart() {
        let out = strip("int/**/x;", CSyntax::c(), false).unwrap();
        assert_eq!(out, "int x;");
    }

    #[test]
    fn unterminated_block_comment_runs_to_end() {
        assert_eq!(js("a();\n/* no closer"), "a();\n");
    }

    #[test]
    fn template_literal_text_is_verbatim() {
        let src = "const u = `http://example.com/* path */`;";
        assert_eq!(js(src), src);
    }

    #[test]
    fn comment_inside_template_interpolation_is_removed() {
        let src = "const t = `a ${ b /* gone */ } // kept`;";
        assert_eq!(js(src), "const t = `a ${ b  } // kept`;");
    }

    #[test]
    fn nested_braces_inside_interpolation() {
        let src = "`${ {a: 1}.a } // kept` // gone";
        assert_eq!(js(src), "`${ {a: 1}.a } // kept`");
    }

    #[test]
    fn regex_literal_is_not_a_comment() {
        let src = "const re = /\\/\\/[/*]+/g; // c";
        assert_eq!(js(src), "const re = /\\/\\/[/*]+/g;");
    }

    #[test]
    fn regex_after_return_keyword() {
        let src = "return /a\\/b/.test(s);";
        assert_eq!(js(src), src);
    }

    #[test]
    fn division_is_not_a_regex() {
        let src = "const r = a / b; // half\nconst q = (c) / 2 / d;";
        assert_eq!(js(src), "const r = a / b;\nconst q = (c) / 2 / d;");
    }

    #[test]
    fn unterminated_string_stops_at_newline() {
        let src = "char *s = \"oops\n// gone\nint x;";
        let out = strip(src, CSyntax::c(), false).unwrap();
        assert_eq!(out, "char *s = \"oops\n\nint x;");
    }

    #[test]
    fn rust_lifetimes_and_chars() {
        let src = "fn f<'a>(s: &'a str) -> char { '/' } // c\nlet q = '\\''; // d";
        let out = strip(src, CSyntax::rust(), false).unwrap();
        assert_eq!(out, "fn f<'a>(s: &'a str) -> char { '/' }\nlet q = '\\'';");
    }

    #[test]
    fn rust_raw_strings_hide_markers() {
        let src = "let s = r#\"a \" // b\"#; // c";
        let out = strip(src, CSyntax::rust(), false).unwrap();
        assert_eq!(out, "let s = r#\"a \" // b\"#;");
    }

    #[test]
    fn go_raw_strings_hide_markers() {
        let src = "s := `C:\\ // x` // y";
        let out = strip(src, CSyntax::go(), false).unwrap();
        assert_eq!(out, "s := `C:\\ // x`");
    }

    #[test]
    fn csharp_verbatim_string() {
        let src = "var p = @\"C:\\dir\\\"\"// x\"; // y";
        let out = strip(src, CSyntax::csharp(), false).unwrap();
        assert_eq!(out, "var p = @\"C:\\dir\\\"\"// x\";");
    }

    #[test]
    fn cpp_raw_string() {
        let src = "auto s = R\"x(/* )\" */)x\"; /* c */";
        let out = strip(src, CSyntax::cpp(), false).unwrap();
        assert_eq!(out, "auto s = R\"x(/* )\" */)x\";");
    }

    #[test]
    fn java_text_block() {
        let src = "String s = \"\"\"\n  // inside\n  \"\"\"; // out";
        let out = strip(src, CSyntax::java(), false).unwrap();
        assert_eq!(out, "String s = \"\"\"\n  // inside\n  \"\"\";");
    }

    #[test]
    fn license_comments_are_preserved_and_normalized() {
        let src = "/** @license MIT */\n// Copyright 2024 Acme\n// drop\nx();";
        let out = strip(src, CSyntax::javascript(), true).unwrap();
        assert_eq!(out, "/*! @license MIT */\n/*! Copyright 2024 Acme */\n\nx();");
    }

    #[test]
    fn license_comments_are_dropped_without_preservation() {
        let src = "/*! keep */\n// Copyright\nx();";
        assert_eq!(js(src), "\n\nx();");
    }

    #[test]
    fn raw_string_helpers() {
        assert_eq!(rust_raw_string_len(b"r\"ab\" x"), Some(5));
        assert_eq!(rust_raw_string_len(b"r##\"a\"#\"## x"), Some(10));
        assert_eq!(rust_raw_string_len(b"return"), None);
        assert_eq!(cpp_raw_string_len(b"R\"(a)\""), Some(6));
        assert_eq!(cpp_raw_string_len(b"Rx"), None);
    }
}
