//! Line-scoped string/quote tracking shared by the line-oriented scanners.
//!
//! Nothing here looks across a line boundary. Strings that may span lines
//! (triple quotes, heredocs, block scalars) are tracked by the scanner that
//! owns them.

/// Quote characters understood by the hash-comment languages.
pub const HASH_QUOTES: &[char] = &['"', '\''];

/// `{in_string, quote_char, escape_next}` for a single left-to-right pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QuoteState {
    quote: Option<char>,
    escape_next: bool,
}

impl QuoteState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_string(&self) -> bool {
        self.quote.is_some()
    }

    /// The next character will be consumed as escaped.
    pub fn escaping(&self) -> bool {
        self.escape_next
    }

    /// Feed one character. Returns `true` when the character is inert, i.e.
    /// part of a string literal (delimiters included) or escaped.
    pub fn advance(&mut self, c: char, quotes: &[char]) -> bool {
        if self.escape_next {
            self.escape_next = false;
            return true;
        }

        if c == '\\' {
            self.escape_next = true;
            return self.quote.is_some();
        }

        match self.quote {
            Some(open) => {
                if c == open {
                    self.quote = None;
                }
                true
            }
            None if quotes.contains(&c) => {
                self.quote = Some(c);
                true
            }
            None => false,
        }
    }
}

/// Byte index of the first unescaped `marker` at or after `start` that lies
/// outside any quoted region.
pub fn find_unquoted(line: &str, start: usize, marker: char, quotes: &[char]) -> Option<usize> {
    let tail = line.get(start..)?;
    let mut state = QuoteState::new();

    for (offset, c) in tail.char_indices() {
        let inert = state.advance(c, quotes);
        if !inert && c == marker {
            return Some(start + offset);
        }
    }

    None
}

/// End (exclusive) of the first `quote` at or after `from`. With `escapes`,
/// a backslash hides the byte after it.
pub fn find_close(line: &str, from: usize, quote: &str, escapes: bool) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        if escapes && bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if bytes[i..].starts_with(quote.as_bytes()) {
            return Some(i + quote.len());
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_marker_outside_strings() {
        assert_eq!(find_unquoted("x = 1  # c", 0, '#', HASH_QUOTES), Some(7));
        assert_eq!(find_unquoted("s = '#' # c", 0, '#', HASH_QUOTES), Some(8));
        assert_eq!(find_unquoted("s = \"a#b\"", 0, '#', HASH_QUOTES), None);
    }

    #[test]
    fn other_quote_kind_does_not_close_the_string() {
        assert_eq!(find_unquoted("s = \"it's # here\"", 0, '#', HASH_QUOTES), None);
    }

    #[test]
    fn escaped_quote_keeps_string_open() {
        assert_eq!(find_unquoted(r##"s = "a\"#" # c"##, 0, '#', HASH_QUOTES), Some(11));
    }

    #[test]
    fn escaped_marker_is_not_a_marker() {
        assert_eq!(find_unquoted(r"echo \# # real", 0, '#', HASH_QUOTES), Some(8));
    }

    #[test]
    fn triple_close_honours_escapes_only_when_asked() {
        assert_eq!(find_close(r#"a \""" b"""#, 0, "\"\"\"", true), Some(11));
        assert_eq!(find_close(r#"a \""" b"""#, 0, "\"\"\"", false), Some(6));
        assert_eq!(find_close("'''", 1, "'''", false), None);
    }

    #[test]
    fn start_offset_is_respected() {
        assert_eq!(find_unquoted("# a # b", 1, '#', HASH_QUOTES), Some(4));
        assert_eq!(find_unquoted("abc", 10, '#', HASH_QUOTES), None);
    }
}
