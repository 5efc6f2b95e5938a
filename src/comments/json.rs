//! JSON with comments (JSONC / JSON5-style tolerance).
//!
//! Comments are always stripped; JSON has no license convention to honour.

use crate::error::{ScanResult, slice};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    InString(u8),
    InLineComment,
    InBlockComment,
}

pub fn strip(src: &str) -> ScanResult<String> {
    let bytes = src.as_bytes();
    let mut out = String::with_capacity(src.len());
    let mut state = State::Code;
    let mut flushed = 0;
    let mut i = 0;

    while i < bytes.len() {
        let next = bytes.get(i + 1).copied();

        match state {
            State::Code => match bytes[i] {
                q @ (b'"' | b'\'') => {
                    state = State::InString(q);
                    i += 1;
                }
                b'/' if next == Some(b'/') => {
                    out.push_str(slice(src, flushed, i)?);
                    let kept = out.trim_end_matches([' ', '\t']).len();
                    out.truncate(kept);
                    state = State::InLineComment;
                    i += 2;
                }
                b'/' if next == Some(b'*') => {
                    out.push_str(slice(src, flushed, i)?);
                    state = State::InBlockComment;
                    i += 2;
                }
                _ => i += 1,
            },
            State::InString(q) => match bytes[i] {
                b'\\' => i += 2,
                b if b == q => {
                    state = State::Code;
                    i += 1;
                }
                _ => i += 1,
            },
            State::InLineComment => {
                if matches!(bytes[i], b'\n' | b'\r') {
                    state = State::Code;
                    flushed = i;
                } else {
                    i += 1;
                }
            }
            State::InBlockComment => {
                if bytes[i] == b'*' && next == Some(b'/') {
                    state = State::Code;
                    i += 2;
                    flushed = i;
                    // `1/**/2` must not fuse into one number.
                    if out.as_bytes().last().copied().is_some_and(is_value_byte)
                        && bytes.get(i).copied().is_some_and(is_value_byte)
                    {
                        out.push(' ');
                    }
                } else {
                    i += 1;
                }
            }
        }
    }

    if matches!(state, State::Code | State::InString(_)) {
        out.push_str(slice(src, flushed, bytes.len())?);
    }

    Ok(out)
}

fn is_value_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-' | b'+')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_both_comment_kinds() {
        let src = "{\n  // c\n  \"a\": 1, /* b */ \"u\": \"http://x\"\n}";
        let out = strip(src).unwrap();
        assert_eq!(out, "{\n\n  \"a\": 1,  \"u\": \"http://x\"\n}");
    }

    #[test]
    fn single_quoted_strings_are_respected() {
        assert_eq!(strip("{'k': '/* no */'} // c").unwrap(), "{'k': '/* no */'}");
    }

    #[test]
    fn escaped_quote_does_not_end_the_string() {
        let src = r#"{"a": "x\"//y"}"#;
        assert_eq!(strip(src).unwrap(), src);
    }

    #[test]
    fn unterminated_block_comment_is_dropped() {
        assert_eq!(strip("[1, 2] /* open").unwrap(), "[1, 2] ");
    }

    #[test]
    fn inline_block_comment_keeps_tokens_apart() {
        assert_eq!(strip("[1/**/2]").unwrap(), "[1 2]");
        assert_eq!(strip("[1, /* c */2]").unwrap(), "[1, 2]");
        assert_eq!(strip("[true/* c */]").unwrap(), "[true]");
    }

    #[test]
    fn plain_json_is_untouched() {
        let src = "{\"a\": [1, 2, {\"b\": null}]}\n";
        assert_eq!(strip(src).unwrap(), src);
    }
}
