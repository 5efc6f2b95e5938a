use thiserror::Error;

/// Internal fault raised while scanning a buffer.
///
/// These never reach callers of [`crate::comments::strip_comments`]: the
/// scanner boundary logs them and hands the original text back.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("slice {start}..{end} is not on a char boundary (buffer length {len})")]
    Boundary { start: usize, end: usize, len: usize },

    #[error("comment pattern failed to compile: {0}")]
    Pattern(String),
}

pub type ScanResult<T> = std::result::Result<T, ScanError>;

/// Returned when a language tag does not name a supported language.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown language '{0}'")]
pub struct UnknownLanguage(pub String);

/// Borrow `src[start..end]`, turning an off-boundary slice into a [`ScanError`].
pub(crate) fn slice(src: &str, start: usize, end: usize) -> ScanResult<&str> {
    src.get(start..end).ok_or(ScanError::Boundary {
        start,
        end,
        len: src.len(),
    })
}
