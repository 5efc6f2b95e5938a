//! License comment classifier.
//!
//! Every scanner asks this module, and only this module, whether a comment
//! should survive when license preservation is requested.

/// Words that mark a comment as license/attribution text (matched lowercased).
const KEYWORDS: &[&str] = &["copyright", "license", "licence", "author"];

/// JSDoc-style tags that mark a comment as license text.
const TAGS: &[&str] = &["@license", "@copyright", "@author"];

/// Per-language extras layered on top of the keyword match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseDialect {
    /// C family and CSS: a `/*!` opener is a license marker on its own.
    Block,
    /// Python and Ruby: SPDX identifiers count as license text.
    Script,
    /// Everything else: keywords and tags only.
    Plain,
}

/// Opener that marks a block comment as preserved.
pub const PRESERVED_OPENER: &str = "/*!";

pub fn is_license(text: &str, dialect: LicenseDialect) -> bool {
    let lower = text.to_lowercase();

    if KEYWORDS.iter().any(|kw| lower.contains(kw)) || TAGS.iter().any(|tag| lower.contains(tag)) {
        return true;
    }

    match dialect {
        LicenseDialect::Block => text.trim_start().starts_with(PRESERVED_OPENER),
        LicenseDialect::Script => lower.contains("spdx"),
        LicenseDialect::Plain => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_match_case_insensitively() {
        assert!(is_license("// Copyright 2024 Acme", LicenseDialect::Plain));
        assert!(is_license("# LICENSED under MIT", LicenseDialect::Plain));
        assert!(is_license("-- Licence: BSD", LicenseDialect::Plain));
        assert!(is_license("/* Author: jane */", LicenseDialect::Plain));
        assert!(!is_license("// just a note", LicenseDialect::Plain));
    }

    #[test]
    fn bang_opener_is_a_marker_only_for_block_dialect() {
        assert!(is_license("/*! keep me */", LicenseDialect::Block));
        assert!(!is_license("/*! keep me */", LicenseDialect::Plain));
    }

    #[test]
    fn spdx_is_recognised_for_script_languages_only() {
        let text = "# SPDX-Identifier: MIT";
        assert!(is_license(text, LicenseDialect::Script));
        assert!(!is_license(text, LicenseDialect::Block));
    }
}
