use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::UnknownLanguage;

/// Every language the scanners know how to strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    C,
    Cpp,
    CSharp,
    Java,
    Go,
    Rust,
    Swift,
    JavaScript,
    TypeScript,
    Python,
    Ruby,
    Yaml,
    Toml,
    Sql,
    Html,
    Xml,
    Css,
    Json,
}

/// Which scanner a language is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    CLike,
    Python,
    Ruby,
    Hash,
    Sql,
    Markup,
    Css,
    Json,
}

impl Language {
    pub const ALL: [Language; 18] = [
        Language::C,
        Language::Cpp,
        Language::CSharp,
        Language::Java,
        Language::Go,
        Language::Rust,
        Language::Swift,
        Language::JavaScript,
        Language::TypeScript,
        Language::Python,
        Language::Ruby,
        Language::Yaml,
        Language::Toml,
        Language::Sql,
        Language::Html,
        Language::Xml,
        Language::Css,
        Language::Json,
    ];

    /// Canonical tag, as printed and as accepted by `--lang`.
    pub fn tag(self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
            Language::Java => "java",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Swift => "swift",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Python => "python",
            Language::Ruby => "ruby",
            Language::Yaml => "yaml",
            Language::Toml => "toml",
            Language::Sql => "sql",
            Language::Html => "html",
            Language::Xml => "xml",
            Language::Css => "css",
            Language::Json => "json",
        }
    }

    pub fn family(self) -> Family {
        match self {
            Language::C
            | Language::Cpp
            | Language::CSharp
            | Language::Java
            | Language::Go
            | Language::Rust
            | Language::Swift
            | Language::JavaScript
            | Language::TypeScript => Family::CLike,
            Language::Python => Family::Python,
            Language::Ruby => Family::Ruby,
            Language::Yaml | Language::Toml => Family::Hash,
            Language::Sql => Family::Sql,
            Language::Html | Language::Xml => Family::Markup,
            Language::Css => Family::Css,
            Language::Json => Family::Json,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().trim_start_matches('.').to_ascii_lowercase();

        let lang = match norm.as_str() {
            "c" | "h" => Language::C,
            "cpp" | "c++" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Language::Cpp,
            "csharp" | "cs" | "c#" => Language::CSharp,
            "java" => Language::Java,
            "go" | "golang" => Language::Go,
            "rust" | "rs" => Language::Rust,
            "swift" => Language::Swift,
            "javascript" | "js" | "jsx" | "mjs" | "cjs" | "node" => Language::JavaScript,
            "typescript" | "ts" | "tsx" | "mts" | "cts" => Language::TypeScript,
            "python" | "py" | "python3" | "pyw" => Language::Python,
            "ruby" | "rb" => Language::Ruby,
            "yaml" | "yml" => Language::Yaml,
            "toml" => Language::Toml,
            "sql" => Language::Sql,
            "html" | "htm" | "xhtml" => Language::Html,
            "xml" | "svg" | "xsl" | "xsd" => Language::Xml,
            "css" => Language::Css,
            "json" | "jsonc" | "json5" => Language::Json,
            _ => return Err(UnknownLanguage(s.to_string())),
        };

        Ok(lang)
    }
}
