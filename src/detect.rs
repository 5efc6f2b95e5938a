//! Resolve a [`Language`] from a path or, failing that, from the content.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::comments::json;
use crate::language::Language;

const EXTENSIONS: &[(&str, Language)] = &[
    ("c", Language::C),
    ("h", Language::C),
    ("cpp", Language::Cpp),
    ("cc", Language::Cpp),
    ("cxx", Language::Cpp),
    ("c++", Language::Cpp),
    ("hpp", Language::Cpp),
    ("hh", Language::Cpp),
    ("hxx", Language::Cpp),
    ("cs", Language::CSharp),
    ("java", Language::Java),
    ("go", Language::Go),
    ("rs", Language::Rust),
    ("swift", Language::Swift),
    ("js", Language::JavaScript),
    ("jsx", Language::JavaScript),
    ("mjs", Language::JavaScript),
    ("cjs", Language::JavaScript),
    ("ts", Language::TypeScript),
    ("tsx", Language::TypeScript),
    ("mts", Language::TypeScript),
    ("cts", Language::TypeScript),
    ("py", Language::Python),
    ("pyw", Language::Python),
    ("pyi", Language::Python),
    ("rb", Language::Ruby),
    ("rake", Language::Ruby),
    ("gemspec", Language::Ruby),
    ("ru", Language::Ruby),
    ("yaml", Language::Yaml),
    ("yml", Language::Yaml),
    ("toml", Language::Toml),
    ("sql", Language::Sql),
    ("html", Language::Html),
    ("htm", Language::Html),
    ("xhtml", Language::Html),
    ("xml", Language::Xml),
    ("svg", Language::Xml),
    ("xsl", Language::Xml),
    ("xsd", Language::Xml),
    ("plist", Language::Xml),
    ("css", Language::Css),
    ("json", Language::Json),
    ("jsonc", Language::Json),
    ("json5", Language::Json),
];

const FILE_NAMES: &[(&str, Language)] = &[
    ("gemfile", Language::Ruby),
    ("rakefile", Language::Ruby),
    ("vagrantfile", Language::Ruby),
    ("podfile", Language::Ruby),
    ("sconstruct", Language::Python),
    ("pipfile", Language::Toml),
    ("cargo.lock", Language::Toml),
    (".babelrc", Language::Json),
    (".eslintrc", Language::Json),
    (".clang-format", Language::Yaml),
];

/// Immutable extension/file-name lookup, built once and shared by reference.
#[derive(Debug, Clone)]
pub struct LanguageTable {
    by_extension: HashMap<&'static str, Language>,
    by_file_name: HashMap<&'static str, Language>,
}

impl Default for LanguageTable {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageTable {
    pub fn new() -> Self {
        Self {
            by_extension: EXTENSIONS.iter().copied().collect(),
            by_file_name: FILE_NAMES.iter().copied().collect(),
        }
    }

    /// Case-insensitive, with or without the leading dot.
    pub fn by_extension(&self, ext: &str) -> Option<Language> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        self.by_extension.get(ext.as_str()).copied()
    }

    pub fn by_path(&self, path: &Path) -> Option<Language> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if let Some(&lang) = self.by_file_name.get(name.as_str()) {
            return Some(lang);
        }

        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| self.by_extension(e))
    }

    /// Path first, then content.
    pub fn detect(&self, path: Option<&Path>, content: &str) -> Option<Language> {
        path.and_then(|p| self.by_path(p))
            .or_else(|| sniff(content))
    }
}

/// Per-language line signals, scored by number of matches.
const SIGNALS: &[(Language, &str)] = &[
    (Language::Python, r"^\s*def \w+\(.*\)\s*(->.*)?:\s*$"),
    (Language::Python, r"^\s*(from [\w.]+ )?import \w+\s*$"),
    (Language::Python, r"^\s*class \w+(\(.*\))?:\s*$"),
    (Language::Python, r"^if __name__ == .__main__.:"),
    (Language::Ruby, r"^\s*def \w+[?!]?(\(.*\))?\s*$"),
    (Language::Ruby, r"^\s*end\s*$"),
    (Language::Ruby, r#"^\s*require(_relative)? ['"]"#),
    (Language::Ruby, r"^\s*attr_(reader|writer|accessor) :"),
    (Language::Rust, r"^\s*(pub(\(\w+\))? )?fn \w+"),
    (Language::Rust, r"^\s*use (std|crate|super)::"),
    (Language::Rust, r"^\s*let mut \w+"),
    (Language::Rust, r"^\s*#\[derive\("),
    (Language::Go, r"^package \w+\s*$"),
    (Language::Go, r"^func (\(.*\) )?\w+\("),
    (Language::Go, r"\w+ := "),
    (Language::C, r"^#include <\w+\.h>"),
    (Language::C, r"\b(printf|malloc|free)\("),
    (Language::Cpp, r"^#include <(iostream|vector|string|memory|map)>"),
    (Language::Cpp, r"\bstd::"),
    (Language::Cpp, r"^\s*template\s*<"),
    (Language::Java, r"^\s*(public|private|protected) (static )?(final )?(class|interface|enum) \w+"),
    (Language::Java, r"^import java\."),
    (Language::Java, r"System\.out\.println"),
    (Language::CSharp, r"^using System"),
    (Language::CSharp, r"Console\.Write"),
    (Language::CSharp, r"\{ get; (set; )?\}"),
    (Language::Swift, r"^import (Foundation|UIKit|SwiftUI)"),
    (Language::Swift, r"^\s*guard let "),
    (Language::Swift, r"^\s*func \w+\(.*\) -> \w+ \{"),
    (Language::JavaScript, r"^\s*(const|let|var) \w+ = "),
    (Language::JavaScript, r"^\s*(async )?function\*? ?\w*\("),
    (Language::JavaScript, r"console\.log\("),
    (Language::JavaScript, r#"\brequire\(['"]"#),
    (Language::JavaScript, r"module\.exports"),
    (Language::TypeScript, r"^\s*(export )?interface \w+"),
    (Language::TypeScript, r"^\s*(export )?type \w+ = "),
    (Language::TypeScript, r"\w: (string|number|boolean|void)\b"),
    (Language::Sql, r"(?i)^\s*(select\b.*\bfrom|insert into|create (table|index|view)|update \w+ set|delete from|alter table|drop table)\b"),
    (Language::Yaml, r"^---\s*$"),
    (Language::Yaml, r"^\s*(- )?[\w-]+:( [^;{}]*)?$"),
    (Language::Toml, r"^\[[\w.-]+\]\s*$"),
    (Language::Toml, r#"^[\w-]+ = ("|\d|\[|true|false)"#),
    (Language::Css, r"^\s*[.#@]?[\w-]+[^{;]*\{\s*$"),
    (Language::Css, r"^\s*[\w-]+:\s*[^;]+;\s*$"),
];

static SIGNAL_PATTERNS: LazyLock<Vec<(Language, Regex)>> = LazyLock::new(|| {
    SIGNALS
        .iter()
        .filter_map(|(lang, pat)| Regex::new(&format!("(?m){pat}")).ok().map(|re| (*lang, re)))
        .collect()
});

/// Guess a language from the text alone.
pub fn sniff(content: &str) -> Option<Language> {
    let trimmed = content.trim_start();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(lang) = from_shebang(trimmed) {
        return Some(lang);
    }

    let lower_head: String = trimmed.chars().take(256).collect::<String>().to_ascii_lowercase();
    if lower_head.starts_with("<?xml") {
        return Some(Language::Xml);
    }
    if lower_head.starts_with("<!doctype html") || lower_head.starts_with("<html") {
        return Some(Language::Html);
    }

    if (trimmed.starts_with('{') || trimmed.starts_with('['))
        && json::strip(content)
            .ok()
            .is_some_and(|plain| serde_json::from_str::<serde_json::Value>(&plain).is_ok())
    {
        return Some(Language::Json);
    }

    let mut scores: Vec<(Language, usize)> = Vec::new();
    for (lang, re) in SIGNAL_PATTERNS.iter() {
        let hits = re.find_iter(content).count();
        if hits == 0 {
            continue;
        }
        match scores.iter_mut().find(|(l, _)| l == lang) {
            Some((_, n)) => *n += hits,
            None => scores.push((*lang, hits)),
        }
    }

    // Ties go to the language listed first.
    let mut best: Option<(Language, usize)> = None;
    for (lang, n) in scores {
        if best.is_none_or(|(_, top)| n > top) {
            best = Some((lang, n));
        }
    }
    best.map(|(lang, _)| lang)
}

fn from_shebang(text: &str) -> Option<Language> {
    let first = text.lines().next()?.strip_prefix("#!")?;

    if first.contains("python") {
        Some(Language::Python)
    } else if first.contains("ruby") {
        Some(Language::Ruby)
    } else if first.contains("ts-node") || first.contains("deno") {
        Some(Language::TypeScript)
    } else if first.contains("node") || first.contains("bun") {
        Some(Language::JavaScript)
    } else {
        None
    }
}
