use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::{DirEntry, WalkBuilder};
use tracing::{debug, warn};

pub mod comments;
pub mod detect;
pub mod dispatch;
pub mod error;
pub mod language;

pub use crate::comments::{StripOptions, strip_comments};
pub use crate::detect::LanguageTable;
pub use crate::dispatch::{RemovalRequest, RemovalResult, remove_comments};
pub use crate::error::{ScanError, UnknownLanguage};
pub use crate::language::Language;

/// Path argument that means "read stdin, write stdout".
pub const STDIN_PATH: &str = "-";

/// Configuration passed from the CLI layer (main.rs) into the core logic.
#[derive(Debug)]
pub struct Config {
    /// Extension filter. Empty means every file whose language is known
    /// from its name.
    pub exts: HashSet<String>,
    pub paths: Vec<PathBuf>,
    /// Forced language; otherwise resolved per file.
    pub language: Option<Language>,
    pub options: StripOptions,
    pub dry_run: bool,
    pub follow_symlinks: bool,
    pub no_gitignore: bool,
    pub json: bool,
    pub excludes: Vec<String>,
    pub max_bytes: Option<u64>,
    pub end_marker: bool,
}

impl Config {
    fn request<'a>(&self, path: Option<&'a Path>) -> RemovalRequest<'a> {
        RemovalRequest {
            language: self.language,
            path,
            options: self.options,
            dry_run: self.dry_run,
        }
    }
}

#[derive(serde::Serialize)]
struct FileEntry {
    path: String,
    file_name: String,
    language: Option<Language>,
    removed_count: usize,
    content: String,
}

/// Running state shared by every printed file.
#[derive(Debug, Default)]
struct Output {
    first_file: bool,
    files: usize,
    removed: usize,
}

pub fn run_with_config(cfg: Config) -> Result<()> {
    let exclude_globset = build_exclude_globset(&cfg.excludes)?;
    let table = LanguageTable::new();

    let mut had_error = false;
    let mut output = Output {
        first_file: true,
        ..Default::default()
    };

    if cfg.json {
        println!("[");
    }

    for raw_root in &cfg.paths {
        if raw_root.as_os_str() == STDIN_PATH {
            if let Err(err) = process_stdin(&cfg, &table, &mut output) {
                eprintln!("Error processing stdin: {:#}", err);
                had_error = true;
            }
            continue;
        }

        // Canonicalise roots so running from arbitrary working dirs is reliable.
        let canon_root = match raw_root.canonicalize() {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Skipping root {:?}: {}", raw_root, e);
                had_error = true;
                continue;
            }
        };

        let mut builder = WalkBuilder::new(&canon_root);
        builder.follow_links(cfg.follow_symlinks);

        // Helps avoid edge cases where process CWD is invalid and global ignores need a base.
        builder.current_dir(canon_root.clone());

        if cfg.no_gitignore {
            builder
                .git_ignore(false)
                .git_exclude(false)
                .git_global(false)
                .ignore(false);
        } else {
            builder
                .git_ignore(true)
                .git_exclude(true)
                .git_global(true)
                .ignore(true)
                .require_git(false);
        }

        // Values moved into the 'static filter closure must be owned separately.
        let root_for_filter = canon_root.clone();
        let exclude_globset = exclude_globset.clone();

        builder.filter_entry(move |entry: &DirEntry| {
            // Always keep the root.
            if entry.depth() == 0 {
                return true;
            }

            // Apply user exclude globs, relative to the current root.
            if let Some(ref gs) = exclude_globset {
                let path = entry.path();
                let rel = path.strip_prefix(&root_for_filter).unwrap_or(path);
                let rel_norm = normalize_for_matching(rel);

                if gs.is_match(&rel_norm) {
                    return false;
                }

                // If this is a directory, also try a trailing slash to make patterns
                // like `tests/**` able to prune the whole subtree early.
                if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false)
                    && !rel_norm.ends_with('/')
                {
                    let rel_dir = format!("{rel_norm}/");
                    if gs.is_match(&rel_dir) {
                        return false;
                    }
                }
            }

            true
        });

        let walker = builder.build();

        for result in walker {
            let entry = match result {
                Ok(e) => e,
                Err(err) => {
                    eprintln!("Walk error: {err}");
                    had_error = true;
                    continue;
                }
            };

            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }

            let path = entry.path();
            let display_path = make_display_path(&canon_root, path);

            if cfg.exts.is_empty() {
                // Without a filter only files whose name says what they are get
                // touched; sniffing every file in a tree is too eager.
                if cfg.language.is_none() && table.by_path(path).is_none() {
                    debug!(path = %display_path, "no language for file name, skipping");
                    continue;
                }
            } else if !matches_ext(path, &cfg.exts) {
                continue;
            }

            if let Some(limit) = cfg.max_bytes
                && let Ok(meta) = fs::metadata(path)
                && meta.len() > limit
            {
                warn!(
                    "Skipping {} (size {} bytes > max {} bytes)",
                    display_path,
                    meta.len(),
                    limit
                );
                continue;
            }

            let processed = process_file(path, &display_path, &cfg, &table)
                .and_then(|result| output.emit(&display_path, file_name(path), &result, &cfg));
            if let Err(err) = processed {
                eprintln!("Error printing {}: {:#}", display_path, err);
                had_error = true;
            }
        }
    }

    if cfg.json {
        println!("\n]");
    } else if cfg.dry_run {
        println!(
            "total: {} comment line(s) in {} file(s)",
            output.removed, output.files
        );
    }

    if had_error {
        anyhow::bail!("One or more files could not be read. See stderr for details.");
    }

    Ok(())
}

fn process_file(
    path: &Path,
    display_path: &str,
    cfg: &Config,
    table: &LanguageTable,
) -> Result<RemovalResult> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", display_path))?;
    let text = String::from_utf8_lossy(&bytes);

    let result = remove_comments(&text, &cfg.request(Some(path)), table);
    if result.language.is_none() {
        warn!("Could not detect a language for {}, leaving it unchanged", display_path);
    }

    Ok(result)
}

fn process_stdin(cfg: &Config, table: &LanguageTable, output: &mut Output) -> Result<()> {
    let text = io::read_to_string(io::stdin().lock()).context("Failed to read stdin")?;

    let result = remove_comments(&text, &cfg.request(None), table);
    if result.language.is_none() {
        warn!("Could not detect a language for stdin, leaving it unchanged");
    }

    if cfg.json || cfg.dry_run {
        return output.emit(STDIN_PATH, STDIN_PATH.to_string(), &result, cfg);
    }

    // Filter mode: the text goes out exactly as produced, no header.
    print!("{}", result.text);
    output.files += 1;
    output.removed += result.removed_count;
    Ok(())
}

impl Output {
    fn emit(
        &mut self,
        display_path: &str,
        file_name: String,
        result: &RemovalResult,
        cfg: &Config,
    ) -> Result<()> {
        self.files += 1;
        self.removed += result.removed_count;

        if cfg.json {
            if !self.first_file {
                println!(",");
            }
            self.first_file = false;
            return print_file_json(display_path, file_name, result);
        }

        if cfg.dry_run {
            print_dry_run(display_path, result);
        } else {
            print_file(display_path, &result.text, cfg.end_marker);
        }

        Ok(())
    }
}

/// Build a GlobSet from the user–provided `--exclude` patterns.
/// Returns `Ok(None)` if there are no patterns.
fn build_exclude_globset(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();

    for pat in patterns {
        let pat = pat.trim();
        if pat.is_empty() {
            continue;
        }

        let glob =
            Glob::new(pat).with_context(|| format!("Invalid --exclude glob pattern: {pat}"))?;
        builder.add(glob);
    }

    let set = builder
        .build()
        .context("Failed to build exclude glob set")?;

    Ok(Some(set))
}

/// Case-insensitive extension match, using the provided extension set.
pub fn matches_ext(path: &Path, exts: &HashSet<String>) -> bool {
    match path.extension().and_then(|s| s.to_str()) {
        Some(ext) => exts.contains(&ext.to_ascii_lowercase()),
        None => false,
    }
}

/// Produce a display path relative to `root` (stable regardless of current working directory).
pub fn make_display_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);

    // If root is a file and path == root, rel is empty.
    if rel.as_os_str().is_empty() {
        return file_name(path);
    }

    normalize_for_matching(rel)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Print stripped text under a file header (and optional end marker).
pub fn print_file(display_path: &str, text: &str, end_marker: bool) {
    println!("========== FILE: {} ==========", display_path);
    print!("{text}");

    // Ensure there is a trailing newline before the separator between files.
    if !text.ends_with('\n') {
        println!();
    }

    if end_marker {
        println!("========== END FILE: {} ==========\n", display_path);
    } else {
        println!();
    }
}

fn print_dry_run(display_path: &str, result: &RemovalResult) {
    match result.language {
        Some(lang) => println!(
            "{}: {} comment line(s) [{}]",
            display_path, result.removed_count, lang
        ),
        None => println!("{}: skipped (unknown language)", display_path),
    }
}

fn print_file_json(display_path: &str, file_name: String, result: &RemovalResult) -> Result<()> {
    let entry = FileEntry {
        path: display_path.to_string(),
        file_name,
        language: result.language,
        removed_count: result.removed_count,
        content: result.text.clone(),
    };

    let json = serde_json::to_string(&entry)?;
    print!("{}", json);

    Ok(())
}

/// Convert paths to a stable, slash-separated form for matching/printing.
fn normalize_for_matching(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::Path;

    #[test]
    fn matches_ext_is_case_insensitive_and_requires_extension() {
        let mut exts = HashSet::new();
        exts.insert("py".to_string());

        assert!(matches_ext(Path::new("foo.PY"), &exts));
        assert!(matches_ext(Path::new("dir/bar.py"), &exts));
        assert!(!matches_ext(Path::new("README"), &exts));
        assert!(!matches_ext(Path::new("script.sh"), &exts));
    }

    #[test]
    fn display_path_is_relative_and_slash_separated() {
        let root = Path::new("/work");
        assert_eq!(make_display_path(root, Path::new("/work/src/a.rs")), "src/a.rs");
        assert_eq!(make_display_path(Path::new("/work/a.rs"), Path::new("/work/a.rs")), "a.rs");
    }

    #[test]
    fn config_request_carries_the_options() {
        let cfg = Config {
            exts: HashSet::new(),
            paths: vec![],
            language: Some(Language::Go),
            options: StripOptions {
                preserve_license: true,
                keep_empty_lines: false,
            },
            dry_run: true,
            follow_symlinks: false,
            no_gitignore: false,
            json: false,
            excludes: vec![],
            max_bytes: None,
            end_marker: false,
        };

        let req = cfg.request(Some(Path::new("x.go")));
        assert_eq!(req.language, Some(Language::Go));
        assert!(req.options.preserve_license);
        assert!(!req.options.keep_empty_lines);
        assert!(req.dry_run);
    }
}
