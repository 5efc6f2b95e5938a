use std::collections::HashSet;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser};
use decomment::{Config, Language, StripOptions, run_with_config};
use tracing::Level;

/// decomment - strip comments from source code.
///
/// Removes comments while leaving string literals, regexes, heredocs and
/// other lexical look-alikes untouched. Languages are picked from the file
/// name, or sniffed from the content when reading stdin.
#[derive(Parser, Debug)]
#[command(
    name = "decomment",
    author,
    version,
    about = "Strip comments from source files without touching string literals",
    long_about = r#"Strip comments from source files without touching string literals.

By default it:
  • respects .gitignore / .ignore / git exclude files
  • picks the language from each file name (or --lang)
  • keeps blank lines where comments used to be
  • prints every file under a path header

Typical usage:
  decomment src
  decomment -t py,rb --keep-license lib
  decomment --lang js - < app.js
  decomment --dry-run .
"#
)]
struct Args {
    /// Only process files with these extensions (e.g. py, rs).
    ///
    /// Can be repeated or comma-separated:
    ///   decomment -t py
    ///   decomment -t py,rs
    ///   decomment -t py -t rs
    ///
    /// Without a filter every file with a recognised name is processed.
    #[arg(
        short = 't',
        long = "type",
        alias = "ext",
        value_name = "EXT",
        action = ArgAction::Append,
        value_delimiter = ','
    )]
    exts: Vec<String>,

    /// Paths to scan (files or directories). Defaults to current directory.
    ///
    /// `-` reads stdin and writes the stripped text to stdout.
    #[arg(value_name = "PATH", default_value = ".")]
    paths: Vec<PathBuf>,

    /// Force the language instead of detecting it (e.g. python, js, c++).
    #[arg(short = 'l', long = "lang", value_name = "LANG")]
    language: Option<Language>,

    /// Keep license, copyright and author comments.
    #[arg(long = "keep-license")]
    keep_license: bool,

    /// Drop lines that are blank after stripping.
    #[arg(long = "remove-empty-lines")]
    remove_empty_lines: bool,

    /// Report how many comment lines would go, without printing the result.
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Follow symbolic links during traversal.
    #[arg(long = "follow-symlinks")]
    follow_symlinks: bool,

    /// Disable reading .gitignore / .ignore / git exclude files.
    #[arg(long = "no-gitignore")]
    no_gitignore: bool,

    /// Additional glob patterns to exclude (files or directories).
    ///
    /// Patterns are evaluated relative to each PATH root, e.g.:
    ///
    ///   decomment --exclude 'vendor/**,*.min.js'
    #[arg(
        long = "exclude",
        short = 'E',
        value_name = "GLOB",
        action = ArgAction::Append,
        value_delimiter = ','
    )]
    excludes: Vec<String>,

    /// Maximum file size to process, in bytes (skip larger files).
    #[arg(long = "max-bytes", value_name = "N")]
    max_bytes: Option<u64>,

    /// Output a JSON array of objects
    /// { "path", "file_name", "language", "removed_count", "content" }.
    #[arg(long = "json")]
    json: bool,

    /// Print an explicit END marker after each file.
    #[arg(long = "end-marker")]
    end_marker: bool,

    /// More log output on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    quiet: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose, args.quiet);

    // Normalise extensions to lowercase, no leading dot.
    let ext_set: HashSet<String> = args
        .exts
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    let cfg = Config {
        exts: ext_set,
        paths: args.paths,
        language: args.language,
        options: StripOptions {
            preserve_license: args.keep_license,
            keep_empty_lines: !args.remove_empty_lines,
        },
        dry_run: args.dry_run,
        follow_symlinks: args.follow_symlinks,
        no_gitignore: args.no_gitignore,
        json: args.json,
        excludes: args.excludes,
        max_bytes: args.max_bytes,
        end_marker: args.end_marker,
    };

    run_with_config(cfg)
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::INFO,
        (false, 2) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .with_max_level(level)
        .init();
}
