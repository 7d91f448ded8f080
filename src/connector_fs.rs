//! Tree walker: turn a materialized source tree into corpus entries.
//!
//! Ignored directories are pruned top-down and never descended into. Each
//! remaining file runs through a small filter pipeline (exclude globs,
//! extension allow-list, readability, per-file cap); every rejection is kept
//! as a [`SkippedFile`] so the decision can be inspected.

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::corpus::assemble_corpus;
use crate::error::AnalyzeError;
use crate::extract::decode_utf8_discarding;
use crate::models::{Corpus, CorpusEntry, SkipReason, SkippedFile};

/// Directory names that are never descended into.
pub const IGNORE_DIRS: &[&str] = &[
    "node_modules",
    "build",
    "dist",
    ".git",
    "__pycache__",
    ".venv",
    "venv",
];

/// File extensions (lowercase, without the dot) that qualify for the corpus.
pub const ALLOWED_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "py", "html", "css"];

/// Files with more characters than this are skipped whole.
pub const MAX_FILE_CHARS: usize = 100_000;

#[derive(Debug, Clone)]
pub struct WalkOptions {
    pub max_file_chars: usize,
    pub exclude: GlobSet,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_file_chars: MAX_FILE_CHARS,
            exclude: GlobSet::empty(),
        }
    }
}

impl WalkOptions {
    pub fn new(max_file_chars: usize, exclude_globs: &[String]) -> Result<Self> {
        Ok(Self {
            max_file_chars,
            exclude: build_globset(exclude_globs)?,
        })
    }
}

/// Outcome of walking one source directory.
#[derive(Debug, Default)]
pub struct TreeScan {
    pub entries: Vec<CorpusEntry>,
    pub skipped: Vec<SkippedFile>,
}

/// Pick the directory to analyze inside a repository checkout.
///
/// `<root>/src` wins if present; otherwise the first directory named `src`
/// in traversal order; otherwise the root itself.
pub fn find_src_dir(root: &Path) -> PathBuf {
    let direct = root.join("src");
    if direct.is_dir() {
        return direct;
    }

    let nested = walk_pruned(root)
        .filter_map(|e| e.ok())
        .find(|e| e.depth() > 0 && e.file_type().is_dir() && e.file_name() == "src");

    match nested {
        Some(entry) => entry.into_path(),
        None => root.to_path_buf(),
    }
}

/// Walk `src_dir` and split its files into corpus entries and skips.
///
/// Entries come back in a deterministic, name-sorted depth-first order.
pub fn scan_tree(src_dir: &Path, options: &WalkOptions) -> TreeScan {
    let mut scan = TreeScan::default();

    for entry in walk_pruned(src_dir) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let rel = e
                    .path()
                    .map(|p| relative_path(src_dir, p))
                    .unwrap_or_default();
                debug!(path = %rel, error = %e, "skipping unreadable entry");
                scan.skipped.push(SkippedFile {
                    relative_path: rel,
                    reason: SkipReason::Unreadable(e.to_string()),
                });
                continue;
            }
        };
        let rel = relative_path(src_dir, entry.path());
        if entry.depth() > 0 && entry.path_is_symlink() {
            debug!(path = %rel, "skipping symlink");
            scan.skipped.push(SkippedFile {
                relative_path: rel,
                reason: SkipReason::Symlink,
            });
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }

        match qualify(entry.path(), &rel, options) {
            Ok(content) => scan.entries.push(CorpusEntry {
                relative_path: rel,
                content,
            }),
            Err(reason) => {
                debug!(path = %rel, %reason, "skipping file");
                scan.skipped.push(SkippedFile {
                    relative_path: rel,
                    reason,
                });
            }
        }
    }

    scan
}

/// Locate the source directory under `root`, walk it and assemble the corpus.
///
/// Fails with [`AnalyzeError::NoAnalyzableFiles`] when nothing qualifies.
pub fn read_corpus(
    root: &Path,
    options: &WalkOptions,
    max_corpus_chars: usize,
) -> Result<(Corpus, TreeScan), AnalyzeError> {
    if !root.is_dir() {
        return Err(AnalyzeError::SourceNotFound(root.display().to_string()));
    }

    let src_dir = find_src_dir(root);
    let scan = scan_tree(&src_dir, options);
    info!(
        src_dir = %src_dir.display(),
        files = scan.entries.len(),
        skipped = scan.skipped.len(),
        "scanned source tree"
    );

    if scan.entries.is_empty() {
        return Err(AnalyzeError::NoAnalyzableFiles);
    }

    let corpus = assemble_corpus(&scan.entries, max_corpus_chars);
    Ok((corpus, scan))
}

fn qualify(path: &Path, rel: &str, options: &WalkOptions) -> std::result::Result<String, SkipReason> {
    if options.exclude.is_match(rel) {
        return Err(SkipReason::Excluded);
    }
    if !has_allowed_extension(path) {
        return Err(SkipReason::DisallowedExtension);
    }

    let bytes = std::fs::read(path).map_err(|e| SkipReason::Unreadable(e.to_string()))?;
    let content = decode_utf8_discarding(&bytes);

    let chars = content.chars().count();
    if chars > options.max_file_chars {
        return Err(SkipReason::TooLarge { chars });
    }
    Ok(content)
}

fn has_allowed_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

fn is_ignored_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| IGNORE_DIRS.contains(&name))
            .unwrap_or(false)
}

fn walk_pruned(root: &Path) -> impl Iterator<Item = walkdir::Result<DirEntry>> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_ignored_dir(e))
}

fn relative_path(base: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(base).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
