//! Core data models shared by the ingestion and recovery pipeline.
//!
//! Everything here is created fresh per request and dropped once the
//! result has been handed back; nothing is persisted.

use serde::Serialize;
use std::fmt;

/// Which instruction template and result schema a request uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    CodeAnalysis,
    ResumeAnalysis,
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisMode::CodeAnalysis => write!(f, "code-analysis"),
            AnalysisMode::ResumeAnalysis => write!(f, "resume-analysis"),
        }
    }
}

/// One qualifying source file produced by the tree walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusEntry {
    /// Path relative to the selected source directory, `/`-separated.
    pub relative_path: String,
    pub content: String,
}

/// Why the tree walker left a candidate file out of the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Extension is not on the allow-list.
    DisallowedExtension,
    /// Matched a configured `walker.exclude_globs` pattern.
    Excluded,
    /// Content exceeds the per-file cap (likely generated or minified).
    TooLarge { chars: usize },
    /// Symbolic link; links are never followed out of the tree.
    Symlink,
    /// The file could not be read.
    Unreadable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::DisallowedExtension => write!(f, "extension not allowed"),
            SkipReason::Excluded => write!(f, "excluded by pattern"),
            SkipReason::TooLarge { chars } => write!(f, "too large ({} chars)", chars),
            SkipReason::Symlink => write!(f, "symbolic link not followed"),
            SkipReason::Unreadable(e) => write!(f, "unreadable: {}", e),
        }
    }
}

/// A candidate file that did not make it into the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub relative_path: String,
    pub reason: SkipReason,
}

/// Assembled, size-bounded text handed to the prompt builder.
#[derive(Debug, Clone)]
pub struct Corpus {
    pub text: String,
    /// Number of entries that went into the corpus (before any truncation).
    pub file_count: usize,
    /// Whether the text was cut at the ceiling and carries the sentinel.
    pub truncated: bool,
}
