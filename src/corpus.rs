//! Corpus assembly: join walker entries under a global character budget.

use crate::models::{Corpus, CorpusEntry};

/// Ceiling for the assembled corpus, in characters.
pub const MAX_CORPUS_CHARS: usize = 150_000;

/// Appended after the cut when the corpus exceeds its ceiling.
pub const CORPUS_TRUNCATION_SENTINEL: &str = "\n... (truncated)";

/// Header line that precedes each file's content.
pub fn entry_header(relative_path: &str) -> String {
    format!("// --- file: {} ---", relative_path)
}

/// Join entries (header + raw text, blank line between entries) and cap the
/// result at `max_chars`, appending [`CORPUS_TRUNCATION_SENTINEL`] if cut.
pub fn assemble_corpus(entries: &[CorpusEntry], max_chars: usize) -> Corpus {
    let joined = entries
        .iter()
        .map(|e| format!("{}\n{}", entry_header(&e.relative_path), e.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    let (text, truncated) = match truncate_chars(&joined, max_chars) {
        Some(head) => (format!("{}{}", head, CORPUS_TRUNCATION_SENTINEL), true),
        None => (joined, false),
    };

    Corpus {
        text,
        file_count: entries.len(),
        truncated,
    }
}

/// Returns the first `max_chars` characters of `text` if it is longer than
/// that, or `None` if it already fits.
pub fn truncate_chars(text: &str, max_chars: usize) -> Option<&str> {
    text.char_indices()
        .nth(max_chars)
        .map(|(byte_idx, _)| &text[..byte_idx])
}
