//! Document extraction: uploaded bytes → cleaned, bounded plain text.
//!
//! Extraction never fails. The detected format picks an ordered list of
//! [`ExtractionStrategy`]s; each one is total and either yields text or an
//! explicit [`Extraction::NoResult`]. The first strategy with non-blank text
//! wins, so a misdetected PDF still gets decoded as plain text.

use regex::Regex;
use std::io::Read;
use std::panic::{self, AssertUnwindSafe};
use std::sync::LazyLock;
use tracing::debug;

use crate::corpus::truncate_chars;

/// Ceiling for cleaned document text, in characters.
pub const MAX_DOCUMENT_CHARS: usize = 20_000;

/// Appended after the cut when a document exceeds its ceiling.
pub const DOCUMENT_TRUNCATION_SENTINEL: &str = "\n... [document truncated]";

/// Maximum decompressed bytes read from `word/document.xml` (zip-bomb guard).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

const PDF_MAGIC: &[u8] = b"%PDF";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    PlainText,
}

/// Result of a single strategy attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Text(String),
    NoResult(String),
}

/// One way of turning bytes into text. Implementations must not panic.
pub trait ExtractionStrategy {
    fn name(&self) -> &'static str;
    fn extract(&self, bytes: &[u8]) -> Extraction;
}

/// Guess the format from the filename extension, then from magic bytes.
pub fn detect_format(bytes: &[u8], filename: Option<&str>) -> DocumentFormat {
    let ext = filename
        .and_then(|f| f.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match ext.as_deref() {
        Some("pdf") => return DocumentFormat::Pdf,
        Some("docx") => return DocumentFormat::Docx,
        _ => {}
    }

    if bytes.starts_with(PDF_MAGIC) {
        DocumentFormat::Pdf
    } else if bytes.starts_with(ZIP_MAGIC) {
        DocumentFormat::Docx
    } else {
        DocumentFormat::PlainText
    }
}

/// Strategies to try for a format, in order. The text-decoding ladder is
/// always the tail, and its last rung always produces a result.
pub fn strategies_for(format: DocumentFormat) -> Vec<Box<dyn ExtractionStrategy>> {
    let mut strategies: Vec<Box<dyn ExtractionStrategy>> = Vec::new();
    match format {
        DocumentFormat::Pdf => strategies.push(Box::new(PdfPages)),
        DocumentFormat::Docx => strategies.push(Box::new(DocxParagraphs)),
        DocumentFormat::PlainText => {}
    }
    strategies.push(Box::new(StrictUtf8));
    strategies.push(Box::new(SingleByte));
    strategies.push(Box::new(Utf8Discarding));
    strategies
}

/// Extract, clean and truncate with the default ceiling.
pub fn extract_document(bytes: &[u8], filename: Option<&str>) -> String {
    extract_document_with_limit(bytes, filename, MAX_DOCUMENT_CHARS)
}

/// Extract, clean and truncate a document. Total: always returns a string of
/// at most `max_chars` characters plus [`DOCUMENT_TRUNCATION_SENTINEL`].
pub fn extract_document_with_limit(bytes: &[u8], filename: Option<&str>, max_chars: usize) -> String {
    let format = detect_format(bytes, filename);
    debug!(?format, bytes = bytes.len(), "extracting document");

    let mut raw = String::new();
    for strategy in strategies_for(format) {
        match strategy.extract(bytes) {
            Extraction::Text(text) if !text.trim().is_empty() => {
                debug!(strategy = strategy.name(), "extraction succeeded");
                raw = text;
                break;
            }
            Extraction::Text(_) => {
                debug!(strategy = strategy.name(), "extraction produced blank text");
            }
            Extraction::NoResult(reason) => {
                debug!(strategy = strategy.name(), %reason, "extraction produced no result");
            }
        }
    }

    truncate_document(clean_text(&raw), max_chars)
}

static HORIZONTAL_WS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\r\n]+").expect("static regex"));
static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\n]*\n(?:[^\S\n]*\n)+[^\S\n]*").expect("static regex"));

/// Invisible format characters: byte-order mark and zero-width space/joiners.
const INVISIBLE_CHARS: &[char] = &['\u{feff}', '\u{200b}', '\u{200c}', '\u{200d}', '\u{2060}'];

/// Normalize text from arbitrary producers.
///
/// Drops control characters other than `\n`, `\r` and `\t` along with
/// byte-order marks and zero-width characters, collapses runs
/// of horizontal whitespace to one space and runs of blank lines to a single
/// paragraph break, then trims.
pub fn clean_text(text: &str) -> String {
    let printable: String = text
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
        .filter(|c| !INVISIBLE_CHARS.contains(c))
        .collect();
    let spaced = HORIZONTAL_WS.replace_all(&printable, " ");
    let paragraphs = BLANK_LINES.replace_all(&spaced, "\n\n");
    paragraphs.trim().to_string()
}

pub fn truncate_document(text: String, max_chars: usize) -> String {
    match truncate_chars(&text, max_chars) {
        Some(head) => format!("{}{}", head, DOCUMENT_TRUNCATION_SENTINEL),
        None => text,
    }
}

/// Decode UTF-8, silently dropping byte sequences that are not valid.
pub fn decode_utf8_discarding(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

// ============ Strategies ============

/// Page-by-page PDF text, pages joined by a single line break.
pub struct PdfPages;

impl ExtractionStrategy for PdfPages {
    fn name(&self) -> &'static str {
        "pdf-pages"
    }

    fn extract(&self, bytes: &[u8]) -> Extraction {
        // pdf-extract can panic on malformed input.
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(bytes)
        }));
        match outcome {
            Ok(Ok(pages)) => Extraction::Text(
                pages
                    .iter()
                    .map(|p| p.trim())
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            Ok(Err(e)) => Extraction::NoResult(format!("PDF extraction failed: {}", e)),
            Err(_) => Extraction::NoResult("PDF parser panicked".to_string()),
        }
    }
}

/// `<w:t>` runs from `word/document.xml`, one line per `<w:p>` paragraph.
pub struct DocxParagraphs;

impl ExtractionStrategy for DocxParagraphs {
    fn name(&self) -> &'static str {
        "docx-paragraphs"
    }

    fn extract(&self, bytes: &[u8]) -> Extraction {
        match read_document_xml(bytes).and_then(|xml| extract_paragraphs(&xml)) {
            Ok(text) => Extraction::Text(text),
            Err(reason) => Extraction::NoResult(reason),
        }
    }
}

/// Strict UTF-8; declines anything with invalid sequences.
pub struct StrictUtf8;

impl ExtractionStrategy for StrictUtf8 {
    fn name(&self) -> &'static str {
        "utf-8"
    }

    fn extract(&self, bytes: &[u8]) -> Extraction {
        match std::str::from_utf8(bytes) {
            Ok(s) => Extraction::Text(s.to_string()),
            Err(e) => Extraction::NoResult(e.to_string()),
        }
    }
}

/// ISO-8859-1: every byte maps to one code point. Declines input with NUL
/// bytes, which marks binary content rather than a legacy text encoding.
pub struct SingleByte;

impl ExtractionStrategy for SingleByte {
    fn name(&self) -> &'static str {
        "latin-1"
    }

    fn extract(&self, bytes: &[u8]) -> Extraction {
        if bytes.contains(&0) {
            return Extraction::NoResult("contains NUL bytes".to_string());
        }
        Extraction::Text(bytes.iter().map(|&b| char::from(b)).collect())
    }
}

/// Last resort: UTF-8 with undecodable bytes discarded.
pub struct Utf8Discarding;

impl ExtractionStrategy for Utf8Discarding {
    fn name(&self) -> &'static str {
        "utf-8-discarding"
    }

    fn extract(&self, bytes: &[u8]) -> Extraction {
        Extraction::Text(decode_utf8_discarding(bytes))
    }
}

fn read_document_xml(bytes: &[u8]) -> Result<Vec<u8>, String> {
    let mut archive =
        zip::ZipArchive::new(std::io::Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|_| "word/document.xml not found".to_string())?;

    let mut out = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut out)
        .map_err(|e| e.to_string())?;
    if out.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err("word/document.xml exceeds size limit".to_string());
    }
    Ok(out)
}

fn extract_paragraphs(xml: &[u8]) -> Result<String, String> {
    use quick_xml::events::Event;

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::Text(te)) if in_text => {
                current.push_str(te.unescape().unwrap_or_default().as_ref());
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"tab" => current.push('\t'),
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
        buf.clear();
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    Ok(paragraphs.join("\n"))
}
