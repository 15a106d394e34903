//! Plain-text extraction from stored document bytes
//!
//! Extraction never fails the caller: parse and decode errors degrade to empty text
//! with an `ExtractionStatus::Failed` tag so the context assembler can skip the
//! document and log why.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::types::FileType;

/// Outcome of extracting one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionStatus {
    /// Text was extracted
    Ok,
    /// Nothing to extract (unsupported format or no text)
    Empty,
    /// Parsing or decoding failed; content is empty
    Failed(String),
}

/// Text extracted from a stored document. Recomputed per query, never cached.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    /// Source document identity (storage path)
    pub source: String,
    /// Plain-text content
    pub content: String,
    /// Extraction status
    pub status: ExtractionStatus,
}

impl ExtractedText {
    /// Whether the text can contribute to a prompt
    pub fn is_usable(&self) -> bool {
        self.status == ExtractionStatus::Ok
    }
}

/// Format-dispatching text extractor
pub struct TextExtractor;

impl TextExtractor {
    /// Extract text from `data`, tagging the result with its source path
    pub fn extract(source: &str, data: &[u8], format: FileType) -> ExtractedText {
        let (content, status) = match Self::try_extract(data, format) {
            Ok(text) if text.trim().is_empty() => (String::new(), ExtractionStatus::Empty),
            Ok(text) => (text, ExtractionStatus::Ok),
            Err(e) => {
                tracing::warn!("Text extraction failed for {}: {}", source, e);
                (String::new(), ExtractionStatus::Failed(e.to_string()))
            }
        };

        ExtractedText {
            source: source.to_string(),
            content,
            status,
        }
    }

    /// Extract on the blocking pool; a panicking parser degrades to `Failed`
    pub async fn extract_blocking(source: String, data: Vec<u8>, format: FileType) -> ExtractedText {
        let fallback_source = source.clone();
        match tokio::task::spawn_blocking(move || Self::extract(&source, &data, format)).await {
            Ok(extracted) => extracted,
            Err(e) => {
                tracing::error!("Text extraction task for {} aborted: {}", fallback_source, e);
                ExtractedText {
                    source: fallback_source,
                    content: String::new(),
                    status: ExtractionStatus::Failed(format!("extraction task aborted: {}", e)),
                }
            }
        }
    }

    fn try_extract(data: &[u8], format: FileType) -> Result<String> {
        if !format.is_supported() {
            return Ok(String::new());
        }

        // Parsers read from disk; the temp file is removed when `file` drops,
        // on every return path below.
        let file = Self::materialize(data, format)?;

        match format {
            FileType::Pdf => Self::extract_pdf(file.path()),
            FileType::Docx => Self::extract_docx(file.path()),
            FileType::Txt => Self::extract_txt(file.path()),
            FileType::Unknown => Ok(String::new()),
        }
    }

    /// Write the bytes to a named temporary file
    fn materialize(data: &[u8], format: FileType) -> Result<NamedTempFile> {
        let suffix = match format {
            FileType::Pdf => ".pdf",
            FileType::Docx => ".docx",
            FileType::Txt => ".txt",
            FileType::Unknown => ".bin",
        };

        let mut file = tempfile::Builder::new()
            .prefix("compliance-rag-")
            .suffix(suffix)
            .tempfile()?;
        file.write_all(data)?;
        file.flush()?;
        Ok(file)
    }

    /// Page texts in page order, each followed by a newline
    fn extract_pdf(path: &Path) -> Result<String> {
        let doc = lopdf::Document::load(path)
            .map_err(|e| Error::internal(format!("Failed to load PDF: {}", e)))?;

        let mut text = String::new();
        // get_pages is keyed by page number, so iteration is in page order
        for page_number in doc.get_pages().keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(page_text) => text.push_str(page_text.trim_end()),
                Err(e) => tracing::debug!("No text on PDF page {}: {}", page_number, e),
            }
            text.push('\n');
        }

        if text.trim().is_empty() {
            tracing::debug!("lopdf found no text, trying pdf-extract");
            return pdf_extract::extract_text(path)
                .map_err(|e| Error::internal(format!("pdf-extract failed: {}", e)));
        }

        Ok(text)
    }

    /// Paragraph texts in document order, separated by newlines
    fn extract_docx(path: &Path) -> Result<String> {
        let data = std::fs::read(path)?;
        let doc = docx_rs::read_docx(&data)
            .map_err(|e| Error::internal(format!("Failed to read DOCX: {}", e)))?;

        let mut paragraphs = Vec::new();
        for child in doc.document.children {
            if let docx_rs::DocumentChild::Paragraph(p) = child {
                let mut paragraph = String::new();
                for child in p.children {
                    if let docx_rs::ParagraphChild::Run(run) = child {
                        for child in run.children {
                            if let docx_rs::RunChild::Text(t) = child {
                                paragraph.push_str(&t.text);
                            }
                        }
                    }
                }
                paragraphs.push(paragraph);
            }
        }

        Ok(paragraphs.join("\n"))
    }

    /// Strict UTF-8 decode
    fn extract_txt(path: &Path) -> Result<String> {
        let data = std::fs::read(path)?;
        String::from_utf8(data)
            .map_err(|e| Error::internal(format!("Text is not valid UTF-8: {}", e)))
    }
}
