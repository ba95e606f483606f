//! Text extraction for uploaded career documents.
//!
//! Only three file kinds are accepted: PDF, plain text, and Markdown. The
//! kind is decided from the file extension; everything else is rejected
//! before any bytes are read.

use serde::Serialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type: {0} (expected .pdf, .txt, or .md)")]
    UnsupportedFileType(String),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),
}

/// Declared type of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Text,
    Markdown,
}

impl FileKind {
    /// Determine the kind from a path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        Self::from_extension(&ext).ok_or_else(|| {
            if ext.is_empty() {
                ExtractError::UnsupportedFileType("(no extension)".to_string())
            } else {
                ExtractError::UnsupportedFileType(format!(".{}", ext))
            }
        })
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "pdf" => Some(FileKind::Pdf),
            "txt" => Some(FileKind::Text),
            "md" | "markdown" => Some(FileKind::Markdown),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Text => "txt",
            FileKind::Markdown => "md",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FileKind {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| ExtractError::UnsupportedFileType(s.to_string()))
    }
}

/// Extract plain UTF-8 text with `\n` line endings.
pub fn extract_text(bytes: &[u8], kind: FileKind) -> Result<String, ExtractError> {
    let raw = match kind {
        FileKind::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ExtractError::Pdf(e.to_string()))?,
        FileKind::Text | FileKind::Markdown => decode_utf8(bytes),
    };
    Ok(normalize_newlines(&raw))
}

fn decode_utf8(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
