//! Uploaded document handling
//!
//! Classifies uploads by extension and turns them into text. PDF and DOCX
//! parsing belong to an external collaborator plugged in through
//! `DocumentExtractor`; the built-in extractor only reads plain text.

use crate::error::AssistantError;
use crate::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Docx,
    Txt,
    Unsupported,
}

impl DocumentKind {
    pub fn from_file_name(name: &str) -> Self {
        let lower = name.trim().to_lowercase();
        if lower.ends_with(".pdf") {
            DocumentKind::Pdf
        } else if lower.ends_with(".docx") {
            DocumentKind::Docx
        } else if lower.ends_with(".txt") {
            DocumentKind::Txt
        } else {
            DocumentKind::Unsupported
        }
    }

    fn error_tag(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "[PDF ERROR]",
            DocumentKind::Docx => "[DOCX ERROR]",
            DocumentKind::Txt => "[TXT ERROR]",
            DocumentKind::Unsupported => "[UNSUPPORTED FILE]",
        }
    }
}

/// A file as received from the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn kind(&self) -> DocumentKind {
        DocumentKind::from_file_name(&self.file_name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionError {
    Unsupported,
    Failed { kind: DocumentKind, reason: String },
}

impl ExtractionError {
    /// Display text shown in place of the document contents.
    pub fn display(&self) -> String {
        match self {
            ExtractionError::Unsupported => DocumentKind::Unsupported.error_tag().to_string(),
            ExtractionError::Failed { kind, reason } => format!("{} {}", kind.error_tag(), reason),
        }
    }
}

pub trait DocumentExtractor: Send + Sync {
    fn extract(&self, upload: &Upload) -> std::result::Result<String, ExtractionError>;
}

/// Reads `.txt` uploads as lossy UTF-8.
pub struct PlainTextExtractor;

impl DocumentExtractor for PlainTextExtractor {
    fn extract(&self, upload: &Upload) -> std::result::Result<String, ExtractionError> {
        match upload.kind() {
            DocumentKind::Txt => Ok(String::from_utf8_lossy(&upload.bytes).into_owned()),
            DocumentKind::Pdf => Err(ExtractionError::Failed {
                kind: DocumentKind::Pdf,
                reason: "PDF extraction requires a PDF reader.".to_string(),
            }),
            DocumentKind::Docx => Err(ExtractionError::Failed {
                kind: DocumentKind::Docx,
                reason: "DOCX extraction requires a DOCX reader.".to_string(),
            }),
            DocumentKind::Unsupported => Err(ExtractionError::Unsupported),
        }
    }
}

/// Decode a hex-encoded upload body.
pub fn decode_hex_body(file_name: &str, content_hex: &str) -> Result<Upload> {
    let bytes = hex::decode(content_hex.trim()).map_err(|e| {
        AssistantError::InputError(format!("File content is not valid hex: {}", e))
    })?;
    Ok(Upload::new(file_name, bytes))
}
