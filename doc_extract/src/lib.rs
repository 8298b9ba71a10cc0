//! Text extraction from uploaded documents.
//!
//! Each supported format reduces to one extracted string; pages and
//! paragraphs are separated by blank lines. Extraction failures and
//! documents with no readable text both halt processing before any
//! synthesis is attempted.

mod docx;
mod pdf;

use std::path::Path;

use thiserror::Error;

/// Supported upload formats, detected from the filename extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    PlainText,
    Pdf,
    Docx,
}

impl SourceFormat {
    pub fn from_filename(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(Self::PlainText),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("file is not valid UTF-8 text")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("could not read PDF: {0}")]
    Pdf(String),

    #[error("could not read Word document: {0}")]
    Docx(String),

    #[error("no readable text found in the document")]
    EmptyDocument,
}

/// Extract the full text of a document.
pub fn extract_text(format: SourceFormat, bytes: &[u8]) -> Result<String, ExtractError> {
    let text = match format {
        SourceFormat::PlainText => String::from_utf8(bytes.to_vec())?,
        SourceFormat::Pdf => pdf::extract(bytes)?,
        SourceFormat::Docx => docx::extract(bytes)?,
    };

    if text.chars().all(char::is_whitespace) {
        return Err(ExtractError::EmptyDocument);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_formats_case_insensitively() {
        assert_eq!(
            SourceFormat::from_filename("book.txt"),
            Some(SourceFormat::PlainText)
        );
        assert_eq!(
            SourceFormat::from_filename("Report.PDF"),
            Some(SourceFormat::Pdf)
        );
        assert_eq!(
            SourceFormat::from_filename("notes.docx"),
            Some(SourceFormat::Docx)
        );
        assert_eq!(SourceFormat::from_filename("book.epub"), None);
        assert_eq!(SourceFormat::from_filename("no_extension"), None);
    }

    #[test]
    fn plain_text_passes_through() {
        let text = extract_text(SourceFormat::PlainText, "Once upon a time.".as_bytes()).unwrap();
        assert_eq!(text, "Once upon a time.");
    }

    #[test]
    fn invalid_utf8_is_an_extraction_error() {
        let err = extract_text(SourceFormat::PlainText, &[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidUtf8(_)));
    }

    #[test]
    fn whitespace_only_text_is_an_empty_document() {
        let err = extract_text(SourceFormat::PlainText, b"  \n\t \n").unwrap_err();
        assert!(matches!(err, ExtractError::EmptyDocument));
    }

    #[test]
    fn garbage_pdf_bytes_are_rejected() {
        let err = extract_text(SourceFormat::Pdf, b"this is not a pdf").unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }
}
