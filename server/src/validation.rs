use crate::error::ApiError;
use doc_extract::SourceFormat;

/// Maximum length for a voice id in a request
const MAX_VOICE_ID_LENGTH: usize = 64;

/// Validate an uploaded document and resolve its format.
pub fn validate_upload(
    filename: &str,
    size: usize,
    max_bytes: usize,
) -> Result<SourceFormat, ApiError> {
    if filename.trim().is_empty() {
        return Err(ApiError::InvalidInput(
            "Uploaded file has no filename".to_string(),
        ));
    }
    if size == 0 {
        return Err(ApiError::InvalidInput("Uploaded file is empty".to_string()));
    }
    if size > max_bytes {
        return Err(ApiError::InvalidInput(format!(
            "File too large (max {} bytes)",
            max_bytes
        )));
    }

    SourceFormat::from_filename(filename).ok_or_else(|| {
        ApiError::InvalidInput(format!(
            "Unsupported file type '{filename}'. Upload a .txt, .pdf or .docx document"
        ))
    })
}

/// Validate a requested voice id
pub fn validate_voice_id(voice: &str) -> Result<(), ApiError> {
    if voice.is_empty() || voice.len() > MAX_VOICE_ID_LENGTH {
        return Err(ApiError::InvalidInput(format!(
            "Voice id must be 1-{} characters",
            MAX_VOICE_ID_LENGTH
        )));
    }
    if !voice
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ApiError::InvalidInput(format!(
            "Invalid voice id format: {voice}. Use letters, digits, '-' and '_'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_upload_valid() {
        assert_eq!(
            validate_upload("book.txt", 100, 1000).unwrap(),
            SourceFormat::PlainText
        );
        assert_eq!(
            validate_upload("paper.pdf", 100, 1000).unwrap(),
            SourceFormat::Pdf
        );
    }

    #[test]
    fn test_validate_upload_empty_file() {
        let result = validate_upload("book.txt", 0, 1000);
        assert!(result.is_err());
        if let Err(ApiError::InvalidInput(msg)) = result {
            assert!(msg.contains("empty"));
        }
    }

    #[test]
    fn test_validate_upload_too_large() {
        let result = validate_upload("book.txt", 2000, 1000);
        assert!(result.is_err());
        if let Err(ApiError::InvalidInput(msg)) = result {
            assert!(msg.contains("too large"));
        }
    }

    #[test]
    fn test_validate_upload_unsupported_extension() {
        assert!(validate_upload("book.epub", 100, 1000).is_err());
        assert!(validate_upload("README", 100, 1000).is_err());
        assert!(validate_upload("", 100, 1000).is_err());
    }

    #[test]
    fn test_validate_voice_id() {
        assert!(validate_voice_id("en_US-ryan-high").is_ok());
        assert!(validate_voice_id("alba").is_ok());
        assert!(validate_voice_id("").is_err());
        assert!(validate_voice_id("voice with spaces").is_err());
        assert!(validate_voice_id(&"v".repeat(65)).is_err());
    }
}
