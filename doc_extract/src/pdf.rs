//! PDF text extraction, delegated to `pdf-extract`.
//!
//! The crate already inserts page breaks as blank lines, so its output maps
//! straight onto the one-string document model.

use crate::ExtractError;

pub(crate) fn extract(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}
