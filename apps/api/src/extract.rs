//! Document text extraction — converts raw document bytes to plain text.
//!
//! Returns `None` on unreadable or empty input; callers decide whether that
//! is an error. No other module touches the PDF library directly.

use tracing::warn;

/// Extracts plain text from PDF bytes. `None` if the document cannot be
/// read or contains no extractable text.
pub fn text_from_pdf_bytes(bytes: &[u8]) -> Option<String> {
    match pdf_extract::extract_text_from_mem(bytes) {
        Ok(text) if !text.trim().is_empty() => Some(text),
        Ok(_) => {
            warn!("no extractable text found in document");
            None
        }
        Err(e) => {
            warn!("could not read document: {e}");
            None
        }
    }
}
