//! Error types for identifier extraction.

use thiserror::Error;

/// Number of input characters echoed back in error messages.
const PREVIEW_CHARS: usize = 80;

/// Errors that can occur while extracting a product identifier.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// No strategy found an identifier in the share text.
    #[error(
        "unable to extract product id from input '{preview}'\n  Suggestion: paste the full share text or a product page URL containing `id=` or `product_id=`"
    )]
    NotFound {
        /// Truncated input for display.
        preview: String,
    },
}

impl ExtractError {
    /// Creates a `NotFound` error, keeping only a short preview of the input.
    #[must_use]
    pub fn not_found(input: &str) -> Self {
        let trimmed = input.trim();
        let mut preview: String = trimmed.chars().take(PREVIEW_CHARS).collect();
        if trimmed.chars().count() > PREVIEW_CHARS {
            preview.push_str("...");
        }
        Self::NotFound { preview }
    }
}
