//! Product identifier extraction from share text.
//!
//! Share text comes in many shapes: a product page URL, an app share message
//! wrapping a short link in prose, a backend payload with the id in a JSON
//! fragment, or any of those percent-encoded inside a larger string.
//!
//! # Flow
//!
//! 1. The text is cleaned (newlines and full-width spaces become spaces) and
//!    scanned for URL candidates.
//! 2. Candidates on a short-link host are resolved through a
//!    [`ShortLinkResolver`]. This is the only I/O in the module.
//! 3. An ordered list of pure strategies runs over the prepared
//!    [`ShareText`]; the first one that yields an id wins.
//!
//! # Example
//!
//! ```
//! use product_images::parser::IdentifierExtractor;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let extractor = IdentifierExtractor::offline();
//! let id = extractor
//!     .extract("https://haohuo.jinritemai.com/views/product/item2?id=1234567890&source=pc")
//!     .await?;
//! assert_eq!(id.as_str(), "1234567890");
//! # Ok(())
//! # }
//! ```

mod error;
mod short_link;
mod strategies;
mod url;

pub use error::ExtractError;
pub use short_link::{
    DEFAULT_SHORT_LINK_HOSTS, HttpShortLinkResolver, NoShortLinks, SHORT_LINK_TIMEOUT,
    ShortLinkResolver,
};

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use self::url::candidate_urls;

/// Recognized identifier keys, in priority order.
pub const PRODUCT_ID_KEYS: [&str; 2] = ["product_id", "id"];

/// A product identifier (a string of digits in practice).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Wraps an identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Share text prepared for the extraction strategies.
#[derive(Debug, Clone)]
pub struct ShareText {
    raw: String,
    cleaned: String,
    resolved_urls: Vec<String>,
}

impl ShareText {
    /// Prepares `raw` without resolving any short link.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        let cleaned = clean_text(raw);
        let resolved_urls = candidate_urls(&cleaned);
        Self {
            raw: raw.to_string(),
            cleaned,
            resolved_urls,
        }
    }

    /// The text exactly as supplied.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The text with newlines and full-width spaces replaced by spaces.
    #[must_use]
    pub fn cleaned(&self) -> &str {
        &self.cleaned
    }

    /// URL candidates, with short links replaced by their targets.
    #[must_use]
    pub fn resolved_urls(&self) -> &[String] {
        &self.resolved_urls
    }
}

/// Extracts product ids, resolving short links on the way.
pub struct IdentifierExtractor {
    resolver: Box<dyn ShortLinkResolver>,
}

impl fmt::Debug for IdentifierExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentifierExtractor").finish_non_exhaustive()
    }
}

impl IdentifierExtractor {
    /// Creates an extractor backed by `resolver`.
    #[must_use]
    pub fn new(resolver: Box<dyn ShortLinkResolver>) -> Self {
        Self { resolver }
    }

    /// Creates an extractor that never touches the network.
    #[must_use]
    pub fn offline() -> Self {
        Self::new(Box::new(NoShortLinks))
    }

    /// Extracts the product id from `text`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::NotFound`] when no strategy finds an id.
    #[instrument(skip(self, text), fields(input_len = text.len()))]
    pub async fn extract(&self, text: &str) -> Result<ProductId, ExtractError> {
        let share_text = self.prepare(text).await;
        extract_from_share_text(&share_text)
    }

    /// Cleans `text` and resolves the short links among its URL candidates.
    ///
    /// Resolution failures keep the original URL.
    pub async fn prepare(&self, text: &str) -> ShareText {
        let mut share_text = ShareText::new(text);
        for candidate in &mut share_text.resolved_urls {
            let is_short = ::url::Url::parse(candidate)
                .is_ok_and(|parsed| self.resolver.is_short_link(&parsed));
            if !is_short {
                continue;
            }
            if let Some(resolved) = self.resolver.resolve(candidate).await {
                debug!(short = %candidate, resolved = %resolved, "substituted short link");
                *candidate = resolved;
            }
        }
        share_text
    }
}

/// Runs the extraction strategies over prepared share text.
///
/// # Errors
///
/// Returns [`ExtractError::NotFound`] when no strategy finds an id.
pub fn extract_from_share_text(share_text: &ShareText) -> Result<ProductId, ExtractError> {
    for (name, strategy) in strategies::STRATEGIES {
        if let Some(id) = strategy(share_text) {
            debug!(strategy = name, product_id = %id, "extracted product id");
            return Ok(id);
        }
    }
    Err(ExtractError::not_found(share_text.raw()))
}

/// Replaces newlines and full-width spaces with plain spaces.
#[must_use]
pub fn clean_text(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '\n' | '\r' | '\u{3000}' => ' ',
            other => other,
        })
        .collect()
}

/// Returns true if `value` is a usable product id: non-empty ASCII digits.
///
/// Ids become directory names, so anything else (`..`, `/`, letters) is
/// rejected here.
#[must_use]
pub fn is_valid_product_id(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Returns the first recognized key of `map` holding a usable id.
///
/// Digit strings and non-negative integers qualify; other values are skipped.
pub(crate) fn id_from_json_object(map: &Map<String, Value>) -> Option<String> {
    PRODUCT_ID_KEYS.iter().find_map(|key| match map.get(*key)? {
        Value::String(s) if is_valid_product_id(s.trim()) => Some(s.trim().to_string()),
        Value::Number(n) => n.as_u64().map(|n| n.to_string()),
        _ => None,
    })
}
