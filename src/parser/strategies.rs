//! Extraction strategies, tried in order.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::url::{candidate_urls, product_id_from_url};
use super::{ProductId, ShareText, clean_text, id_from_json_object};

/// A pure extraction step over prepared share text.
pub(crate) type Strategy = fn(&ShareText) -> Option<ProductId>;

/// Strategies in priority order; the first hit wins.
pub(crate) const STRATEGIES: [(&str, Strategy); 4] = [
    ("resolved_urls", from_resolved_urls),
    ("decoded_urls", from_decoded_urls),
    ("key_value", from_key_value),
    ("embedded_json", from_embedded_json),
];

#[allow(clippy::expect_used)]
static KEY_VALUE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^A-Za-z0-9_])(?:product_id|id)[:=]\s*([0-9]+)")
        .expect("key/value regex is valid")
});

/// Object literals without nested braces.
#[allow(clippy::expect_used)]
static JSON_OBJECT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^{}]*\}").expect("JSON object regex is valid"));

fn from_resolved_urls(share_text: &ShareText) -> Option<ProductId> {
    share_text
        .resolved_urls()
        .iter()
        .find_map(|url| product_id_from_url(url))
        .map(ProductId::new)
}

/// Escaped URLs (`https%3A%2F%2F...`) only show up after decoding.
fn from_decoded_urls(share_text: &ShareText) -> Option<ProductId> {
    let decoded = percent_decode(share_text.raw());
    candidate_urls(&clean_text(&decoded))
        .iter()
        .find_map(|url| product_id_from_url(url))
        .map(ProductId::new)
}

fn from_key_value(share_text: &ShareText) -> Option<ProductId> {
    KEY_VALUE_PATTERN
        .captures(share_text.cleaned())
        .and_then(|caps| caps.get(1))
        .map(|m| ProductId::new(m.as_str()))
}

fn from_embedded_json(share_text: &ShareText) -> Option<ProductId> {
    JSON_OBJECT_PATTERN
        .find_iter(share_text.cleaned())
        .find_map(|m| match serde_json::from_str::<Value>(m.as_str()) {
            Ok(Value::Object(map)) => id_from_json_object(&map),
            _ => None,
        })
        .map(ProductId::new)
}

fn percent_decode(raw: &str) -> Cow<'_, str> {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded,
        Err(_) => {
            let bytes = urlencoding::decode_binary(raw.as_bytes());
            Cow::Owned(String::from_utf8_lossy(&bytes).into_owned())
        }
    }
}
