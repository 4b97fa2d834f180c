//! URL candidates in share text, and product ids inside URLs.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::trace;
use url::{Url, form_urlencoded};

use super::{PRODUCT_ID_KEYS, id_from_json_object, is_valid_product_id};

/// Regex pattern for finding URLs in share text.
///
/// Stops at whitespace, quotes, angle brackets and CJK punctuation / full-width
/// forms, which app share messages glue directly onto links.
#[allow(clippy::expect_used)]
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>"'\x{3000}-\x{303F}\x{FF00}-\x{FFEF}]+"#)
        .expect("URL regex is valid") // Static pattern, safe to panic
});

/// Returns every URL-shaped substring of `text`, in order of appearance.
#[must_use]
pub(crate) fn candidate_urls(text: &str) -> Vec<String> {
    URL_PATTERN
        .find_iter(text)
        .map(|m| clean_url_trailing(m.as_str()))
        .filter(|url| !url.is_empty())
        .inspect(|url| trace!(url = %url, "found URL candidate"))
        .map(str::to_string)
        .collect()
}

/// Cleans trailing punctuation that often gets captured with URLs.
fn clean_url_trailing(url: &str) -> &str {
    let mut result = url;

    while let Some(last) = result.chars().last() {
        match last {
            '.' | ',' | ';' | ':' | '!' => {
                result = &result[..result.len() - 1];
            }
            // Closing brackets at the end only belong to the URL when balanced.
            ')' | ']' | '}' => {
                let open = match last {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                let open_count = result.chars().filter(|&c| c == open).count();
                let close_count = result.chars().filter(|&c| c == last).count();
                if close_count > open_count {
                    result = &result[..result.len() - 1];
                } else {
                    break;
                }
            }
            _ => break,
        }
    }

    result
}

/// Extracts a product id from a single URL.
///
/// Checked in order:
/// 1. query parameters named by [`PRODUCT_ID_KEYS`]
/// 2. the fragment, read as a query string
/// 3. query values that hold a JSON object with a recognized key
/// 4. the last all-digit path segment
#[must_use]
pub(crate) fn product_id_from_url(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw).ok()?;

    let query: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
    if let Some(id) = first_recognized_pair(&query) {
        return Some(id);
    }

    if let Some(fragment) = parsed.fragment() {
        let fragment_pairs: Vec<(String, String)> = form_urlencoded::parse(fragment.as_bytes())
            .into_owned()
            .collect();
        if let Some(id) = first_recognized_pair(&fragment_pairs) {
            return Some(id);
        }
    }

    for (_, value) in &query {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(value)
            && let Some(id) = id_from_json_object(&map)
        {
            return Some(id);
        }
    }

    parsed
        .path_segments()?
        .rev()
        .find(|segment| !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()))
        .map(str::to_string)
}

fn first_recognized_pair(pairs: &[(String, String)]) -> Option<String> {
    PRODUCT_ID_KEYS.iter().find_map(|key| {
        pairs
            .iter()
            .find(|(name, value)| name == key && is_valid_product_id(value.trim()))
            .map(|(_, value)| value.trim().to_string())
    })
}
