//! The `ratio=1` quality parameter.
//!
//! The image CDN serves a downscaled asset unless `ratio` is present in the
//! query. Both the product client (when normalizing image URLs) and the
//! acquirer (when upgrading a low resolution download) go through
//! [`ensure_quality_param`] so the two never disagree on the URL shape.

use url::Url;

/// Query key of the quality parameter.
pub const QUALITY_PARAM_KEY: &str = "ratio";

/// Value requesting the original asset.
pub const QUALITY_PARAM_VALUE: &str = "1";

/// Ensures `url` carries the quality parameter.
///
/// If the query already has a `ratio` key (whatever its value) the URL is
/// returned unchanged. Otherwise `ratio=1` is appended to the existing query,
/// leaving the other parameters as they were. Applying it twice gives the
/// same result as applying it once.
///
/// # Examples
///
/// ```
/// use product_images::quality::ensure_quality_param;
///
/// let once = ensure_quality_param("https://example.com/a.jpg?x=1");
/// assert_eq!(once, "https://example.com/a.jpg?x=1&ratio=1");
/// assert_eq!(ensure_quality_param(&once), once);
/// ```
#[must_use]
pub fn ensure_quality_param(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return append_raw(url);
    };

    if has_quality_param(&parsed) {
        return url.to_string();
    }

    parsed
        .query_pairs_mut()
        .append_pair(QUALITY_PARAM_KEY, QUALITY_PARAM_VALUE);
    parsed.to_string()
}

fn has_quality_param(url: &Url) -> bool {
    url.query_pairs().any(|(key, _)| key == QUALITY_PARAM_KEY)
}

// Strings the url crate rejects still get a best-effort parameter.
fn append_raw(url: &str) -> String {
    let (base, fragment) = match url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (url, None),
    };
    let query = base.split_once('?').map_or("", |(_, query)| query);
    let present = query
        .split('&')
        .any(|pair| pair.split('=').next() == Some(QUALITY_PARAM_KEY));
    if present {
        return url.to_string();
    }

    let separator = if base.contains('?') {
        if base.ends_with('?') || base.ends_with('&') {
            ""
        } else {
            "&"
        }
    } else {
        "?"
    };
    let mut out = format!("{base}{separator}{QUALITY_PARAM_KEY}={QUALITY_PARAM_VALUE}");
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}
