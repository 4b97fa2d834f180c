//! Shared request identity for the product endpoint, the image CDN and the
//! short-link host.
//!
//! These hosts serve mobile/desktop browsers; a tool-style User-Agent gets
//! empty payloads or 403s, so every client sends the same browser string.

/// Desktop browser User-Agent sent with every request.
pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0 Safari/537.36";

/// Referer expected by the product detail endpoint.
pub(crate) const STOREFRONT_REFERER: &str = "https://haohuo.jinritemai.com/";

/// Accept header for JSON API calls.
pub(crate) const JSON_ACCEPT: &str = "application/json, text/plain, */*";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_user_agent_is_single_line() {
        assert!(BROWSER_USER_AGENT.starts_with("Mozilla/5.0"));
        assert!(!BROWSER_USER_AGENT.contains('\n'));
        assert!(
            !BROWSER_USER_AGENT.contains("  "),
            "line continuation must not leave double spaces: {BROWSER_USER_AGENT}"
        );
    }

    #[test]
    fn test_referer_is_https_origin() {
        assert!(STOREFRONT_REFERER.starts_with("https://"));
        assert!(STOREFRONT_REFERER.ends_with('/'));
    }
}
