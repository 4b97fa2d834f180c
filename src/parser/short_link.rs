//! Short-link resolution.
//!
//! App share messages carry a short link (`https://v.douyin.com/<code>/`) that
//! redirects to the product page. The redirect target is read from the
//! `Location` header without following it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::LOCATION;
use tracing::{debug, instrument};
use url::Url;

use crate::http_client::{ClientOptions, build_client};

/// Hosts whose links are resolved before extraction.
pub const DEFAULT_SHORT_LINK_HOSTS: &[&str] = &["v.douyin.com"];

/// Timeout for a single resolution request.
pub const SHORT_LINK_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolves short links to their redirect target.
///
/// Resolution is best effort: `None` means "keep the original URL".
#[async_trait]
pub trait ShortLinkResolver: Send + Sync {
    /// Returns true if `url` should be resolved before extraction.
    fn is_short_link(&self, url: &Url) -> bool;

    /// Returns the redirect target of `url`, or `None` when there is none.
    async fn resolve(&self, url: &str) -> Option<String>;
}

/// Resolver that issues a GET without following redirects.
#[derive(Debug, Clone)]
pub struct HttpShortLinkResolver {
    client: Client,
    hosts: Vec<String>,
}

impl HttpShortLinkResolver {
    /// Creates a resolver for [`DEFAULT_SHORT_LINK_HOSTS`].
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_hosts(DEFAULT_SHORT_LINK_HOSTS.iter().copied())
    }

    /// Creates a resolver for a custom host allowlist.
    ///
    /// A URL matches when its host equals an entry or is a subdomain of it.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the HTTP client cannot be built.
    pub fn with_hosts<I, S>(hosts: I) -> Result<Self, reqwest::Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options = ClientOptions::with_timeout(SHORT_LINK_TIMEOUT).no_redirects();
        let client = build_client("short-link", &options)?;
        Ok(Self {
            client,
            hosts: hosts
                .into_iter()
                .map(|host| {
                    let host: String = host.into();
                    host.trim().to_ascii_lowercase()
                })
                .filter(|host| !host.is_empty())
                .collect(),
        })
    }
}

#[async_trait]
impl ShortLinkResolver for HttpShortLinkResolver {
    fn is_short_link(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        self.hosts
            .iter()
            .any(|known| host == *known || host.ends_with(&format!(".{known}")))
    }

    #[instrument(level = "debug", skip(self))]
    async fn resolve(&self, url: &str) -> Option<String> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(error) => {
                debug!(error = %error, "short link request failed; keeping original URL");
                return None;
            }
        };

        let status = response.status().as_u16();
        if matches!(status, 301 | 302 | 303 | 307 | 308) {
            if let Some(location) = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
            {
                let resolved = absolutize_location(url, location);
                debug!(resolved = %resolved, "resolved short link from Location header");
                return Some(resolved);
            }
        }

        // A client that followed redirects anyway ends up on a different URL.
        let followed = Url::parse(url).is_ok_and(|requested| requested != *response.url());
        if followed {
            let resolved = response.url().to_string();
            debug!(resolved = %resolved, "resolved short link from final URL");
            return Some(resolved);
        }

        debug!(status, "short link did not redirect; keeping original URL");
        None
    }
}

/// Resolver that never resolves anything.
///
/// Used when extraction must stay offline.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoShortLinks;

#[async_trait]
impl ShortLinkResolver for NoShortLinks {
    fn is_short_link(&self, _url: &Url) -> bool {
        false
    }

    async fn resolve(&self, _url: &str) -> Option<String> {
        None
    }
}

fn absolutize_location(base: &str, location: &str) -> String {
    Url::parse(base)
        .and_then(|base| base.join(location))
        .map_or_else(|_| location.to_string(), |joined| joined.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_is_short_link_default_host() {
        let resolver = HttpShortLinkResolver::new().unwrap();
        assert!(resolver.is_short_link(&Url::parse("https://v.douyin.com/abc/").unwrap()));
        assert!(!resolver.is_short_link(&Url::parse("https://www.douyin.com/abc/").unwrap()));
        assert!(
            !resolver.is_short_link(&Url::parse("https://haohuo.jinritemai.com/x?id=1").unwrap())
        );
    }

    #[test]
    fn test_is_short_link_subdomain_and_case() {
        let resolver = HttpShortLinkResolver::with_hosts(["Short.Example"]).unwrap();
        assert!(resolver.is_short_link(&Url::parse("https://a.short.example/x").unwrap()));
        assert!(resolver.is_short_link(&Url::parse("https://SHORT.example/x").unwrap()));
        assert!(!resolver.is_short_link(&Url::parse("https://notshort.example/x").unwrap()));
    }

    #[test]
    fn test_absolutize_relative_location() {
        assert_eq!(
            absolutize_location("https://v.douyin.com/abc/", "/product?id=5"),
            "https://v.douyin.com/product?id=5"
        );
        assert_eq!(
            absolutize_location("https://v.douyin.com/abc/", "https://shop.example/p?id=5"),
            "https://shop.example/p?id=5"
        );
    }

    #[tokio::test]
    async fn test_no_short_links_never_resolves() {
        let resolver = NoShortLinks;
        assert!(!resolver.is_short_link(&Url::parse("https://v.douyin.com/abc/").unwrap()));
        assert_eq!(resolver.resolve("https://v.douyin.com/abc/").await, None);
    }
}
