//! Shared reqwest client construction.
//!
//! The product client, the image client and the short-link resolver all build
//! their `reqwest::Client` here so they agree on User-Agent, compression and
//! proxy handling.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder, Proxy};
use tracing::warn;

use crate::user_agent::BROWSER_USER_AGENT;

/// Connect timeout shared by every client; the total request timeout is per client.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Per-client knobs.
#[derive(Debug, Clone)]
pub(crate) struct ClientOptions {
    /// Total request timeout.
    pub(crate) timeout: Duration,
    /// Follow redirects (`false` for short-link resolution).
    pub(crate) follow_redirects: bool,
    /// Headers sent with every request.
    pub(crate) default_headers: HeaderMap,
}

impl ClientOptions {
    pub(crate) fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            follow_redirects: true,
            default_headers: HeaderMap::new(),
        }
    }

    pub(crate) fn no_redirects(mut self) -> Self {
        self.follow_redirects = false;
        self
    }

    pub(crate) fn headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = headers;
        self
    }
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

/// Builds a client for `purpose` (used only in logs).
///
/// Some sandboxed macOS environments panic while reqwest reads the system
/// proxy configuration; in that case the build is retried with system proxy
/// lookup disabled and `*_PROXY` environment variables applied by hand.
///
/// # Errors
///
/// Returns the reqwest builder error when the client cannot be constructed.
pub(crate) fn build_client(purpose: &str, options: &ClientOptions) -> Result<Client, reqwest::Error> {
    match try_build_client(options, false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Build(error)) => Err(error),
        Err(BuildClientFailure::Panic) => {
            warn!(
                purpose,
                "HTTP client builder panicked while reading system proxy settings; using env-proxy fallback"
            );
            match try_build_client(options, true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Build(error)) => Err(error),
                // Second panic has no further fallback; build the plainest client we can.
                Err(BuildClientFailure::Panic) => base_builder(options).no_proxy().build(),
            }
        }
    }
}

fn try_build_client(
    options: &ClientOptions,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    catch_unwind(AssertUnwindSafe(|| {
        let mut builder = base_builder(options);
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn base_builder(options: &ClientOptions) -> ClientBuilder {
    let redirect = if options.follow_redirects {
        Policy::limited(10)
    } else {
        Policy::none()
    };
    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(options.timeout))
        .timeout(options.timeout)
        .redirect(redirect)
        .gzip(true)
        .user_agent(BROWSER_USER_AGENT)
        .default_headers(options.default_headers.clone())
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = env_proxy_for_scheme("https")
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    if let Some(proxy) = env_proxy_for_scheme("http")
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn env_proxy_for_scheme(scheme: &str) -> Option<String> {
    let names: &[&str] = match scheme {
        "https" => &["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"],
        "http" => &["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"],
        _ => return None,
    };
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
