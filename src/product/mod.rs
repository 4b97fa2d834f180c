//! Product detail client.
//!
//! Fetches a product record from the commerce endpoint and normalizes it into a
//! [`ProductDetail`]: a title and a non-empty, ordered list of absolute image
//! URLs carrying the quality parameter.

mod error;
mod normalize;

pub use error::FetchError;

use std::time::Duration;

use reqwest::header::{ACCEPT, COOKIE, HeaderMap, HeaderValue, REFERER};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use url::Url;

use crate::http_client::{ClientOptions, build_client};
use crate::parser::ProductId;
use crate::user_agent::{JSON_ACCEPT, STOREFRONT_REFERER};

/// Product detail endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://ec.snssdk.com/product/info/v2/";

/// Fixed application id sent with every detail request.
pub const APP_ID: &str = "1128";

/// Fixed item source sent with every detail request.
pub const ITEM_SOURCE: &str = "0";

/// Default timeout for the detail request.
pub const DEFAULT_METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// Normalized product metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetail {
    /// Product the detail belongs to.
    pub product_id: ProductId,
    /// Product title; empty when the payload carries none.
    pub title: String,
    /// Absolute HTTPS image URLs with the quality parameter, in payload order.
    pub images: Vec<String>,
}

/// HTTP client for the product detail endpoint.
#[derive(Debug, Clone)]
pub struct ProductClient {
    client: reqwest::Client,
    endpoint: String,
}

impl ProductClient {
    /// Creates a client for the production endpoint with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns the reqwest builder error when the client cannot be constructed.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_endpoint(DEFAULT_ENDPOINT, DEFAULT_METADATA_TIMEOUT)
    }

    /// Creates a client for `endpoint` (useful for tests against a mock server).
    ///
    /// # Errors
    ///
    /// Returns the reqwest builder error when the client cannot be constructed.
    pub fn with_endpoint(endpoint: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let options = ClientOptions::with_timeout(timeout).headers(default_headers());
        let client = build_client("product", &options)?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    /// Returns the endpoint this client talks to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetches and normalizes the detail for `product_id`.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Network`] / [`FetchError::Timeout`] when the request fails
    /// - [`FetchError::HttpStatus`] on a non-2xx response
    /// - [`FetchError::InvalidResponse`] when the body is not JSON
    /// - [`FetchError::NoData`] when the payload has no product data
    /// - [`FetchError::NoImages`] when no usable image URL remains
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn fetch_detail(&self, product_id: &ProductId) -> Result<ProductDetail, FetchError> {
        let url = self.request_url(product_id)?;
        debug!(url = %url, "requesting product detail");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::network(product_id.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(
                product_id.as_str(),
                status.as_u16(),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::network(product_id.as_str(), e))?;
        let payload: serde_json::Value = serde_json::from_slice(&body)
            .map_err(|e| FetchError::invalid_response(product_id.as_str(), e))?;

        let detail = normalize::detail_from_payload(product_id, &payload)?;
        info!(
            title = %detail.title,
            images = detail.images.len(),
            "fetched product detail"
        );
        Ok(detail)
    }

    fn request_url(&self, product_id: &ProductId) -> Result<Url, FetchError> {
        Url::parse_with_params(
            &self.endpoint,
            [
                ("product_id", product_id.as_str()),
                ("app_id", APP_ID),
                ("item_source", ITEM_SOURCE),
            ],
        )
        .map_err(|_| FetchError::invalid_endpoint(&self.endpoint))
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(JSON_ACCEPT));
    headers.insert(REFERER, HeaderValue::from_static(STOREFRONT_REFERER));
    headers.insert(COOKIE, HeaderValue::from_static(""));
    headers
}
