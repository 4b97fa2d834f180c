//! Error types for the product detail client.

use thiserror::Error;

/// Errors that can occur while fetching a product detail.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection refused, TLS, body read).
    #[error("network error fetching product {product_id}: {source}")]
    Network {
        /// Product being fetched.
        product_id: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out.
    #[error("timeout fetching product {product_id}")]
    Timeout {
        /// Product being fetched.
        product_id: String,
    },

    /// Endpoint answered with a non-2xx status.
    #[error("HTTP {status} fetching product {product_id}")]
    HttpStatus {
        /// Product being fetched.
        product_id: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Body was not JSON.
    #[error("invalid response for product {product_id}: {source}")]
    InvalidResponse {
        /// Product being fetched.
        product_id: String,
        /// The JSON parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Configured endpoint is not a valid URL.
    #[error("invalid product endpoint: {endpoint}")]
    InvalidEndpoint {
        /// The endpoint string.
        endpoint: String,
    },

    /// Payload has no (or an empty) `data` object.
    #[error("no product data found for {product_id}")]
    NoData {
        /// Product being fetched.
        product_id: String,
    },

    /// No image URL survived normalization.
    #[error("product {product_id} does not have image data")]
    NoImages {
        /// Product being fetched.
        product_id: String,
    },
}

impl FetchError {
    /// Creates a network error from a reqwest error, promoting timeouts.
    pub fn network(product_id: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::Timeout {
                product_id: product_id.into(),
            };
        }
        Self::Network {
            product_id: product_id.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(product_id: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            product_id: product_id.into(),
            status,
        }
    }

    /// Creates an invalid response error.
    pub fn invalid_response(product_id: impl Into<String>, source: serde_json::Error) -> Self {
        Self::InvalidResponse {
            product_id: product_id.into(),
            source,
        }
    }

    /// Creates an invalid endpoint error.
    pub fn invalid_endpoint(endpoint: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            endpoint: endpoint.into(),
        }
    }

    /// Creates a no-data error.
    pub fn no_data(product_id: impl Into<String>) -> Self {
        Self::NoData {
            product_id: product_id.into(),
        }
    }

    /// Creates a no-images error.
    pub fn no_images(product_id: impl Into<String>) -> Self {
        Self::NoImages {
            product_id: product_id.into(),
        }
    }
}
