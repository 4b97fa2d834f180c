//! End-to-end orchestration: share text in, processed images out.
//!
//! Stages run strictly in sequence and the first failure is returned as is:
//!
//! 1. extract the product id from the share text
//! 2. fetch the product detail
//! 3. download the images into `<output>/<id>/original`
//! 4. remove backgrounds into `<output>/<id>/processed`
//!
//! The background remover is checked before any network traffic, so a missing
//! tool fails the run immediately.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};

use crate::background::{BackgroundError, BackgroundRemover, process_batch};
use crate::download::{
    DEFAULT_BASE_DELAY, DEFAULT_DOWNLOAD_TIMEOUT_SECS, DEFAULT_MAX_RETRIES, DEFAULT_MIN_DIMENSION,
    DownloadError, DownloadedImage, HttpClient, ImageAcquirer, ResolutionGate, RetryPolicy,
};
use crate::parser::{
    DEFAULT_SHORT_LINK_HOSTS, ExtractError, HttpShortLinkResolver, IdentifierExtractor, ProductId,
};
use crate::product::{
    DEFAULT_ENDPOINT, DEFAULT_METADATA_TIMEOUT, FetchError, ProductClient, ProductDetail,
};

/// Subdirectory of `<output>/<id>` holding downloaded images.
pub const ORIGINAL_DIR: &str = "original";

/// Subdirectory of `<output>/<id>` holding background-free images.
pub const PROCESSED_DIR: &str = "processed";

/// Longest share-text prefix written to the log.
const LOGGED_INPUT_CHARS: usize = 200;

/// Errors from any pipeline stage, passed through unchanged.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// An HTTP client could not be constructed.
    #[error("failed to build {purpose} HTTP client: {source}")]
    ClientSetup {
        /// Which client failed.
        purpose: &'static str,
        /// The builder error.
        #[source]
        source: reqwest::Error,
    },

    /// No product id in the share text.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Product detail could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// An image could not be acquired.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Background removal is unavailable or its output directory failed.
    #[error(transparent)]
    Background(#[from] BackgroundError),
}

impl PipelineError {
    fn client_setup(purpose: &'static str, source: reqwest::Error) -> Self {
        Self::ClientSetup { purpose, source }
    }
}

/// Resolved runtime settings for a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Per-image request timeout.
    pub download_timeout: Duration,
    /// Product detail request timeout.
    pub metadata_timeout: Duration,
    /// Retries per image request on transient failures.
    pub max_retries: u32,
    /// Base delay of the retry backoff.
    pub retry_base_delay: Duration,
    /// Minimum accepted image width.
    pub min_width: u32,
    /// Minimum accepted image height.
    pub min_height: u32,
    /// Product detail endpoint.
    pub endpoint: String,
    /// Hosts treated as short links.
    pub short_link_hosts: Vec<String>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            download_timeout: Duration::from_secs(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
            metadata_timeout: DEFAULT_METADATA_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: DEFAULT_BASE_DELAY,
            min_width: DEFAULT_MIN_DIMENSION,
            min_height: DEFAULT_MIN_DIMENSION,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            short_link_hosts: DEFAULT_SHORT_LINK_HOSTS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl PipelineOptions {
    fn retry_policy(&self) -> RetryPolicy {
        let max_delay = self.retry_base_delay.saturating_mul(16);
        RetryPolicy::new(self.max_retries, self.retry_base_delay, max_delay)
    }
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    /// Extracted product id.
    pub product_id: ProductId,
    /// Fetched product detail.
    pub product_detail: ProductDetail,
    /// `<output>/<id>/original`.
    pub download_dir: PathBuf,
    /// `<output>/<id>/processed`.
    pub processed_dir: PathBuf,
    /// Acquired images, in product order.
    pub downloaded_images: Vec<DownloadedImage>,
    /// Background-free PNGs, in product order; may be shorter than `downloaded_images`.
    pub processed_images: Vec<PathBuf>,
}

impl PipelineResult {
    /// Paths of the acquired images.
    #[must_use]
    pub fn downloaded_paths(&self) -> Vec<&Path> {
        self.downloaded_images
            .iter()
            .map(|image| image.path.as_path())
            .collect()
    }
}

/// The assembled stages.
pub struct Pipeline {
    extractor: IdentifierExtractor,
    products: ProductClient,
    acquirer: ImageAcquirer,
    remover: Box<dyn BackgroundRemover>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("extractor", &self.extractor)
            .field("products", &self.products)
            .field("acquirer", &self.acquirer)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Builds every stage from `options`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ClientSetup`] if an HTTP client cannot be built.
    pub fn new(
        options: &PipelineOptions,
        remover: Box<dyn BackgroundRemover>,
    ) -> Result<Self, PipelineError> {
        let resolver = HttpShortLinkResolver::with_hosts(options.short_link_hosts.iter().cloned())
            .map_err(|e| PipelineError::client_setup("short-link", e))?;
        let products = ProductClient::with_endpoint(&options.endpoint, options.metadata_timeout)
            .map_err(|e| PipelineError::client_setup("product", e))?;
        let client = HttpClient::new(options.download_timeout)
            .map_err(|e| PipelineError::client_setup("image", e))?
            .with_retry_policy(options.retry_policy());
        let gate = ResolutionGate::new(options.min_width, options.min_height);

        Ok(Self::from_parts(
            IdentifierExtractor::new(Box::new(resolver)),
            products,
            ImageAcquirer::new(client, gate),
            remover,
        ))
    }

    /// Assembles a pipeline from ready-made stages.
    #[must_use]
    pub fn from_parts(
        extractor: IdentifierExtractor,
        products: ProductClient,
        acquirer: ImageAcquirer,
        remover: Box<dyn BackgroundRemover>,
    ) -> Self {
        Self {
            extractor,
            products,
            acquirer,
            remover,
        }
    }

    /// Runs every stage for `text`, writing under `output_dir`.
    ///
    /// # Errors
    ///
    /// Returns the first stage error, unchanged.
    #[instrument(skip(self, text), fields(output_dir = %output_dir.display()))]
    pub async fn run(&self, text: &str, output_dir: &Path) -> Result<PipelineResult, PipelineError> {
        let preview: String = text.chars().take(LOGGED_INPUT_CHARS).collect();
        info!(input = %preview, "starting pipeline");

        self.remover.ensure_available().await?;

        let product_id = self.extractor.extract(text).await?;
        info!(product_id = %product_id, "extracted product id");

        let product_detail = self.products.fetch_detail(&product_id).await?;
        info!(
            product_id = %product_id,
            images = product_detail.images.len(),
            "fetched product detail"
        );

        let product_dir = output_dir.join(product_id.as_str());
        let download_dir = product_dir.join(ORIGINAL_DIR);
        let downloaded_images = self
            .acquirer
            .download(&product_detail.images, &download_dir)
            .await?;
        info!(count = downloaded_images.len(), "downloaded images");

        let processed_dir = product_dir.join(PROCESSED_DIR);
        let inputs: Vec<PathBuf> = downloaded_images
            .iter()
            .map(|image| image.path.clone())
            .collect();
        let processed_images = process_batch(self.remover.as_ref(), &inputs, &processed_dir).await?;
        info!(count = processed_images.len(), "processed images");

        Ok(PipelineResult {
            product_id,
            product_detail,
            download_dir,
            processed_dir,
            downloaded_images,
            processed_images,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::background::RembgCommand;
    use tempfile::TempDir;

    #[test]
    fn test_default_options() {
        let options = PipelineOptions::default();
        assert_eq!(options.download_timeout, Duration::from_secs(10));
        assert_eq!(options.metadata_timeout, Duration::from_secs(10));
        assert_eq!(options.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!((options.min_width, options.min_height), (1080, 1080));
        assert_eq!(options.short_link_hosts, ["v.douyin.com"]);
        assert_eq!(options.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_retry_policy_follows_options() {
        let options = PipelineOptions {
            max_retries: 5,
            ..PipelineOptions::default()
        };
        assert_eq!(options.retry_policy().max_retries(), 5);
    }

    #[tokio::test]
    async fn test_missing_remover_fails_before_extraction() {
        let temp_dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(
            &PipelineOptions::default(),
            Box::new(RembgCommand::with_program("/nonexistent/rembg")),
        )
        .unwrap();

        // Text without an id: the remover check must win.
        let err = pipeline.run("无效的输入", temp_dir.path()).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Background(BackgroundError::Unavailable { .. })
        ));
        assert!(std::fs::read_dir(temp_dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_stage_errors_are_transparent() {
        let inner = FetchError::no_images("555");
        let expected = inner.to_string();
        let err = PipelineError::from(inner);
        assert_eq!(err.to_string(), expected);
    }
}
