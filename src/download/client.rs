//! HTTP client wrapper for downloading images.
//!
//! [`HttpClient`] streams a response body to a caller-chosen path and retries
//! transient failures according to its [`RetryPolicy`].

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument, warn};
use url::Url;

use super::error::DownloadError;
use super::retry::{RetryDecision, RetryPolicy, classify_error};
use crate::http_client::{ClientOptions, build_client};

/// Default per-request timeout for image downloads, in seconds.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 10;

/// HTTP client for image downloads.
///
/// Create once per pipeline run and reuse it for every image so connections
/// are pooled.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use std::time::Duration;
///
/// use product_images::download::HttpClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new(Duration::from_secs(10))?;
/// let bytes = client
///     .download_to_path("https://cdn.example.com/a.jpg", Path::new("./image_01.jpg"))
///     .await?;
/// println!("wrote {bytes} bytes");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    retry: RetryPolicy,
}

impl HttpClient {
    /// Creates a client with the given request timeout and the default retry policy.
    ///
    /// # Errors
    ///
    /// Returns the reqwest builder error when the client cannot be constructed.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = build_client("image", &ClientOptions::with_timeout(timeout))?;
        Ok(Self {
            client,
            retry: RetryPolicy::default(),
        })
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the retry policy in use.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Downloads `url` to `dest`, overwriting any existing file.
    ///
    /// Transient failures are retried with backoff. On any error the file at
    /// `dest` is removed.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::InvalidUrl`] if the URL is not http(s)
    /// - [`DownloadError::HttpStatus`] on a non-2xx response after retries
    /// - [`DownloadError::Network`] / [`DownloadError::Timeout`] after retries
    /// - [`DownloadError::Io`] if the file cannot be written
    #[instrument(skip(self, dest), fields(url = %url, dest = %dest.display()))]
    pub async fn download_to_path(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DownloadError::invalid_url(url));
        }

        let mut attempt = 1;
        loop {
            let error = match self.attempt_download(parsed.clone(), url, dest).await {
                Ok(bytes) => return Ok(bytes),
                Err(error) => error,
            };
            match self.retry.should_retry(classify_error(&error), attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next,
                } => {
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis(),
                        error = %error,
                        "transient download failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt = next;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(attempt, reason = %reason, "giving up");
                    return Err(error);
                }
            }
        }
    }

    async fn attempt_download(
        &self,
        url: Url,
        raw_url: &str,
        dest: &Path,
    ) -> Result<u64, DownloadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::network(raw_url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(raw_url, status.as_u16()));
        }

        let mut file = File::create(dest)
            .await
            .map_err(|e| DownloadError::io(raw_url, dest, e))?;

        let result = stream_to_file(&mut file, response, raw_url, dest).await;
        if result.is_err() {
            debug!(path = %dest.display(), "cleaning up partial file after error");
            drop(file);
            let _ = tokio::fs::remove_file(dest).await;
        }
        let bytes = result?;
        debug!(bytes, "download complete");
        Ok(bytes)
    }
}

/// Streams the response body to `file`, returning bytes written.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(url, path, e))?;
        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(url, path, e))?;

    Ok(bytes_written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    fn fast_client(max_retries: u32) -> HttpClient {
        HttpClient::new(Duration::from_secs(5))
            .unwrap()
            .with_retry_policy(RetryPolicy::new(max_retries, Duration::ZERO, Duration::ZERO))
    }

    #[tokio::test]
    async fn test_download_to_path_success() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/a.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg bytes"))
            .mount(&mock_server)
            .await;

        let dest = temp_dir.path().join("image_01.jpg");
        let url = format!("{}/a.jpg", mock_server.uri());
        let bytes = fast_client(0).download_to_path(&url, &dest).await.unwrap();

        assert_eq!(bytes, 10);
        assert_eq!(std::fs::read(&dest).unwrap(), b"jpeg bytes");
    }

    #[tokio::test]
    async fn test_download_overwrites_existing_file() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("image_01.jpg");
        std::fs::write(&dest, b"a much longer previous body").unwrap();

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"new"))
            .mount(&mock_server)
            .await;

        let url = format!("{}/a.jpg", mock_server.uri());
        fast_client(0).download_to_path(&url, &dest).await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_transient_status_is_retried() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/flaky.jpg"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .with_priority(1)
            .expect(2)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok"))
            .with_priority(2)
            .expect(1)
            .mount(&mock_server)
            .await;

        let dest = temp_dir.path().join("image_01.jpg");
        let url = format!("{}/flaky.jpg", mock_server.uri());
        let bytes = fast_client(3).download_to_path(&url, &dest).await.unwrap();
        assert_eq!(bytes, 2);
    }

    #[tokio::test]
    async fn test_retries_exhausted_returns_last_status() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .expect(3)
            .mount(&mock_server)
            .await;

        let dest = temp_dir.path().join("image_01.jpg");
        let url = format!("{}/down.jpg", mock_server.uri());
        let result = fast_client(2).download_to_path(&url, &dest).await;

        match result {
            Err(DownloadError::HttpStatus { status, url: failed }) => {
                assert_eq!(status, 502);
                assert_eq!(failed, url);
            }
            other => panic!("Expected HttpStatus error, got: {other:?}"),
        }
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_404_is_not_retried() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&mock_server)
            .await;

        let dest = temp_dir.path().join("image_01.jpg");
        let url = format!("{}/missing.jpg", mock_server.uri());
        let result = fast_client(3).download_to_path(&url, &dest).await;
        assert!(matches!(
            result,
            Err(DownloadError::HttpStatus { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_download_cleanup_on_read_timeout() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"data")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let client = HttpClient::new(Duration::from_secs(1))
            .unwrap()
            .with_retry_policy(RetryPolicy::new(0, Duration::ZERO, Duration::ZERO));
        let dest = temp_dir.path().join("image_01.jpg");
        let url = format!("{}/slow.jpg", mock_server.uri());

        let result = client.download_to_path(&url, &dest).await;
        assert!(result.is_err(), "expected timeout or network error");
        assert!(!dest.exists(), "partial file must be removed");
    }

    #[tokio::test]
    async fn test_invalid_url_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("image_01.jpg");
        for url in ["not-a-valid-url", "ftp://cdn.example.com/a.jpg"] {
            let result = fast_client(0).download_to_path(url, &dest).await;
            assert!(matches!(result, Err(DownloadError::InvalidUrl { .. })), "{url}");
        }
    }
}
