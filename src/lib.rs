//! Product Images Core Library
//!
//! This library turns a piece of share text (an app share message, a product
//! page URL, a backend payload) into a folder of background-free product
//! images.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`parser`] - Product identifier extraction from share text
//! - [`product`] - Product detail fetching and response normalization
//! - [`download`] - Image acquisition with retry and resolution gating
//! - [`background`] - Background removal collaborator (external `rembg`)
//! - [`pipeline`] - Orchestration of the stages above
//! - [`quality`] - Shared `ratio=1` quality parameter handling

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod background;
pub mod download;
mod http_client;
pub mod parser;
pub mod pipeline;
pub mod product;
pub mod quality;
#[cfg(test)]
mod test_support;
mod user_agent;

// Re-export commonly used types
pub use background::{BackgroundError, BackgroundRemover, RembgCommand, process_batch};
pub use download::{
    DEFAULT_DOWNLOAD_TIMEOUT_SECS, DEFAULT_MAX_RETRIES, DownloadError, DownloadedImage,
    HttpClient, ImageAcquirer, ResolutionGate, RetryPolicy,
};
pub use parser::{
    ExtractError, HttpShortLinkResolver, IdentifierExtractor, ProductId, ShortLinkResolver,
};
pub use pipeline::{Pipeline, PipelineError, PipelineOptions, PipelineResult};
pub use product::{FetchError, ProductClient, ProductDetail};
pub use quality::ensure_quality_param;
