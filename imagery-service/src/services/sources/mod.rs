//! Image source adapters.
//!
//! Each adapter wraps one remote query and normalises the answer to a
//! [`SourceImage`]. Adapters implement the fallible [`ImageSource::try_fetch`];
//! callers use [`ImageSource::fetch`], which turns every failure into `None`
//! so no provider error crosses the adapter boundary.

pub mod apod;
pub mod artic;
pub mod jwst;
pub mod nature;
pub mod pool;
pub mod unsplash;

pub use apod::ApodSource;
pub use artic::ArtInstituteSource;
pub use jwst::JwstSource;
pub use nature::NatureSource;
pub use pool::StaticPool;
pub use unsplash::UnsplashSource;

use crate::services::metrics;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::time::Instant;
use thiserror::Error;

/// Why a source produced no image.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected status {0}")]
    Status(u16),

    #[error("Malformed response: {0}")]
    Parse(String),

    #[error("No image in response: {0}")]
    NoImage(String),
}

impl SourceError {
    /// Short label used as a metric outcome.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::Network(_) => "network",
            SourceError::Status(_) => "status",
            SourceError::Parse(_) => "parse",
            SourceError::NoImage(_) => "empty",
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SourceError::Parse(err.to_string())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

/// An image a source vouched for.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    /// Absolute http(s) URL.
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl SourceImage {
    /// Accepts only absolute http/https URLs; anything else counts as no image.
    pub fn new(url: &str) -> Result<Self, SourceError> {
        let url = url.trim();
        match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => {
                Ok(Self {
                    url: url.to_string(),
                    title: None,
                    description: None,
                })
            }
            _ => Err(SourceError::NoImage(format!("not an absolute URL: {:?}", url))),
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = non_empty(title);
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = non_empty(description);
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Stable identifier used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Query the provider once.
    async fn try_fetch(&self, query_hint: Option<&str>) -> Result<SourceImage, SourceError>;

    /// Query the provider once, absorbing every failure.
    async fn fetch(&self, query_hint: Option<&str>) -> Option<SourceImage> {
        let start = Instant::now();
        let result = self.try_fetch(query_hint).await;
        let elapsed = start.elapsed();

        match result {
            Ok(image) => {
                metrics::record_source_request(self.name(), "found", elapsed);
                tracing::debug!(source = self.name(), url = %image.url, "Image source returned an image");
                Some(image)
            }
            Err(e) => {
                metrics::record_source_request(self.name(), e.kind(), elapsed);
                tracing::warn!(source = self.name(), error = %e, "Image source returned no image");
                None
            }
        }
    }
}

/// Send a request and decode a 2xx JSON body.
pub(crate) async fn get_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, SourceError> {
    let response = request.send().await?;

    if !response.status().is_success() {
        return Err(SourceError::Status(response.status().as_u16()));
    }

    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| SourceError::Parse(e.to_string()))
}

/// Uniform pick from a fixed list.
pub(crate) fn pick<T>(items: &[T]) -> Option<&T> {
    items.choose(&mut rand::thread_rng())
}

/// Join a configured base URL and a path without doubling slashes.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl ImageSource for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn try_fetch(&self, _query_hint: Option<&str>) -> Result<SourceImage, SourceError> {
            Err(SourceError::Status(503))
        }
    }

    #[test]
    fn source_image_rejects_relative_and_non_http_urls() {
        assert!(SourceImage::new("https://images.example/a.jpg").is_ok());
        assert!(SourceImage::new("/relative/a.jpg").is_err());
        assert!(SourceImage::new("ftp://images.example/a.jpg").is_err());
        assert!(SourceImage::new("").is_err());
    }

    #[test]
    fn blank_metadata_is_dropped() {
        let image = SourceImage::new("https://images.example/a.jpg")
            .unwrap()
            .with_title(Some("  ".into()))
            .with_description(Some(" Nebula ".into()));

        assert_eq!(image.title, None);
        assert_eq!(image.description.as_deref(), Some("Nebula"));
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(
            endpoint("https://api.example/v1/", "/search"),
            "https://api.example/v1/search"
        );
    }

    #[tokio::test]
    async fn fetch_absorbs_errors() {
        assert_eq!(Failing.fetch(None).await, None);
    }
}
