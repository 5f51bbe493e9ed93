//! Keyword image search against the Unsplash stock-photo API.

use super::{endpoint, get_json, ImageSource, SourceError, SourceImage};
use crate::config::ApiEndpoint;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::time::Duration;

/// Query used when the caller gives no hint.
const DEFAULT_QUERY: &str = "landscape";

pub struct UnsplashSource {
    client: Client,
    endpoint: ApiEndpoint,
    timeout: Duration,
}

impl UnsplashSource {
    pub fn new(client: Client, endpoint: ApiEndpoint, timeout: Duration) -> Self {
        Self {
            client,
            endpoint,
            timeout,
        }
    }
}

#[async_trait]
impl ImageSource for UnsplashSource {
    fn name(&self) -> &'static str {
        "unsplash"
    }

    async fn try_fetch(&self, query_hint: Option<&str>) -> Result<SourceImage, SourceError> {
        let query = query_hint
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .unwrap_or(DEFAULT_QUERY);

        let request = self
            .client
            .get(endpoint(&self.endpoint.base_url, "search/photos"))
            .header(
                "Authorization",
                format!("Client-ID {}", self.endpoint.api_key.expose_secret()),
            )
            .query(&[
                ("query", query),
                ("per_page", "1"),
                ("orientation", "landscape"),
            ])
            .timeout(self.timeout);

        let response: SearchResponse = get_json(request).await?;

        let photo = response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::NoImage(format!("no results for {:?}", query)))?;

        let url = photo
            .urls
            .regular
            .ok_or_else(|| SourceError::NoImage("result has no regular URL".to_string()))?;

        Ok(SourceImage::new(&url)?
            .with_title(photo.alt_description.clone())
            .with_description(photo.description.or(photo.alt_description)))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    alt_description: Option<String>,
    urls: PhotoUrls,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    #[serde(default)]
    regular: Option<String>,
}
