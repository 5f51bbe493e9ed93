//! NASA Astronomy Picture of the Day.

use super::{endpoint, get_json, ImageSource, SourceError, SourceImage};
use crate::config::ApiEndpoint;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::time::Duration;

pub struct ApodSource {
    client: Client,
    endpoint: ApiEndpoint,
    timeout: Duration,
}

impl ApodSource {
    pub fn new(client: Client, endpoint: ApiEndpoint, timeout: Duration) -> Self {
        Self {
            client,
            endpoint,
            timeout,
        }
    }
}

#[async_trait]
impl ImageSource for ApodSource {
    fn name(&self) -> &'static str {
        "apod"
    }

    async fn try_fetch(&self, _query_hint: Option<&str>) -> Result<SourceImage, SourceError> {
        let request = self
            .client
            .get(endpoint(&self.endpoint.base_url, "planetary/apod"))
            .query(&[("api_key", self.endpoint.api_key.expose_secret().as_str())])
            .timeout(self.timeout);

        let apod: ApodResponse = get_json(request).await?;

        // Some days are videos or interactive pages.
        if apod.media_type.as_deref() != Some("image") {
            return Err(SourceError::NoImage(format!(
                "media type is {:?}",
                apod.media_type
            )));
        }

        let url = apod
            .url
            .filter(|u| !u.trim().is_empty())
            .or(apod.hdurl)
            .ok_or_else(|| SourceError::NoImage("APOD entry has no URL".to_string()))?;

        Ok(SourceImage::new(&url)?
            .with_title(apod.title)
            .with_description(apod.explanation))
    }
}

#[derive(Debug, Deserialize)]
struct ApodResponse {
    #[serde(default)]
    media_type: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    hdurl: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    explanation: Option<String>,
}
