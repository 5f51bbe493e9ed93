//! James Webb Space Telescope imagery via the jwstapi.com program lookup.

use super::{endpoint, get_json, pick, ImageSource, SourceError, SourceImage};
use crate::config::ApiEndpoint;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::time::Duration;

/// Programs with well-known public imagery.
pub const PROGRAM_IDS: [u32; 5] = [2733, 1345, 2736, 1536, 2107];

/// File types that can be shown directly.
const PREVIEW_TYPES: [&str; 4] = ["jpg", "jpeg", "png", "preview"];

pub struct JwstSource {
    client: Client,
    endpoint: ApiEndpoint,
    timeout: Duration,
}

impl JwstSource {
    pub fn new(client: Client, endpoint: ApiEndpoint, timeout: Duration) -> Self {
        Self {
            client,
            endpoint,
            timeout,
        }
    }
}

#[async_trait]
impl ImageSource for JwstSource {
    fn name(&self) -> &'static str {
        "jwst"
    }

    async fn try_fetch(&self, _query_hint: Option<&str>) -> Result<SourceImage, SourceError> {
        let program_id = *pick(&PROGRAM_IDS).unwrap_or(&PROGRAM_IDS[0]);

        let request = self
            .client
            .get(endpoint(
                &self.endpoint.base_url,
                &format!("program/id/{}", program_id),
            ))
            .header("X-API-KEY", self.endpoint.api_key.expose_secret())
            .timeout(self.timeout);

        let response: ProgramResponse = get_json(request).await?;

        let file = response
            .body
            .into_iter()
            .find(ProgramFile::is_preview)
            .ok_or_else(|| {
                SourceError::NoImage(format!("program {} has no preview file", program_id))
            })?;

        let title = file.details.and_then(|d| d.description);
        let location = file.location.unwrap_or_default();

        Ok(SourceImage::new(&location)?.with_title(title))
    }
}

#[derive(Debug, Deserialize)]
struct ProgramResponse {
    #[serde(default)]
    body: Vec<ProgramFile>,
}

#[derive(Debug, Deserialize)]
struct ProgramFile {
    #[serde(default)]
    file_type: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    details: Option<FileDetails>,
}

impl ProgramFile {
    fn is_preview(&self) -> bool {
        let typed = self
            .file_type
            .as_deref()
            .map(|t| PREVIEW_TYPES.contains(&t.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        let located = self
            .location
            .as_deref()
            .map(|l| !l.trim().is_empty())
            .unwrap_or(false);
        typed && located
    }
}

#[derive(Debug, Deserialize)]
struct FileDetails {
    #[serde(default)]
    description: Option<String>,
}
