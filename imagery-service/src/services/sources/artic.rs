//! Art imagery from the Art Institute of Chicago public API.
//!
//! Search results carry an `image_id`; the display URL is built from the
//! IIIF image service template advertised in the response `config` block.

use super::{endpoint, get_json, pick, ImageSource, SourceError, SourceImage};
use crate::config::ApiEndpoint;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const SEARCH_TERMS: [&str; 6] = [
    "landscape",
    "nature",
    "portrait",
    "painting",
    "sculpture",
    "impressionist",
];

const DEFAULT_IIIF_URL: &str = "https://www.artic.edu/iiif/2";
const RESULT_LIMIT: &str = "20";
const FIELDS: &str = "id,title,image_id,artist_display";

pub struct ArtInstituteSource {
    client: Client,
    endpoint: ApiEndpoint,
    timeout: Duration,
}

impl ArtInstituteSource {
    pub fn new(client: Client, endpoint: ApiEndpoint, timeout: Duration) -> Self {
        Self {
            client,
            endpoint,
            timeout,
        }
    }
}

/// IIIF display URL for an artwork image.
pub fn display_url(iiif_url: &str, image_id: &str) -> String {
    format!(
        "{}/{}/full/843,/0/default.jpg",
        iiif_url.trim_end_matches('/'),
        image_id
    )
}

#[async_trait]
impl ImageSource for ArtInstituteSource {
    fn name(&self) -> &'static str {
        "artic"
    }

    async fn try_fetch(&self, _query_hint: Option<&str>) -> Result<SourceImage, SourceError> {
        let term = *pick(&SEARCH_TERMS).unwrap_or(&SEARCH_TERMS[0]);

        let request = self
            .client
            .get(endpoint(&self.endpoint.base_url, "artworks/search"))
            .query(&[("q", term), ("limit", RESULT_LIMIT), ("fields", FIELDS)])
            .timeout(self.timeout);

        let response: SearchResponse = get_json(request).await?;

        let with_images: Vec<&Artwork> = response
            .data
            .iter()
            .filter(|a| a.image_id.as_deref().is_some_and(|id| !id.trim().is_empty()))
            .collect();

        let artwork = pick(&with_images).ok_or_else(|| {
            SourceError::NoImage(format!("no artwork with an image for {:?}", term))
        })?;

        let iiif_url = response
            .config
            .as_ref()
            .and_then(|c| c.iiif_url.as_deref())
            .unwrap_or(DEFAULT_IIIF_URL);
        let image_id = artwork.image_id.as_deref().unwrap_or_default();

        Ok(SourceImage::new(&display_url(iiif_url, image_id))?
            .with_title(artwork.title.clone())
            .with_description(artwork.artist_display.clone()))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Artwork>,
    #[serde(default)]
    config: Option<IiifConfig>,
}

#[derive(Debug, Deserialize)]
struct Artwork {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    image_id: Option<String>,
    #[serde(default)]
    artist_display: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IiifConfig {
    #[serde(default)]
    iiif_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source(server: &MockServer) -> ArtInstituteSource {
        ArtInstituteSource::new(
            Client::new(),
            ApiEndpoint::new(server.uri(), ""),
            Duration::from_secs(2),
        )
    }

    #[test]
    fn display_url_follows_iiif_template() {
        assert_eq!(
            display_url("https://www.artic.edu/iiif/2/", "abc-123"),
            "https://www.artic.edu/iiif/2/abc-123/full/843,/0/default.jpg"
        );
    }

    #[tokio::test]
    async fn only_artworks_with_image_ids_are_chosen() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/artworks/search"))
            .and(query_param("limit", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    { "id": 1, "title": "No image", "image_id": null },
                    { "id": 2, "title": "Blank image", "image_id": "  " },
                    { "id": 3, "title": "Water Lilies", "image_id": "lilies-1",
                      "artist_display": "Claude Monet\nFrench, 1840-1926" }
                ],
                "config": { "iiif_url": "https://iiif.example/iiif/2" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let image = source(&server).try_fetch(None).await.unwrap();

        assert_eq!(
            image.url,
            "https://iiif.example/iiif/2/lilies-1/full/843,/0/default.jpg"
        );
        assert_eq!(image.title.as_deref(), Some("Water Lilies"));
        assert!(image.description.unwrap().starts_with("Claude Monet"));
    }

    #[tokio::test]
    async fn search_term_comes_from_fixed_list() {
        let server = MockServer::start().await;
        for term in SEARCH_TERMS {
            Mock::given(path("/artworks/search"))
                .and(query_param("q", term))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "data": [{ "title": term, "image_id": format!("id-{}", term) }]
                })))
                .mount(&server)
                .await;
        }

        let image = source(&server).try_fetch(None).await.unwrap();

        assert!(image.url.starts_with(DEFAULT_IIIF_URL));
        assert!(SEARCH_TERMS.contains(&image.title.as_deref().unwrap()));
    }

    #[tokio::test]
    async fn no_images_is_absorbed() {
        let server = MockServer::start().await;
        Mock::given(path("/artworks/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .mount(&server)
            .await;

        assert_eq!(source(&server).fetch(None).await, None);
    }
}
