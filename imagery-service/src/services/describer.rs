//! Natural-language image descriptions from a vision model.

use crate::services::providers::{ChatMessage, GenerationParams, TextProvider};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Returned whenever the image cannot be described.
pub const PLACEHOLDER: &str = "Unable to analyze the image at this moment.";

/// Returned when a search result could not be saved locally.
pub const SAVE_FAILED: &str = "Unable to save or analyze the image at this moment.";

const SYSTEM_PROMPT: &str = "You are a precise image analyzer. Describe exactly what you see in \
the image, focusing on the main subject and key details. Do not make assumptions or add details \
that aren't visible. If you see a specific subject (like a cat, person, or landscape), start by \
identifying it clearly.";

const USER_PROMPT: &str = "What do you see in this image? Provide a clear, accurate description \
of what is actually visible in the image.";

const MAX_TOKENS: u32 = 150;

pub struct DescriptionGenerator {
    client: Client,
    provider: Arc<dyn TextProvider>,
    vision_model: String,
    timeout: Duration,
}

impl DescriptionGenerator {
    pub fn new(
        client: Client,
        provider: Arc<dyn TextProvider>,
        vision_model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            provider,
            vision_model: vision_model.into(),
            timeout,
        }
    }

    /// Describe the image at `image_url`. Never fails; falls back to [`PLACEHOLDER`].
    #[tracing::instrument(skip(self))]
    pub async fn describe(&self, image_url: &str) -> String {
        if let Err(reason) = self.verify(image_url).await {
            tracing::warn!(error = %reason, "Image URL not reachable, skipping vision call");
            return PLACEHOLDER.to_string();
        }

        let messages = [
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(USER_PROMPT).with_image(image_url),
        ];
        let params = GenerationParams {
            model: Some(self.vision_model.clone()),
            max_tokens: Some(MAX_TOKENS),
            ..Default::default()
        };

        match self.provider.generate(&messages, &params).await {
            Ok(response) => match response.text() {
                Some(text) => text.to_string(),
                None => {
                    tracing::warn!("Vision provider returned no text");
                    PLACEHOLDER.to_string()
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Vision provider failed");
                PLACEHOLDER.to_string()
            }
        }
    }

    async fn verify(&self, image_url: &str) -> Result<(), String> {
        let response = self
            .client
            .head(image_url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(format!("HEAD returned {}", response.status()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::MockTextProvider;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn describer(provider: Arc<MockTextProvider>) -> DescriptionGenerator {
        DescriptionGenerator::new(Client::new(), provider, "gpt-4o", Duration::from_secs(2))
    }

    async fn reachable_image() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/a.jpg"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn returns_provider_text() {
        let server = reachable_image().await;
        let provider = Arc::new(MockTextProvider::with_reply(" A spiral galaxy. "));

        let text = describer(provider.clone())
            .describe(&format!("{}/a.jpg", server.uri()))
            .await;

        assert_eq!(text, "A spiral galaxy.");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn provider_failure_yields_placeholder() {
        let server = reachable_image().await;
        let provider = Arc::new(MockTextProvider::new(false));

        let text = describer(provider)
            .describe(&format!("{}/a.jpg", server.uri()))
            .await;

        assert_eq!(text, PLACEHOLDER);
    }

    #[tokio::test]
    async fn empty_answer_yields_placeholder() {
        let server = reachable_image().await;
        let provider = Arc::new(MockTextProvider::with_reply(""));

        let text = describer(provider)
            .describe(&format!("{}/a.jpg", server.uri()))
            .await;

        assert_eq!(text, PLACEHOLDER);
    }

    #[tokio::test]
    async fn unreachable_image_skips_provider() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let provider = Arc::new(MockTextProvider::with_reply("never used"));

        let text = describer(provider.clone())
            .describe(&format!("{}/gone.jpg", server.uri()))
            .await;

        assert_eq!(text, PLACEHOLDER);
        assert_eq!(provider.calls(), 0);
    }
}
