//! Mock provider implementations for testing.

use super::{
    ChatMessage, GenerationParams, ImageGenerator, MessagePart, ProviderError, ProviderResponse,
    TextProvider,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock text provider for testing.
///
/// Answers with a fixed reply, or fails with `NotConfigured` when disabled.
pub struct MockTextProvider {
    enabled: bool,
    reply: Option<String>,
    calls: AtomicUsize,
}

impl MockTextProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            reply: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always answer with `reply` (an empty string simulates "no content").
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            enabled: true,
            reply: Some(reply.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `generate` calls seen so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(
        &self,
        messages: &[ChatMessage],
        _params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ));
        }

        let last_text = messages
            .iter()
            .rev()
            .flat_map(|m| m.parts.iter())
            .find_map(|p| match p {
                MessagePart::Text(text) => Some(text.as_str()),
                MessagePart::ImageUrl(_) => None,
            })
            .unwrap_or_default();

        let text = self
            .reply
            .clone()
            .unwrap_or_else(|| format!("Mock response for: {}", last_text));

        Ok(ProviderResponse {
            input_tokens: last_text.len() as u32 / 4,
            output_tokens: text.len() as u32 / 4,
            text: Some(text),
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.enabled {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ))
        }
    }
}

/// Mock image generator for testing.
pub struct MockImageGenerator {
    enabled: bool,
}

impl MockImageGenerator {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait]
impl ImageGenerator for MockImageGenerator {
    async fn generate_image(&self, prompt: &str) -> Result<String, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock image generator not enabled".to_string(),
            ));
        }

        let slug: String = prompt
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        Ok(format!("https://mock.images.local/{}.png", slug))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echoes_last_text_part() {
        let provider = MockTextProvider::new(true);
        let response = provider
            .generate(
                &[ChatMessage::system("sys"), ChatMessage::user("hello")],
                &GenerationParams::default(),
            )
            .await
            .unwrap();

        assert_eq!(response.text(), Some("Mock response for: hello"));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn disabled_mocks_fail() {
        assert!(MockTextProvider::new(false)
            .generate(&[ChatMessage::user("x")], &GenerationParams::default())
            .await
            .is_err());
        assert!(MockImageGenerator::new(false)
            .generate_image("x")
            .await
            .is_err());
    }
}
