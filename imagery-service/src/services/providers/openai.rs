//! OpenAI-compatible provider implementation.
//!
//! Speaks `/chat/completions` (text and vision) and `/images/generations`
//! with bearer auth. Any server exposing the same surface works by pointing
//! `OPENAI_BASE_URL` at it.

use super::{
    ChatMessage, GenerationParams, ImageGenerator, MessagePart, ProviderError, ProviderResponse,
    TextProvider,
};
use crate::config::OpenAiConfig;
use crate::services::metrics;
use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

const PROVIDER_NAME: &str = "openai";
const IMAGE_SIZE: &str = "1024x1024";

pub struct OpenAiProvider {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(client: Client, config: OpenAiConfig) -> Self {
        Self { config, client }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        let key = self.config.api_key.expose_secret();
        if key.trim().is_empty() {
            return Err(ProviderError::NotConfigured(
                "OpenAI API key not configured".to_string(),
            ));
        }
        Ok(key)
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Response, ProviderError> {
        let key = self.api_key()?;

        let response = self
            .client
            .post(self.api_url(path))
            .bearer_auth(key)
            .timeout(self.config.timeout())
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        check_status(response).await
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        if messages.is_empty() {
            return Err(ProviderError::InvalidRequest(
                "at least one message is required".to_string(),
            ));
        }

        let model = params
            .model
            .clone()
            .unwrap_or_else(|| self.config.chat_model.clone());

        let request = ChatCompletionRequest {
            model: &model,
            messages: messages.iter().map(WireMessage::from).collect(),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        tracing::debug!(
            model = %model,
            message_count = messages.len(),
            "Sending chat completion request"
        );

        let api_response: ChatCompletionResponse = self
            .post("chat/completions", &request)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

        let text = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content);
        let usage = api_response.usage.unwrap_or_default();

        Ok(ProviderResponse {
            text,
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
        })
    }

    async fn image(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = ImageGenerationRequest {
            model: &self.config.image_model,
            prompt,
            n: 1,
            size: IMAGE_SIZE,
        };

        let api_response: ImageGenerationResponse = self
            .post("images/generations", &request)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

        api_response
            .data
            .into_iter()
            .find_map(|d| d.url.filter(|u| !u.trim().is_empty()))
            .ok_or_else(|| ProviderError::ApiError("Response contained no image URL".to_string()))
    }
}

async fn check_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status.as_u16() == 429 {
        return Err(ProviderError::RateLimited);
    }

    let error_text = response.text().await.unwrap_or_default();
    Err(ProviderError::ApiError(format!(
        "OpenAI API error {}: {}",
        status, error_text
    )))
}

fn observe<T>(result: Result<T, ProviderError>) -> Result<T, ProviderError> {
    if let Err(e) = &result {
        metrics::record_provider_error(PROVIDER_NAME, e.kind());
        tracing::warn!(provider = PROVIDER_NAME, error = %e, "Provider call failed");
    }
    result
}

#[async_trait]
impl TextProvider for OpenAiProvider {
    async fn generate(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        observe(self.chat(messages, params).await)
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        self.api_key().map(|_| ())
    }
}

#[async_trait]
impl ImageGenerator for OpenAiProvider {
    async fn generate_image(&self, prompt: &str) -> Result<String, ProviderError> {
        observe(self.image(prompt).await)
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: WireContent<'a>,
}

/// A lone text part goes out as a plain string, anything else as parts.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WireContent<'a> {
    Text(&'a str),
    Parts(Vec<WirePart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WirePart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: WireImageUrl<'a> },
}

/// Image parts are always analysed at full resolution.
const IMAGE_DETAIL: &str = "high";

#[derive(Debug, Serialize)]
struct WireImageUrl<'a> {
    url: &'a str,
    detail: &'static str,
}

impl<'a> From<&'a ChatMessage> for WireMessage<'a> {
    fn from(message: &'a ChatMessage) -> Self {
        let content = match message.parts.as_slice() {
            [MessagePart::Text(text)] => WireContent::Text(text),
            parts => WireContent::Parts(
                parts
                    .iter()
                    .map(|part| match part {
                        MessagePart::Text(text) => WirePart::Text { text },
                        MessagePart::ImageUrl(url) => WirePart::ImageUrl {
                            image_url: WireImageUrl {
                                url,
                                detail: IMAGE_DETAIL,
                            },
                        },
                    })
                    .collect(),
            ),
        };

        Self {
            role: message.role.as_str(),
            content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ImageGenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    #[serde(default)]
    url: Option<String>,
}
