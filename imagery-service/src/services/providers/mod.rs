//! AI provider abstractions and implementations.
//!
//! Chat/vision completion and image generation sit behind traits so handlers
//! and the describer can run against the OpenAI-compatible backend or a mock.

pub mod mock;
pub mod openai;

pub use mock::{MockImageGenerator, MockTextProvider};
pub use openai::OpenAiProvider;

use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Short label used as a metric dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::ApiError(_) => "api_error",
            ProviderError::InvalidRequest(_) => "invalid_request",
            ProviderError::RateLimited => "rate_limited",
            ProviderError::NetworkError(_) => "network",
        }
    }
}

/// Result of a completion call.
#[derive(Debug, Clone, Default)]
pub struct ProviderResponse {
    /// Text of the first choice, if any.
    pub text: Option<String>,

    /// Input tokens consumed.
    pub input_tokens: u32,

    /// Output tokens generated.
    pub output_tokens: u32,
}

impl ProviderResponse {
    /// Trimmed text, or `None` when the provider answered with nothing.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessagePart {
    Text(String),
    ImageUrl(String),
}

/// One chat message: a role and one or more content parts.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub parts: Vec<MessagePart>,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            parts: vec![MessagePart::Text(text.into())],
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![MessagePart::Text(text.into())],
        }
    }

    /// Append an image reference to this message.
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.parts.push(MessagePart::ImageUrl(url.into()));
        self
    }
}

/// Generation parameters for completion requests.
#[derive(Debug, Clone, Default)]
pub struct GenerationParams {
    /// Overrides the provider's default chat model (e.g. the vision model).
    pub model: Option<String>,

    /// Temperature (0.0 - 2.0).
    pub temperature: Option<f32>,

    /// Maximum output tokens.
    pub max_tokens: Option<u32>,
}

/// Trait for chat/vision completion providers.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Generate a completion for the conversation.
    async fn generate(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;
}

/// Trait for text-to-image providers.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate one image and return its URL.
    async fn generate_image(&self, prompt: &str) -> Result<String, ProviderError>;
}
