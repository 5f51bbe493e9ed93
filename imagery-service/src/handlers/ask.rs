use crate::dtos::{AskRequest, AskResponse};
use crate::services::providers::{ChatMessage, GenerationParams};
use crate::startup::AppState;
use axum::{extract::State, Json};
use service_core::error::AppError;
use validator::Validate;

const SYSTEM_PROMPT: &str = "You are an image retrieval assistant and a college level professor \
that explains the interesting or important facts of the image that you retrieve. you only \
explain images that you've retrieved.";

const NO_RESPONSE: &str = "Sorry, no response received from API.";

#[tracing::instrument(skip(state, request))]
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    request.validate()?;

    let messages = [
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(request.question.as_str()),
    ];
    let params = GenerationParams {
        temperature: Some(0.7),
        max_tokens: Some(150),
        ..Default::default()
    };

    let response = state
        .text_provider
        .generate(&messages, &params)
        .await
        .map_err(|e| AppError::Upstream(format!("Error from text provider: {}", e)))?;

    let answer = response
        .text()
        .ok_or_else(|| AppError::Upstream(NO_RESPONSE.to_string()))?;

    tracing::info!(answer_len = answer.len(), "Answered question");

    Ok(Json(AskResponse {
        answer: answer.to_string(),
    }))
}
