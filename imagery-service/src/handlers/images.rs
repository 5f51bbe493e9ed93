use crate::dtos::{
    GenerateImageRequest, GenerateImageResponse, SearchImageRequest, SearchImageResponse,
};
use crate::services::describer::SAVE_FAILED;
use crate::services::storage::retrieved_image_key;
use crate::startup::AppState;
use axum::{extract::State, Json};
use chrono::Local;
use service_core::error::AppError;
use validator::Validate;

/// Resolve an image for the category, save it locally and describe it.
#[tracing::instrument(skip(state, request))]
pub async fn search_image(
    State(state): State<AppState>,
    Json(request): Json<SearchImageRequest>,
) -> Result<Json<SearchImageResponse>, AppError> {
    request.validate()?;

    let category = request.category();
    tracing::info!(category = %category, prompt = %request.prompt, "Searching for image");

    let url = state.resolver.resolve(category).await;
    let key = retrieved_image_key(&url, Local::now().naive_local());

    // The vision call only runs once the image is safely on disk.
    let description = match state.downloader.download(&url, &key).await {
        Ok(_) => state.describer.describe(&url).await,
        Err(e) => {
            tracing::warn!(error = %e, url = %url, "Failed to save search result");
            SAVE_FAILED.to_string()
        }
    };

    Ok(Json(SearchImageResponse { url, description }))
}

#[tracing::instrument(skip(state, request))]
pub async fn generate_image(
    State(state): State<AppState>,
    Json(request): Json<GenerateImageRequest>,
) -> Result<Json<GenerateImageResponse>, AppError> {
    request.validate()?;

    let url = state
        .image_generator
        .generate_image(&request.prompt)
        .await
        .map_err(|e| AppError::Upstream(format!("Error from image provider: {}", e)))?;

    Ok(Json(GenerateImageResponse { url }))
}
