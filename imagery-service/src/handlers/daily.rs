use crate::models::{Category, DailyRecord};
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

pub async fn daily_images(State(state): State<AppState>) -> Result<Json<DailyRecord>, AppError> {
    let record = state.daily.daily_images().await?;
    Ok(Json(record))
}

pub async fn daily_image(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let bytes = state.daily.daily_image(Category::parse(&kind)).await?;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes))
}
