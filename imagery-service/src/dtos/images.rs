use crate::models::Category;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SearchImageRequest {
    #[serde(default, deserialize_with = "crate::dtos::null_as_empty")]
    #[validate(length(min = 1, message = "No prompt provided"))]
    pub prompt: String,
    /// Routing category; anything unrecognised is treated as `other`.
    #[serde(default, deserialize_with = "crate::dtos::null_as_empty")]
    pub category: String,
}

impl SearchImageRequest {
    pub fn category(&self) -> Category {
        Category::parse(&self.category)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchImageResponse {
    pub url: String,
    pub description: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateImageRequest {
    #[serde(default, deserialize_with = "crate::dtos::null_as_empty")]
    #[validate(length(min = 1, message = "No prompt provided"))]
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateImageResponse {
    pub url: String,
}
