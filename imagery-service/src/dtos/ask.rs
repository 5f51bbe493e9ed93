use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct AskRequest {
    #[serde(default, deserialize_with = "crate::dtos::null_as_empty")]
    #[validate(length(min = 1, message = "No question provided"))]
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}
