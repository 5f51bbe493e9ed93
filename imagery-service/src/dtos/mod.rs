pub mod ask;
pub mod images;

pub use ask::{AskRequest, AskResponse};
pub use images::{
    GenerateImageRequest, GenerateImageResponse, SearchImageRequest, SearchImageResponse,
};

use serde::{Deserialize, Deserializer};

/// Reads an explicit JSON `null` the same as a missing field.
pub(crate) fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
