use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Curated image theme a request is routed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Space,
    Art,
    Earth,
    Other,
}

impl Category {
    /// Categories captured by the daily cache, in capture order.
    pub const DAILY: [Category; 3] = [Category::Space, Category::Earth, Category::Art];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Space => "space",
            Category::Art => "art",
            Category::Earth => "earth",
            Category::Other => "other",
        }
    }

    /// Lenient parse: anything unrecognised is `Other`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "space" => Category::Space,
            "art" => Category::Art,
            "earth" => Category::Earth,
            _ => Category::Other,
        }
    }

    pub fn is_daily(&self) -> bool {
        Category::DAILY.contains(self)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fetched image and what is known about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResult {
    pub source_category: Category,
    pub url: Option<String>,
    pub local_path: Option<String>,
    pub title: String,
    pub description: String,
    pub captured_at_date: NaiveDate,
}

/// The per-day snapshot persisted as `daily_data_{date}.json`.
///
/// Categories whose fetch failed are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DailyRecord {
    pub images: BTreeMap<Category, ImageResult>,
}

impl DailyRecord {
    pub fn insert(&mut self, image: ImageResult) {
        self.images.insert(image.source_category, image);
    }

    pub fn get(&self, category: Category) -> Option<&ImageResult> {
        self.images.get(&category)
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }
}
