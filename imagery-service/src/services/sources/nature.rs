//! Nature/earth imagery: a random descriptive phrase handed to keyword search.

use super::{pick, ImageSource, SourceError, SourceImage};
use async_trait::async_trait;
use std::sync::Arc;

pub const NATURE_PHRASES: [&str; 8] = [
    "pristine nature landscape",
    "mountain wilderness",
    "forest waterfall",
    "dramatic landscape",
    "natural scenery",
    "wildlife nature",
    "scenic landscape",
    "nature photography",
];

pub struct NatureSource {
    search: Arc<dyn ImageSource>,
}

impl NatureSource {
    pub fn new(search: Arc<dyn ImageSource>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl ImageSource for NatureSource {
    fn name(&self) -> &'static str {
        "nature"
    }

    async fn try_fetch(&self, _query_hint: Option<&str>) -> Result<SourceImage, SourceError> {
        let phrase = *pick(&NATURE_PHRASES).unwrap_or(&NATURE_PHRASES[0]);
        tracing::debug!(phrase, "Searching nature imagery");
        self.search.try_fetch(Some(phrase)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSearch {
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ImageSource for RecordingSearch {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn try_fetch(&self, query_hint: Option<&str>) -> Result<SourceImage, SourceError> {
            self.queries
                .lock()
                .unwrap()
                .push(query_hint.unwrap_or_default().to_string());
            SourceImage::new("https://images.example/nature.jpg")
        }
    }

    #[tokio::test]
    async fn delegates_with_a_phrase_from_the_list() {
        let search = Arc::new(RecordingSearch::default());
        let nature = NatureSource::new(search.clone());

        for _ in 0..5 {
            let image = nature.fetch(Some("ignored hint")).await.unwrap();
            assert_eq!(image.url, "https://images.example/nature.jpg");
        }

        let queries = search.queries.lock().unwrap();
        assert_eq!(queries.len(), 5);
        assert!(queries.iter().all(|q| NATURE_PHRASES.contains(&q.as_str())));
    }
}
