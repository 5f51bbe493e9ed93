//! Once-per-day snapshot of one image per curated category.
//!
//! The first request of a calendar day fetches space, earth and art images,
//! saves their bytes and a JSON record under `daily/`, and every later
//! request that day is served from disk. Nothing guards concurrent first
//! requests: both may fetch, and the last writer's files win.

use crate::models::{Category, DailyRecord, ImageResult};
use crate::services::describer::DescriptionGenerator;
use crate::services::metrics;
use crate::services::sources::ImageSource;
use crate::services::storage::{ImageDownloader, LocalStorage, DAILY_DIR};
use chrono::{Local, NaiveDate};
use service_core::error::AppError;
use std::sync::Arc;

pub fn record_key(date: NaiveDate) -> String {
    format!("{}/daily_data_{}.json", DAILY_DIR, date.format("%Y-%m-%d"))
}

pub fn image_key(category: Category, date: NaiveDate) -> String {
    format!("{}/{}_{}.jpg", DAILY_DIR, category, date.format("%Y-%m-%d"))
}

fn default_title(category: Category) -> &'static str {
    match category {
        Category::Space => "Astronomy Picture of the Day",
        Category::Earth => "Nature Image of the Day",
        Category::Art => "Artwork of the Day",
        Category::Other => "Image of the Day",
    }
}

pub struct DailyCacheManager {
    storage: Arc<LocalStorage>,
    downloader: Arc<ImageDownloader>,
    describer: Arc<DescriptionGenerator>,
    space: Arc<dyn ImageSource>,
    earth: Arc<dyn ImageSource>,
    art: Arc<dyn ImageSource>,
}

impl DailyCacheManager {
    pub fn new(
        storage: Arc<LocalStorage>,
        downloader: Arc<ImageDownloader>,
        describer: Arc<DescriptionGenerator>,
        space: Arc<dyn ImageSource>,
        earth: Arc<dyn ImageSource>,
        art: Arc<dyn ImageSource>,
    ) -> Self {
        Self {
            storage,
            downloader,
            describer,
            space,
            earth,
            art,
        }
    }

    /// Today's record, fetched on the first call of the day.
    pub async fn daily_images(&self) -> Result<DailyRecord, AppError> {
        self.daily_images_for(Local::now().date_naive()).await
    }

    #[tracing::instrument(skip(self), fields(date = %date))]
    pub async fn daily_images_for(&self, date: NaiveDate) -> Result<DailyRecord, AppError> {
        if let Some(record) = self.load(date).await? {
            metrics::record_daily_cache("hit");
            tracing::debug!(categories = record.len(), "Serving cached daily images");
            return Ok(record);
        }

        metrics::record_daily_cache("miss");
        tracing::info!("No daily record yet, fetching images");

        let mut record = DailyRecord::default();
        for category in Category::DAILY {
            match self.capture(category, date).await {
                Ok(image) => record.insert(image),
                Err(e) => {
                    tracing::warn!(category = %category, error = %e, "Daily image unavailable")
                }
            }
        }

        if record.is_empty() {
            metrics::record_daily_cache("empty");
            tracing::warn!("Every daily category failed, nothing persisted");
            return Ok(record);
        }

        let json = serde_json::to_vec_pretty(&record)?;
        if let Err(e) = self.storage.write(&record_key(date), &json).await {
            tracing::error!(error = %e, "Failed to persist daily record");
        }

        Ok(record)
    }

    /// Bytes of today's image for `category`.
    pub async fn daily_image(&self, category: Category) -> Result<Vec<u8>, AppError> {
        self.daily_image_for(category, Local::now().date_naive())
            .await
    }

    pub async fn daily_image_for(
        &self,
        category: Category,
        date: NaiveDate,
    ) -> Result<Vec<u8>, AppError> {
        let not_found = || {
            AppError::NotFound(anyhow::anyhow!(
                "No daily image for {} on {}",
                category,
                date
            ))
        };

        if !category.is_daily() {
            return Err(not_found());
        }

        self.storage
            .read(&image_key(category, date))
            .await?
            .ok_or_else(not_found)
    }

    /// A stored record that is missing or unreadable counts as absent.
    async fn load(&self, date: NaiveDate) -> Result<Option<DailyRecord>, AppError> {
        let Some(bytes) = self.storage.read(&record_key(date)).await? else {
            return Ok(None);
        };

        match serde_json::from_slice::<DailyRecord>(&bytes) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::warn!(error = %e, "Daily record is corrupt, refetching");
                Ok(None)
            }
        }
    }

    fn source_for(&self, category: Category) -> Option<&Arc<dyn ImageSource>> {
        match category {
            Category::Space => Some(&self.space),
            Category::Earth => Some(&self.earth),
            Category::Art => Some(&self.art),
            Category::Other => None,
        }
    }

    async fn capture(&self, category: Category, date: NaiveDate) -> Result<ImageResult, AppError> {
        let source = self.source_for(category).ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!("{} is not cached daily", category))
        })?;

        let image = source
            .fetch(None)
            .await
            .ok_or_else(|| AppError::Upstream(format!("{} returned no image", source.name())))?;

        let key = image_key(category, date);
        self.downloader.download(&image.url, &key).await?;

        let description = match image.description {
            Some(description) => description,
            None => self.describer.describe(&image.url).await,
        };

        Ok(ImageResult {
            source_category: category,
            url: Some(image.url),
            local_path: Some(key),
            title: image
                .title
                .unwrap_or_else(|| default_title(category).to_string()),
            description,
            captured_at_date: date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::MockTextProvider;
    use crate::services::sources::{SourceError, SourceImage};
    use async_trait::async_trait;
    use reqwest::Client;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Fixed {
        image: Option<SourceImage>,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn new(image: Option<SourceImage>) -> Arc<Self> {
            Arc::new(Self {
                image,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ImageSource for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn try_fetch(&self, _query_hint: Option<&str>) -> Result<SourceImage, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.image
                .clone()
                .ok_or_else(|| SourceError::NoImage("fixed".into()))
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    async fn image_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF]))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        server
    }

    fn image_at(server: &MockServer, name: &str) -> SourceImage {
        SourceImage::new(&format!("{}/{}.jpg", server.uri(), name)).unwrap()
    }

    async fn manager(
        dir: &tempfile::TempDir,
        space: Arc<Fixed>,
        earth: Arc<Fixed>,
        art: Arc<Fixed>,
    ) -> DailyCacheManager {
        let client = Client::new();
        let storage = Arc::new(LocalStorage::new(dir.path()).await.unwrap());
        let downloader = Arc::new(ImageDownloader::new(
            client.clone(),
            storage.clone(),
            Duration::from_secs(2),
        ));
        let describer = Arc::new(DescriptionGenerator::new(
            client,
            Arc::new(MockTextProvider::with_reply("Generated description")),
            "gpt-4o",
            Duration::from_secs(2),
        ));
        DailyCacheManager::new(storage, downloader, describer, space, earth, art)
    }

    #[test]
    fn keys_follow_daily_layout() {
        assert_eq!(record_key(date()), "daily/daily_data_2024-05-01.json");
        assert_eq!(image_key(Category::Art, date()), "daily/art_2024-05-01.jpg");
    }

    #[tokio::test]
    async fn second_call_is_served_from_disk() {
        let server = image_server().await;
        let dir = tempfile::tempdir().unwrap();
        let space = Fixed::new(Some(
            image_at(&server, "apod").with_title(Some("Pillars".into())),
        ));
        let earth = Fixed::new(Some(image_at(&server, "earth")));
        let art = Fixed::new(Some(
            image_at(&server, "art").with_description(Some("Claude Monet".into())),
        ));
        let cache = manager(&dir, space.clone(), earth.clone(), art.clone()).await;

        let first = cache.daily_images_for(date()).await.unwrap();
        let second = cache.daily_images_for(date()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert_eq!(space.calls.load(Ordering::SeqCst), 1);
        assert_eq!(earth.calls.load(Ordering::SeqCst), 1);
        assert_eq!(art.calls.load(Ordering::SeqCst), 1);

        let space_image = first.get(Category::Space).unwrap();
        assert_eq!(space_image.title, "Pillars");
        assert_eq!(space_image.description, "Generated description");
        assert_eq!(first.get(Category::Art).unwrap().description, "Claude Monet");
        assert!(dir.path().join("daily/daily_data_2024-05-01.json").exists());
    }

    #[tokio::test]
    async fn failed_category_is_omitted() {
        let server = image_server().await;
        let dir = tempfile::tempdir().unwrap();
        let cache = manager(
            &dir,
            Fixed::new(None),
            Fixed::new(Some(image_at(&server, "earth"))),
            Fixed::new(Some(image_at(&server, "art"))),
        )
        .await;

        let record = cache.daily_images_for(date()).await.unwrap();

        let categories: Vec<Category> = record.images.keys().copied().collect();
        assert_eq!(categories, vec![Category::Art, Category::Earth]);
        assert!(matches!(
            cache.daily_image_for(Category::Space, date()).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(
            cache.daily_image_for(Category::Earth, date()).await.unwrap(),
            vec![0xFF, 0xD8, 0xFF]
        );
    }

    #[tokio::test]
    async fn all_failed_day_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let space = Fixed::new(None);
        let cache = manager(&dir, space.clone(), Fixed::new(None), Fixed::new(None)).await;

        assert!(cache.daily_images_for(date()).await.unwrap().is_empty());
        assert!(cache.daily_images_for(date()).await.unwrap().is_empty());

        assert_eq!(space.calls.load(Ordering::SeqCst), 2);
        assert!(!dir.path().join("daily/daily_data_2024-05-01.json").exists());
    }

    #[tokio::test]
    async fn corrupt_record_is_refetched() {
        let server = image_server().await;
        let dir = tempfile::tempdir().unwrap();
        let earth = Fixed::new(Some(image_at(&server, "earth")));
        let cache = manager(&dir, Fixed::new(None), earth.clone(), Fixed::new(None)).await;

        std::fs::create_dir_all(dir.path().join("daily")).unwrap();
        std::fs::write(dir.path().join("daily/daily_data_2024-05-01.json"), "{not json").unwrap();

        let record = cache.daily_images_for(date()).await.unwrap();

        assert_eq!(record.len(), 1);
        assert_eq!(earth.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn other_category_is_never_served() {
        let dir = tempfile::tempdir().unwrap();
        let cache = manager(&dir, Fixed::new(None), Fixed::new(None), Fixed::new(None)).await;

        assert!(matches!(
            cache.daily_image_for(Category::Other, date()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
