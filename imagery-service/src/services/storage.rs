use anyhow::anyhow;
use chrono::NaiveDateTime;
use reqwest::{Client, Response};
use service_core::error::AppError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Directory for the per-day image cache.
pub const DAILY_DIR: &str = "daily";

/// Directory for images saved by `/api/search-image`.
pub const RETRIEVED_DIR: &str = "retrieved_images";

const SAVED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

/// File store rooted at the data directory. Keys are relative paths.
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub async fn new(base_path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let base_path = base_path.into();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).await?;
        }
        Ok(Self { base_path })
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }

    pub async fn write(&self, key: &str, data: &[u8]) -> Result<(), AppError> {
        let path = self.prepare(key).await?;
        fs::write(path, data).await?;
        Ok(())
    }

    /// Contents of `key`, or `None` when it does not exist.
    pub async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        match fs::read(self.path_for(key)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Stream an HTTP body to `key` chunk by chunk. A partial file is removed on failure.
    pub async fn write_response(&self, key: &str, mut response: Response) -> Result<u64, AppError> {
        let path = self.prepare(key).await?;
        let file = fs::File::create(&path).await?;

        let result = stream_to(file, &mut response).await;

        if result.is_err() {
            let _ = fs::remove_file(&path).await;
        }
        result
    }

    /// Whether the root directory can be listed; used by `/ready`.
    pub async fn is_usable(&self) -> bool {
        fs::metadata(&self.base_path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    async fn prepare(&self, key: &str) -> Result<PathBuf, AppError> {
        if key.is_empty() || Path::new(key).is_absolute() || key.split('/').any(|s| s == "..") {
            return Err(AppError::InternalError(anyhow!(
                "invalid storage key: {:?}",
                key
            )));
        }
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(path)
    }
}

async fn stream_to(mut file: fs::File, response: &mut Response) -> Result<u64, AppError> {
    let mut written = 0u64;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| AppError::Upstream(format!("Image body read failed: {}", e)))?
    {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

/// Fetches remote images into [`LocalStorage`].
pub struct ImageDownloader {
    client: Client,
    storage: Arc<LocalStorage>,
    timeout: Duration,
}

impl ImageDownloader {
    pub fn new(client: Client, storage: Arc<LocalStorage>, timeout: Duration) -> Self {
        Self {
            client,
            storage,
            timeout,
        }
    }

    /// Download `url` to `key`, returning the local path.
    #[tracing::instrument(skip(self))]
    pub async fn download(&self, url: &str, key: &str) -> Result<PathBuf, AppError> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Image download failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Image download returned {}",
                response.status()
            )));
        }

        let bytes = self.storage.write_response(key, response).await?;
        tracing::info!(bytes, key, "Image saved");

        Ok(self.storage.path_for(key))
    }
}

/// Key for a saved search result: `retrieved_images/image_{YYYYmmdd_HHMMSS}.{ext}`.
pub fn retrieved_image_key(url: &str, now: NaiveDateTime) -> String {
    format!(
        "{}/image_{}.{}",
        RETRIEVED_DIR,
        now.format("%Y%m%d_%H%M%S"),
        extension_of(url)
    )
}

/// Extension from the URL path when it is a known image type, else `jpg`.
fn extension_of(url: &str) -> String {
    let path = reqwest::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| {
            url.split(|c: char| c == '?' || c == '#')
                .next()
                .unwrap_or_default()
                .to_string()
        });

    path.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| SAVED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or_else(|| "jpg".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn retrieved_key_uses_timestamp_and_known_extension() {
        assert_eq!(
            retrieved_image_key("https://img.example/a/photo.PNG?w=100", at(8, 5, 3)),
            "retrieved_images/image_20240309_080503.png"
        );
        assert_eq!(
            retrieved_image_key("https://img.example/photo-123?ixid=abc.def", at(8, 5, 3)),
            "retrieved_images/image_20240309_080503.jpg"
        );
        assert_eq!(
            retrieved_image_key("https://img.example/doc.webp", at(23, 59, 59)),
            "retrieved_images/image_20240309_235959.jpg"
        );
    }

    #[tokio::test]
    async fn write_then_read_and_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("data")).await.unwrap();

        storage.write("daily/x.json", b"{}").await.unwrap();

        assert_eq!(storage.read("daily/x.json").await.unwrap().unwrap(), b"{}");
        assert_eq!(storage.read("daily/missing.json").await.unwrap(), None);
        assert!(storage.is_usable().await);
    }

    #[tokio::test]
    async fn escaping_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        assert!(storage.write("../outside.txt", b"x").await.is_err());
        assert!(storage.write("", b"x").await.is_err());
    }

    #[tokio::test]
    async fn download_streams_body_to_disk() {
        let server = MockServer::start().await;
        let body = vec![7u8; 64 * 1024];
        Mock::given(method("GET"))
            .and(path("/img.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(LocalStorage::new(dir.path()).await.unwrap());
        let downloader =
            ImageDownloader::new(Client::new(), storage.clone(), Duration::from_secs(2));

        let saved = downloader
            .download(&format!("{}/img.jpg", server.uri()), "daily/space_2024-03-09.jpg")
            .await
            .unwrap();

        assert_eq!(saved, dir.path().join("daily/space_2024-03-09.jpg"));
        assert_eq!(std::fs::read(saved).unwrap(), body);
    }

    #[tokio::test]
    async fn non_success_download_writes_nothing() {
        let server = MockServer::start().await;
        Mock::given(path("/img.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(LocalStorage::new(dir.path()).await.unwrap());
        let downloader =
            ImageDownloader::new(Client::new(), storage.clone(), Duration::from_secs(2));

        let result = downloader
            .download(&format!("{}/img.jpg", server.uri()), "daily/art.jpg")
            .await;

        assert!(matches!(result, Err(AppError::Upstream(_))));
        assert_eq!(storage.read("daily/art.jpg").await.unwrap(), None);
    }
}
