use imagery_service::config::{
    ApiEndpoint, ImageryConfig, OpenAiConfig, SourcesConfig, StorageConfig,
};
use imagery_service::startup::Application;
use secrecy::Secret;
use serde_json::Value;
use service_core::config::Config as CoreConfig;
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::MockServer;

/// A running service whose every outbound API points at one mock server.
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
    pub upstream: MockServer,
    pub data_dir: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let upstream = MockServer::start().await;
        let data_dir = tempfile::tempdir().expect("Failed to create data dir");

        let config = ImageryConfig {
            common: CoreConfig {
                port: 0,
                ..CoreConfig::default()
            },
            storage: StorageConfig {
                data_dir: data_dir.path().to_path_buf(),
            },
            openai: OpenAiConfig {
                api_key: Secret::new("sk-test".to_string()),
                base_url: upstream.uri(),
                chat_model: "gpt-3.5-turbo".to_string(),
                vision_model: "gpt-4o".to_string(),
                image_model: "dall-e-2".to_string(),
                timeout_secs: 5,
            },
            sources: SourcesConfig {
                jwst: ApiEndpoint::new(upstream.uri(), "jwst-test"),
                artic: ApiEndpoint::new(upstream.uri(), ""),
                unsplash: ApiEndpoint::new(upstream.uri(), "unsplash-test"),
                nasa: ApiEndpoint::new(upstream.uri(), "DEMO_KEY"),
                timeout_secs: 5,
            },
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
            upstream,
            data_dir,
        }
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// URL of a file served by the mock upstream.
    pub fn upstream_url(&self, path: &str) -> String {
        format!("{}{}", self.upstream.uri(), path)
    }

    pub fn data_path(&self, key: &str) -> PathBuf {
        self.data_dir.path().join(key)
    }
}
