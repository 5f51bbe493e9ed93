use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default timeout for image source lookups and downloads.
const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 10;

/// Default timeout for completion/vision/image-generation calls.
const DEFAULT_AI_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ImageryConfig {
    pub common: core_config::Config,
    pub storage: StorageConfig,
    pub openai: OpenAiConfig,
    pub sources: SourcesConfig,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root for the daily cache and saved search results.
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Secret<String>,
    pub base_url: String,
    /// Model answering `/api/ask`.
    pub chat_model: String,
    /// Vision-capable model used for image descriptions.
    pub vision_model: String,
    /// Model behind the legacy `/api/generate-image` endpoint.
    pub image_model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct SourcesConfig {
    pub jwst: ApiEndpoint,
    pub artic: ApiEndpoint,
    pub unsplash: ApiEndpoint,
    pub nasa: ApiEndpoint,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct ApiEndpoint {
    pub base_url: String,
    pub api_key: Secret<String>,
}

impl ApiEndpoint {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: Secret::new(api_key.into()),
        }
    }
}

impl SourcesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl OpenAiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ImageryConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = common_config.is_prod();

        Ok(ImageryConfig {
            common: common_config,
            storage: StorageConfig {
                data_dir: PathBuf::from(get_env("IMAGERY_DATA_DIR", Some("data"), is_prod)?),
            },
            openai: OpenAiConfig {
                api_key: Secret::new(get_env("OPENAI_API_KEY", Some(""), is_prod)?),
                base_url: get_env(
                    "OPENAI_BASE_URL",
                    Some("https://api.openai.com/v1"),
                    is_prod,
                )?,
                chat_model: get_env("OPENAI_CHAT_MODEL", Some("gpt-3.5-turbo"), is_prod)?,
                vision_model: get_env("OPENAI_VISION_MODEL", Some("gpt-4o"), is_prod)?,
                image_model: get_env("OPENAI_IMAGE_MODEL", Some("dall-e-2"), is_prod)?,
                timeout_secs: get_env(
                    "OPENAI_TIMEOUT_SECS",
                    Some(&DEFAULT_AI_TIMEOUT_SECS.to_string()),
                    is_prod,
                )?
                .parse()
                .unwrap_or(DEFAULT_AI_TIMEOUT_SECS),
            },
            sources: SourcesConfig {
                jwst: ApiEndpoint::new(
                    get_env("JWST_BASE_URL", Some("https://api.jwstapi.com"), is_prod)?,
                    get_env("JWST_API_KEY", Some(""), is_prod)?,
                ),
                artic: ApiEndpoint::new(
                    get_env(
                        "ARTIC_BASE_URL",
                        Some("https://api.artic.edu/api/v1"),
                        is_prod,
                    )?,
                    String::new(),
                ),
                unsplash: ApiEndpoint::new(
                    get_env(
                        "UNSPLASH_BASE_URL",
                        Some("https://api.unsplash.com"),
                        is_prod,
                    )?,
                    get_env("UNSPLASH_ACCESS_KEY", Some("demo-key"), is_prod)?,
                ),
                nasa: ApiEndpoint::new(
                    get_env("NASA_BASE_URL", Some("https://api.nasa.gov"), is_prod)?,
                    get_env("NASA_API_KEY", Some("DEMO_KEY"), is_prod)?,
                ),
                timeout_secs: get_env(
                    "SOURCE_TIMEOUT_SECS",
                    Some(&DEFAULT_SOURCE_TIMEOUT_SECS.to_string()),
                    is_prod,
                )?
                .parse()
                .unwrap_or(DEFAULT_SOURCE_TIMEOUT_SECS),
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
