//! Runtime configuration, read from the environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `OPENWEATHER_API_KEY` | required |
//! | `NEWSAPI_API_KEY` | required |
//! | `SKYWATCH_PORT` | `3000` |
//! | `SKYWATCH_MODEL_PATH` | `models/cbmodel.json` |
//! | `SKYWATCH_DEFAULT_CITY` | `Mumbai` |
//! | `SKYWATCH_NEWS_KEYWORD` | `weather` |
//! | `SKYWATCH_NEWS_LANGUAGE` | `en` |
//! | `SKYWATCH_NEWS_PAGE_SIZE` | `4` |
//! | `OPENWEATHER_BASE_URL`, `NEWSAPI_BASE_URL`, `IPINFO_BASE_URL` | public endpoints |
//!
//! A `.env` file in the working directory is honoured; see `main`.

use std::path::PathBuf;

use crate::dashboard::DashboardConfig;
use crate::error::ConfigError;

/// Default port if not specified via environment variable.
pub const DEFAULT_PORT: u16 = 3000;

/// Default location of the classifier artifact.
pub const DEFAULT_MODEL_PATH: &str = "models/cbmodel.json";

/// Everything the binary needs to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub model_path: PathBuf,
    pub dashboard: DashboardConfig,
}

impl AppConfig {
    /// Read the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingCredential`] if either API key is unset or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| var(key).ok_or(ConfigError::MissingCredential(key));

        let mut dashboard = DashboardConfig::new(
            &required("OPENWEATHER_API_KEY")?,
            &required("NEWSAPI_API_KEY")?,
        );

        if let Some(city) = var("SKYWATCH_DEFAULT_CITY") {
            dashboard.default_city = city;
        }
        if let Some(keyword) = var("SKYWATCH_NEWS_KEYWORD") {
            dashboard.news_keyword = keyword;
        }
        if let Some(language) = var("SKYWATCH_NEWS_LANGUAGE") {
            dashboard.news_language = language;
        }
        if let Some(size) = var("SKYWATCH_NEWS_PAGE_SIZE").and_then(|s| s.parse().ok()) {
            dashboard.news_page_size = size;
        }
        dashboard.openweather_base_url = var("OPENWEATHER_BASE_URL");
        dashboard.news_base_url = var("NEWSAPI_BASE_URL");
        dashboard.ipinfo_base_url = var("IPINFO_BASE_URL");

        let port = var("SKYWATCH_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let model_path = var("SKYWATCH_MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH));

        Ok(Self {
            port,
            model_path,
            dashboard,
        })
    }
}
