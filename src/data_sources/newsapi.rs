//! NewsAPI client for weather headlines.
//!
//! # API Reference
//!
//! See: <https://newsapi.org/docs/endpoints/top-headlines>

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::NewsError;

/// Base URL for NewsAPI.
const NEWSAPI_BASE: &str = "https://newsapi.org/v2";

/// NewsAPI rejects requests without a user agent.
const USER_AGENT: &str = concat!("skywatch/", env!("CARGO_PKG_VERSION"));

/// Client for the NewsAPI top-headlines endpoint.
#[derive(Clone)]
pub struct NewsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NewsClient {
    /// Create a new client against the public API.
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(NEWSAPI_BASE, api_key)
    }

    /// Create a client with a custom base URL (for testing).
    pub fn with_base_url(base_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Fetch the top headlines matching a keyword.
    ///
    /// # Arguments
    ///
    /// * `keyword` - Search term, e.g. "weather"
    /// * `language` - ISO 639-1 language code, e.g. "en"
    /// * `page_size` - Maximum number of headlines to return
    ///
    /// Articles without a title or URL are skipped.
    ///
    /// # Errors
    ///
    /// [`NewsError::Unavailable`] on transport failure, non-success status, or
    /// a body without an `articles` list.
    pub async fn top_headlines(
        &self,
        keyword: &str,
        language: &str,
        page_size: u8,
    ) -> Result<Vec<Headline>, NewsError> {
        let url = format!(
            "{}/top-headlines?q={}&language={}&pageSize={}",
            self.base_url,
            urlencoding::encode(keyword),
            urlencoding::encode(language),
            page_size
        );

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| NewsError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = %status, "NewsAPI returned non-success status");
            return Err(NewsError::Unavailable(format!("status {}", status)));
        }

        let data = response
            .json::<NewsResponse>()
            .await
            .map_err(|e| NewsError::Unavailable(e.to_string()))?;

        let articles = data.articles.ok_or_else(|| {
            NewsError::Unavailable(
                data.message
                    .unwrap_or_else(|| "response has no articles".to_string()),
            )
        })?;

        Ok(articles
            .into_iter()
            .filter_map(Article::into_headline)
            .take(usize::from(page_size))
            .collect())
    }
}

/// A headline as shown on the home page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
}

/// Response from the top-headlines endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct NewsResponse {
    #[serde(default)]
    pub articles: Option<Vec<Article>>,

    /// Error message when `status` is "error".
    #[serde(default)]
    pub message: Option<String>,
}

/// A single article. NewsAPI sends `null` for many fields.
#[derive(Debug, Clone, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

impl Article {
    fn into_headline(self) -> Option<Headline> {
        Some(Headline {
            title: self.title.filter(|t| !t.is_empty())?,
            url: self.url.filter(|u| !u.is_empty())?,
            description: self.description.filter(|d| !d.trim().is_empty()),
        })
    }
}
