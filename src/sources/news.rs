use crate::config::deserialize_option_parsed;
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Stands in for the news block when the provider returns nothing.
pub const NO_NEWS_PLACEHOLDER: &str = "No news available.";

pub const DEFAULT_PAGE_SIZE: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum NewsError {
    #[error("Invalid news base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("News API error (status {status}): {body}")]
    ApiStatus { status: u16, body: String },
    #[error("News API rejected the request ({code}): {message}")]
    Api { code: String, message: String },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Deserialize, Debug, Clone)]
pub struct NewsConfig {
    #[serde(rename = "news_query", default = "default_news_query")]
    pub query: String,
    #[serde(rename = "news_language", default = "default_news_language")]
    pub language: String,
    #[serde(
        rename = "news_page_size",
        default,
        deserialize_with = "deserialize_option_parsed"
    )]
    pub page_size: Option<usize>,
    #[serde(rename = "news_base_url", default = "default_news_base_url")]
    pub base_url: String,
    #[serde(
        rename = "news_timeout_secs",
        default,
        deserialize_with = "deserialize_option_parsed"
    )]
    pub timeout_secs: Option<u64>,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            query: default_news_query(),
            language: default_news_language(),
            page_size: None,
            base_url: default_news_base_url(),
            timeout_secs: None,
        }
    }
}

fn default_news_query() -> String {
    r#"(Nvidia OR Samsung OR Microsoft) AND (earnings OR "insider selling" OR disclosure)"#
        .to_string()
}

fn default_news_language() -> String {
    "en".to_string()
}

fn default_news_base_url() -> String {
    "https://newsapi.org".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub source: Option<String>,
}

#[derive(Deserialize, Debug)]
struct EverythingResponse {
    status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<ApiArticle>,
}

#[derive(Deserialize, Debug)]
struct ApiArticle {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    source: Option<ApiSource>,
}

#[derive(Deserialize, Debug)]
struct ApiSource {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewsFetcher {
    query: String,
    language: String,
    page_size: usize,
    endpoint: Url,
    client: Client,
}

impl NewsFetcher {
    pub fn new(api_key: &str, config: NewsConfig) -> Result<Self, NewsError> {
        let mut endpoint = Url::parse(&config.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| NewsError::InvalidBaseUrl(config.base_url.clone()))?;
        endpoint
            .path_segments_mut()
            .map_err(|_| NewsError::InvalidBaseUrl(config.base_url.clone()))?
            .pop_if_empty()
            .extend(["v2", "everything"]);

        let mut headers = HeaderMap::new();
        let key_value =
            HeaderValue::from_str(api_key).context("Invalid NEWS_API_KEY for X-Api-Key header")?;
        headers.insert("x-api-key", key_value);
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs.unwrap_or(15)))
            .user_agent("secretary/0.1")
            .build()
            .context("Failed to build news HTTP client")?;

        Ok(Self {
            query: config.query,
            language: config.language,
            page_size: config.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            endpoint,
            client,
        })
    }

    /// Most recent articles first, at most `page_size` of them.
    pub async fn fetch(&self) -> Result<Vec<Article>, NewsError> {
        log::info!("searching news for '{}'...", self.query);
        let page_size = self.page_size.to_string();
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("q", self.query.as_str()),
                ("language", self.language.as_str()),
                ("sortBy", "publishedAt"),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .context("News request failed")?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(NewsError::ApiStatus { status, body });
        }

        let body: EverythingResponse = response.json().await.context("News JSON")?;
        if body.status != "ok" {
            return Err(NewsError::Api {
                code: body.code.unwrap_or_else(|| "unknown".to_string()),
                message: body.message.unwrap_or_default(),
            });
        }

        let returned = body.articles.len();
        let articles = body
            .articles
            .into_iter()
            .filter_map(|a| {
                let title = a.title.filter(|t| !t.trim().is_empty())?;
                Some(Article {
                    title: title.trim().to_string(),
                    source: a.source.and_then(|s| s.name).filter(|n| !n.is_empty()),
                })
            })
            .take(self.page_size)
            .collect::<Vec<_>>();

        log::info!("fetched {} articles, kept {}", returned, articles.len());
        Ok(articles)
    }
}

/// One line per article, or [`NO_NEWS_PLACEHOLDER`] when there are none.
pub fn render_news(articles: &[Article]) -> String {
    if articles.is_empty() {
        return NO_NEWS_PLACEHOLDER.to_string();
    }
    articles
        .iter()
        .map(|a| match &a.source {
            Some(source) => format!("- {} ({})", a.title, source),
            None => format!("- {}", a.title),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
