use crate::config::deserialize_option_parsed;
use anyhow::Context;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use url::Url;

/// Substituted for any symbol whose quote could not be fetched or computed.
pub const UNAVAILABLE: &str = "unavailable";

#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    #[error("Invalid market base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("Quote API error (status {status}): {body}")]
    ApiStatus { status: u16, body: String },
    #[error("No chart data returned for {0}")]
    NoData(String),
    #[error("Not enough price history for {symbol}: {samples} sample(s)")]
    InsufficientHistory { symbol: String, samples: usize },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticker {
    pub name: String,
    pub symbol: String,
}

impl Ticker {
    pub fn new(name: &str, symbol: &str) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct MarketConfig {
    #[serde(
        rename = "market_tickers",
        default = "default_tickers",
        deserialize_with = "deserialize_tickers"
    )]
    pub tickers: Vec<Ticker>,
    #[serde(rename = "market_base_url", default = "default_market_base_url")]
    pub base_url: String,
    #[serde(
        rename = "market_timeout_secs",
        default,
        deserialize_with = "deserialize_option_parsed"
    )]
    pub timeout_secs: Option<u64>,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            tickers: default_tickers(),
            base_url: default_market_base_url(),
            timeout_secs: None,
        }
    }
}

pub fn default_tickers() -> Vec<Ticker> {
    vec![
        Ticker::new("S&P 500", "^GSPC"),
        Ticker::new("Nasdaq", "^IXIC"),
        Ticker::new("Nvidia", "NVDA"),
        Ticker::new("Samsung Electronics", "005930.KS"),
        Ticker::new("US 10Y Yield", "^TNX"),
        Ticker::new("USD/KRW", "KRW=X"),
    ]
}

fn default_market_base_url() -> String {
    "https://query2.finance.yahoo.com".to_string()
}

/// Parses `Name=SYMBOL,Name=SYMBOL`. Splits on the first `=` so symbols like `KRW=X` survive.
pub fn parse_tickers(s: &str) -> Result<Vec<Ticker>, String> {
    s.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, symbol) = entry
                .split_once('=')
                .map(|(n, s)| (n.trim(), s.trim()))
                .filter(|(n, s)| !n.is_empty() && !s.is_empty())
                .ok_or_else(|| {
                    format!("invalid ticker entry '{}': expected 'Name=SYMBOL'", entry)
                })?;
            Ok(Ticker::new(name, symbol))
        })
        .collect()
}

fn deserialize_tickers<'de, D>(deserializer: D) -> Result<Vec<Ticker>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    let Some(s) = s.filter(|v| !v.trim().is_empty()) else {
        return Ok(default_tickers());
    };
    parse_tickers(&s).map_err(serde::de::Error::custom)
}

/// Day-over-day change between the two most recent closes.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteDelta {
    pub symbol: String,
    pub current: f64,
    pub previous: f64,
    pub change: f64,
    pub change_percent: f64,
}

impl QuoteDelta {
    /// Uses the last two samples. Returns `None` with fewer than two, or when the
    /// previous close is zero and no percentage can be computed.
    pub fn from_closes(symbol: &str, closes: &[f64]) -> Option<Self> {
        let [.., previous, current] = closes else {
            return None;
        };
        if *previous == 0.0 || !previous.is_finite() || !current.is_finite() {
            return None;
        }
        let change = current - previous;
        Some(Self {
            symbol: symbol.to_string(),
            current: *current,
            previous: *previous,
            change,
            change_percent: change / previous * 100.0,
        })
    }

    pub fn render(&self) -> String {
        format!(
            "{:.2} {:+.2} ({:+.2}%)",
            self.current,
            round_cents(self.change),
            round_cents(self.change_percent)
        )
    }
}

/// Rounds to two decimals so a change that rounds to zero prints as `+0.00`, not `-0.00`.
fn round_cents(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketEntry {
    pub name: String,
    pub symbol: String,
    pub value: String,
}

impl MarketEntry {
    pub fn is_unavailable(&self) -> bool {
        self.value == UNAVAILABLE
    }
}

/// Asset name to formatted quote, in configured order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarketSnapshot {
    entries: Vec<MarketEntry>,
}

impl MarketSnapshot {
    pub fn entries(&self) -> &[MarketEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.value.as_str())
    }

    pub fn unavailable_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_unavailable()).count()
    }

    pub fn render(&self) -> String {
        if self.entries.is_empty() {
            return "No market data available.".to_string();
        }
        self.entries
            .iter()
            .map(|e| format!("{}: {}", e.name, e.value))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Deserialize, Debug)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Deserialize, Debug)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    indicators: Indicators,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Deserialize, Debug)]
struct QuoteSeries {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Clone)]
pub struct MarketFetcher {
    tickers: Vec<Ticker>,
    base_url: Url,
    client: Client,
}

impl MarketFetcher {
    pub fn new(config: MarketConfig) -> Result<Self, MarketError> {
        let base_url = Url::parse(&config.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| MarketError::InvalidBaseUrl(config.base_url.clone()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.unwrap_or(15)))
            .user_agent("secretary/0.1")
            .build()
            .context("Failed to build quote HTTP client")?;
        Ok(Self {
            tickers: config.tickers,
            base_url,
            client,
        })
    }

    /// Queries every configured ticker in turn. A failing symbol is logged and
    /// recorded as [`UNAVAILABLE`]; it never aborts the snapshot.
    pub async fn snapshot(&self) -> MarketSnapshot {
        log::info!("fetching quotes for {} tickers...", self.tickers.len());
        let mut entries = Vec::with_capacity(self.tickers.len());
        for ticker in &self.tickers {
            let value = match self.fetch_quote(&ticker.symbol).await {
                Ok(delta) => delta.render(),
                Err(err) => {
                    log::warn!(
                        "quote for {} ({}) unavailable: {}",
                        ticker.name,
                        ticker.symbol,
                        err
                    );
                    UNAVAILABLE.to_string()
                }
            };
            entries.push(MarketEntry {
                name: ticker.name.clone(),
                symbol: ticker.symbol.clone(),
                value,
            });
        }
        MarketSnapshot { entries }
    }

    pub async fn fetch_quote(&self, symbol: &str) -> Result<QuoteDelta, MarketError> {
        let url = self.chart_url(symbol)?;
        let response = self
            .client
            .get(url)
            .query(&[("range", "2d"), ("interval", "1d")])
            .send()
            .await
            .context("Quote request failed")?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(MarketError::ApiStatus { status, body });
        }

        let chart: ChartResponse = response.json().await.context("Quote chart JSON")?;
        let closes = chart
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .and_then(|result| result.indicators.quote.into_iter().next())
            .map(|series| series.close.into_iter().flatten().collect::<Vec<f64>>())
            .ok_or_else(|| MarketError::NoData(symbol.to_string()))?;

        log::debug!("{} returned {} closes", symbol, closes.len());

        QuoteDelta::from_closes(symbol, &closes).ok_or_else(|| MarketError::InsufficientHistory {
            symbol: symbol.to_string(),
            samples: closes.len(),
        })
    }

    fn chart_url(&self, symbol: &str) -> Result<Url, MarketError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| MarketError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);
        Ok(url)
    }
}
