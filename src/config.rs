use crate::error::SecretaryError;
use crate::mail::MailConfig;
use crate::report::ReportConfig;
use crate::sources::market::MarketConfig;
use crate::sources::news::NewsConfig;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

#[derive(Deserialize, Debug, Clone)]
pub struct AppConfig {
    pub news_api_key: String,
    pub gemini_api_key: String,
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    pub my_email: String,
    pub app_password: String,

    #[serde(flatten)]
    pub market: MarketConfig,
    #[serde(flatten)]
    pub news: NewsConfig,
    #[serde(flatten)]
    pub report: ReportConfig,
    #[serde(flatten)]
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, SecretaryError> {
        let config = envy::from_env::<AppConfig>()?;
        config.validate()?;
        Ok(config)
    }

    /// Unset secrets in CI show up as empty strings rather than missing variables.
    fn validate(&self) -> Result<(), SecretaryError> {
        let required = [
            ("NEWS_API_KEY", &self.news_api_key),
            ("GEMINI_API_KEY", &self.gemini_api_key),
            ("MY_EMAIL", &self.my_email),
            ("APP_PASSWORD", &self.app_password),
        ];
        if let Some((name, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(SecretaryError::ConfigMissing(name.to_string()));
        }
        if self.gemini_model.trim().is_empty() {
            return Err(SecretaryError::ConfigInvalid(
                "GEMINI_MODEL must not be empty".to_string(),
            ));
        }
        if let Some(size) = self.news.page_size {
            if !(1..=100).contains(&size) {
                return Err(SecretaryError::ConfigInvalid(format!(
                    "NEWS_PAGE_SIZE must be between 1 and 100, got {}",
                    size
                )));
            }
        }
        Ok(())
    }
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

/// Flattened envy fields arrive as strings, so numbers are parsed by hand.
pub(crate) fn deserialize_option_parsed<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s.filter(|v| !v.trim().is_empty()) {
        Some(s) => s.trim().parse::<T>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}
