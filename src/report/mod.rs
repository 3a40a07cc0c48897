pub mod prompt;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use prompt::{build_report_prompt, Persona};

use crate::config::deserialize_option_parsed;

use rig::agent::Agent as RigAgent;
use rig::client::CompletionClient;
use rig::completion::{Prompt, PromptError};
use rig::providers::gemini;
use rig::providers::gemini::completion::CompletionModel;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Language model request failed: {0}")]
    Prompt(#[from] PromptError),
    #[error("Language model request failed: {0}")]
    Request(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ReportConfig {
    #[serde(rename = "report_persona", default)]
    pub persona: Persona,
    #[serde(
        rename = "report_temperature",
        default,
        deserialize_with = "deserialize_option_parsed"
    )]
    pub temperature: Option<f64>,
    #[serde(
        rename = "report_max_output_tokens",
        default,
        deserialize_with = "deserialize_option_parsed"
    )]
    pub max_output_tokens: Option<u64>,
}

impl ReportConfig {
    /// Zero unless configured, so the same data yields the same wording.
    pub fn temperature(&self) -> f64 {
        self.temperature.unwrap_or(0.0)
    }
}

/// A text-generation backend. Takes one prompt, returns the generated text as-is.
#[async_trait(?Send)]
pub trait LanguageModel {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: String) -> Result<String, ReportError>;
}

pub struct GeminiModel {
    agent: RigAgent<CompletionModel>,
    model: String,
}

impl GeminiModel {
    pub fn new(api_key: &str, model: &str, config: &ReportConfig) -> Result<Self, ReportError> {
        let client = gemini::Client::new(api_key).context("Failed to build Gemini client")?;

        let mut builder = client.agent(model).temperature(config.temperature());
        if let Some(max_tokens) = config.max_output_tokens {
            builder = builder.max_tokens(max_tokens);
        }

        Ok(Self {
            agent: builder.build(),
            model: model.to_string(),
        })
    }
}

#[async_trait(?Send)]
impl LanguageModel for GeminiModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: String) -> Result<String, ReportError> {
        self.agent.prompt(prompt).await.map_err(ReportError::from)
    }
}

/// Builds the prompt from both data blocks and returns the model's text unmodified.
pub async fn generate_report<M: LanguageModel>(
    model: &M,
    persona: Persona,
    market_block: &str,
    news_block: &str,
) -> Result<String, ReportError> {
    let prompt = build_report_prompt(persona, market_block, news_block);
    log::info!(
        "sending {} character prompt to model {}",
        prompt.chars().count(),
        model.name()
    );
    let report = model.generate(prompt).await?;
    log::info!("received {} character report", report.chars().count());
    Ok(report)
}
