use chrono::{Local, NaiveDate};

use crate::config::AppConfig;
use crate::error::SecretaryError;
use crate::mail::{dispatch, MailTransport, ReportEmail, SmtpMailer};
use crate::report::prompt::Persona;
use crate::report::{generate_report, GeminiModel, LanguageModel};
use crate::sources::market::MarketFetcher;
use crate::sources::news::{render_news, NewsFetcher};

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub symbols: usize,
    pub symbols_unavailable: usize,
    pub articles: usize,
    pub subject: String,
}

/// Market data, news, report, mail: once, in that order.
pub struct Secretary<M, T> {
    market: MarketFetcher,
    news: NewsFetcher,
    model: M,
    transport: T,
    persona: Persona,
    address: String,
    subject_label: String,
}

impl Secretary<GeminiModel, SmtpMailer> {
    pub fn from_config(config: &AppConfig) -> Result<Self, SecretaryError> {
        let model = GeminiModel::new(&config.gemini_api_key, &config.gemini_model, &config.report)?;
        let transport = SmtpMailer::new(&config.mail, &config.my_email, &config.app_password)?;
        Self::with_backends(config, model, transport)
    }
}

impl<M: LanguageModel, T: MailTransport> Secretary<M, T> {
    /// Wires the fetchers, persona and mail identity from `config` around the
    /// given model and transport.
    pub fn with_backends(
        config: &AppConfig,
        model: M,
        transport: T,
    ) -> Result<Self, SecretaryError> {
        let market = MarketFetcher::new(config.market.clone())
            .map_err(|e| SecretaryError::ConfigInvalid(e.to_string()))?;
        let news = NewsFetcher::new(&config.news_api_key, config.news.clone())
            .map_err(|e| SecretaryError::ConfigInvalid(e.to_string()))?;

        Ok(Self::new(
            market,
            news,
            model,
            transport,
            config.report.persona,
            &config.my_email,
            &config.mail.subject_label,
        ))
    }

    pub fn new(
        market: MarketFetcher,
        news: NewsFetcher,
        model: M,
        transport: T,
        persona: Persona,
        address: &str,
        subject_label: &str,
    ) -> Self {
        Self {
            market,
            news,
            model,
            transport,
            persona,
            address: address.to_string(),
            subject_label: subject_label.to_string(),
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn run(&self) -> Result<RunSummary, SecretaryError> {
        self.run_on(Local::now().date_naive()).await
    }

    /// Runs the pipeline with the subject dated `date`. Nothing is mailed unless
    /// every earlier stage succeeded.
    pub async fn run_on(&self, date: NaiveDate) -> Result<RunSummary, SecretaryError> {
        let snapshot = self.market.snapshot().await;
        let market_block = snapshot.render();

        let articles = self.news.fetch().await?;
        let news_block = render_news(&articles);

        let report =
            generate_report(&self.model, self.persona, &market_block, &news_block).await?;

        let email = ReportEmail::new(&self.subject_label, &self.address, report, date);
        dispatch(&self.transport, &email).await?;

        Ok(RunSummary {
            symbols: snapshot.entries().len(),
            symbols_unavailable: snapshot.unavailable_count(),
            articles: articles.len(),
            subject: email.subject,
        })
    }
}
