use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Persona {
    #[default]
    FinancialAnalyst,
    QuantAnalyst,
    DataRobot,
}

impl Persona {
    pub fn instruction(&self) -> &'static str {
        match self {
            Persona::FinancialAnalyst => {
                "You are a veteran financial analyst writing a daily market briefing."
            }
            Persona::QuantAnalyst => {
                "You are a quantitative analyst. Report measurable figures and their changes; \
                 keep interpretation to what the numbers directly support."
            }
            Persona::DataRobot => {
                "You are a data-only reporting robot. Output facts and figures only. \
                 Do not interpret, predict, or advise."
            }
        }
    }
}

/// Terms the report must never use: nothing about the reader's age or identity,
/// and no emotional or advisory language. Plain trade verbs stay allowed since
/// insider buying and selling are reported as facts.
pub const FORBIDDEN_TERMS: &[&str] = &[
    "senior",
    "elderly",
    "retiree",
    "retirement",
    "older investor",
    "grandparent",
    "dear",
    "worry",
    "don't worry",
    "reassuring",
    "scary",
    "exciting",
    "panic",
    "you should",
    "we recommend",
    "buy now",
    "consider selling",
    "hold on to",
];

pub const REPORT_SECTIONS: &[&str] = &[
    "Market figures: each asset's latest value and day-over-day change, as given",
    "Disclosures and news facts: what was reported and by which source",
    "Insider trading figures: any insider buying or selling mentioned, with amounts",
    "Risk commentary: factual risks visible in the data above",
];

pub fn build_report_prompt(persona: Persona, market_block: &str, news_block: &str) -> String {
    let forbidden = FORBIDDEN_TERMS
        .iter()
        .map(|t| format!("\"{}\"", t))
        .collect::<Vec<_>>()
        .join(", ");

    let sections = REPORT_SECTIONS
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {}", i + 1, s))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"# Role
{instruction}

# Forbidden vocabulary
Never use any of the following words or phrases, and never refer to the reader's age or identity: {forbidden}.
Do not use emotional language and do not give investment advice.

# Required structure
Write plain text (no Markdown tables) with exactly these numbered sections:
{sections}

If a figure is marked "unavailable", say it is unavailable. Do not estimate it.

# Market data
{market_block}

# News
{news_block}
"#,
        instruction = persona.instruction(),
    )
}
