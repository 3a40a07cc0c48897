use crate::mail::MailError;
use crate::report::ReportError;
use crate::sources::news::NewsError;

/// Coarse classification of a failed run, so callers can tell which side broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    ConfigurationMissing,
    UpstreamUnavailable,
    TransportFailure,
}

#[derive(Debug, thiserror::Error)]
pub enum SecretaryError {
    #[error("Missing configuration value: {0}")]
    ConfigMissing(String),
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    #[error(transparent)]
    News(#[from] NewsError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error(transparent)]
    Mail(#[from] MailError),
}

impl SecretaryError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SecretaryError::ConfigMissing(_) | SecretaryError::ConfigInvalid(_) => {
                FailureKind::ConfigurationMissing
            }
            SecretaryError::News(_) | SecretaryError::Report(_) => FailureKind::UpstreamUnavailable,
            SecretaryError::Mail(_) => FailureKind::TransportFailure,
        }
    }
}

impl From<envy::Error> for SecretaryError {
    fn from(err: envy::Error) -> Self {
        match err {
            envy::Error::MissingValue(field) => SecretaryError::ConfigMissing(field.to_uppercase()),
            envy::Error::Custom(message) => SecretaryError::ConfigInvalid(message),
        }
    }
}
