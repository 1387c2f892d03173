use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("submission is missing required field `{block_id}.{action_id}`")]
    MissingField { block_id: String, action_id: String },
}

/// Failures raised while processing a form submission.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("ledger failure: {0}")]
    Ledger(String),
    #[error("chat failure: {0}")]
    Chat(String),
}

impl ApplicationError {
    /// Short label used as a structured log field.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(DomainError::MissingField { .. }) => "missing_field",
            Self::Ledger(_) => "ledger",
            Self::Chat(_) => "chat",
        }
    }
}
