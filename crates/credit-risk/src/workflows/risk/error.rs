/// Recoverable input problems surfaced to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please select a company.")]
    NoCompanySelected,
    #[error("Company not found.")]
    CompanyNotFound { company_id: String },
    #[error("No data to export.")]
    NoDataToExport,
    #[error("Factor score must be 1, 2, or 3 (got {value}).")]
    FactorScoreOutOfRange { value: u8 },
    #[error("Another action is already in progress.")]
    ActionInProgress,
}

/// Failures while handing an export to the external sink.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to export: {status} - {body}")]
    Status { status: u16, body: String },
    #[error("{0}")]
    Rejected(String),
    #[error("{0}")]
    Fault(String),
}

impl TransportError {
    /// Message stored on the session when an export fails.
    pub fn user_message(&self) -> String {
        match self {
            TransportError::Rejected(message) => message.clone(),
            other => format!("Error exporting data: {other}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssessmentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl AssessmentError {
    pub fn user_message(&self) -> String {
        match self {
            AssessmentError::Validation(err) => err.to_string(),
            AssessmentError::Transport(err) => err.user_message(),
        }
    }
}
