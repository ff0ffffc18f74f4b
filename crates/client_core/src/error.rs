use reqwest::StatusCode;
use shared::error::{ErrorCategory, ValidationError};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    #[error("analysis request failed: {0}")]
    Network(String),
    #[error("analysis service responded with status {0}")]
    Status(StatusCode),
    #[error("analysis response could not be parsed: {0}")]
    Protocol(String),
}

impl AnalysisError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AnalysisError::Network(_) | AnalysisError::Status(_) => ErrorCategory::Network,
            AnalysisError::Protocol(_) => ErrorCategory::Protocol,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error("alert dispatch failed: {0}")]
    Transport(String),
    #[error("alert service responded with status {0}")]
    Status(StatusCode),
}

impl DispatchError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Dispatch
    }
}

#[derive(Debug, Clone, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("a submission is already in flight")]
    InFlight,
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

impl SubmitError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SubmitError::Validation(err) => err.category(),
            SubmitError::InFlight => ErrorCategory::Validation,
            SubmitError::Analysis(err) => err.category(),
        }
    }

    /// Fatal errors unwind the loading state and need a blocking notice.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SubmitError::Analysis(_))
    }
}
