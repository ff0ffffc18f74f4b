use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Field;

pub const SELECT_FROM_LIST: &str = "select a value from the available list.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    Network,
    Protocol,
    Dispatch,
}

/// Inline form error; never reaches the network layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: Field,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    pub fn not_in_catalog(field: Field) -> Self {
        Self::new(field, SELECT_FROM_LIST)
    }

    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Validation
    }
}
