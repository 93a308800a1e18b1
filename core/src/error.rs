use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reason code attached to an insufficient-data result so the presentation
/// layer can explain the state. The core never decides how it is displayed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum InsufficientDataReason {
    /// The customer table was empty after window filtering.
    EmptyCustomerTable,
    /// MLE needs at least `need` distinct frequency values.
    TooFewDistinctFrequencies { got: usize, need: usize },
    /// CLV needs at least `need` customers with a repeat visit.
    TooFewRepeatCustomers { got: usize, need: usize },
}

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("insufficient data: {reason:?}")]
    InsufficientData { reason: InsufficientDataReason },

    #[error("invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AnalyticsError {
    pub fn insufficient(reason: InsufficientDataReason) -> Self {
        Self::InsufficientData { reason }
    }

    /// The reason code, when this is an insufficient-data condition.
    pub fn insufficient_reason(&self) -> Option<InsufficientDataReason> {
        match self {
            Self::InsufficientData { reason } => Some(*reason),
            _ => None,
        }
    }
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
