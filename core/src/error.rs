use thiserror::Error;

use crate::monotonicity::Violation;

#[derive(Error, Debug)]
pub enum SurveyError {
    #[error("Invalid prospect: {reason}")]
    InvalidProspect { reason: String },

    #[error("Please answer all {required} rows before continuing ({answered} answered)")]
    IncompletePhase { answered: usize, required: usize },

    #[error("{0}")]
    MonotonicityViolation(Violation),

    #[error("Invalid participant: {reason}")]
    InvalidParticipant { reason: String },

    #[error("Cannot {action} while session is {state}")]
    InvalidState { action: &'static str, state: String },

    #[error("Row {row} is out of range")]
    RowOutOfRange { row: usize },

    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("Catalog has {available} {domain} prospects, {requested} requested")]
    CatalogTooSmall {
        domain: String,
        requested: usize,
        available: usize,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type SurveyResult<T> = Result<T, SurveyError>;
