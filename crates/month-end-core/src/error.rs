use thiserror::Error;

#[derive(Debug, Error)]
pub enum CloseError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Period mismatch: left report covers {left}, right report covers {right}")]
    PeriodMismatch { left: String, right: String },

    #[error("Account code absent from one side: {0}")]
    MissingAccount(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for CloseError {
    fn from(e: serde_json::Error) -> Self {
        CloseError::SerializationError(e.to_string())
    }
}
