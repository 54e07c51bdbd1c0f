use thiserror::Error;

#[derive(Debug, Error)]
pub enum FinSightError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for FinSightError {
    fn from(e: serde_json::Error) -> Self {
        FinSightError::SerializationError(e.to_string())
    }
}
