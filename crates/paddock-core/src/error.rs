use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("No valid API token: set one with `paddock token set` (missing or expired)")]
    Unauthenticated,

    #[error("Request timed out")]
    Timeout,

    #[error("Network request failed: {0}")]
    NetworkFailure(String),

    #[error("{message}")]
    HttpError { status: u16, message: String },

    #[error("Malformed API response: {0}")]
    MalformedResponse(String),

    #[error("Invalid record {external_id}: {reason}")]
    InvalidRecord { external_id: String, reason: String },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

impl AppError {
    /// True for failures where the request never got an HTTP answer, so
    /// another route to the API may still succeed.
    pub fn is_transport(&self) -> bool {
        matches!(self, AppError::Timeout | AppError::NetworkFailure(_))
    }
}
