use thiserror::Error;

/// Domain-level errors for the task intelligence pipeline.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Audio transcription failed: {0}")]
    TranscriptionFailed(String),

    #[error("Could not extract valid text from audio")]
    EmptyTranscription,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network request blocked: {reason}")]
    NetworkBlocked { reason: String },

    #[error("HTTP request failed: {0}")]
    HttpRequest(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Model verification failed: expected {expected}, got {actual}")]
    ModelVerification { expected: String, actual: String },
}

impl DomainError {
    /// Whether the caller's input caused the failure (4xx-equivalent).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DomainError::TranscriptionFailed(_)
                | DomainError::EmptyTranscription
                | DomainError::Validation(_)
        )
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for DomainError {
    fn from(err: toml::de::Error) -> Self {
        DomainError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for DomainError {
    fn from(err: toml::ser::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}
