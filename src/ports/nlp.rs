use crate::domain::{Doc, DomainError};

/// Port for the NLP model: tokenization and named-entity extraction.
///
/// Implementations must be reentrant; one instance is shared by all requests.
pub trait NlpModel: Send + Sync {
    /// Model name for logging.
    fn name(&self) -> &str;

    /// Lowercase, tokenize and extract entities from `text`.
    fn analyze(&self, text: &str) -> Result<Doc, DomainError>;
}
