use std::sync::Arc;

use async_trait::async_trait;

use super::{NlpModel, SpeechModel};
use crate::domain::DomainError;

/// Port for loading the pretrained models at startup.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Load the speech model, acquiring it first if the provider can.
    async fn load_speech(&self) -> Result<Arc<dyn SpeechModel>, DomainError>;

    /// Load the NLP model from its local resources.
    async fn load_nlp(&self) -> Result<Arc<dyn NlpModel>, DomainError>;

    /// Fetch or install missing NLP resources so a retried load can succeed.
    async fn acquire_nlp(&self) -> Result<(), DomainError>;
}
