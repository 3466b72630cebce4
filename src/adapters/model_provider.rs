use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{LexiconNlpModel, LocalModelStore, WhisperCppSpeechModel};
use crate::domain::config::{ModelsConfig, TranscriptionConfig};
use crate::domain::DomainError;
use crate::ports::{HttpClient, ModelProvider, NlpModel, SpeechModel};

/// Loads the whisper model from the model store and the date lexicon from
/// the data directory.
pub struct LocalModelProvider {
    store: LocalModelStore,
    http: Arc<dyn HttpClient>,
    models: ModelsConfig,
    transcription: TranscriptionConfig,
    lexicon_path: PathBuf,
}

impl LocalModelProvider {
    pub fn new(
        store: LocalModelStore,
        http: Arc<dyn HttpClient>,
        models: ModelsConfig,
        transcription: TranscriptionConfig,
        lexicon_path: PathBuf,
    ) -> Self {
        Self {
            store,
            http,
            models,
            transcription,
            lexicon_path,
        }
    }

    async fn speech_model_path(&self) -> Result<PathBuf, DomainError> {
        let id = &self.models.speech_model;
        let quant = self.models.quantization;

        if self.models.auto_download && !self.http.is_network_blocked() {
            return self
                .store
                .ensure_installed(id, quant, self.http.as_ref(), None)
                .await;
        }

        let path = self.store.model_path(id, quant);
        if !path.is_file() {
            return Err(DomainError::ModelNotFound(format!(
                "{} ({}) is not installed at {} and downloads are disabled",
                id,
                quant,
                path.display()
            )));
        }
        Ok(path)
    }
}

#[async_trait]
impl ModelProvider for LocalModelProvider {
    async fn load_speech(&self) -> Result<Arc<dyn SpeechModel>, DomainError> {
        let path = self.speech_model_path().await?;
        let model = WhisperCppSpeechModel::load(
            &path,
            self.transcription.threads,
            self.transcription.language_hint(),
        )
        .await?;
        Ok(Arc::new(model))
    }

    async fn load_nlp(&self) -> Result<Arc<dyn NlpModel>, DomainError> {
        let model = LexiconNlpModel::from_file(&self.lexicon_path, self.models.nlp_max_length)?;
        info!(version = model.version(), path = ?self.lexicon_path, "Date lexicon loaded");
        Ok(Arc::new(model))
    }

    async fn acquire_nlp(&self) -> Result<(), DomainError> {
        LexiconNlpModel::install_bundled(&self.lexicon_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::GuardedHttpClient;
    use crate::domain::config::PrivacyConfig;

    fn provider(dir: &std::path::Path, auto_download: bool) -> LocalModelProvider {
        let store = LocalModelStore::new(dir.join("models")).unwrap();
        let http = Arc::new(GuardedHttpClient::new(&PrivacyConfig::default()).unwrap());
        let models = ModelsConfig {
            auto_download,
            ..ModelsConfig::default()
        };
        LocalModelProvider::new(
            store,
            http,
            models,
            TranscriptionConfig::default(),
            dir.join("nlp").join("date_lexicon.json"),
        )
    }

    #[tokio::test]
    async fn test_nlp_load_after_acquisition() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider(dir.path(), false);

        assert!(provider.load_nlp().await.is_err());
        provider.acquire_nlp().await.unwrap();

        let nlp = provider.load_nlp().await.unwrap();
        let doc = nlp.analyze("Tomorrow morning").unwrap();
        assert_eq!(doc.entities.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_speech_model_without_downloads() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider(dir.path(), true);

        // Default privacy config is local-only, so no download is attempted.
        let result = provider.load_speech().await;
        assert!(matches!(result, Err(DomainError::ModelNotFound(_))));
    }
}
