use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::DomainError;
use crate::ports::{ModelProvider, NlpModel, SpeechModel};

/// The pretrained models, loaded once at startup and shared read-only.
#[derive(Clone)]
pub struct ModelRegistry {
    speech: Option<Arc<dyn SpeechModel>>,
    nlp: Arc<dyn NlpModel>,
}

impl ModelRegistry {
    pub fn new(speech: Option<Arc<dyn SpeechModel>>, nlp: Arc<dyn NlpModel>) -> Self {
        Self { speech, nlp }
    }

    /// Load both models through `provider`.
    ///
    /// A speech model failure only disables transcription. An NLP failure
    /// triggers one acquisition and one retry; a second failure is fatal.
    pub async fn initialize(provider: &dyn ModelProvider) -> Result<Self, DomainError> {
        let speech = match provider.load_speech().await {
            Ok(model) => {
                info!(model = model.name(), "Speech model ready");
                Some(model)
            }
            Err(e) => {
                warn!(error = %e, "Speech model failed to load, transcription disabled");
                None
            }
        };

        let nlp = match provider.load_nlp().await {
            Ok(model) => model,
            Err(first) => {
                warn!(error = %first, "NLP model not available, attempting acquisition");
                provider
                    .acquire_nlp()
                    .await
                    .map_err(|e| Self::nlp_unavailable(&first, &e))?;
                provider
                    .load_nlp()
                    .await
                    .map_err(|e| Self::nlp_unavailable(&first, &e))?
            }
        };
        info!(model = nlp.name(), "NLP model ready");

        Ok(Self { speech, nlp })
    }

    fn nlp_unavailable(first: &DomainError, retry: &DomainError) -> DomainError {
        DomainError::ModelUnavailable(format!(
            "NLP model could not be loaded ({}); retry after acquisition failed: {}",
            first, retry
        ))
    }

    pub fn speech(&self) -> Option<Arc<dyn SpeechModel>> {
        self.speech.clone()
    }

    pub fn nlp(&self) -> Arc<dyn NlpModel> {
        Arc::clone(&self.nlp)
    }

    pub fn transcription_available(&self) -> bool {
        self.speech.is_some()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use crate::adapters::LexiconNlpModel;
    use crate::domain::Waveform;
    use crate::ports::TranscriptionResult;

    pub(crate) struct EchoSpeech;

    #[async_trait]
    impl SpeechModel for EchoSpeech {
        fn name(&self) -> &str {
            "echo"
        }

        async fn transcribe(&self, _: Waveform) -> Result<TranscriptionResult, DomainError> {
            Ok(TranscriptionResult {
                text: "echo".to_string(),
                detected_language: None,
                duration_ms: 0,
            })
        }
    }

    /// Provider whose NLP loads fail `nlp_failures` times.
    struct ScriptedProvider {
        speech_ok: bool,
        nlp_failures: u32,
        acquire_ok: bool,
        nlp_loads: AtomicU32,
        acquisitions: AtomicU32,
    }

    impl ScriptedProvider {
        fn new(speech_ok: bool, nlp_failures: u32, acquire_ok: bool) -> Self {
            Self {
                speech_ok,
                nlp_failures,
                acquire_ok,
                nlp_loads: AtomicU32::new(0),
                acquisitions: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ModelProvider for ScriptedProvider {
        async fn load_speech(&self) -> Result<Arc<dyn SpeechModel>, DomainError> {
            if self.speech_ok {
                Ok(Arc::new(EchoSpeech))
            } else {
                Err(DomainError::ModelNotFound("ggml-base.bin".to_string()))
            }
        }

        async fn load_nlp(&self) -> Result<Arc<dyn NlpModel>, DomainError> {
            let attempt = self.nlp_loads.fetch_add(1, Ordering::SeqCst);
            if attempt < self.nlp_failures {
                return Err(DomainError::ModelNotFound("date_lexicon.json".to_string()));
            }
            Ok(Arc::new(LexiconNlpModel::bundled(1_000)?))
        }

        async fn acquire_nlp(&self) -> Result<(), DomainError> {
            self.acquisitions.fetch_add(1, Ordering::SeqCst);
            if self.acquire_ok {
                Ok(())
            } else {
                Err(DomainError::Io("read-only filesystem".to_string()))
            }
        }
    }

    #[tokio::test]
    async fn test_both_models_load() {
        let provider = ScriptedProvider::new(true, 0, true);
        let registry = ModelRegistry::initialize(&provider).await.unwrap();

        assert!(registry.transcription_available());
        assert_eq!(provider.acquisitions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_speech_failure_is_not_fatal() {
        let provider = ScriptedProvider::new(false, 0, true);
        let registry = ModelRegistry::initialize(&provider).await.unwrap();

        assert!(!registry.transcription_available());
        assert!(registry.speech().is_none());
    }

    #[tokio::test]
    async fn test_nlp_acquired_then_retried_once() {
        let provider = ScriptedProvider::new(true, 1, true);
        let registry = ModelRegistry::initialize(&provider).await.unwrap();

        assert_eq!(registry.nlp().name(), "date-lexicon");
        assert_eq!(provider.acquisitions.load(Ordering::SeqCst), 1);
        assert_eq!(provider.nlp_loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_nlp_failing_twice_is_fatal() {
        let provider = ScriptedProvider::new(true, 2, true);
        let result = ModelRegistry::initialize(&provider).await;

        assert!(matches!(result, Err(DomainError::ModelUnavailable(_))));
        assert_eq!(provider.nlp_loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_acquisition_is_fatal() {
        let provider = ScriptedProvider::new(true, 1, false);
        let result = ModelRegistry::initialize(&provider).await;

        assert!(matches!(result, Err(DomainError::ModelUnavailable(_))));
        assert_eq!(provider.nlp_loads.load(Ordering::SeqCst), 1);
    }
}
