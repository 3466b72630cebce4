use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::{ModelRegistry, TranscriptionService};
use crate::domain::{
    due_date, priority, AudioClip, DomainError, ResolvedTask, TaskIntent, TaskOverrides,
    TaskPatch, TaskRequest,
};
use crate::ports::{AudioDecoder, NlpModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Transcribing,
    UsingText,
    Inferring,
    Merging,
    Done,
    Failed,
}

/// Entry point for task creation and update.
///
/// Stateless across requests; the shared models are read-only.
pub struct TaskIntelligence {
    nlp: Arc<dyn NlpModel>,
    transcription: TranscriptionService,
}

impl TaskIntelligence {
    pub fn new(registry: &ModelRegistry, decoder: Arc<dyn AudioDecoder>) -> Self {
        Self {
            nlp: registry.nlp(),
            transcription: TranscriptionService::new(registry.speech(), decoder),
        }
    }

    pub fn transcription_available(&self) -> bool {
        self.transcription.is_available()
    }

    pub async fn transcribe(&self, clip: AudioClip) -> Result<String, DomainError> {
        self.transcription.transcribe(clip).await
    }

    /// Classify priority and resolve the due date of `text`.
    ///
    /// Inference failures never surface; the degraded fallback is returned
    /// instead. Only blank input is rejected.
    pub async fn infer_intent(
        &self,
        text: &str,
        today: NaiveDate,
    ) -> Result<TaskIntent, DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::Validation("Task text is empty".to_string()));
        }

        let nlp = Arc::clone(&self.nlp);
        let owned = text.to_string();
        let outcome = tokio::task::spawn_blocking(move || {
            let doc = nlp.analyze(&owned)?;
            let priority = priority::classify(&doc);
            let due_date = due_date::resolve(&doc, today);
            Ok::<_, DomainError>(TaskIntent::new(priority, due_date))
        })
        .await;

        let intent = match outcome {
            Ok(Ok(intent)) => intent,
            Ok(Err(e)) => {
                warn!(error = %e, "Intent inference failed, using fallback");
                TaskIntent::fallback()
            }
            Err(e) => {
                warn!(error = %e, "Intent inference task aborted, using fallback");
                TaskIntent::fallback()
            }
        };

        debug!(
            priority = %intent.priority,
            due_date = ?intent.due_date,
            degraded = intent.degraded,
            "Intent inferred"
        );
        Ok(intent)
    }

    /// Resolve the text of a new task and merge inferred intent with the
    /// caller's overrides. Audio takes precedence over text when both are set.
    pub async fn create_intent(
        &self,
        request: TaskRequest,
        today: NaiveDate,
    ) -> Result<ResolvedTask, DomainError> {
        let TaskRequest {
            text,
            audio,
            overrides,
        } = request;

        let text = match (audio, text) {
            (Some(clip), _) => {
                trace_stage(Stage::Transcribing);
                self.transcribe(clip).await.map_err(|e| {
                    trace_stage(Stage::Failed);
                    e
                })?
            }
            (None, Some(text)) if !text.trim().is_empty() => {
                trace_stage(Stage::UsingText);
                text
            }
            _ => {
                trace_stage(Stage::Failed);
                return Err(DomainError::Validation(
                    "Task text or audio file is required".to_string(),
                ));
            }
        };

        trace_stage(Stage::Inferring);
        let inferred = self.infer_intent(&text, today).await?;

        trace_stage(Stage::Merging);
        let intent = inferred.merged_with(&overrides);
        trace_stage(Stage::Done);

        info!(
            priority = %intent.priority,
            due_date = ?intent.due_date,
            degraded = intent.degraded,
            "Task intent resolved"
        );
        Ok(ResolvedTask { text, intent })
    }

    /// Fields to write when a task is updated.
    ///
    /// Re-inference only happens when the text actually changes; unchanged
    /// text or a failed inference yields the overrides alone.
    pub async fn reinfer_on_update(
        &self,
        current_text: &str,
        new_text: Option<&str>,
        overrides: TaskOverrides,
        today: NaiveDate,
    ) -> TaskPatch {
        let new_text = match new_text {
            Some(t) if !t.trim().is_empty() && t != current_text => t,
            _ => return TaskPatch::from(overrides),
        };

        let nlp = Arc::clone(&self.nlp);
        let owned = new_text.to_string();
        let outcome = tokio::task::spawn_blocking(move || {
            let doc = nlp.analyze(&owned)?;
            Ok::<_, DomainError>(TaskIntent::new(
                priority::classify(&doc),
                due_date::resolve(&doc, today),
            ))
        })
        .await;

        match outcome {
            Ok(Ok(inferred)) => {
                let merged = inferred.merged_with(&overrides);
                TaskPatch {
                    priority: Some(merged.priority),
                    due_date: Some(merged.due_date),
                }
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Re-inference failed, applying overrides only");
                TaskPatch::from(overrides)
            }
            Err(e) => {
                warn!(error = %e, "Re-inference task aborted, applying overrides only");
                TaskPatch::from(overrides)
            }
        }
    }
}

fn trace_stage(stage: Stage) {
    debug!(stage = ?stage, "Task pipeline stage");
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::adapters::audio_decode::tests::generate_test_wav;
    use crate::adapters::{LexiconNlpModel, SymphoniaDecoder};
    use crate::app::registry::tests::EchoSpeech;
    use crate::domain::{Doc, Priority};

    struct BrokenNlp;

    impl NlpModel for BrokenNlp {
        fn name(&self) -> &str {
            "broken"
        }

        fn analyze(&self, _: &str) -> Result<Doc, DomainError> {
            Err(DomainError::Inference("model crashed".to_string()))
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    fn service() -> TaskIntelligence {
        let nlp = Arc::new(LexiconNlpModel::bundled(1_000_000).unwrap());
        let registry = ModelRegistry::new(Some(Arc::new(EchoSpeech)), nlp);
        TaskIntelligence::new(&registry, Arc::new(SymphoniaDecoder::new()))
    }

    fn broken() -> TaskIntelligence {
        let registry = ModelRegistry::new(None, Arc::new(BrokenNlp));
        TaskIntelligence::new(&registry, Arc::new(SymphoniaDecoder::new()))
    }

    #[tokio::test]
    async fn test_infer_urgent_tomorrow() {
        let intent = service()
            .infer_intent("URGENT: call the bank tomorrow", today())
            .await
            .unwrap();

        assert_eq!(intent.priority, Priority::High);
        assert_eq!(intent.due_date, NaiveDate::from_ymd_opt(2024, 1, 11));
        assert!(!intent.degraded);
    }

    #[tokio::test]
    async fn test_infer_is_deterministic() {
        let svc = service();
        let a = svc.infer_intent("Finish report in 3 days", today()).await.unwrap();
        let b = svc.infer_intent("Finish report in 3 days", today()).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.due_date, NaiveDate::from_ymd_opt(2024, 1, 13));
    }

    #[tokio::test]
    async fn test_blank_text_rejected() {
        let result = service().infer_intent("   ", today()).await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_inference_failure_falls_back() {
        let intent = broken().infer_intent("anything at all", today()).await.unwrap();
        assert_eq!(intent, TaskIntent::fallback());
        assert!(intent.degraded);
    }

    #[tokio::test]
    async fn test_create_overrides_win() {
        let request = TaskRequest::from_text("URGENT now").with_overrides(TaskOverrides {
            priority: Some(Priority::Low),
            due_date: None,
        });

        let task = service().create_intent(request, today()).await.unwrap();
        assert_eq!(task.text, "URGENT now");
        assert_eq!(task.intent.priority, Priority::Low);
    }

    #[tokio::test]
    async fn test_create_explicit_null_due_date() {
        let request =
            TaskRequest::from_text("Pay rent tomorrow").with_overrides(TaskOverrides {
                priority: None,
                due_date: Some(None),
            });

        let task = service().create_intent(request, today()).await.unwrap();
        assert_eq!(task.intent.due_date, None);
    }

    #[tokio::test]
    async fn test_create_requires_input() {
        let result = service().create_intent(TaskRequest::default(), today()).await;
        match result {
            Err(DomainError::Validation(msg)) => {
                assert_eq!(msg, "Task text or audio file is required")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_from_audio_prefers_transcript() {
        let clip = AudioClip::new(generate_test_wav(16_000, 1, 1_600), "audio/wav");
        let request = TaskRequest {
            text: Some("ignored text".to_string()),
            audio: Some(clip),
            overrides: TaskOverrides::default(),
        };

        let task = service().create_intent(request, today()).await.unwrap();
        assert_eq!(task.text, "echo");
    }

    #[tokio::test]
    async fn test_create_from_audio_without_speech_model() {
        let clip = AudioClip::new(generate_test_wav(16_000, 1, 1_600), "audio/wav");
        let result = broken()
            .create_intent(TaskRequest::from_audio(clip), today())
            .await;
        assert!(matches!(result, Err(DomainError::ModelUnavailable(_))));
    }

    #[tokio::test]
    async fn test_update_with_unchanged_text_keeps_overrides_only() {
        let overrides = TaskOverrides {
            priority: Some(Priority::High),
            due_date: None,
        };
        let patch = service()
            .reinfer_on_update("Buy milk", Some("Buy milk"), overrides, today())
            .await;

        assert_eq!(patch.priority, Some(Priority::High));
        assert_eq!(patch.due_date, None);

        let untouched = service()
            .reinfer_on_update("Buy milk", None, TaskOverrides::default(), today())
            .await;
        assert_eq!(untouched, TaskPatch::default());
    }

    #[tokio::test]
    async fn test_update_with_new_text_reinfers() {
        let patch = service()
            .reinfer_on_update(
                "Buy milk",
                Some("Submit the tax form asap, due tomorrow"),
                TaskOverrides::default(),
                today(),
            )
            .await;

        assert_eq!(patch.priority, Some(Priority::High));
        assert_eq!(patch.due_date, Some(NaiveDate::from_ymd_opt(2024, 1, 11)));
    }

    #[tokio::test]
    async fn test_update_failure_skips_fallback() {
        let overrides = TaskOverrides {
            priority: None,
            due_date: Some(NaiveDate::from_ymd_opt(2024, 2, 1)),
        };
        let patch = broken()
            .reinfer_on_update("old", Some("new text here"), overrides, today())
            .await;

        assert_eq!(patch, TaskPatch::from(overrides));
        assert_eq!(patch.priority, None);
    }
}
