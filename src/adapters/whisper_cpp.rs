use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::domain::{DomainError, Waveform, MODEL_SAMPLE_RATE};
use crate::ports::{SpeechModel, TranscriptionResult};

/// Speech model backed by whisper.cpp via whisper-rs.
///
/// The loaded context is immutable; every call creates its own decoding state.
pub struct WhisperCppSpeechModel {
    context: Arc<WhisperContext>,
    name: String,
    threads: u32,
    language: Option<String>,
}

impl WhisperCppSpeechModel {
    /// Load a ggml model file.
    ///
    /// `threads` of 0 means auto-detect (cores - 1).
    pub async fn load(
        path: &Path,
        threads: u32,
        language: Option<String>,
    ) -> Result<Self, DomainError> {
        if !path.exists() {
            return Err(DomainError::ModelNotFound(
                path.to_string_lossy().to_string(),
            ));
        }

        info!(path = ?path, "Loading whisper model");

        let path_str = path.to_string_lossy().to_string();
        let context = tokio::task::spawn_blocking(move || {
            WhisperContext::new_with_params(&path_str, WhisperContextParameters::default())
                .map_err(|e| DomainError::ModelUnavailable(format!("Failed to load whisper model: {}", e)))
        })
        .await
        .map_err(|e| DomainError::ModelUnavailable(format!("Task join error: {}", e)))??;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "whisper".to_string());
        let threads = Self::resolve_threads(threads);

        info!(model = %name, threads = threads, "Whisper model loaded");

        Ok(Self {
            context: Arc::new(context),
            name,
            threads,
            language,
        })
    }

    fn resolve_threads(threads: u32) -> u32 {
        if threads > 0 {
            return threads;
        }
        std::thread::available_parallelism()
            .map(|p| std::cmp::max(1, p.get() as u32 - 1))
            .unwrap_or(1)
    }
}

#[async_trait]
impl SpeechModel for WhisperCppSpeechModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn transcribe(&self, waveform: Waveform) -> Result<TranscriptionResult, DomainError> {
        if waveform.sample_rate != MODEL_SAMPLE_RATE {
            return Err(DomainError::TranscriptionFailed(format!(
                "Expected {}Hz audio, got {}Hz",
                MODEL_SAMPLE_RATE, waveform.sample_rate
            )));
        }

        debug!(
            samples = waveform.len(),
            duration_secs = waveform.duration_secs(),
            threads = self.threads,
            "Starting whisper inference"
        );

        let start = Instant::now();
        let ctx = Arc::clone(&self.context);
        let threads = self.threads;
        let language = self.language.clone();

        let (text, detected_language) = tokio::task::spawn_blocking(move || {
            let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });

            params.set_n_threads(threads as i32);
            params.set_print_progress(false);
            params.set_print_realtime(false);
            params.set_print_timestamps(false);
            params.set_print_special(false);

            // Set language if specified, otherwise auto-detect
            if let Some(ref lang) = language {
                params.set_language(Some(lang.as_str()));
            }

            let mut state = ctx.create_state().map_err(|e| {
                DomainError::TranscriptionFailed(format!("Failed to create whisper state: {}", e))
            })?;

            state
                .full(params, &waveform.samples)
                .map_err(|e| DomainError::TranscriptionFailed(format!("Inference failed: {}", e)))?;

            let num_segments = state.full_n_segments().map_err(|e| {
                DomainError::TranscriptionFailed(format!("Failed to get segment count: {}", e))
            })?;

            let mut text = String::new();
            for i in 0..num_segments {
                let segment = state.full_get_segment_text(i).map_err(|e| {
                    DomainError::TranscriptionFailed(format!("Failed to read segment {}: {}", i, e))
                })?;
                text.push_str(&segment);
            }

            let detected_language = state
                .full_lang_id_from_state()
                .ok()
                .and_then(|id| whisper_rs::get_lang_str(id).map(|s| s.to_string()));

            Ok::<(String, Option<String>), DomainError>((text, detected_language))
        })
        .await
        .map_err(|e| DomainError::TranscriptionFailed(format!("Task join error: {}", e)))??;

        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            text_len = text.len(),
            duration_ms = duration_ms,
            detected_language = ?detected_language,
            "Whisper inference complete"
        );

        Ok(TranscriptionResult {
            text,
            detected_language,
            duration_ms,
        })
    }
}
