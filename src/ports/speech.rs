use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{DecodedAudio, DomainError, Waveform, MODEL_SAMPLE_RATE};

/// Raw output of the speech model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResult {
    /// Transcribed text, untrimmed.
    pub text: String,
    /// Detected language (ISO 639-1 code).
    pub detected_language: Option<String>,
    /// Inference duration in milliseconds.
    pub duration_ms: u64,
}

/// Port for the speech-recognition model.
///
/// Implementations must be reentrant; a single loaded model serves every
/// request concurrently.
#[async_trait]
pub trait SpeechModel: Send + Sync {
    /// Model name for logging.
    fn name(&self) -> &str;

    /// Sample rate the model expects its input waveform in.
    fn sample_rate(&self) -> u32 {
        MODEL_SAMPLE_RATE
    }

    /// Run inference on a mono waveform at [`SpeechModel::sample_rate`].
    async fn transcribe(&self, waveform: Waveform) -> Result<TranscriptionResult, DomainError>;
}

/// Port for decoding uploaded audio bytes.
pub trait AudioDecoder: Send + Sync {
    /// Decode `bytes` into planar f32 channels at their native sample rate.
    ///
    /// `mime_type` is only a hint; the container is probed from the bytes.
    fn decode(&self, bytes: &[u8], mime_type: &str) -> Result<DecodedAudio, DomainError>;
}
