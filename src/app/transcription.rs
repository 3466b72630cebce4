use std::sync::Arc;

use tracing::{debug, info};

use crate::adapters::resample_channels;
use crate::domain::{AudioClip, DecodedAudio, DomainError};
use crate::ports::{AudioDecoder, SpeechModel};

/// Turns uploaded audio into trimmed text.
///
/// Pipeline: decode, resample to the model rate, downmix to mono, infer, trim.
#[derive(Clone)]
pub struct TranscriptionService {
    speech: Option<Arc<dyn SpeechModel>>,
    decoder: Arc<dyn AudioDecoder>,
}

impl TranscriptionService {
    pub fn new(speech: Option<Arc<dyn SpeechModel>>, decoder: Arc<dyn AudioDecoder>) -> Self {
        Self { speech, decoder }
    }

    pub fn is_available(&self) -> bool {
        self.speech.is_some()
    }

    pub async fn transcribe(&self, clip: AudioClip) -> Result<String, DomainError> {
        let speech = self.speech.clone().ok_or_else(|| {
            DomainError::ModelUnavailable("Speech model is not loaded".to_string())
        })?;

        if clip.is_empty() {
            return Err(DomainError::TranscriptionFailed(
                "Audio payload is empty".to_string(),
            ));
        }

        let decoder = Arc::clone(&self.decoder);
        let target_rate = speech.sample_rate();

        // Decoding and resampling are CPU bound.
        let waveform = tokio::task::spawn_blocking(move || {
            let decoded = decoder.decode(clip.bytes(), clip.mime_type())?;
            drop(clip);

            let decoded = if decoded.sample_rate == target_rate {
                decoded
            } else {
                debug!(
                    from = decoded.sample_rate,
                    to = target_rate,
                    channels = decoded.channel_count(),
                    "Resampling"
                );
                let channels =
                    resample_channels(&decoded.channels, decoded.sample_rate, target_rate)?;
                DecodedAudio::new(channels, target_rate)
            };

            Ok::<_, DomainError>(decoded.downmix())
        })
        .await
        .map_err(|e| DomainError::TranscriptionFailed(format!("Task join error: {}", e)))??;

        if waveform.is_empty() {
            return Err(DomainError::EmptyTranscription);
        }

        let result = speech.transcribe(waveform).await?;
        let text = result.text.trim();
        if text.is_empty() {
            return Err(DomainError::EmptyTranscription);
        }

        info!(
            model = speech.name(),
            chars = text.len(),
            duration_ms = result.duration_ms,
            "Transcription complete"
        );
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    use async_trait::async_trait;

    use crate::adapters::audio_decode::tests::generate_test_wav;
    use crate::adapters::SymphoniaDecoder;
    use crate::domain::{Waveform, MODEL_SAMPLE_RATE};
    use crate::ports::TranscriptionResult;

    /// Records the waveform it receives and answers with fixed text.
    struct RecordingSpeech {
        reply: String,
        received: Mutex<Option<Waveform>>,
    }

    impl RecordingSpeech {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                received: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl SpeechModel for RecordingSpeech {
        fn name(&self) -> &str {
            "recording"
        }

        async fn transcribe(&self, waveform: Waveform) -> Result<TranscriptionResult, DomainError> {
            *self.received.lock() = Some(waveform);
            Ok(TranscriptionResult {
                text: self.reply.clone(),
                detected_language: Some("en".to_string()),
                duration_ms: 1,
            })
        }
    }

    struct SilentDecoder;

    impl AudioDecoder for SilentDecoder {
        fn decode(&self, _: &[u8], _: &str) -> Result<DecodedAudio, DomainError> {
            Ok(DecodedAudio::new(vec![Vec::new()], MODEL_SAMPLE_RATE))
        }
    }

    fn wav_clip() -> AudioClip {
        AudioClip::new(generate_test_wav(44_100, 2, 22_050), "audio/wav")
    }

    #[tokio::test]
    async fn test_pipeline_delivers_mono_16khz() {
        let speech = RecordingSpeech::new("  Call the dentist tomorrow \n");
        let service = TranscriptionService::new(
            Some(speech.clone() as Arc<dyn SpeechModel>),
            Arc::new(SymphoniaDecoder::new()),
        );

        let text = service.transcribe(wav_clip()).await.unwrap();
        assert_eq!(text, "Call the dentist tomorrow");

        let received = speech.received.lock().take().unwrap();
        assert_eq!(received.sample_rate, MODEL_SAMPLE_RATE);
        assert_eq!(received.len(), 8_000);
    }

    #[tokio::test]
    async fn test_without_speech_model() {
        let service = TranscriptionService::new(None, Arc::new(SymphoniaDecoder::new()));
        assert!(!service.is_available());

        let result = service.transcribe(wav_clip()).await;
        assert!(matches!(result, Err(DomainError::ModelUnavailable(_))));
    }

    #[tokio::test]
    async fn test_blank_transcript_is_empty_transcription() {
        let service = TranscriptionService::new(
            Some(RecordingSpeech::new("   ") as Arc<dyn SpeechModel>),
            Arc::new(SymphoniaDecoder::new()),
        );

        let result = service.transcribe(wav_clip()).await;
        assert!(matches!(result, Err(DomainError::EmptyTranscription)));
    }

    #[tokio::test]
    async fn test_silent_audio_is_empty_transcription() {
        let service = TranscriptionService::new(
            Some(RecordingSpeech::new("ghost") as Arc<dyn SpeechModel>),
            Arc::new(SilentDecoder),
        );

        let clip = AudioClip::new(vec![0u8; 16], "audio/wav");
        let result = service.transcribe(clip).await;
        assert!(matches!(result, Err(DomainError::EmptyTranscription)));
    }

    #[tokio::test]
    async fn test_undecodable_audio_is_client_error() {
        let service = TranscriptionService::new(
            Some(RecordingSpeech::new("x") as Arc<dyn SpeechModel>),
            Arc::new(SymphoniaDecoder::new()),
        );

        let clip = AudioClip::new(b"definitely not audio".to_vec(), "audio/mpeg");
        let err = service.transcribe(clip).await.unwrap_err();
        assert!(matches!(err, DomainError::TranscriptionFailed(_)));
        assert!(err.is_client_error());
    }
}
