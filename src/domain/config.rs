use serde::{Deserialize, Serialize};

use super::model::Quantization;

/// Privacy-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacyConfig {
    /// When true, all network requests are blocked (default: true).
    pub local_only: bool,
    /// Allowed domains when local_only is false.
    pub allowed_domains: Vec<String>,
}

impl Default for PrivacyConfig {
    fn default() -> Self {
        Self {
            local_only: true,
            allowed_domains: Self::default_allowed_domains(),
        }
    }
}

impl PrivacyConfig {
    /// Default allowed domains for model downloads.
    pub fn default_allowed_domains() -> Vec<String> {
        vec![
            "huggingface.co".to_string(),
            "cdn-lfs.huggingface.co".to_string(),
            "cdn-lfs-us-1.huggingface.co".to_string(),
        ]
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Enable file logging with rotation.
    pub file_logging: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logging: true,
        }
    }
}

/// Transcription configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Language code (e.g., "en", "fr", "auto").
    pub language: String,
    /// Number of inference threads (0 = auto).
    pub threads: u32,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            language: "auto".to_string(),
            threads: 0,
        }
    }
}

impl TranscriptionConfig {
    /// Language to force on the speech model, None for auto-detection.
    pub fn language_hint(&self) -> Option<String> {
        match self.language.trim() {
            "" | "auto" => None,
            lang => Some(lang.to_string()),
        }
    }
}

/// Model selection and acquisition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Speech model id from the catalog.
    pub speech_model: String,
    /// Quantization of the speech model file.
    pub quantization: Quantization,
    /// Download the speech model on startup when it is not installed.
    /// Still subject to `privacy.local_only`.
    pub auto_download: bool,
    /// Longest text (in chars) the NLP model accepts.
    pub nlp_max_length: usize,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            speech_model: "whisper-base".to_string(),
            quantization: Quantization::Q5_1,
            auto_download: true,
            nlp_max_length: 1_000_000,
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub privacy: PrivacyConfig,
    pub logging: LoggingConfig,
    pub transcription: TranscriptionConfig,
    pub models: ModelsConfig,
}

impl AppConfig {
    /// Create a new AppConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [models]
            speech_model = "whisper-tiny"
            "#,
        )
        .unwrap();

        assert_eq!(config.models.speech_model, "whisper-tiny");
        assert_eq!(config.models.quantization, Quantization::Q5_1);
        assert!(config.privacy.local_only);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_language_hint() {
        let mut config = TranscriptionConfig::default();
        assert!(config.language_hint().is_none());

        config.language = "en".to_string();
        assert_eq!(config.language_hint().as_deref(), Some("en"));
    }
}
