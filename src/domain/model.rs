use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Quantization level of a ggml whisper model file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quantization {
    /// 5-bit quantization - smallest file, slight quality loss.
    Q5_1,
    /// 8-bit quantization - near full quality.
    Q8_0,
    /// 16-bit float - full quality, largest file.
    F16,
}

impl Quantization {
    /// File name suffix for this quantization level.
    pub fn suffix(&self) -> &'static str {
        match self {
            Quantization::Q5_1 => "q5_1",
            Quantization::Q8_0 => "q8_0",
            Quantization::F16 => "f16",
        }
    }

    /// Parse quantization from a string suffix.
    pub fn from_suffix(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "q5_1" => Some(Quantization::Q5_1),
            "q8_0" => Some(Quantization::Q8_0),
            "f16" => Some(Quantization::F16),
            _ => None,
        }
    }
}

impl std::fmt::Display for Quantization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

/// Downloadable file for one quantization of a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelVariant {
    pub quantization: Quantization,
    /// Approximate file size in megabytes.
    pub approx_size_mb: u32,
    /// SHA-256 checksum, verified after download when present.
    #[serde(default)]
    pub sha256: Option<String>,
    pub url: String,
}

/// A speech model in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Unique identifier (e.g., "whisper-base").
    pub id: String,
    pub name: String,
    pub description: String,
    pub variants: Vec<ModelVariant>,
}

impl ModelInfo {
    /// Find a specific variant by quantization.
    pub fn variant(&self, quant: Quantization) -> Option<&ModelVariant> {
        self.variants.iter().find(|v| v.quantization == quant)
    }
}

/// Catalog of available speech models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCatalog {
    pub version: u32,
    pub models: Vec<ModelInfo>,
}

impl ModelCatalog {
    /// Find a model by ID.
    pub fn get(&self, model_id: &str) -> Option<&ModelInfo> {
        self.models.iter().find(|m| m.id == model_id)
    }
}

/// A model file present in the models directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstalledModel {
    pub id: String,
    pub quantization: Quantization,
    pub path: PathBuf,
    pub size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantization_suffix() {
        assert_eq!(Quantization::Q5_1.suffix(), "q5_1");
        assert_eq!(Quantization::from_suffix("Q8_0"), Some(Quantization::Q8_0));
        assert_eq!(Quantization::from_suffix("q4_0"), None);
    }

    #[test]
    fn test_variant_lookup() {
        let info = ModelInfo {
            id: "whisper-base".to_string(),
            name: "Whisper Base".to_string(),
            description: String::new(),
            variants: vec![ModelVariant {
                quantization: Quantization::F16,
                approx_size_mb: 142,
                sha256: None,
                url: "https://huggingface.co/x".to_string(),
            }],
        };
        assert!(info.variant(Quantization::F16).is_some());
        assert!(info.variant(Quantization::Q5_1).is_none());
    }
}
