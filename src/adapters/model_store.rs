use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::domain::{DomainError, InstalledModel, ModelCatalog, Quantization};
use crate::ports::{HttpClient, ProgressCallback};

/// Embedded speech model catalog JSON.
const CATALOG_JSON: &str = include_str!("../../resources/model_catalog.json");

/// Speech model files on the local filesystem.
pub struct LocalModelStore {
    catalog: ModelCatalog,
    models_dir: PathBuf,
}

impl LocalModelStore {
    pub fn new(models_dir: PathBuf) -> Result<Self, DomainError> {
        let catalog: ModelCatalog = serde_json::from_str(CATALOG_JSON)
            .map_err(|e| DomainError::Config(format!("Failed to parse model catalog: {}", e)))?;

        fs::create_dir_all(&models_dir)?;

        debug!(
            models_dir = ?models_dir,
            catalog_version = catalog.version,
            "Model store initialized"
        );

        Ok(Self {
            catalog,
            models_dir,
        })
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Local file path for a model variant: `{model_id}-{quant}.bin`.
    pub fn model_path(&self, model_id: &str, quant: Quantization) -> PathBuf {
        self.models_dir
            .join(format!("{}-{}.bin", model_id, quant.suffix()))
    }

    pub fn is_installed(&self, model_id: &str, quant: Quantization) -> bool {
        self.model_path(model_id, quant).is_file()
    }

    /// Installed catalog models, in catalog order.
    pub fn list_installed(&self) -> Result<Vec<InstalledModel>, DomainError> {
        let mut installed = Vec::new();
        for model in &self.catalog.models {
            for variant in &model.variants {
                let path = self.model_path(&model.id, variant.quantization);
                if let Ok(meta) = fs::metadata(&path) {
                    installed.push(InstalledModel {
                        id: model.id.clone(),
                        quantization: variant.quantization,
                        path,
                        size_bytes: meta.len(),
                    });
                }
            }
        }
        Ok(installed)
    }

    /// Return the model path, downloading the file first if it is missing.
    pub async fn ensure_installed(
        &self,
        model_id: &str,
        quant: Quantization,
        http: &dyn HttpClient,
        progress: Option<ProgressCallback>,
    ) -> Result<PathBuf, DomainError> {
        let target_path = self.model_path(model_id, quant);
        if target_path.is_file() {
            return Ok(target_path);
        }

        let model_info = self
            .catalog
            .get(model_id)
            .ok_or_else(|| DomainError::ModelNotFound(model_id.to_string()))?;

        let variant = model_info.variant(quant).ok_or_else(|| {
            DomainError::ModelNotFound(format!("Model {} has no {} variant", model_id, quant))
        })?;

        info!(
            model_id = model_id,
            quant = %quant,
            url = %variant.url,
            approx_size_mb = variant.approx_size_mb,
            "Speech model not installed, downloading"
        );

        http.download_file(&variant.url, &target_path, progress).await?;

        match &variant.sha256 {
            Some(expected) => {
                let actual = Self::calculate_sha256(&target_path)?;
                if &actual != expected {
                    let _ = fs::remove_file(&target_path);
                    return Err(DomainError::ModelVerification {
                        expected: expected.clone(),
                        actual,
                    });
                }
                debug!(model_id = model_id, "Checksum verified");
            }
            None => {
                warn!(model_id = model_id, quant = %quant, "No checksum in catalog, skipping verification");
            }
        }

        info!(model_id = model_id, quant = %quant, path = ?target_path, "Model installed");
        Ok(target_path)
    }

    /// Delete an installed model file.
    pub fn delete(&self, model_id: &str, quant: Quantization) -> Result<(), DomainError> {
        let path = self.model_path(model_id, quant);
        if !path.is_file() {
            return Err(DomainError::ModelNotFound(format!("{}-{}", model_id, quant)));
        }
        fs::remove_file(&path)?;
        info!(model_id = model_id, quant = %quant, "Model deleted");
        Ok(())
    }

    fn calculate_sha256(path: &Path) -> Result<String, DomainError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut hasher = Sha256::new();

        let mut buffer = [0u8; 8192];
        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(format!("{:x}", hasher.finalize()))
    }
}
