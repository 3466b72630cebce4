use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use tokio::runtime::Runtime;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use super::{ModelRegistry, TaskIntelligence};
use crate::adapters::{
    GuardedHttpClient, LocalModelProvider, LocalModelStore, SymphoniaDecoder, TomlConfigStore,
};
use crate::domain::{
    AppConfig, AudioClip, DomainError, InstalledModel, ModelCatalog, Quantization, ResolvedTask,
    TaskIntent, TaskOverrides, TaskPatch, TaskRequest,
};
use crate::infrastructure::init_logging;
use crate::ports::{ConfigStore, HttpClient, ProgressCallback};

/// Wires adapters to the pipeline and bridges synchronous callers onto the
/// async runtime.
///
/// The models are loaded on first use, so configuration and model
/// management commands work without them.
pub struct AppController {
    runtime: Runtime,
    config: RwLock<AppConfig>,
    config_store: Arc<TomlConfigStore>,
    http: Arc<GuardedHttpClient>,
    intelligence: OnceCell<Arc<TaskIntelligence>>,
    _log_guard: Option<WorkerGuard>,
}

impl AppController {
    /// `data_dir` overrides the platform data and config directory.
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self, DomainError> {
        let config_store = Arc::new(match data_dir {
            Some(dir) => TomlConfigStore::with_data_dir(dir)?,
            None => TomlConfigStore::new()?,
        });

        let config = config_store.load()?;

        let log_guard = init_logging(
            &config_store.logs_dir(),
            &config.logging.level,
            config.logging.file_logging,
        )?;

        info!("TaskIntel starting up");

        let http = Arc::new(GuardedHttpClient::new(&config.privacy)?);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("task-intel")
            .build()?;

        info!(
            local_only = config.privacy.local_only,
            data_dir = ?config_store.data_dir(),
            "AppController initialized"
        );

        Ok(Self {
            runtime,
            config: RwLock::new(config),
            config_store,
            http,
            intelligence: OnceCell::new(),
            _log_guard: log_guard,
        })
    }

    fn model_store(&self) -> Result<LocalModelStore, DomainError> {
        LocalModelStore::new(self.config_store.models_dir())
    }

    /// Load the models and build the pipeline, once.
    pub fn intelligence(&self) -> Result<Arc<TaskIntelligence>, DomainError> {
        self.intelligence
            .get_or_try_init(|| {
                let config = self.config();
                let provider = LocalModelProvider::new(
                    self.model_store()?,
                    Arc::clone(&self.http) as Arc<dyn HttpClient>,
                    config.models,
                    config.transcription,
                    self.config_store.lexicon_path(),
                );

                let registry = self
                    .runtime
                    .block_on(ModelRegistry::initialize(&provider))?;
                info!(
                    transcription = registry.transcription_available(),
                    "Model registry ready"
                );

                Ok(Arc::new(TaskIntelligence::new(
                    &registry,
                    Arc::new(SymphoniaDecoder::new()),
                )))
            })
            .map(Arc::clone)
    }

    pub fn infer(&self, text: &str, today: Option<NaiveDate>) -> Result<TaskIntent, DomainError> {
        let intelligence = self.intelligence()?;
        let today = today.unwrap_or_else(local_today);
        self.runtime.block_on(intelligence.infer_intent(text, today))
    }

    pub fn transcribe(&self, clip: AudioClip) -> Result<String, DomainError> {
        let intelligence = self.intelligence()?;
        self.runtime.block_on(intelligence.transcribe(clip))
    }

    pub fn create(
        &self,
        request: TaskRequest,
        today: Option<NaiveDate>,
    ) -> Result<ResolvedTask, DomainError> {
        let intelligence = self.intelligence()?;
        let today = today.unwrap_or_else(local_today);
        self.runtime
            .block_on(intelligence.create_intent(request, today))
    }

    pub fn update(
        &self,
        current_text: &str,
        new_text: Option<&str>,
        overrides: TaskOverrides,
        today: Option<NaiveDate>,
    ) -> Result<TaskPatch, DomainError> {
        let intelligence = self.intelligence()?;
        let today = today.unwrap_or_else(local_today);
        Ok(self.runtime.block_on(intelligence.reinfer_on_update(
            current_text,
            new_text,
            overrides,
            today,
        )))
    }

    pub fn model_catalog(&self) -> Result<ModelCatalog, DomainError> {
        Ok(self.model_store()?.catalog().clone())
    }

    pub fn list_installed_models(&self) -> Result<Vec<InstalledModel>, DomainError> {
        self.model_store()?.list_installed()
    }

    /// Download a speech model; defaults to the configured one.
    pub fn download_model(
        &self,
        model_id: Option<&str>,
        quant: Option<Quantization>,
        progress: Option<ProgressCallback>,
    ) -> Result<PathBuf, DomainError> {
        let models = self.config().models;
        let model_id = model_id.unwrap_or(&models.speech_model);
        let quant = quant.unwrap_or(models.quantization);

        let store = self.model_store()?;
        self.runtime.block_on(store.ensure_installed(
            model_id,
            quant,
            self.http.as_ref(),
            progress,
        ))
    }

    pub fn delete_model(&self, model_id: &str, quant: Quantization) -> Result<(), DomainError> {
        self.model_store()?.delete(model_id, quant)
    }

    pub fn config(&self) -> AppConfig {
        self.config.read().clone()
    }

    /// Persist `config` and apply its network policy.
    ///
    /// Model settings only affect a pipeline that has not been built yet.
    pub fn update_config(&self, config: AppConfig) -> Result<(), DomainError> {
        self.http.apply(&config.privacy);
        self.config_store.save(&config)?;
        *self.config.write() = config;

        info!("Configuration updated");
        Ok(())
    }

    pub fn is_network_blocked(&self) -> bool {
        self.http.is_network_blocked()
    }

    pub fn data_dir(&self) -> String {
        self.config_store.data_dir().to_string_lossy().to_string()
    }

    pub fn logs_dir(&self) -> String {
        self.config_store.logs_dir().to_string_lossy().to_string()
    }

    pub fn config_path(&self) -> String {
        self.config_store.config_path().to_string_lossy().to_string()
    }
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}
