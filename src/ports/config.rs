use std::path::PathBuf;

use crate::domain::{AppConfig, DomainError};

/// Port for the persisted configuration and the on-disk layout around it.
pub trait ConfigStore: Send + Sync {
    /// Load configuration, writing the defaults first if no file exists.
    fn load(&self) -> Result<AppConfig, DomainError>;

    fn save(&self, config: &AppConfig) -> Result<(), DomainError>;

    fn config_path(&self) -> PathBuf;

    /// Root of everything the pipeline keeps on disk.
    fn data_dir(&self) -> PathBuf;

    fn logs_dir(&self) -> PathBuf;

    /// Directory holding downloaded speech model files.
    fn models_dir(&self) -> PathBuf {
        self.data_dir().join("models")
    }

    /// Location of the NLP date lexicon.
    fn lexicon_path(&self) -> PathBuf {
        self.data_dir().join("nlp").join("date_lexicon.json")
    }
}
