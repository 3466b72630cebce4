pub mod audio;
pub mod config;
pub mod due_date;
pub mod error;
pub mod model;
pub mod nlp;
pub mod priority;
pub mod task;

pub use audio::{AudioClip, DecodedAudio, Waveform, MODEL_SAMPLE_RATE};
pub use config::AppConfig;
pub use error::DomainError;
pub use model::{InstalledModel, ModelCatalog, ModelInfo, ModelVariant, Quantization};
pub use nlp::{tokenize, Doc, Entity, EntityLabel, Token};
pub use task::{
    parse_due_date, Priority, ResolvedTask, TaskIntent, TaskOverrides, TaskPatch, TaskRequest,
};
