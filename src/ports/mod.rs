pub mod config;
pub mod http;
pub mod model_provider;
pub mod nlp;
pub mod speech;

pub use config::ConfigStore;
pub use http::{HttpClient, ProgressCallback};
pub use model_provider::ModelProvider;
pub use nlp::NlpModel;
pub use speech::{AudioDecoder, SpeechModel, TranscriptionResult};
