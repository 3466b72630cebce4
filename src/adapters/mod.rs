pub mod audio_decode;
pub mod config_store;
pub mod http_guard;
pub mod lexicon_nlp;
pub mod model_provider;
pub mod model_store;
pub mod whisper_cpp;

pub use audio_decode::{resample_channels, SymphoniaDecoder};
pub use config_store::TomlConfigStore;
pub use http_guard::GuardedHttpClient;
pub use lexicon_nlp::LexiconNlpModel;
pub use model_provider::LocalModelProvider;
pub use model_store::LocalModelStore;
pub use whisper_cpp::WhisperCppSpeechModel;
