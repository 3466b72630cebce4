mod controller;
pub mod orchestrator;
pub mod registry;
pub mod transcription;

pub use controller::AppController;
pub use orchestrator::TaskIntelligence;
pub use registry::ModelRegistry;
pub use transcription::TranscriptionService;
