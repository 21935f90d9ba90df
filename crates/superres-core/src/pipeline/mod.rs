pub mod config;
mod orchestrator;
mod types;

pub use config::ReconstructionConfig;
pub use orchestrator::{run_reconstruction, run_reconstruction_reported};
pub use types::{PipelineStage, ProgressReporter};
