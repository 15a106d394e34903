//! Per-request query pipeline

mod orchestrator;

pub use orchestrator::{PipelineStage, QueryOrchestrator};
