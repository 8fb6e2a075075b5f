pub mod download_flow;
pub mod phase;

pub use download_flow::Workflow;
pub use phase::WorkflowPhase;
