use std::fmt::Display;

/// 流程阶段
///
/// `Idle → SessionReady → Searching → ResultsReady → Downloading → Completed | Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowPhase {
    Idle,
    SessionReady,
    Searching,
    ResultsReady,
    Downloading,
    Completed,
    Failed,
}

impl Display for WorkflowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WorkflowPhase::Idle => "idle",
            WorkflowPhase::SessionReady => "session-ready",
            WorkflowPhase::Searching => "searching",
            WorkflowPhase::ResultsReady => "results-ready",
            WorkflowPhase::Downloading => "downloading",
            WorkflowPhase::Completed => "completed",
            WorkflowPhase::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}
