pub mod adapters;
pub mod http;
pub mod orchestrator;
pub mod retry;
pub mod stages;

pub use adapters::{
    AdapterError, KnowledgeAdapter, LabelCandidate, MarketExplainRequest, ReasoningAdapter,
    StrategyCandidate, StrategyProposeRequest, TrendSnapshot, VisionAdapter, VisionDetection,
};
pub use orchestrator::{Orchestrator, OrchestrationError, OrchestratorSettings, Stage};
pub use retry::{RetryError, RetryExecutor, RetryPolicy};
pub use stages::StageError;
