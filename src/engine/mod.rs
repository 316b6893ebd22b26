//! Public façade for the engine layer.

pub mod analyzer;
pub mod composer;
pub mod core;
pub mod feedback;
pub mod orchestrator;
pub mod types;

pub use analyzer::{decode_analysis, AnalysisDecode, TurnAnalyzer, ANALYSIS_SCHEMA};
pub use composer::{ResponseComposer, INLINE_CORRECTION_THRESHOLD};
pub use feedback::{FeedbackAggregator, MistakeSummary, NO_MISTAKES_MESSAGE};
pub use orchestrator::{SessionController, SessionOutcome};
pub use types::{
    AnalysisResult, EngineState, LifecycleError, SessionContext, SessionObservations,
    SessionPhase, SessionPresets, Task,
};
