//! Client-report agent.
//!
//! Meeting reports become client workspaces, summary pages and tasks;
//! monthly notes exports become project plans and project pages. Every run
//! is written to the agent log.

use crate::llm::{LlmError, Unparsable};
use thiserror::Error;

pub mod ideas;
pub mod pipeline;
pub mod reports;

pub use ideas::IdeaPlanner;
pub use pipeline::{
    merge_tasks, Agent, InboxItem, InboxScan, PipelineStatus, ProjectSummary, ReportOutcome, IdeasOutcome,
};
pub use reports::ReportProcessor;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Unparsable(#[from] Unparsable),
}
