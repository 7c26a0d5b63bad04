//! Third-party workspace (Notion) access.
//!
//! Pipelines talk to the [`Workspace`] trait. [`NotionClient`] speaks the
//! Notion REST API; [`MemoryWorkspace`] keeps everything in process and backs
//! the pipeline tests.

use crate::domain::reports::{ParsedReport, ProjectPlan, TaskRecord};
use thiserror::Error;

pub mod blocks;
pub mod memory;
pub mod notion;

pub use memory::MemoryWorkspace;
pub use notion::NotionClient;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("NOTION_TOKEN is not set. Add it to the environment or the [notion] config section.")]
    MissingToken,

    #[error("{0} is not set.")]
    MissingSetting(&'static str),

    #[error("failed to reach workspace API {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("workspace API error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("workspace API returned an unexpected body: {0}")]
    InvalidBody(String),

    #[error("{0}")]
    Rejected(String),
}

/// An existing task database found by search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseRef {
    pub id: String,
    /// Page the database lives under, when it is page-parented.
    pub parent_page_id: Option<String>,
}

/// A vault note promoted to a row of the export database.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPage {
    pub title: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub source: String,
    pub status: String,
}

/// Operations the agent pipelines need from the workspace. Every creating
/// call returns the new object's id.
pub trait Workspace: Send + Sync {
    fn find_client_database(&self, client_name: &str) -> Result<Option<DatabaseRef>, WorkspaceError>;

    fn create_client_page(&self, client_name: &str, parent_page_id: &str) -> Result<String, WorkspaceError>;

    fn create_client_database(&self, client_name: &str, parent_page_id: &str) -> Result<String, WorkspaceError>;

    fn create_meeting_page(&self, parent_page_id: &str, report: &ParsedReport) -> Result<String, WorkspaceError>;

    fn create_task(&self, database_id: &str, task: &TaskRecord) -> Result<String, WorkspaceError>;

    fn create_project_page(&self, parent_page_id: &str, plan: &ProjectPlan) -> Result<String, WorkspaceError>;

    fn create_export_page(&self, database_id: &str, page: &ExportPage) -> Result<String, WorkspaceError>;

    /// Ids of inbox pages whose `Processed` checkbox is unset, oldest first.
    fn unprocessed_pages(&self, database_id: &str) -> Result<Vec<String>, WorkspaceError>;

    /// Plain text of a page's blocks, one line per block.
    fn page_text(&self, page_id: &str) -> Result<String, WorkspaceError>;

    fn mark_processed(&self, page_id: &str) -> Result<(), WorkspaceError>;
}
