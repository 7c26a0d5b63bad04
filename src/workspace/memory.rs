//! In-process workspace.

use super::{blocks, DatabaseRef, ExportPage, Workspace, WorkspaceError};
use crate::domain::reports::{ParsedReport, ProjectPlan, TaskRecord};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq)]
pub enum Created {
    ClientPage { id: String, client: String, parent: String },
    ClientDatabase { id: String, client: String, parent: String },
    MeetingPage { id: String, title: String, parent: String },
    Task { id: String, database: String, task: TaskRecord },
    ProjectPage { id: String, title: String, parent: String },
    ExportPage { id: String, database: String, page: ExportPage },
}

#[derive(Debug, Clone, PartialEq)]
pub struct InboxPage {
    pub id: String,
    pub text: String,
    pub processed: bool,
}

#[derive(Default)]
struct State {
    next_id: usize,
    created: Vec<Created>,
    databases: Vec<(String, DatabaseRef)>,
    inbox: Vec<InboxPage>,
}

/// Workspace that records every object it is asked to create.
///
/// Task names listed with [`MemoryWorkspace::reject_task`] fail with
/// [`WorkspaceError::Rejected`].
#[derive(Default)]
pub struct MemoryWorkspace {
    state: Mutex<State>,
    rejected_tasks: Mutex<Vec<String>>,
}

impl MemoryWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-register an existing client database under a display title.
    pub fn with_database(self, title: &str, database: DatabaseRef) -> Self {
        self.lock().databases.push((title.to_string(), database));
        self
    }

    pub fn with_inbox_page(self, id: &str, text: &str) -> Self {
        self.lock().inbox.push(InboxPage { id: id.to_string(), text: text.to_string(), processed: false });
        self
    }

    pub fn reject_task(&self, name: &str) {
        if let Ok(mut names) = self.rejected_tasks.lock() {
            names.push(name.to_string());
        }
    }

    pub fn created(&self) -> Vec<Created> {
        self.lock().created.clone()
    }

    pub fn inbox(&self) -> Vec<InboxPage> {
        self.lock().inbox.clone()
    }

    pub fn tasks(&self) -> Vec<TaskRecord> {
        self.created()
            .into_iter()
            .filter_map(|c| match c {
                Created::Task { task, .. } => Some(task),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, make: impl FnOnce(String) -> Created) -> String {
        let mut state = self.lock();
        state.next_id += 1;
        let id = format!("mem-{}", state.next_id);
        let created = make(id.clone());
        state.created.push(created);
        id
    }
}

impl Workspace for MemoryWorkspace {
    fn find_client_database(&self, client_name: &str) -> Result<Option<DatabaseRef>, WorkspaceError> {
        let needle = client_name.to_lowercase();
        Ok(self
            .lock()
            .databases
            .iter()
            .find(|(title, _)| title.to_lowercase().contains(&needle))
            .map(|(_, db)| db.clone()))
    }

    fn create_client_page(&self, client_name: &str, parent_page_id: &str) -> Result<String, WorkspaceError> {
        Ok(self.record(|id| Created::ClientPage {
            id,
            client: client_name.to_string(),
            parent: parent_page_id.to_string(),
        }))
    }

    fn create_client_database(&self, client_name: &str, parent_page_id: &str) -> Result<String, WorkspaceError> {
        let id = self.record(|id| Created::ClientDatabase {
            id,
            client: client_name.to_string(),
            parent: parent_page_id.to_string(),
        });
        self.lock().databases.push((
            blocks::client_database_title(client_name),
            DatabaseRef { id: id.clone(), parent_page_id: Some(parent_page_id.to_string()) },
        ));
        Ok(id)
    }

    fn create_meeting_page(&self, parent_page_id: &str, report: &ParsedReport) -> Result<String, WorkspaceError> {
        Ok(self.record(|id| Created::MeetingPage {
            id,
            title: blocks::meeting_page_title(report),
            parent: parent_page_id.to_string(),
        }))
    }

    fn create_task(&self, database_id: &str, task: &TaskRecord) -> Result<String, WorkspaceError> {
        let rejected = self
            .rejected_tasks
            .lock()
            .map(|names| names.iter().any(|n| n == &task.name))
            .unwrap_or(false);
        if rejected {
            return Err(WorkspaceError::Rejected(format!("task '{}' rejected", task.name)));
        }
        Ok(self.record(|id| Created::Task { id, database: database_id.to_string(), task: task.clone() }))
    }

    fn create_project_page(&self, parent_page_id: &str, plan: &ProjectPlan) -> Result<String, WorkspaceError> {
        Ok(self.record(|id| Created::ProjectPage {
            id,
            title: plan.title.clone(),
            parent: parent_page_id.to_string(),
        }))
    }

    fn create_export_page(&self, database_id: &str, page: &ExportPage) -> Result<String, WorkspaceError> {
        Ok(self.record(|id| Created::ExportPage { id, database: database_id.to_string(), page: page.clone() }))
    }

    fn unprocessed_pages(&self, _database_id: &str) -> Result<Vec<String>, WorkspaceError> {
        Ok(self.lock().inbox.iter().filter(|p| !p.processed).map(|p| p.id.clone()).collect())
    }

    fn page_text(&self, page_id: &str) -> Result<String, WorkspaceError> {
        self.lock()
            .inbox
            .iter()
            .find(|p| p.id == page_id)
            .map(|p| p.text.clone())
            .ok_or_else(|| WorkspaceError::Rejected(format!("page {page_id} not found")))
    }

    fn mark_processed(&self, page_id: &str) -> Result<(), WorkspaceError> {
        let mut state = self.lock();
        match state.inbox.iter_mut().find(|p| p.id == page_id) {
            Some(page) => {
                page.processed = true;
                Ok(())
            }
            None => Err(WorkspaceError::Rejected(format!("page {page_id} not found"))),
        }
    }
}
