//! Agent pipelines: report processing, ideas export and inbox scanning.
//!
//! A pipeline never aborts on a recoverable step. Failures are collected in
//! `errors`, progress in `steps`, and the final status says whether anything
//! went wrong. Each run ends with one agent-log row.

use super::{AgentError, IdeaPlanner, ReportProcessor};
use crate::domain::config::NotionConfig;
use crate::domain::reports::{ActionItem, ParsedReport, TaskItem, TaskRecord};
use crate::llm::TextGenerator;
use crate::store::{ClientInput, ClientRecord, Store, StoreError};
use crate::workspace::{Workspace, WorkspaceError};
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Completed,
    CompletedWithErrors,
    Failed,
    /// The pipeline could not start because a setting is missing.
    Error,
}

impl PipelineStatus {
    fn from_errors(errors: &[String]) -> Self {
        if errors.is_empty() {
            PipelineStatus::Completed
        } else {
            PipelineStatus::CompletedWithErrors
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportOutcome {
    pub status: PipelineStatus,
    pub steps: Vec<String>,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed_report: Option<ParsedReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_new_client: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_page_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_database_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_page_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_tasks: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_count: Option<usize>,
}

impl ReportOutcome {
    fn new() -> Self {
        Self {
            status: PipelineStatus::Failed,
            steps: Vec::new(),
            errors: Vec::new(),
            parsed_report: None,
            client_name: None,
            is_new_client: None,
            client_page_id: None,
            client_database_id: None,
            meeting_page_id: None,
            created_tasks: None,
            task_count: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    pub title: String,
    pub page_id: String,
    pub task_count: usize,
    pub milestone_count: usize,
    pub estimated_duration_weeks: Option<Value>,
    pub timeline: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IdeasOutcome {
    pub status: PipelineStatus,
    pub steps: Vec<String>,
    pub errors: Vec<String>,
    pub projects: Vec<ProjectSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_count: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InboxItem {
    pub page_id: String,
    pub client: String,
    pub tasks_created: usize,
    pub status: PipelineStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct InboxScan {
    pub status: PipelineStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub found: usize,
    pub processed: Vec<InboxItem>,
    pub errors: Vec<String>,
    pub processed_count: usize,
}

/// Merge extracted tasks with the report's action items.
///
/// Names are compared trimmed and case-insensitively; the first occurrence
/// wins and input order is kept, extracted tasks first. Action items get
/// `Unassigned`, `Medium` and `Action Item` where they say nothing.
pub fn merge_tasks(extracted: Vec<TaskItem>, action_items: &[ActionItem]) -> Vec<TaskItem> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();

    for task in extracted {
        let key = task.name.trim().to_lowercase();
        if !key.is_empty() && seen.insert(key) {
            merged.push(task);
        }
    }

    for item in action_items {
        let key = item.text().trim().to_lowercase();
        if key.is_empty() || !seen.insert(key) {
            continue;
        }
        let or = |value: &str, fallback: &str| {
            if value.is_empty() { fallback.to_string() } else { value.to_string() }
        };
        merged.push(match item {
            ActionItem::Plain(text) => TaskItem {
                name: text.clone(),
                assignee: "Unassigned".to_string(),
                due_date: String::new(),
                priority: "Medium".to_string(),
                category: "Action Item".to_string(),
            },
            ActionItem::Detailed(detail) => TaskItem {
                name: detail.task.clone(),
                assignee: or(&detail.assignee, "Unassigned"),
                due_date: detail.due_date.clone(),
                priority: or(&detail.priority, "Medium"),
                category: or(&detail.category, "Action Item"),
            },
        });
    }

    merged
}

/// The agent with its collaborators. The store is locked only for the
/// duration of each database call.
pub struct Agent<'a> {
    llm: &'a dyn TextGenerator,
    workspace: &'a dyn Workspace,
    store: &'a Mutex<Store>,
    notion: &'a NotionConfig,
}

impl<'a> Agent<'a> {
    pub fn new(
        llm: &'a dyn TextGenerator,
        workspace: &'a dyn Workspace,
        store: &'a Mutex<Store>,
        notion: &'a NotionConfig,
    ) -> Self {
        Self { llm, workspace, store, notion }
    }

    fn with_store<T>(&self, f: impl FnOnce(&Store) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let guard = self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&guard)
    }

    /// Record a pipeline run; a failing write is logged and otherwise ignored.
    fn log_event(&self, event_type: &str, client_id: Option<i64>, payload: &impl Serialize) {
        let data = serde_json::to_value(payload).unwrap_or(Value::Null);
        if let Err(e) = self.with_store(|s| s.log_event(event_type, client_id, &data)) {
            tracing::warn!(event_type, "failed to write agent log: {e}");
        }
    }

    pub fn process_report(&self, raw_report: &str) -> ReportOutcome {
        let processor = ReportProcessor::new(self.llm);
        let mut out = ReportOutcome::new();

        let parsed = match processor.parse(raw_report) {
            Ok(parsed) => parsed,
            Err(e) => {
                let message = match &e {
                    AgentError::Unparsable(_) => format!("Report parsing failed: {e}"),
                    AgentError::Llm(_) => format!("Report parsing exception: {e}"),
                };
                out.errors.push(message);
                out.status = PipelineStatus::Failed;
                self.log_event("fireflies_parse_error", None, &out);
                return out;
            }
        };
        out.steps.push("Parsed meeting report".to_string());
        out.parsed_report = Some(parsed.clone());

        let known = self.with_store(|s| s.client_names()).unwrap_or_default();
        let fallback_name = || {
            if parsed.client_name.trim().is_empty() {
                "Unknown".to_string()
            } else {
                parsed.client_name.clone()
            }
        };
        let (client_name, is_new) = match processor.identify_client(raw_report, &known) {
            Ok(id) => {
                let name = id
                    .client_name
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(fallback_name);
                out.steps.push(format!("Identified client: {name} (new={})", id.is_new_client));
                out.client_name = Some(name.clone());
                out.is_new_client = Some(id.is_new_client);
                (name, id.is_new_client)
            }
            Err(e) => {
                let name = fallback_name();
                tracing::warn!("client identification failed: {e}");
                out.steps.push(format!("Client identification fallback: {name}"));
                out.client_name = Some(name.clone());
                (name, true)
            }
        };

        let client = match self.ensure_client_workspace(&client_name, is_new) {
            Ok(client) => client,
            Err(e) => {
                out.errors.push(format!("Workspace creation failed: {e:#}"));
                out.status = PipelineStatus::Failed;
                self.log_event("workspace_error", None, &out);
                return out;
            }
        };
        out.steps.push(format!(
            "Client workspace ready: page={}, db={}",
            client.notion_page_id, client.notion_database_id
        ));
        out.client_page_id = Some(client.notion_page_id.clone());
        out.client_database_id = Some(client.notion_database_id.clone());

        match self.workspace.create_meeting_page(&client.notion_page_id, &parsed) {
            Ok(id) => {
                out.steps.push(format!("Created meeting summary page: {id}"));
                out.meeting_page_id = Some(id);
            }
            Err(e) => out.errors.push(format!("Meeting page creation failed: {e}")),
        }

        match processor.extract_tasks(raw_report, &parsed.attendees) {
            Ok(extracted) => {
                let tasks = merge_tasks(extracted, &parsed.action_items);
                let mut created = Vec::new();
                for task in tasks {
                    let record = task_record(task, &parsed);
                    match self.workspace.create_task(&client.notion_database_id, &record) {
                        Ok(_) => created.push(record.name),
                        Err(e) => {
                            out.errors.push(format!("Task creation failed for '{}': {e}", record.name))
                        }
                    }
                }
                out.steps.push(format!("Created {} tasks in database", created.len()));
                out.task_count = Some(created.len());
                out.created_tasks = Some(created);
            }
            Err(e) => out.errors.push(format!("Task extraction/creation failed: {e}")),
        }

        out.status = PipelineStatus::from_errors(&out.errors);
        tracing::info!(client = %client_name, status = ?out.status, "processed meeting report");
        self.log_event("fireflies_processed", Some(client.id), &out);
        out
    }

    /// Find or create the client's page and task database, keeping the local
    /// client record in step.
    fn ensure_client_workspace(&self, name: &str, is_new: bool) -> Result<ClientRecord> {
        let existing = self.with_store(|s| s.find_client_by_name(name))?;
        if let Some(record) = &existing {
            if !record.notion_page_id.is_empty() && !record.notion_database_id.is_empty() {
                return Ok(record.clone());
            }
        }

        let (page_id, database_id) = match self.found_database(name, is_new)? {
            Some(found) => found,
            None => {
                if self.notion.parent_page_id.is_empty() {
                    return Err(WorkspaceError::MissingSetting("NOTION_PARENT_PAGE_ID").into());
                }
                let page_id = self
                    .workspace
                    .create_client_page(name, &self.notion.parent_page_id)
                    .context("creating client page")?;
                let database_id = self
                    .workspace
                    .create_client_database(name, &page_id)
                    .context("creating client database")?;
                (Some(page_id), database_id)
            }
        };

        let input = ClientInput {
            name: None,
            notion_page_id: page_id,
            notion_database_id: Some(database_id),
            notes: None,
        };
        let record = match existing {
            Some(record) => self.with_store(|s| s.update_client(record.id, &input))?,
            None => self.with_store(|s| s.create_client(&ClientInput { name: Some(name.to_string()), ..input }))?,
        };
        Ok(record)
    }

    /// A database found by search, only consulted for known clients.
    fn found_database(&self, name: &str, is_new: bool) -> Result<Option<(Option<String>, String)>> {
        if is_new {
            return Ok(None);
        }
        let found = self.workspace.find_client_database(name).context("searching client databases")?;
        Ok(found.map(|db| (db.parent_page_id, db.id)))
    }

    pub fn process_ideas(&self, markdown: &str) -> IdeasOutcome {
        let planner = IdeaPlanner::new(self.llm);
        let mut out = IdeasOutcome {
            status: PipelineStatus::Failed,
            steps: Vec::new(),
            errors: Vec::new(),
            projects: Vec::new(),
            project_count: None,
        };

        let ideas = match planner.parse_ideas(markdown) {
            Ok(ideas) => ideas,
            Err(e) => {
                out.errors.push(format!("Obsidian parsing failed: {e}"));
                self.log_event("obsidian_parse_error", None, &out);
                return out;
            }
        };
        out.steps.push(format!("Parsed {} project ideas from Obsidian", ideas.len()));

        if ideas.is_empty() {
            out.status = PipelineStatus::Completed;
            out.steps.push("No project ideas found in export".to_string());
            return out;
        }

        let Some(parent) = self.notion.projects_parent() else {
            out.errors.push("NOTION_PROJECTS_PAGE_ID not configured".to_string());
            return out;
        };

        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        for idea in &ideas {
            let plan = match planner.generate_plan(idea, &today) {
                Ok(plan) => plan,
                Err(e) => {
                    out.errors.push(format!("Plan generation failed for '{}': {e}", idea.title));
                    continue;
                }
            };
            let title = if plan.title.is_empty() { idea.title.clone() } else { plan.title.clone() };
            out.steps.push(format!("Generated plan for: {title}"));

            match self.workspace.create_project_page(parent, &plan) {
                Ok(page_id) => {
                    out.steps.push(format!("Created Notion project page for: {title}"));
                    out.projects.push(ProjectSummary {
                        title,
                        page_id,
                        task_count: plan.tasks.len(),
                        milestone_count: plan.milestones.len(),
                        estimated_duration_weeks: plan.estimated_duration_weeks.clone(),
                        timeline: plan.timeline_recommendation.clone(),
                    });
                }
                Err(e) => out.errors.push(format!("Project creation failed for '{}': {e}", idea.title)),
            }
        }

        out.status = PipelineStatus::from_errors(&out.errors);
        out.project_count = Some(out.projects.len());
        self.log_event("obsidian_processed", None, &out);
        out
    }

    /// Process every unprocessed report page in the inbox database, marking
    /// each one processed afterwards.
    pub fn scan_inbox(&self) -> InboxScan {
        let mut out = InboxScan {
            status: PipelineStatus::Failed,
            message: None,
            found: 0,
            processed: Vec::new(),
            errors: Vec::new(),
            processed_count: 0,
        };
        let inbox = self.notion.fireflies_inbox_db_id.as_str();
        if inbox.is_empty() {
            out.status = PipelineStatus::Error;
            out.message = Some("NOTION_FIREFLIES_INBOX_DB_ID not configured".to_string());
            return out;
        }

        let pages = match self.workspace.unprocessed_pages(inbox) {
            Ok(pages) => pages,
            Err(e) => {
                out.errors.push(format!("Inbox scan failed: {e}"));
                return out;
            }
        };
        out.found = pages.len();

        for page_id in pages {
            if let Err(e) = self.process_inbox_page(&page_id, &mut out) {
                out.errors.push(format!("Failed to process page {page_id}: {e}"));
            }
        }

        out.status = PipelineStatus::Completed;
        out.processed_count = out.processed.len();
        self.log_event("inbox_scan", None, &out);
        out
    }

    fn process_inbox_page(&self, page_id: &str, out: &mut InboxScan) -> Result<(), WorkspaceError> {
        let text = self.workspace.page_text(page_id)?;
        if text.trim().is_empty() {
            out.errors.push(format!("Empty report in page {page_id}"));
            return Ok(());
        }
        let result = self.process_report(&text);
        out.processed.push(InboxItem {
            page_id: page_id.to_string(),
            client: result.client_name.clone().unwrap_or_else(|| "Unknown".to_string()),
            tasks_created: result.task_count.unwrap_or(0),
            status: result.status,
        });
        self.workspace.mark_processed(page_id)
    }
}

fn task_record(task: TaskItem, report: &ParsedReport) -> TaskRecord {
    let or = |value: String, fallback: &str| if value.is_empty() { fallback.to_string() } else { value };
    TaskRecord {
        name: or(task.name, "Untitled Task"),
        assignee: or(task.assignee, "Unassigned"),
        due_date: task.due_date,
        priority: or(task.priority, "Medium"),
        category: or(task.category, "Task"),
        meeting_date: report.date.clone(),
        source: report.title_or_default().to_string(),
        status: "Not Started".to_string(),
    }
}
