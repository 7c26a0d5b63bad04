//! Structured payloads returned by the LLM for the client-report agent.
//!
//! Every field is optional on the wire; missing keys take the documented
//! defaults so a partially filled reply still deserializes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedReport {
    pub title: String,
    /// `YYYY-MM-DD` or empty.
    pub date: String,
    pub attendees: Vec<String>,
    pub client_name: String,
    pub summary: String,
    pub key_topics: Vec<String>,
    pub action_items: Vec<ActionItem>,
    pub transcript_highlights: Vec<String>,
}

impl ParsedReport {
    pub fn title_or_default(&self) -> &str {
        if self.title.is_empty() {
            "Meeting"
        } else {
            &self.title
        }
    }
}

/// Action items arrive either as bare strings or as objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionItem {
    Plain(String),
    Detailed(DetailedAction),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailedAction {
    #[serde(alias = "name")]
    pub task: String,
    pub assignee: String,
    pub priority: String,
    pub category: String,
    pub due_date: String,
}

impl ActionItem {
    pub fn text(&self) -> &str {
        match self {
            ActionItem::Plain(text) => text,
            ActionItem::Detailed(item) => &item.task,
        }
    }

    pub fn assignee(&self) -> &str {
        match self {
            ActionItem::Plain(_) => "",
            ActionItem::Detailed(item) => &item.assignee,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientIdentification {
    pub client_name: Option<String>,
    pub confidence: String,
    pub is_new_client: bool,
    pub matched_existing: Option<String>,
    pub reasoning: String,
}

impl Default for ClientIdentification {
    fn default() -> Self {
        Self {
            client_name: None,
            confidence: String::new(),
            is_new_client: true,
            matched_existing: None,
            reasoning: String::new(),
        }
    }
}

/// A task as extracted from a report, before it is filed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskItem {
    #[serde(alias = "task")]
    pub name: String,
    pub assignee: String,
    pub due_date: String,
    pub priority: String,
    pub category: String,
}

/// The row written to a client's task database.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRecord {
    pub name: String,
    pub assignee: String,
    pub due_date: String,
    pub priority: String,
    pub category: String,
    pub meeting_date: String,
    pub source: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectIdea {
    pub title: String,
    pub raw_content: String,
    pub description: String,
    pub tags: Vec<String>,
    pub links: Vec<String>,
    pub category: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectPlan {
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub tasks: Vec<PlannedTask>,
    pub milestones: Vec<Milestone>,
    pub timeline_recommendation: String,
    pub estimated_duration_weeks: Option<serde_json::Value>,
    pub team_size_recommendation: String,
    pub risks: Vec<String>,
    pub next_steps: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannedTask {
    pub name: String,
    pub assignee: String,
    pub due_date: String,
    pub priority: String,
    pub phase: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Milestone {
    pub name: String,
    pub target_date: String,
    pub description: String,
    pub deliverables: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_items_accept_strings_and_objects() {
        let report: ParsedReport = serde_json::from_value(json!({
            "title": "Kickoff",
            "action_items": [
                "Send deck",
                {"task": "Book venue", "assignee": "Ana"}
            ]
        }))
        .expect("report");
        assert_eq!(report.action_items.len(), 2);
        assert_eq!(report.action_items[0].text(), "Send deck");
        assert_eq!(report.action_items[1].text(), "Book venue");
        assert_eq!(report.action_items[1].assignee(), "Ana");
        assert!(report.attendees.is_empty());
    }

    #[test]
    fn identification_defaults_to_new_client() {
        let id: ClientIdentification = serde_json::from_value(json!({})).expect("id");
        assert!(id.is_new_client);
        assert!(id.client_name.is_none());
    }

    #[test]
    fn task_item_accepts_task_alias() {
        let task: TaskItem =
            serde_json::from_value(json!({"task": "Email client"})).expect("task");
        assert_eq!(task.name, "Email client");
        assert!(task.priority.is_empty());
    }
}
