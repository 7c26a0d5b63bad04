//! Notion block and property payloads.
//!
//! Rich-text content is capped at 2000 characters, the API's per-object limit.

use crate::domain::reports::{ParsedReport, ProjectPlan, TaskRecord};
use crate::utils::text::truncate_chars;
use serde_json::{json, Value};

pub const TEXT_LIMIT: usize = 2000;
const MAX_TAGS: usize = 10;

pub fn rich_text(content: &str) -> Value {
    json!([{ "type": "text", "text": { "content": truncate_chars(content, TEXT_LIMIT) } }])
}

fn block(kind: &str, body: Value) -> Value {
    let mut value = json!({ "object": "block", "type": kind });
    value[kind] = body;
    value
}

fn text_block(kind: &str, content: &str) -> Value {
    block(kind, json!({ "rich_text": rich_text(content) }))
}

fn to_do(content: &str) -> Value {
    block("to_do", json!({ "rich_text": rich_text(content), "checked": false }))
}

fn callout(content: &str, emoji: &str) -> Value {
    block("callout", json!({ "rich_text": rich_text(content), "icon": { "type": "emoji", "emoji": emoji } }))
}

fn table_row(label: &str, value: &str) -> Value {
    json!({
        "type": "table_row",
        "table_row": { "cells": [rich_text(label), rich_text(value)] }
    })
}

pub fn title_property(title: &str) -> Value {
    json!({ "title": rich_text(title) })
}

/// Body of a new client hub page.
pub fn client_hub_blocks(client_name: &str) -> Vec<Value> {
    vec![
        text_block("heading_1", &format!("{client_name} - Client Hub")),
        callout(
            "This page is managed by the agent. Meeting summaries are filed here \
             automatically, and tasks are extracted and assigned.",
            "🤖",
        ),
        text_block("heading_2", "Meeting Summaries"),
        block("divider", json!({})),
    ]
}

pub fn client_database_title(client_name: &str) -> String {
    format!("{client_name} - Tasks & Meetings")
}

/// Column schema of a client task database.
pub fn client_database_schema() -> Value {
    let options = |pairs: &[(&str, &str)]| -> Value {
        pairs.iter().map(|(name, color)| json!({ "name": name, "color": color })).collect()
    };
    json!({
        "Name": { "title": {} },
        "Status": { "select": { "options": options(&[
            ("Not Started", "gray"), ("In Progress", "blue"), ("Done", "green"), ("Blocked", "red"),
        ]) } },
        "Assignee": { "rich_text": {} },
        "Due Date": { "date": {} },
        "Priority": { "select": { "options": options(&[
            ("High", "red"), ("Medium", "yellow"), ("Low", "green"),
        ]) } },
        "Category": { "select": { "options": options(&[
            ("Task", "blue"), ("Follow-up", "purple"), ("Decision", "orange"), ("Action Item", "pink"),
        ]) } },
        "Meeting Date": { "date": {} },
        "Source": { "rich_text": {} },
    })
}

/// `"{title} ({date})"`, or the bare title when the date is unknown.
pub fn meeting_page_title(report: &ParsedReport) -> String {
    let title = if report.title.is_empty() { "Meeting Summary" } else { report.title.as_str() };
    if report.date.is_empty() {
        title.to_string()
    } else {
        format!("{title} ({})", report.date)
    }
}

pub fn meeting_blocks(report: &ParsedReport) -> Vec<Value> {
    let date = if report.date.is_empty() { "N/A" } else { report.date.as_str() };
    let mut children = vec![
        text_block("heading_2", "Meeting Details"),
        block(
            "table",
            json!({
                "table_width": 2,
                "has_column_header": false,
                "has_row_header": true,
                "children": [
                    table_row("Date", date),
                    table_row("Attendees", &report.attendees.join(", ")),
                ],
            }),
        ),
    ];

    if !report.summary.is_empty() {
        children.push(text_block("heading_2", "Summary"));
        children.push(text_block("paragraph", &report.summary));
    }

    if !report.key_topics.is_empty() {
        children.push(text_block("heading_2", "Key Topics"));
        children.extend(report.key_topics.iter().map(|t| text_block("bulleted_list_item", t)));
    }

    if !report.action_items.is_empty() {
        children.push(text_block("heading_2", "Action Items"));
        for item in &report.action_items {
            let text = match item.assignee() {
                "" => item.text().to_string(),
                who => format!("{} — Assigned to: {who}", item.text()),
            };
            children.push(to_do(&text));
        }
    }

    if !report.transcript_highlights.is_empty() {
        children.push(text_block("heading_2", "Notable Quotes / Highlights"));
        children.extend(report.transcript_highlights.iter().map(|h| text_block("quote", h)));
    }

    children
}

/// Row properties for a task; optional columns are omitted when empty.
pub fn task_properties(task: &TaskRecord) -> Value {
    let name = if task.name.is_empty() { "Untitled Task" } else { task.name.as_str() };
    let status = if task.status.is_empty() { "Not Started" } else { task.status.as_str() };
    let mut props = json!({
        "Name": title_property(name),
        "Status": { "select": { "name": status } },
    });
    let mut set = |key: &str, value: Value| {
        props[key] = value;
    };
    if !task.assignee.is_empty() {
        set("Assignee", json!({ "rich_text": rich_text(&task.assignee) }));
    }
    if !task.due_date.is_empty() {
        set("Due Date", json!({ "date": { "start": task.due_date } }));
    }
    if !task.priority.is_empty() {
        set("Priority", json!({ "select": { "name": task.priority } }));
    }
    if !task.category.is_empty() {
        set("Category", json!({ "select": { "name": task.category } }));
    }
    if !task.meeting_date.is_empty() {
        set("Meeting Date", json!({ "date": { "start": task.meeting_date } }));
    }
    if !task.source.is_empty() {
        set("Source", json!({ "rich_text": rich_text(&task.source) }));
    }
    props
}

pub fn project_blocks(plan: &ProjectPlan, today: &str) -> Vec<Value> {
    let mut children = vec![callout(
        &format!("Project sourced from Obsidian monthly review. Created: {today}"),
        "📋",
    )];

    if !plan.description.is_empty() {
        children.push(text_block("heading_2", "Project Description"));
        children.push(text_block("paragraph", &plan.description));
    }

    if !plan.requirements.is_empty() {
        children.push(text_block("heading_2", "Requirements"));
        children.extend(plan.requirements.iter().map(|r| text_block("bulleted_list_item", r)));
    }

    if !plan.tasks.is_empty() {
        children.push(text_block("heading_2", "Task List"));
        for task in &plan.tasks {
            let mut text = task.name.clone();
            if !task.assignee.is_empty() {
                text.push_str(&format!(" | Assignee: {}", task.assignee));
            }
            if !task.due_date.is_empty() {
                text.push_str(&format!(" | Due: {}", task.due_date));
            }
            children.push(to_do(&text));
        }
    }

    if !plan.milestones.is_empty() {
        children.push(text_block("heading_2", "Milestones"));
        for milestone in &plan.milestones {
            let text = match milestone.target_date.as_str() {
                "" => milestone.name.clone(),
                date => format!("{} — Target: {date}", milestone.name),
            };
            children.push(text_block("numbered_list_item", &text));
        }
    }

    if !plan.timeline_recommendation.is_empty() {
        children.push(text_block("heading_2", "Timeline & Recommendations"));
        children.push(text_block("paragraph", &plan.timeline_recommendation));
    }

    children
}

pub fn export_properties(page: &super::ExportPage, imported: &str) -> Value {
    let tags: Vec<Value> = page
        .tags
        .iter()
        .take(MAX_TAGS)
        .map(|t| json!({ "name": t.trim_start_matches('#') }))
        .collect();
    json!({
        "Name": title_property(&page.title),
        "Status": { "select": { "name": page.status } },
        "Tags": { "multi_select": tags },
        "Summary": { "rich_text": rich_text(&page.summary) },
        "Source": { "rich_text": rich_text(&page.source) },
        "Imported": { "date": { "start": imported } },
    })
}

pub fn export_blocks(page: &super::ExportPage) -> Vec<Value> {
    vec![text_block("paragraph", &page.summary)]
}

/// Plain text of blocks: each block's rich-text runs joined, one line per
/// non-empty block.
pub fn blocks_to_text(blocks: &[Value]) -> String {
    blocks
        .iter()
        .filter_map(|block| {
            let kind = block.get("type")?.as_str()?;
            let runs = block.get(kind)?.get("rich_text")?.as_array()?;
            let line: String =
                runs.iter().filter_map(|r| r.get("plain_text").and_then(Value::as_str)).collect();
            (!line.is_empty()).then_some(line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Concatenated `plain_text` of a title array.
pub fn plain_title(title: &Value) -> String {
    title
        .as_array()
        .map(|runs| runs.iter().filter_map(|r| r.get("plain_text").and_then(Value::as_str)).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reports::{ActionItem, DetailedAction, Milestone, PlannedTask};
    use crate::workspace::ExportPage;

    #[test]
    fn rich_text_is_capped() {
        let long = "a".repeat(2500);
        let value = rich_text(&long);
        assert_eq!(value[0]["text"]["content"].as_str().map(str::len), Some(TEXT_LIMIT));
    }

    #[test]
    fn meeting_blocks_follow_report_sections() {
        let report = ParsedReport {
            title: "Kickoff".into(),
            date: "2026-03-02".into(),
            attendees: vec!["Ana".into(), "Bo".into()],
            summary: "We agreed on scope.".into(),
            key_topics: vec!["Scope".into()],
            action_items: vec![
                ActionItem::Plain("Send deck".into()),
                ActionItem::Detailed(DetailedAction {
                    task: "Book venue".into(),
                    assignee: "Ana".into(),
                    ..DetailedAction::default()
                }),
            ],
            ..ParsedReport::default()
        };
        assert_eq!(meeting_page_title(&report), "Kickoff (2026-03-02)");

        let blocks = meeting_blocks(&report);
        let kinds: Vec<&str> = blocks.iter().filter_map(|b| b["type"].as_str()).collect();
        assert_eq!(
            kinds,
            vec!["heading_2", "table", "heading_2", "paragraph", "heading_2", "bulleted_list_item", "heading_2", "to_do", "to_do"]
        );
        let rows = &blocks[1]["table"]["children"];
        assert_eq!(rows[1]["table_row"]["cells"][1][0]["text"]["content"], "Ana, Bo");
        assert_eq!(blocks[8]["to_do"]["rich_text"][0]["text"]["content"], "Book venue — Assigned to: Ana");
    }

    #[test]
    fn task_properties_skip_empty_columns() {
        let task = TaskRecord {
            name: "Email client".into(),
            assignee: "Unassigned".into(),
            due_date: String::new(),
            priority: "Medium".into(),
            category: "Task".into(),
            meeting_date: String::new(),
            source: "Kickoff".into(),
            status: "Not Started".into(),
        };
        let props = task_properties(&task);
        assert_eq!(props["Name"]["title"][0]["text"]["content"], "Email client");
        assert!(props.get("Due Date").is_none());
        assert!(props.get("Meeting Date").is_none());
        assert_eq!(props["Priority"]["select"]["name"], "Medium");
    }

    #[test]
    fn project_blocks_render_tasks_and_milestones() {
        let plan = ProjectPlan {
            title: "Garden app".into(),
            tasks: vec![PlannedTask {
                name: "Wireframes".into(),
                assignee: "Me".into(),
                due_date: "2026-04-01".into(),
                ..PlannedTask::default()
            }],
            milestones: vec![Milestone { name: "MVP".into(), target_date: "2026-05-01".into(), ..Milestone::default() }],
            ..ProjectPlan::default()
        };
        let blocks = project_blocks(&plan, "2026-03-01");
        assert_eq!(
            blocks[0]["callout"]["rich_text"][0]["text"]["content"],
            "Project sourced from Obsidian monthly review. Created: 2026-03-01"
        );
        assert_eq!(blocks[2]["to_do"]["rich_text"][0]["text"]["content"], "Wireframes | Assignee: Me | Due: 2026-04-01");
        assert_eq!(blocks[4]["numbered_list_item"]["rich_text"][0]["text"]["content"], "MVP — Target: 2026-05-01");
    }

    #[test]
    fn export_tags_are_stripped_and_capped() {
        let page = ExportPage {
            title: "Idea".into(),
            summary: "s".into(),
            tags: (0..12).map(|i| format!("#t{i}")).collect(),
            source: "Inbox/Idea.md".into(),
            status: "Not Started".into(),
        };
        let props = export_properties(&page, "2026-03-01T00:00:00");
        let tags = props["Tags"]["multi_select"].as_array().expect("tags");
        assert_eq!(tags.len(), 10);
        assert_eq!(tags[0]["name"], "t0");
    }

    #[test]
    fn blocks_flatten_to_lines() {
        let blocks = vec![
            json!({"type": "paragraph", "paragraph": {"rich_text": [{"plain_text": "Client: "}, {"plain_text": "Acme"}]}}),
            json!({"type": "divider", "divider": {}}),
            json!({"type": "heading_2", "heading_2": {"rich_text": []}}),
            json!({"type": "bulleted_list_item", "bulleted_list_item": {"rich_text": [{"plain_text": "Ship it"}]}}),
        ];
        assert_eq!(blocks_to_text(&blocks), "Client: Acme\nShip it");
    }
}
