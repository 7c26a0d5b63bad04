//! Picks notes that deserve project tracking and exports them to the
//! workspace database.

use super::note::VaultNote;
use super::{joined_prefix, report_header};
use crate::domain::vault::{ExportedNote, TriageResult, TriagedNote};
use crate::llm::{extract_as, GenerateOptions, LlmError, TextGenerator};
use crate::utils::text::truncate_chars;
use crate::workspace::{ExportPage, Workspace};

pub const REPORT_TITLE: &str = "Notion Export Report";

const EXPORT_STATUS: &str = "Not Started";

const SYSTEM_PROMPT: &str = r##"You are a project manager reviewing an Obsidian vault.
Identify notes that represent actionable projects: things that need task tracking, deadlines, collaboration, or sustained effort.
Do NOT select simple reference notes, definitions, or quick ideas.
For each qualifying note, explain why it should be a project.

Respond with JSON (no fences):
{"projects": [{"title": "...", "reason": "...", "priority": "high|medium|low", "tags": ["#tag"]}]}"##;

pub fn digest(notes: &[VaultNote]) -> String {
    notes
        .iter()
        .map(|n| {
            format!(
                "- {} | tags: [{}] | summary: {}",
                n.title,
                joined_prefix(&n.tags, 6),
                truncate_chars(&n.summary, 120)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct NoteTriage<'a> {
    llm: &'a dyn TextGenerator,
}

impl<'a> NoteTriage<'a> {
    pub fn new(llm: &'a dyn TextGenerator) -> Self {
        Self { llm }
    }

    pub fn triage(&self, notes: &[VaultNote]) -> Result<Vec<TriagedNote>, LlmError> {
        let prompt = format!("## Vault notes to review\n\n{}", digest(notes));
        let response = self.llm.generate(SYSTEM_PROMPT, &prompt, GenerateOptions::new(4096, 0.7))?;
        Ok(extract_as::<TriageResult>(&response).unwrap_or_default().projects)
    }

    /// Triage, then create one export row per selected note. Rows the
    /// workspace rejects are logged and left out of the result.
    pub fn export(
        &self,
        notes: &[VaultNote],
        workspace: &dyn Workspace,
        database_id: &str,
    ) -> Result<Vec<ExportedNote>, LlmError> {
        let projects = self.triage(notes)?;
        if projects.is_empty() {
            tracing::info!("no notes qualify for export");
            return Ok(Vec::new());
        }

        let mut exported = Vec::new();
        for project in projects {
            let page = export_page(&project, notes.iter().find(|n| n.title == project.title));
            match workspace.create_export_page(database_id, &page) {
                Ok(id) => exported.push(ExportedNote { title: project.title, notion_id: id }),
                Err(e) => tracing::error!(title = %project.title, "export failed: {e}"),
            }
        }
        tracing::info!(count = exported.len(), "export complete");
        Ok(exported)
    }
}

fn export_page(project: &TriagedNote, note: Option<&VaultNote>) -> ExportPage {
    let summary = match note {
        Some(n) if !n.summary.is_empty() => n.summary.clone(),
        _ => project.reason.clone(),
    };
    ExportPage {
        title: project.title.clone(),
        summary,
        tags: project.tags.clone(),
        source: note.map(|n| n.path.display().to_string()).unwrap_or_default(),
        status: EXPORT_STATUS.to_string(),
    }
}

pub fn render_report(exported: &[ExportedNote], date: &str) -> String {
    let mut lines = report_header(REPORT_TITLE, &["agent-report", "notion-export"], date);
    lines.push(format!("**{} notes exported to Notion.**", exported.len()));
    lines.push(String::new());
    lines.extend(exported.iter().map(|e| format!("- [[{}]] → Notion ID: `{}`", e.title, e.notion_id)));
    lines.push(String::new());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedGenerator;
    use crate::workspace::memory::Created;
    use crate::workspace::MemoryWorkspace;
    use std::path::PathBuf;

    fn note(title: &str, summary: &str) -> VaultNote {
        VaultNote {
            path: PathBuf::from(format!("/vault/{title}.md")),
            title: title.into(),
            tags: vec![],
            links: vec![],
            summary: summary.into(),
        }
    }

    #[test]
    fn selected_notes_become_export_rows() {
        let llm = ScriptedGenerator::new([r##"{"projects": [
            {"title": "Garden Redesign", "reason": "Needs a plan", "priority": "high", "tags": ["#garden"]},
            {"title": "Loose Idea", "reason": "Worth tracking", "priority": "low", "tags": []}
        ]}"##]);
        let notes = [note("Garden Redesign", "Raised beds by May."), note("Other", "")];
        let workspace = MemoryWorkspace::new();

        let exported = NoteTriage::new(&llm).export(&notes, &workspace, "db-1").expect("export");
        assert_eq!(exported.len(), 2);
        assert_eq!(exported[0].title, "Garden Redesign");

        let pages: Vec<ExportPage> = workspace
            .created()
            .into_iter()
            .filter_map(|c| match c {
                Created::ExportPage { database, page, .. } if database == "db-1" => Some(page),
                _ => None,
            })
            .collect();
        assert_eq!(pages[0].summary, "Raised beds by May.");
        assert_eq!(pages[0].source, "/vault/Garden Redesign.md");
        assert_eq!(pages[0].status, "Not Started");
        // Unknown to the vault: the triage reason stands in for the summary.
        assert_eq!(pages[1].summary, "Worth tracking");
        assert_eq!(pages[1].source, "");
    }

    #[test]
    fn unparsable_triage_exports_nothing() {
        let llm = ScriptedGenerator::new(["none of these"]);
        let workspace = MemoryWorkspace::new();
        let exported = NoteTriage::new(&llm).export(&[note("A", "")], &workspace, "db").expect("export");
        assert!(exported.is_empty());
        assert!(workspace.created().is_empty());
    }

    #[test]
    fn report_lists_exported_ids() {
        let report = render_report(
            &[ExportedNote { title: "Garden".into(), notion_id: "abc".into() }],
            "2026-04-01",
        );
        assert!(report.contains("tags: [agent-report, notion-export]"));
        assert!(report.ends_with("**1 notes exported to Notion.**\n\n- [[Garden]] → Notion ID: `abc`\n"));
    }
}
