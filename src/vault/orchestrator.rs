//! Vault pipelines: ingest, relationship analysis, workspace export,
//! research opportunities, and all of them in sequence.

use super::analyzer::{merge_recommendations, NoteAnalyzer};
use super::drive::{DriveApi, DriveInbox};
use super::manager::VaultManager;
use super::opportunities::{self, ResearchRecommender};
use super::relationships::{self, RelationshipAnalyzer};
use super::today;
use super::triage::{self, NoteTriage};
use crate::domain::Config;
use crate::llm::TextGenerator;
use crate::workspace::Workspace;
use anyhow::{Context, Result};
use chrono::Datelike;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Result of one `run-all` step; a failed step serializes as `"error"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StepOutcome<T> {
    Done(T),
    Skipped(String),
    Failed(&'static str),
}

impl<T> StepOutcome<T> {
    fn from_result(step: &str, result: Result<T>) -> Self {
        match result {
            Ok(value) => StepOutcome::Done(value),
            Err(e) => {
                tracing::error!(step, "pipeline step failed: {e:#}");
                StepOutcome::Failed("error")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub ingested: StepOutcome<Vec<PathBuf>>,
    pub vault_analysis: StepOutcome<PathBuf>,
    pub notion_export: StepOutcome<PathBuf>,
    pub research: StepOutcome<PathBuf>,
}

pub struct VaultAgent<'a> {
    config: &'a Config,
    llm: &'a dyn TextGenerator,
    workspace: &'a dyn Workspace,
    drive: Option<&'a dyn DriveApi>,
    vault: VaultManager,
}

impl<'a> VaultAgent<'a> {
    pub fn new(config: &'a Config, llm: &'a dyn TextGenerator, workspace: &'a dyn Workspace) -> Result<Self> {
        Ok(Self { config, llm, workspace, drive: None, vault: VaultManager::new(&config.vault)? })
    }

    pub fn with_drive(mut self, drive: &'a dyn DriveApi) -> Self {
        self.drive = Some(drive);
        self
    }

    pub fn vault(&self) -> &VaultManager {
        &self.vault
    }

    /// Analyze one file, fold in recommended tags and links, and write the
    /// note. `None` when the file had no usable content.
    pub fn ingest_file(&mut self, path: &Path) -> Result<Option<PathBuf>> {
        tracing::info!(path = %path.display(), "ingesting");
        let analyzer = NoteAnalyzer::new(self.llm);

        let mut analysis = analyzer.analyze(path).with_context(|| format!("failed to analyze {}", path.display()))?;
        if analysis.markdown.trim().is_empty() {
            tracing::warn!(path = %path.display(), "no usable content");
            return Ok(None);
        }

        self.vault.index()?;
        let recs = analyzer.recommend_links_and_tags(&analysis, &self.vault)?;
        merge_recommendations(&mut analysis, recs);

        let note = self.vault.write_note(&analysis)?;
        tracing::info!(path = %note.display(), "ingestion complete");
        Ok(Some(note))
    }

    fn drive_inbox(&self) -> Result<DriveInbox<'a>> {
        let drive = self.drive.context("drive access is not configured")?;
        Ok(DriveInbox::new(drive, &self.config.drive))
    }

    /// One drive poll; every new file goes through [`Self::ingest_file`].
    pub fn ingest_from_drive(&mut self) -> Result<Vec<PathBuf>> {
        let inbox = self.drive_inbox()?;
        let mut created = Vec::new();
        inbox.poll_once(&mut |_, local| {
            if let Some(note) = self.ingest_file(local)? {
                created.push(note);
            }
            Ok(())
        })?;
        Ok(created)
    }

    pub fn watch_drive(&mut self) -> Result<()> {
        let inbox = self.drive_inbox()?;
        let interval = Duration::from_secs(self.config.drive.poll_interval_secs.max(1));
        inbox.watch(interval, &mut |_, local| self.ingest_file(local).map(|_| ()))
    }

    pub fn analyze_vault(&mut self) -> Result<PathBuf> {
        tracing::info!("running vault relationship analysis");
        let date = today();
        self.vault.build_index()?;
        let report = RelationshipAnalyzer::new(self.llm).report(self.vault.notes(), &date)?;
        self.vault.write_agent_report(&format!("{} — {date}", relationships::REPORT_TITLE), &report)
    }

    /// Triage the vault and export project-worthy notes. Without an export
    /// database nothing is sent and the report lists no notes.
    pub fn export_to_notion(&mut self) -> Result<PathBuf> {
        tracing::info!("running workspace export");
        let date = today();
        self.vault.build_index()?;
        let database_id = self.config.notion.export_database_id.trim();
        let exported = if database_id.is_empty() {
            tracing::warn!("NOTION_DATABASE_ID is not set; skipping export");
            Vec::new()
        } else {
            NoteTriage::new(self.llm).export(self.vault.notes(), self.workspace, database_id)?
        };
        let report = triage::render_report(&exported, &date);
        self.vault.write_agent_report(&format!("{} — {date}", triage::REPORT_TITLE), &report)
    }

    pub fn recommend_research(&mut self) -> Result<PathBuf> {
        tracing::info!("running research opportunity scan");
        let date = today();
        self.vault.build_index()?;
        let report = ResearchRecommender::new(self.llm, &self.config.vault.consulting_domains)
            .report(self.vault.notes(), &date)?;
        self.vault.write_agent_report(&format!("{} — {date}", opportunities::REPORT_TITLE), &report)
    }

    pub fn run_all(&mut self) -> RunSummary {
        self.run_all_on(chrono::Local::now().date_naive())
    }

    /// Every pipeline in order; the export only runs on the configured day
    /// of the month. A failing step does not stop the ones after it.
    pub fn run_all_on(&mut self, date: chrono::NaiveDate) -> RunSummary {
        let ingested = StepOutcome::from_result("ingest", self.ingest_from_drive());
        let vault_analysis = StepOutcome::from_result("analyze", self.analyze_vault());

        let dump_day = self.config.vault.notion_dump_day;
        let notion_export = if date.day() == dump_day {
            StepOutcome::from_result("export", self.export_to_notion())
        } else {
            StepOutcome::Skipped(format!("skipped (runs on day {dump_day})"))
        };

        let research = StepOutcome::from_result("research", self.recommend_research());
        RunSummary { ingested, vault_analysis, notion_export, research }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::VaultConfig;
    use crate::llm::testing::ScriptedGenerator;
    use crate::vault::drive::tests::{drive_config, FakeDrive};
    use crate::vault::manager::tests::vault_with;
    use crate::workspace::MemoryWorkspace;
    use std::fs;
    use tempfile::TempDir;

    const ANALYSIS: &str = r##"{"title": "Bee Census", "note_type": "table", "summary": "Hive counts.",
        "tags": ["#bees"], "suggested_links": [], "markdown": "| hive | count |", "confidence": 0.8}"##;
    const RECS: &str = r##"{"additional_tags": ["#bees", "#garden"], "additional_links": ["[[Garden]]"]}"##;

    fn config_for(vault: VaultConfig) -> Config {
        Config { vault, ..Config::default() }
    }

    #[test]
    fn ingest_file_writes_note_with_recommendations() {
        let (_dir, vault) = vault_with(&[("Garden.md", "#garden")]);
        let config = config_for(vault);
        let scratch = TempDir::new().expect("tempdir");
        let input = scratch.path().join("census.csv");
        fs::write(&input, "hive,count\nA,3").expect("write");

        let llm = ScriptedGenerator::new([ANALYSIS, RECS]);
        let workspace = MemoryWorkspace::new();
        let mut agent = VaultAgent::new(&config, &llm, &workspace).expect("agent");

        let note = agent.ingest_file(&input).expect("ingest").expect("note");
        assert_eq!(note, config.vault.inbox_dir().join("Bee Census.md"));
        let content = fs::read_to_string(&note).expect("read");
        assert!(content.contains("tags: [\"bees\", \"garden\"]\nlinks: [\"Garden\"]\n"));
        assert!(content.ends_with("\n| hive | count |\n"));
        assert!(llm.last_user_text().contains("- Garden  tags:[garden]  links:[]"));
    }

    #[test]
    fn empty_input_writes_nothing() {
        let (_dir, vault) = vault_with(&[]);
        let config = config_for(vault);
        let scratch = TempDir::new().expect("tempdir");
        let input = scratch.path().join("empty.txt");
        fs::write(&input, "").expect("write");

        let llm = ScriptedGenerator::new(Vec::<String>::new());
        let workspace = MemoryWorkspace::new();
        let mut agent = VaultAgent::new(&config, &llm, &workspace).expect("agent");
        assert_eq!(agent.ingest_file(&input).expect("ingest"), None);
        assert!(!config.vault.inbox_dir().exists());
    }

    #[test]
    fn drive_files_are_ingested_once() {
        let (_dir, vault) = vault_with(&[]);
        let staging = TempDir::new().expect("tempdir");
        let config = Config { drive: drive_config(staging.path()), ..config_for(vault) };
        let drive = FakeDrive::default().with("doc-1", "Bee notes", "application/vnd.google-apps.document", "A: 3");

        let llm = ScriptedGenerator::new([ANALYSIS, RECS]);
        let workspace = MemoryWorkspace::new();
        let mut agent = VaultAgent::new(&config, &llm, &workspace).expect("agent").with_drive(&drive);

        let created = agent.ingest_from_drive().expect("first poll");
        assert_eq!(created.len(), 1);
        assert!(agent.ingest_from_drive().expect("second poll").is_empty());
        assert_eq!(llm.requests.lock().expect("lock").len(), 2);
    }

    #[test]
    fn export_sends_triaged_notes_and_reports_them() {
        let (_dir, vault) = vault_with(&[("Garden.md", "---\nsummary: Raised beds.\n---\nPlan")]);
        let mut config = config_for(vault);
        config.notion.export_database_id = "db-9".into();

        let llm = ScriptedGenerator::new([r#"{"projects": [{"title": "Garden", "reason": "Multi-week", "priority": "high"}]}"#]);
        let workspace = MemoryWorkspace::new();
        let mut agent = VaultAgent::new(&config, &llm, &workspace).expect("agent");

        let report = agent.export_to_notion().expect("export");
        let name = report.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        assert!(name.starts_with("Notion Export Report — "));
        let content = fs::read_to_string(&report).expect("read");
        assert!(content.contains("**1 notes exported to Notion.**"));
        assert!(content.contains("- [[Garden]] → Notion ID: `"));
        assert_eq!(workspace.created().len(), 1);
    }

    #[test]
    fn export_without_database_skips_triage() {
        let (_dir, vault) = vault_with(&[("Garden.md", "Plan")]);
        let config = config_for(vault);
        let llm = ScriptedGenerator::new(Vec::<String>::new());
        let workspace = MemoryWorkspace::new();
        let mut agent = VaultAgent::new(&config, &llm, &workspace).expect("agent");

        let report = agent.export_to_notion().expect("export");
        assert!(fs::read_to_string(report).expect("read").contains("**0 notes exported to Notion.**"));
        assert!(llm.requests.lock().expect("lock").is_empty());
    }

    #[test]
    fn run_all_keeps_going_after_a_failed_step() {
        let (_dir, vault) = vault_with(&[]);
        let config = config_for(vault);
        // Empty vault: the relationship pass answers locally, research asks once.
        let llm = ScriptedGenerator::new(["{}"]);
        let workspace = MemoryWorkspace::new();
        let mut agent = VaultAgent::new(&config, &llm, &workspace).expect("agent");

        let date = chrono::NaiveDate::from_ymd_opt(2026, 3, 15).expect("date");
        let summary = agent.run_all_on(date);
        assert_eq!(summary.ingested, StepOutcome::Failed("error"));
        assert_eq!(summary.notion_export, StepOutcome::Skipped("skipped (runs on day 1)".into()));

        let json = serde_json::to_value(&summary).expect("json");
        assert_eq!(json["ingested"], "error");
        assert_eq!(json["notion_export"], "skipped (runs on day 1)");
        let analysis = json["vault_analysis"].as_str().expect("analysis path");
        assert!(analysis.contains("Vault Relationship Report — "));
        let research = json["research"].as_str().expect("research path");
        assert!(research.contains("Research Opportunities Report — "));
    }
}
