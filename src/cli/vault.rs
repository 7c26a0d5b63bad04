//! Vault subcommands

use anyhow::Result;
use std::path::Path;

use super::utils::{report_written, with_spinner};
use crate::domain::Config;
use crate::llm::AnthropicClient;
use crate::vault::{GoogleDrive, VaultAgent};
use crate::workspace::NotionClient;

/// Remote clients built from the configuration; the agent borrows them.
struct Clients {
    llm: AnthropicClient,
    workspace: NotionClient,
    drive: GoogleDrive,
}

impl Clients {
    fn new(config: &Config) -> Self {
        Self {
            llm: AnthropicClient::new(&config.llm),
            workspace: NotionClient::new(&config.notion),
            drive: GoogleDrive::new(&config.drive),
        }
    }

    fn agent<'a>(&'a self, config: &'a Config) -> Result<VaultAgent<'a>> {
        Ok(VaultAgent::new(config, &self.llm, &self.workspace)?.with_drive(&self.drive))
    }
}

pub fn ingest(config: &Config) -> Result<()> {
    let clients = Clients::new(config);
    let mut agent = clients.agent(config)?;
    let created = with_spinner("Checking Google Drive…", || agent.ingest_from_drive())?;
    println!("Ingested {} note(s).", created.len());
    for path in &created {
        println!("  → {}", path.display());
    }
    Ok(())
}

pub fn watch(config: &Config) -> Result<()> {
    let clients = Clients::new(config);
    let mut agent = clients.agent(config)?;
    println!("Watching Google Drive (Ctrl+C to stop)…");
    agent.watch_drive()
}

pub fn analyze(config: &Config) -> Result<()> {
    let clients = Clients::new(config);
    let mut agent = clients.agent(config)?;
    let path = with_spinner("Analyzing vault relationships…", || agent.analyze_vault())?;
    report_written("Relationship report", &path);
    Ok(())
}

pub fn export(config: &Config) -> Result<()> {
    let clients = Clients::new(config);
    let mut agent = clients.agent(config)?;
    let path = with_spinner("Selecting notes for export…", || agent.export_to_notion())?;
    report_written("Export report", &path);
    Ok(())
}

pub fn research(config: &Config) -> Result<()> {
    let clients = Clients::new(config);
    let mut agent = clients.agent(config)?;
    let path = with_spinner("Looking for research opportunities…", || agent.recommend_research())?;
    report_written("Research report", &path);
    Ok(())
}

pub fn run_all(config: &Config) -> Result<()> {
    let clients = Clients::new(config);
    let mut agent = clients.agent(config)?;
    let summary = with_spinner("Running all vault pipelines…", || agent.run_all());
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

pub fn ingest_file(config: &Config, path: &Path) -> Result<()> {
    if !path.is_file() {
        anyhow::bail!("file not found — {}", path.display());
    }
    let clients = Clients::new(config);
    let mut agent = clients.agent(config)?;
    match with_spinner("Analyzing file…", || agent.ingest_file(path))? {
        Some(note) => {
            println!("Note written → {}", note.display());
            Ok(())
        }
        None => anyhow::bail!("No usable content extracted."),
    }
}
