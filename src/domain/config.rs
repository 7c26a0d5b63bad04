//! Runtime configuration.
//!
//! A single `Config` value is built once at startup (see `crate::config`) and
//! handed to every service; nothing below reads the process environment.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub manuscripts: ManuscriptsConfig,
    pub notion: NotionConfig,
    pub vault: VaultConfig,
    pub drive: DriveConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub api_version: String,
    /// Per-request timeout in seconds. Zero disables the timeout.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            api_version: "2023-06-01".to_string(),
            timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: PathBuf::from("scribe.db") }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Shared secret expected in `X-Webhook-Secret` on agent endpoints.
    /// Empty means the endpoints are open.
    pub webhook_secret: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "127.0.0.1:5000".to_string(), webhook_secret: String::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManuscriptsConfig {
    pub dir: PathBuf,
}

impl Default for ManuscriptsConfig {
    fn default() -> Self {
        Self { dir: PathBuf::from("manuscripts") }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotionConfig {
    pub token: String,
    pub base_url: String,
    pub api_version: String,
    pub parent_page_id: String,
    pub projects_page_id: String,
    pub fireflies_inbox_db_id: String,
    /// Target database for vault note exports.
    pub export_database_id: String,
    pub timeout_secs: u64,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            base_url: "https://api.notion.com".to_string(),
            api_version: "2022-06-28".to_string(),
            parent_page_id: String::new(),
            projects_page_id: String::new(),
            fireflies_inbox_db_id: String::new(),
            export_database_id: String::new(),
            timeout_secs: 60,
        }
    }
}

impl NotionConfig {
    /// Projects land under the projects page, or the parent page when unset.
    pub fn projects_parent(&self) -> Option<&str> {
        [self.projects_page_id.as_str(), self.parent_page_id.as_str()]
            .into_iter()
            .find(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub path: PathBuf,
    pub inbox_folder: String,
    pub agent_folder: String,
    pub tag_confidence_threshold: f64,
    pub link_relevance_threshold: f64,
    /// Day of the month (1-28) on which `run-all` exports to the workspace.
    pub notion_dump_day: u32,
    pub consulting_domains: Vec<String>,
    pub exclude_globs: Vec<String>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            inbox_folder: "Inbox".to_string(),
            agent_folder: "AgentReports".to_string(),
            tag_confidence_threshold: 0.7,
            link_relevance_threshold: 0.6,
            notion_dump_day: 1,
            consulting_domains: ["technology", "business strategy", "innovation", "education"]
                .iter()
                .map(|d| d.to_string())
                .collect(),
            exclude_globs: vec![".obsidian/**".to_string(), ".trash/**".to_string()],
        }
    }
}

impl VaultConfig {
    pub fn is_configured(&self) -> bool {
        !self.path.as_os_str().is_empty()
    }

    pub fn inbox_dir(&self) -> PathBuf {
        self.path.join(&self.inbox_folder)
    }

    pub fn agent_dir(&self) -> PathBuf {
        self.path.join(&self.agent_folder)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    pub folder_id: String,
    /// OAuth bearer token with read access to the folder.
    pub access_token: String,
    pub base_url: String,
    pub staging_dir: PathBuf,
    pub poll_interval_secs: u64,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            folder_id: String::new(),
            access_token: String::new(),
            base_url: "https://www.googleapis.com".to_string(),
            staging_dir: PathBuf::from("staging/gdrive_inbox"),
            poll_interval_secs: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projects_parent_falls_back_to_parent_page() {
        let mut notion = NotionConfig::default();
        assert_eq!(notion.projects_parent(), None);
        notion.parent_page_id = "parent".into();
        assert_eq!(notion.projects_parent(), Some("parent"));
        notion.projects_page_id = "projects".into();
        assert_eq!(notion.projects_parent(), Some("projects"));
    }

    #[test]
    fn vault_dirs_join_configured_folders() {
        let vault = VaultConfig { path: PathBuf::from("/v"), ..VaultConfig::default() };
        assert!(vault.is_configured());
        assert_eq!(vault.inbox_dir(), PathBuf::from("/v/Inbox"));
        assert_eq!(vault.agent_dir(), PathBuf::from("/v/AgentReports"));
        assert!(!VaultConfig::default().is_configured());
    }
}
