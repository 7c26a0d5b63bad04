//! Config file loading and environment overlay

use crate::domain::Config;
use anyhow::{Context, Result};
use figment::providers::{Env, Serialized};
use figment::Figment;
use std::fs;
use std::path::{Path, PathBuf};

const NESTED_SECTION: &str = "scribe";

/// Load configuration: defaults, then the config file, then the environment.
///
/// An explicit `config_path` must parse; an auto-discovered file that fails to
/// parse is reported and ignored.
pub fn load_config(root: &Path, config_path: Option<&Path>) -> Result<Config> {
    let base = load_file(root, config_path)?;
    let config = apply_env(base)?;
    Ok(fill_from_vars(config, |key| std::env::var(key).ok()))
}

fn load_file(root: &Path, config_path: Option<&Path>) -> Result<Config> {
    let explicit = config_path.is_some();

    let discovered = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config(root),
    };

    let Some(config_file) = discovered else {
        return Ok(Config::default());
    };

    let content = fs::read_to_string(&config_file)
        .with_context(|| format!("Failed reading config file: {}", config_file.display()))?;

    let format = Format::of(&config_file)?;
    match format.parse(&content) {
        Ok(cfg) => {
            tracing::debug!(path = %config_file.display(), ?format, "loaded config file");
            Ok(cfg)
        }
        Err(e) if explicit => Err(e.context(format!("Invalid config file {}", config_file.display()))),
        Err(e) => {
            tracing::warn!(path = %config_file.display(), "ignoring unreadable config: {e:#}");
            Ok(Config::default())
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Format {
    Toml,
    Yaml,
}

impl Format {
    fn of(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("toml") => Ok(Format::Toml),
            Some("yaml" | "yml") => Ok(Format::Yaml),
            _ => anyhow::bail!("Config file {} must end in .toml, .yaml or .yml", path.display()),
        }
    }

    /// Both formats go through a JSON value so an optional `scribe` wrapper
    /// section is unwrapped the same way.
    fn parse(self, content: &str) -> Result<Config> {
        let mut raw: serde_json::Value = match self {
            Format::Toml => toml::from_str(content).context("TOML syntax error")?,
            Format::Yaml => serde_yaml::from_str(content).context("YAML syntax error")?,
        };
        if let Some(inner) = raw.get_mut(NESTED_SECTION).map(serde_json::Value::take) {
            raw = inner;
        }
        if raw.is_null() {
            return Ok(Config::default());
        }
        serde_json::from_value(raw).context("config does not match the expected sections")
    }
}

fn discover_config(root: &Path) -> Option<PathBuf> {
    let candidates = ["scribe.toml", ".scribe.toml", "scribe.yaml", "scribe.yml", ".scribe.yaml"];

    candidates.iter().map(|candidate| root.join(candidate)).find(|path| path.exists())
}

/// Overlay `SCRIBE_<SECTION>__<FIELD>` variables, e.g. `SCRIBE_LLM__MODEL`.
fn apply_env(base: Config) -> Result<Config> {
    Figment::from(Serialized::defaults(base))
        .merge(Env::prefixed("SCRIBE_").split("__"))
        .extract()
        .context("Invalid SCRIBE_* environment override")
}

/// Fill credentials and paths left empty from their conventional variables.
pub fn fill_from_vars<F>(mut config: Config, lookup: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    let get = |keys: &[&str]| keys.iter().find_map(|k| lookup(k).filter(|v| !v.is_empty()));

    fn fill(slot: &mut String, value: Option<String>) {
        if slot.is_empty() {
            if let Some(v) = value {
                *slot = v;
            }
        }
    }

    fill(&mut config.llm.api_key, get(&["ANTHROPIC_API_KEY"]));
    if let Some(model) = get(&["ANTHROPIC_MODEL"]) {
        if config.llm.model == crate::domain::config::DEFAULT_MODEL {
            config.llm.model = model;
        }
    }
    fill(&mut config.notion.token, get(&["NOTION_TOKEN", "NOTION_API_KEY"]));
    fill(&mut config.notion.parent_page_id, get(&["NOTION_PARENT_PAGE_ID"]));
    fill(&mut config.notion.projects_page_id, get(&["NOTION_PROJECTS_PAGE_ID"]));
    fill(&mut config.notion.fireflies_inbox_db_id, get(&["NOTION_FIREFLIES_INBOX_DB_ID"]));
    fill(&mut config.notion.export_database_id, get(&["NOTION_DATABASE_ID"]));
    fill(&mut config.server.webhook_secret, get(&["NOTION_AGENT_WEBHOOK_SECRET"]));
    fill(&mut config.drive.folder_id, get(&["GDRIVE_FOLDER_ID"]));
    fill(&mut config.drive.access_token, get(&["GDRIVE_ACCESS_TOKEN"]));

    if !config.vault.is_configured() {
        if let Some(path) = get(&["OBSIDIAN_VAULT_PATH"]) {
            config.vault.path = PathBuf::from(path);
        }
    }
    // Like the model, the database path is only replaced while it still has
    // its built-in value.
    if config.database == crate::domain::config::DatabaseConfig::default() {
        if let Some(path) = get(&["DATABASE_PATH"]) {
            config.database.path = PathBuf::from(path);
        }
    }

    config
}
