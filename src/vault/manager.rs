//! Reads, indexes and writes the vault on disk.

use super::note::{render_note, strip_link, strip_tag, VaultNote};
use crate::domain::config::VaultConfig;
use crate::domain::vault::AnalysisResult;
use crate::utils::encoding::read_text;
use crate::utils::paths::sanitize_note_title;
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub struct VaultManager {
    root: PathBuf,
    inbox: PathBuf,
    agent_dir: PathBuf,
    excludes: GlobSet,
    index: Vec<VaultNote>,
    indexed: bool,
}

impl VaultManager {
    pub fn new(config: &VaultConfig) -> Result<Self> {
        if !config.is_configured() {
            anyhow::bail!("OBSIDIAN_VAULT_PATH is not set. Pass --vault or set [vault].path.");
        }
        Ok(Self {
            root: config.path.clone(),
            inbox: config.inbox_dir(),
            agent_dir: config.agent_dir(),
            excludes: build_exclude_globset(&config.exclude_globs)?,
            index: Vec::new(),
            indexed: false,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Rescan every `.md` file under the vault root.
    pub fn build_index(&mut self) -> Result<&[VaultNote]> {
        let mut index = Vec::new();
        if self.root.is_dir() {
            let walker = WalkDir::new(&self.root).sort_by_file_name().into_iter().filter_map(Result::ok);
            for entry in walker {
                let path = entry.path();
                if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("md") {
                    continue;
                }
                let rel = path.strip_prefix(&self.root).unwrap_or(path);
                if self.excludes.is_match(rel) {
                    continue;
                }
                match read_text(path, None) {
                    Ok(decoded) => index.push(VaultNote::parse(path, &decoded.text)),
                    Err(e) => tracing::warn!(path = %path.display(), "skipping unreadable note: {e:#}"),
                }
            }
        }
        tracing::info!(notes = index.len(), "vault index built");
        self.index = index;
        self.indexed = true;
        Ok(&self.index)
    }

    /// The current index, scanning the vault on first use.
    pub fn index(&mut self) -> Result<&[VaultNote]> {
        if !self.indexed {
            self.build_index()?;
        }
        Ok(&self.index)
    }

    pub fn notes(&self) -> &[VaultNote] {
        &self.index
    }

    pub fn all_tags(&self) -> BTreeSet<String> {
        self.index.iter().flat_map(|n| n.tags.iter().cloned()).collect()
    }

    pub fn all_titles(&self) -> BTreeSet<String> {
        self.index.iter().map(|n| n.title.clone()).collect()
    }

    pub fn find(&self, title: &str) -> Option<&VaultNote> {
        self.index.iter().find(|n| n.title == title)
    }

    /// Write an analyzed note into the inbox without overwriting anything;
    /// name clashes get a ` (n)` suffix.
    pub fn write_note(&mut self, analysis: &AnalysisResult) -> Result<PathBuf> {
        fs::create_dir_all(&self.inbox)
            .with_context(|| format!("failed to create inbox {}", self.inbox.display()))?;

        let stem = sanitize_note_title(&analysis.title);
        let stem = if stem.is_empty() { "Untitled".to_string() } else { stem };
        let mut dest = self.inbox.join(format!("{stem}.md"));
        let mut counter = 1;
        while dest.exists() {
            dest = self.inbox.join(format!("{stem} ({counter}).md"));
            counter += 1;
        }

        fs::write(&dest, render_note(analysis))
            .with_context(|| format!("failed to write note {}", dest.display()))?;
        tracing::info!(path = %dest.display(), "note written");

        self.index.push(VaultNote {
            path: dest.clone(),
            title: analysis.title.clone(),
            tags: analysis.tags.iter().map(|t| strip_tag(t)).collect(),
            links: analysis.suggested_links.iter().map(|l| strip_link(l)).collect(),
            summary: analysis.summary.clone(),
        });
        Ok(dest)
    }

    /// Write `<agent folder>/<name>.md`, replacing an earlier report of the same name.
    pub fn write_agent_report(&self, name: &str, content: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.agent_dir)
            .with_context(|| format!("failed to create {}", self.agent_dir.display()))?;
        let dest = self.agent_dir.join(format!("{}.md", sanitize_note_title(name)));
        fs::write(&dest, content).with_context(|| format!("failed to write report {}", dest.display()))?;
        tracing::info!(path = %dest.display(), "agent report written");
        Ok(dest)
    }
}

fn build_exclude_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => tracing::warn!(%pattern, "ignoring invalid exclude glob: {e}"),
        }
    }
    Ok(builder.build()?)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    pub(crate) fn vault_with(files: &[(&str, &str)]) -> (TempDir, VaultConfig) {
        let dir = TempDir::new().expect("tempdir");
        for (rel, content) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
            fs::write(path, content).expect("write");
        }
        let config = VaultConfig { path: dir.path().to_path_buf(), ..VaultConfig::default() };
        (dir, config)
    }

    #[test]
    fn unconfigured_vault_is_an_error() {
        let err = VaultManager::new(&VaultConfig::default()).err().expect("error");
        assert!(err.to_string().contains("OBSIDIAN_VAULT_PATH"));
    }

    #[test]
    fn index_skips_excluded_and_non_markdown_files() {
        let (_dir, config) = vault_with(&[
            ("Ideas/Tides.md", "---\nsummary: moon\n---\n#ocean [[Moon]]"),
            ("Moon.md", "#space"),
            (".obsidian/workspace.md", "#hidden"),
            ("image.png", "not a note"),
        ]);
        let mut vault = VaultManager::new(&config).expect("vault");
        let titles: Vec<String> = vault.index().expect("index").iter().map(|n| n.title.clone()).collect();
        assert_eq!(titles, ["Tides", "Moon"]);
        assert_eq!(vault.all_tags().into_iter().collect::<Vec<_>>(), ["ocean", "space"]);
        assert_eq!(vault.find("Tides").map(|n| n.summary.as_str()), Some("moon"));
    }

    #[test]
    fn write_note_never_overwrites() {
        let (_dir, config) = vault_with(&[]);
        let mut vault = VaultManager::new(&config).expect("vault");
        let analysis = AnalysisResult {
            title: "Plan: A/B".into(),
            markdown: "body".into(),
            tags: vec!["#plans".into()],
            suggested_links: vec!["[[Goals]]".into()],
            ..AnalysisResult::default()
        };
        let first = vault.write_note(&analysis).expect("first");
        let second = vault.write_note(&analysis).expect("second");
        assert_eq!(first.file_name().and_then(|n| n.to_str()), Some("Plan- A-B.md"));
        assert_eq!(second.file_name().and_then(|n| n.to_str()), Some("Plan- A-B (1).md"));
        assert!(first.starts_with(config.inbox_dir()));

        let content = fs::read_to_string(&first).expect("read");
        assert!(content.starts_with("---\ntitle: \"Plan: A/B\"\n"));
        assert!(content.ends_with("---\n\nbody\n"));

        let added = vault.notes().last().expect("indexed");
        assert_eq!(added.tags, ["plans"]);
        assert_eq!(added.links, ["Goals"]);
    }

    #[test]
    fn agent_report_is_replaced_in_place() {
        let (_dir, config) = vault_with(&[]);
        let vault = VaultManager::new(&config).expect("vault");
        vault.write_agent_report("Weekly", "one").expect("first");
        let path = vault.write_agent_report("Weekly", "two").expect("second");
        assert_eq!(path, config.agent_dir().join("Weekly.md"));
        assert_eq!(fs::read_to_string(path).expect("read"), "two");
    }
}
