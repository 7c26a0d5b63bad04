//! Vault notes: tag and wikilink extraction, YAML front-matter in and out.

use crate::domain::vault::AnalysisResult;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"#([a-zA-Z0-9_/-]+)").unwrap());
static WIKILINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[([^\]|]+)(?:\|[^\]]+)?\]\]").unwrap());
static PLAIN_SCALAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Lightweight index entry for one Markdown file in the vault.
#[derive(Debug, Clone, PartialEq)]
pub struct VaultNote {
    pub path: PathBuf,
    /// File stem.
    pub title: String,
    pub tags: Vec<String>,
    pub links: Vec<String>,
    /// `summary` from the front-matter, empty when absent.
    pub summary: String,
}

impl VaultNote {
    pub fn parse(path: &Path, content: &str) -> Self {
        let title = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let summary = front_matter(content)
            .and_then(|fm| front_matter_summary(&fm))
            .unwrap_or_default();
        Self {
            path: path.to_path_buf(),
            title,
            tags: unique_captures(&TAG, content),
            links: unique_captures(&WIKILINK, content),
            summary,
        }
    }
}

/// First capture group of every match, first occurrence kept.
fn unique_captures(pattern: &Regex, content: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for caps in pattern.captures_iter(content) {
        let value = caps[1].trim();
        if !value.is_empty() && !out.iter().any(|v| v == value) {
            out.push(value.to_string());
        }
    }
    out
}

/// Raw YAML between a leading `---` line and the next `---` line.
pub fn front_matter(content: &str) -> Option<String> {
    let mut lines = content.lines();
    if lines.next()?.trim_start_matches('\u{feff}').trim_end() != "---" {
        return None;
    }
    let mut yaml = Vec::new();
    for line in lines {
        if line.trim_end() == "---" {
            return Some(yaml.join("\n"));
        }
        yaml.push(line);
    }
    None
}

/// Front-matter written by hand is not always valid YAML, so a plain
/// `summary:` line scan backs up the parser.
fn front_matter_summary(yaml: &str) -> Option<String> {
    if let Ok(value) = serde_yaml::from_str::<serde_yaml::Value>(yaml) {
        if let Some(summary) = value.get("summary") {
            return summary.as_str().map(str::to_string);
        }
        return None;
    }
    yaml.lines().find_map(|line| {
        line.strip_prefix("summary:")
            .map(|rest| rest.trim().trim_matches('"').trim_matches('\'').to_string())
    })
}

pub fn strip_tag(tag: &str) -> String {
    tag.trim().trim_start_matches('#').to_string()
}

pub fn strip_link(link: &str) -> String {
    link.trim().trim_start_matches("[[").trim_end_matches("]]").to_string()
}

fn quoted(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

fn flow_list(items: impl Iterator<Item = String>) -> String {
    let items: Vec<String> = items.filter(|i| !i.is_empty()).map(|i| quoted(&i)).collect();
    format!("[{}]", items.join(", "))
}

/// Front-matter block for a freshly ingested note, closing `---` included.
pub fn render_front_matter(analysis: &AnalysisResult) -> String {
    let note_type = if PLAIN_SCALAR.is_match(&analysis.note_type) {
        analysis.note_type.clone()
    } else {
        quoted(&analysis.note_type)
    };
    format!(
        "---\ntitle: {}\ntype: {}\ntags: {}\nlinks: {}\nsummary: {}\nconfidence: {:?}\nstatus: inbox\n---\n",
        quoted(&analysis.title),
        note_type,
        flow_list(analysis.tags.iter().map(|t| strip_tag(t))),
        flow_list(analysis.suggested_links.iter().map(|l| strip_link(l))),
        quoted(&analysis.summary),
        analysis.confidence,
    )
}

/// Front-matter, a blank line, then the body.
pub fn render_note(analysis: &AnalysisResult) -> String {
    format!("{}\n{}\n", render_front_matter(analysis), analysis.markdown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_collects_unique_tags_links_and_summary() {
        let content = "---\ntitle: \"Tides\"\nsummary: \"Moon and sea.\"\n---\n\
            # Tides\nSee [[Moon]] and [[Moon|the moon]] and [[Sea]]. #physics #ocean/waves #physics\n";
        let note = VaultNote::parse(Path::new("/v/Inbox/Tides.md"), content);
        assert_eq!(note.title, "Tides");
        assert_eq!(note.tags, ["physics", "ocean/waves"]);
        assert_eq!(note.links, ["Moon", "Sea"]);
        assert_eq!(note.summary, "Moon and sea.");
    }

    #[test]
    fn headings_are_not_tags() {
        let note = VaultNote::parse(Path::new("a.md"), "# Heading\n## Sub\nbody");
        assert!(note.tags.is_empty());
    }

    #[test]
    fn summary_survives_invalid_yaml() {
        let content = "---\ntitle: \"Broken: \"quote\"\nsummary: 'kept anyway'\n---\nbody";
        let note = VaultNote::parse(Path::new("b.md"), content);
        assert_eq!(note.summary, "kept anyway");
    }

    #[test]
    fn no_front_matter_means_no_summary() {
        assert_eq!(front_matter("body\n---\nmore"), None);
        assert_eq!(front_matter("---\nunterminated"), None);
        assert_eq!(VaultNote::parse(Path::new("c.md"), "plain").summary, "");
    }

    #[test]
    fn rendered_front_matter() {
        let analysis = AnalysisResult {
            title: "Lighthouse \"Keeper\" Notes".into(),
            markdown: "# Notes".into(),
            tags: vec!["#lighthouses".into(), "#sea-craft".into()],
            suggested_links: vec!["[[Fresnel Lens]]".into()],
            note_type: "list".into(),
            summary: "Duties of a keeper.".into(),
            key_concepts: vec![],
            confidence: 0.85,
        };
        insta::assert_snapshot!(render_front_matter(&analysis).trim_end(), @r###"
        ---
        title: "Lighthouse \"Keeper\" Notes"
        type: list
        tags: ["lighthouses", "sea-craft"]
        links: ["Fresnel Lens"]
        summary: "Duties of a keeper."
        confidence: 0.85
        status: inbox
        ---
        "###);
    }

    #[test]
    fn rendered_front_matter_is_valid_yaml() {
        let analysis = AnalysisResult {
            title: "A: B".into(),
            note_type: "odd type".into(),
            summary: "line one\nline two".into(),
            ..AnalysisResult::default()
        };
        let rendered = render_note(&analysis);
        let yaml = front_matter(&rendered).expect("front-matter");
        let value: serde_yaml::Value = serde_yaml::from_str(&yaml).expect("yaml");
        assert_eq!(value["title"].as_str(), Some("A: B"));
        assert_eq!(value["type"].as_str(), Some("odd type"));
        assert_eq!(value["summary"].as_str(), Some("line one\nline two"));
        assert_eq!(value["confidence"].as_f64(), Some(0.0));
        assert_eq!(value["status"].as_str(), Some("inbox"));
    }
}
