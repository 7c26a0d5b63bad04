//! Stored records and their create/update inputs.
//!
//! Derived fields (`word_count`, `progress_percent`, counts) are computed when
//! a record is read and never persisted.

use serde::{Deserialize, Serialize};

/// Whitespace-delimited word count; empty text counts zero.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Percentage of `target` reached, rounded to one decimal and clamped to [0, 100].
pub fn progress_percent(words: usize, target: i64) -> f64 {
    if target <= 0 {
        return 0.0;
    }
    let pct = (words as f64 / target as f64 * 100.0 * 10.0).round() / 10.0;
    pct.clamp(0.0, 100.0)
}

/// Cut `text` to `limit` characters, marking the cut with `...`.
pub fn preview(text: &str, limit: usize) -> String {
    if text.chars().count() > limit {
        let mut cut: String = text.chars().take(limit).collect();
        cut.push_str("...");
        cut
    } else {
        text.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub subtitle: String,
    pub genre: String,
    pub project_type: String,
    pub status: String,
    pub synopsis: String,
    pub target_word_count: i64,
    pub author_name: String,
    pub author_bio: String,
    pub author_email: String,
    pub author_phone: String,
    pub author_address: String,
    pub agent_name: String,
    pub agent_email: String,
    pub notes: String,
    pub themes: String,
    pub setting_description: String,
    pub word_count: usize,
    pub progress_percent: f64,
    pub chapter_count: usize,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapters: Option<Vec<Chapter>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProjectInput {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub genre: Option<String>,
    pub project_type: Option<String>,
    pub status: Option<String>,
    pub synopsis: Option<String>,
    pub target_word_count: Option<i64>,
    pub author_name: Option<String>,
    pub author_bio: Option<String>,
    pub author_email: Option<String>,
    pub author_phone: Option<String>,
    pub author_address: Option<String>,
    pub agent_name: Option<String>,
    pub agent_email: Option<String>,
    pub notes: Option<String>,
    pub themes: Option<String>,
    pub setting_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chapter {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    pub order: i64,
    pub status: String,
    pub summary: String,
    pub content: String,
    pub notes: String,
    pub pov_character: String,
    pub setting: String,
    pub timeline_position: String,
    pub word_count: usize,
    pub scene_count: usize,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenes: Option<Vec<Scene>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChapterInput {
    pub title: Option<String>,
    pub order: Option<i64>,
    pub status: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub notes: Option<String>,
    pub pov_character: Option<String>,
    pub setting: Option<String>,
    pub timeline_position: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub id: i64,
    pub chapter_id: i64,
    pub title: String,
    pub order: i64,
    pub content: String,
    pub summary: String,
    pub notes: String,
    pub scene_type: String,
    pub word_count: usize,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SceneInput {
    pub title: Option<String>,
    pub order: Option<i64>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub notes: Option<String>,
    pub scene_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Character {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub role: String,
    pub description: String,
    pub backstory: String,
    pub motivations: String,
    pub arc_description: String,
    pub notes: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CharacterInput {
    pub name: Option<String>,
    pub role: Option<String>,
    pub description: Option<String>,
    pub backstory: Option<String>,
    pub motivations: Option<String>,
    pub arc_description: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearchNote {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    pub category: String,
    pub content: String,
    pub source_url: String,
    pub source_citation: String,
    pub tags: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResearchNoteInput {
    pub title: Option<String>,
    pub category: Option<String>,
    pub content: Option<String>,
    pub source_url: Option<String>,
    pub source_citation: Option<String>,
    pub tags: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevisionType {
    Edit,
    Rewrite,
    Expand,
    Correct,
    Improve,
}

impl RevisionType {
    pub fn as_str(self) -> &'static str {
        match self {
            RevisionType::Edit => "edit",
            RevisionType::Rewrite => "rewrite",
            RevisionType::Expand => "expand",
            RevisionType::Correct => "correct",
            RevisionType::Improve => "improve",
        }
    }
}

/// Revision as returned to callers: before/after are previews of at most
/// 500 characters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Revision {
    pub id: i64,
    pub project_id: i64,
    pub chapter_id: Option<i64>,
    pub revision_type: String,
    pub description: String,
    pub content_before: String,
    pub content_after: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRevision<'a> {
    pub project_id: i64,
    pub chapter_id: Option<i64>,
    pub revision_type: RevisionType,
    pub description: &'a str,
    pub content_before: &'a str,
    pub content_after: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientRecord {
    pub id: i64,
    pub name: String,
    pub notion_page_id: String,
    pub notion_database_id: String,
    pub notes: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ClientInput {
    pub name: Option<String>,
    pub notion_page_id: Option<String>,
    pub notion_database_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentLog {
    pub id: i64,
    pub event_type: String,
    pub client_id: Option<i64>,
    /// JSON text of the pipeline payload.
    pub data: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentStats {
    pub known_clients: i64,
    pub total_events_logged: i64,
    pub last_activity: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_count_is_idempotent_and_zero_for_empty() {
        let text = "  The quick\tbrown\n\nfox  ";
        assert_eq!(word_count(text), 4);
        assert_eq!(word_count(text), word_count(text));
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count(" \n\t "), 0);
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(progress_percent(0, 80_000), 0.0);
        assert_eq!(progress_percent(40_000, 80_000), 50.0);
        assert_eq!(progress_percent(1, 3), 33.3);
        assert_eq!(progress_percent(500_000, 1_000), 100.0);
        assert_eq!(progress_percent(10, 0), 0.0);
        assert_eq!(progress_percent(10, -5), 0.0);
    }

    #[test]
    fn preview_marks_truncation() {
        assert_eq!(preview("short", 500), "short");
        let long = "é".repeat(501);
        let cut = preview(&long, 500);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 503);
    }
}
