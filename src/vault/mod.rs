//! Knowledge-vault agent.
//!
//! Files arrive from a cloud drive folder (or the command line), are
//! analyzed into Markdown notes with front-matter and written to the vault
//! inbox. Whole-vault passes then write reports into the agent folder:
//! relationships between notes, research opportunities, and a periodic export
//! of project-worthy notes to the workspace.

pub mod analyzer;
pub mod drive;
pub mod manager;
pub mod note;
pub mod opportunities;
pub mod orchestrator;
pub mod relationships;
pub mod triage;

pub use analyzer::{merge_recommendations, NoteAnalyzer};
pub use drive::{DriveApi, DriveError, DriveFile, DriveInbox, GoogleDrive};
pub use manager::VaultManager;
pub use note::VaultNote;
pub use opportunities::ResearchRecommender;
pub use orchestrator::{RunSummary, StepOutcome, VaultAgent};
pub use relationships::RelationshipAnalyzer;
pub use triage::NoteTriage;

/// `YYYY-MM-DD` in local time, as used in report titles.
pub fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Front-matter and top heading shared by every agent report.
fn report_header(title: &str, tags: &[&str], date: &str) -> Vec<String> {
    vec![
        "---".to_string(),
        format!("title: \"{title} — {date}\""),
        format!("tags: [{}]", tags.join(", ")),
        format!("date: {date}"),
        "---".to_string(),
        String::new(),
        format!("# {title} — {date}"),
        String::new(),
    ]
}

/// `[[a]], [[b]]` for a list of note titles.
fn wikilinks(titles: &[String], separator: &str) -> String {
    titles.iter().map(|t| format!("[[{t}]]")).collect::<Vec<_>>().join(separator)
}

fn joined_prefix(items: &[String], n: usize) -> String {
    items.iter().take(n).cloned().collect::<Vec<_>>().join(", ")
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_header_carries_title_tags_and_date() {
        let header = report_header("Weekly Report", &["agent-report", "weekly"], "2026-03-01");
        assert_eq!(header[1], "title: \"Weekly Report — 2026-03-01\"");
        assert_eq!(header[2], "tags: [agent-report, weekly]");
        assert_eq!(header[6], "# Weekly Report — 2026-03-01");
    }

    #[test]
    fn today_is_iso_date() {
        let date = today();
        assert!(chrono::NaiveDate::parse_from_str(&date, "%Y-%m-%d").is_ok());
    }
}
