//! Manuscript services: one prompt and one LLM call per operation.
//!
//! Request types double as HTTP bodies. Every field except the primary text
//! has a default, so callers only send what they care about.

pub mod editor;
pub mod expansion;
pub mod manuscript;
pub mod research;

pub use editor::EditorService;
pub use expansion::ExpansionService;
pub use manuscript::{ManuscriptService, PacketFile, SynopsisLength};
pub use research::{ResearchDepth, ResearchService};

/// `LABEL: value` on its own line, or nothing when `value` is blank.
fn optional_line(label: &str, value: &str) -> String {
    if value.trim().is_empty() {
        String::new()
    } else {
        format!("{label}: {value}")
    }
}

/// Markdown bullet list, one item per line.
fn bullets(items: &[String]) -> String {
    items.iter().map(|item| format!("- {item}")).collect::<Vec<_>>().join("\n")
}

fn default_project_type() -> String {
    "fiction".to_string()
}

fn default_target_words() -> u32 {
    4000
}

fn default_chapter_num() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_line_skips_blank_values() {
        assert_eq!(optional_line("PROJECT CONTEXT", "  "), "");
        assert_eq!(optional_line("PROJECT CONTEXT", "noir"), "PROJECT CONTEXT: noir");
        assert_eq!(bullets(&["a".into(), "b".into()]), "- a\n- b");
    }
}
