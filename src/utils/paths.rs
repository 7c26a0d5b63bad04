//! File-name helpers.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Component, Path};

static UNSAFE_NOTE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());

/// Vault note file stem: characters illegal on common filesystems become `-`.
pub fn sanitize_note_title(title: &str) -> String {
    UNSAFE_NOTE_CHARS.replace_all(title, "-").trim().to_string()
}

/// Export file stem: alphanumerics, space, `-` and `_` only; spaces become
/// underscores; at most 50 characters; `untitled` when nothing survives.
pub fn safe_filename(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let safe: String = kept.trim().replace(' ', "_").chars().take(50).collect();
    if safe.is_empty() {
        "untitled".to_string()
    } else {
        safe
    }
}

/// True when `relative` stays inside its base directory once joined.
pub fn is_contained(relative: &Path) -> bool {
    relative.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_titles_lose_reserved_characters() {
        assert_eq!(sanitize_note_title(" a/b:c? "), "a-b-c-");
        assert_eq!(sanitize_note_title("Plain"), "Plain");
    }

    #[test]
    fn export_names_are_filesystem_safe() {
        assert_eq!(safe_filename("The Long Road: A Novel!"), "The_Long_Road_A_Novel");
        assert_eq!(safe_filename("???"), "untitled");
        assert_eq!(safe_filename(&"x".repeat(80)).len(), 50);
    }

    #[test]
    fn traversal_is_not_contained() {
        assert!(is_contained(Path::new("book.docx")));
        assert!(is_contained(Path::new("packet/book.docx")));
        assert!(!is_contained(Path::new("../secret")));
        assert!(!is_contained(Path::new("/etc/passwd")));
    }
}
