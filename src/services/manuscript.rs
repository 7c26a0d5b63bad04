//! Submission material: manuscript files, query letters, synopses and the
//! full submission packet.

use crate::export::{manuscript_document, sample_chapters_document, text_document, ExportError};
use crate::llm::{GenerateOptions, LlmError, TextGenerator};
use crate::store::{Chapter, Project};
use crate::utils::paths::safe_filename;
use crate::utils::text::group_thousands;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const QUERY_SYSTEM: &str = "You are a literary agent's assistant who has read thousands of successful query \
letters. You write compelling, professionally formatted query letters that follow industry standards precisely.";

const SYNOPSIS_SYSTEM: &str = "You are an expert at writing manuscript synopses that agents and editors actually \
want to read. You distill complex narratives into compelling, clear summaries that reveal the full arc \
including the ending.";

const BIO_SYSTEM: &str = "You are helping an author draft their professional biography for manuscript submissions.";

#[derive(Debug, Error)]
pub enum ManuscriptError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum SynopsisLength {
    Short,
    #[default]
    Standard,
    Detailed,
}

impl From<String> for SynopsisLength {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "short" => SynopsisLength::Short,
            "detailed" => SynopsisLength::Detailed,
            _ => SynopsisLength::Standard,
        }
    }
}

impl SynopsisLength {
    pub fn as_str(self) -> &'static str {
        match self {
            SynopsisLength::Short => "short",
            SynopsisLength::Standard => "standard",
            SynopsisLength::Detailed => "detailed",
        }
    }

    fn target(self) -> &'static str {
        match self {
            SynopsisLength::Short => "1-2 pages (approximately 500 words)",
            SynopsisLength::Standard => "3-5 pages (approximately 1,500 words)",
            SynopsisLength::Detailed => "8-10 pages (approximately 3,000 words)",
        }
    }

    fn label(self) -> &'static str {
        match self {
            SynopsisLength::Short => "Synopsis (Short)",
            SynopsisLength::Standard => "Synopsis (Standard)",
            SynopsisLength::Detailed => "Synopsis (Detailed)",
        }
    }
}

/// One generated file of a submission packet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PacketFile {
    pub name: String,
    pub path: PathBuf,
}

fn chapters_in_order(project: &Project) -> Vec<&Chapter> {
    let mut chapters: Vec<&Chapter> = project.chapters.iter().flatten().collect();
    chapters.sort_by_key(|c| c.order);
    chapters
}

fn or_default<'s>(value: &'s str, fallback: &'s str) -> &'s str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

pub struct ManuscriptService<'a> {
    llm: &'a dyn TextGenerator,
}

impl<'a> ManuscriptService<'a> {
    pub fn new(llm: &'a dyn TextGenerator) -> Self {
        Self { llm }
    }

    pub fn query_letter(&self, project: &Project) -> Result<String, LlmError> {
        let prompt = format!(
            "Write a professional query letter for the following project:

TITLE: {}
GENRE: {}
TYPE: {}
WORD COUNT: {}
SYNOPSIS: {}
AUTHOR NAME: {}
AUTHOR BIO: {}

Format the query letter following standard industry conventions:
1. Opening hook (1-2 sentences that grab attention)
2. Book description (2-3 paragraphs covering protagonist, conflict, stakes, and unique elements)
3. Comparable titles (2-3 comp titles with brief explanation)
4. Author bio paragraph (relevant credentials and platform)
5. Professional closing with word count, genre, and title

The letter should be under 400 words total. Make it compelling and specific;
avoid generic language. Every sentence should earn its place.",
            project.title,
            project.genre,
            project.project_type,
            group_thousands(project.word_count),
            project.synopsis,
            or_default(&project.author_name, "Author Name"),
            or_default(&project.author_bio, "Provide relevant biographical details"),
        );
        self.llm.generate(QUERY_SYSTEM, &prompt, GenerateOptions::new(2048, 0.7))
    }

    pub fn synopsis(&self, project: &Project, length: SynopsisLength) -> Result<String, LlmError> {
        let summaries: String = chapters_in_order(project)
            .iter()
            .map(|ch| format!("\nChapter {}: {}\n{}\n", ch.order, ch.title, ch.summary))
            .collect();
        let prompt = format!(
            "Write a {} synopsis for:

TITLE: {}
GENRE: {}
TYPE: {}

CHAPTER SUMMARIES:
{summaries}

THEMES: {}

Requirements:
- Written in present tense, third person
- Include ALL major plot points including the ending
- Introduce main characters with their full names in CAPS on first appearance
- Show the emotional arc alongside the plot arc
- Maintain the tone of the manuscript
- Use paragraph breaks for readability
- Do NOT include chapter divisions; this should read as a continuous narrative summary",
            length.target(),
            project.title,
            project.genre,
            project.project_type,
            project.themes,
        );
        self.llm.generate(SYNOPSIS_SYSTEM, &prompt, GenerateOptions::default())
    }

    /// The stored biography, or a drafted one with `[PLACEHOLDER]` markers.
    pub fn author_bio(&self, project: &Project) -> Result<String, LlmError> {
        if !project.author_bio.trim().is_empty() {
            return Ok(project.author_bio.clone());
        }
        let prompt = format!(
            "Draft a professional author biography for a {} {} writer.
Author name: {}
Available info: No details provided yet.

Write a 150-200 word professional bio in third person that:
- Establishes credibility for the genre
- Mentions relevant education, experience, or expertise
- Includes a personal detail or two for warmth
- Notes any previous publications
- Ends with where the author lives

Mark any placeholder information with [PLACEHOLDER] for the author to fill in.",
            project.genre,
            project.project_type,
            or_default(&project.author_name, "Author Name"),
        );
        self.llm.generate(BIO_SYSTEM, &prompt, GenerateOptions::new(1024, 0.7))
    }

    pub fn chapter_outline(project: &Project) -> String {
        let mut lines = vec![
            "CHAPTER-BY-CHAPTER OUTLINE".to_string(),
            project.title.clone(),
            format!("by {}", or_default(&project.author_name, "Author")),
            String::new(),
        ];
        for ch in chapters_in_order(project) {
            lines.push(format!("Chapter {}: {}", ch.order, ch.title));
            lines.push(or_default(&ch.summary, "[Summary to be added]").to_string());
            lines.push(format!("Word count: {}", group_thousands(ch.word_count)));
            lines.push(String::new());
        }
        lines.push(format!("Total word count: {}", group_thousands(project.word_count)));
        lines.join("\n")
    }

    /// Write `<safe title>_manuscript.docx` into `dir`.
    pub fn write_manuscript(project: &Project, dir: &Path) -> Result<PathBuf, ExportError> {
        create_dir(dir)?;
        let path = dir.join(format!("{}_manuscript.docx", safe_filename(&project.title)));
        manuscript_document(project).save(&path)?;
        tracing::info!(path = %path.display(), "wrote manuscript");
        Ok(path)
    }

    /// Manuscript, query letter, short and standard synopses, author bio,
    /// chapter outline and sample chapters, written into `dir`.
    pub fn submission_packet(&self, project: &Project, dir: &Path) -> Result<Vec<PacketFile>, ManuscriptError> {
        let stem = safe_filename(&project.title);
        let mut files = Vec::new();

        let manuscript = Self::write_manuscript(project, dir)?;
        files.push(PacketFile { name: "Full Manuscript".to_string(), path: manuscript });

        let write_text = |suffix: &str, title: &str, text: &str| -> Result<PathBuf, ExportError> {
            let path = dir.join(format!("{stem}_{suffix}.docx"));
            text_document(text, title).save(&path)?;
            Ok(path)
        };

        let query = self.query_letter(project)?;
        files.push(PacketFile { name: "Query Letter".to_string(), path: write_text("query_letter", "Query Letter", &query)? });

        for length in [SynopsisLength::Short, SynopsisLength::Standard] {
            let text = self.synopsis(project, length)?;
            let path = write_text(&format!("synopsis_{}", length.as_str()), length.label(), &text)?;
            files.push(PacketFile { name: length.label().to_string(), path });
        }

        let bio = self.author_bio(project)?;
        files.push(PacketFile {
            name: "Author Biography".to_string(),
            path: write_text("author_bio", "Author Biography", &bio)?,
        });

        let outline = Self::chapter_outline(project);
        files.push(PacketFile {
            name: "Chapter Outline".to_string(),
            path: write_text("chapter_outline", "Chapter-by-Chapter Outline", &outline)?,
        });

        let sample = dir.join(format!("{stem}_sample_chapters.docx"));
        sample_chapters_document(project).save(&sample)?;
        files.push(PacketFile { name: "Sample Chapters".to_string(), path: sample });

        tracing::info!(dir = %dir.display(), files = files.len(), "wrote submission packet");
        Ok(files)
    }
}

fn create_dir(dir: &Path) -> Result<(), ExportError> {
    fs::create_dir_all(dir).map_err(|source| ExportError::Io { path: dir.display().to_string(), source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::layout::tests::project_with_chapters;
    use crate::llm::testing::ScriptedGenerator;

    #[test]
    fn synopsis_length_parses_loosely() {
        assert_eq!(SynopsisLength::from("SHORT".to_string()), SynopsisLength::Short);
        assert_eq!(SynopsisLength::from("epic".to_string()), SynopsisLength::Standard);
    }

    #[test]
    fn synopsis_lists_chapter_summaries() {
        let llm = ScriptedGenerator::new(["synopsis"]);
        let project = project_with_chapters(&[("Dusk", "a b"), ("Dawn", "c")]);
        ManuscriptService::new(&llm).synopsis(&project, SynopsisLength::Detailed).expect("synopsis");
        let prompt = llm.last_user_text();
        assert!(prompt.starts_with("Write a 8-10 pages (approximately 3,000 words) synopsis"));
        assert!(prompt.contains("Chapter 1: Dusk\nSummary of Dusk"));
        assert!(prompt.contains("THEMES: solitude"));
        assert_eq!(llm.requests.lock().expect("lock")[0].options.max_tokens, 8192);
    }

    #[test]
    fn stored_bio_skips_the_llm() {
        let llm = ScriptedGenerator::failing();
        let mut project = project_with_chapters(&[]);
        project.author_bio = "Ada lives by the sea.".into();
        let bio = ManuscriptService::new(&llm).author_bio(&project).expect("bio");
        assert_eq!(bio, "Ada lives by the sea.");
        assert!(llm.requests.lock().expect("lock").is_empty());
    }

    #[test]
    fn outline_text_lists_chapters_and_totals() {
        let project = project_with_chapters(&[("Dusk", "one two"), ("Dawn", "")]);
        let outline = ManuscriptService::chapter_outline(&project);
        similar_asserts::assert_eq!(
            outline,
            "CHAPTER-BY-CHAPTER OUTLINE\nThe Lantern\nby Ada Vale\n\n\
             Chapter 1: Dusk\nSummary of Dusk\nWord count: 2\n\n\
             Chapter 2: Dawn\nSummary of Dawn\nWord count: 0\n\n\
             Total word count: 2"
        );
    }

    #[test]
    fn packet_writes_seven_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let llm = ScriptedGenerator::new(["Dear Agent", "Short synopsis", "Long synopsis", "Bio"]);
        let project = project_with_chapters(&[("Dusk", "The lamp.")]);
        let files = ManuscriptService::new(&llm).submission_packet(&project, dir.path()).expect("packet");

        let names: Vec<String> = files
            .iter()
            .map(|f| f.path.file_name().expect("name").to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "The_Lantern_manuscript.docx",
                "The_Lantern_query_letter.docx",
                "The_Lantern_synopsis_short.docx",
                "The_Lantern_synopsis_standard.docx",
                "The_Lantern_author_bio.docx",
                "The_Lantern_chapter_outline.docx",
                "The_Lantern_sample_chapters.docx",
            ]
        );
        assert!(files.iter().all(|f| f.path.exists()));

        let bytes = std::fs::read(&files[1].path).expect("read");
        let xml = crate::export::docx::tests::read_part(&bytes, "word/document.xml");
        assert!(xml.contains("Dear Agent"));
        assert!(xml.contains("Query Letter"));
    }
}
