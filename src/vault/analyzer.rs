//! Turns a raw input file into a structured vault note.
//!
//! Text, Markdown and CSV files are decoded with encoding detection, PDFs go
//! through `pdf-extract`, and images are transcribed by the model. The text
//! is then classified, titled, tagged and reformatted as Markdown in a
//! single request. A second request compares the result against the vault
//! index to suggest further tags and links.

use super::manager::VaultManager;
use crate::domain::vault::{AnalysisResult, LinkRecommendations, ANALYSIS_FAILED_SUMMARY};
use crate::llm::{extract_as, GenerateOptions, TextGenerator};
use crate::utils::encoding::read_text;
use anyhow::{Context, Result};
use std::path::Path;

const ANALYSIS_SYSTEM_PROMPT: &str = r##"You are an expert note analyst for an Obsidian knowledge management vault.

Given raw note content (which may be plain English, a hand-written list,
a sketched chart or table description, or any informal structure), you must:

1. **Understand** the content: determine the topic, intent, and structure.
2. **Classify** the note type: general | list | outline | table | diagram.
3. **Generate a title**: concise, descriptive, suitable as a file name.
4. **Extract key concepts**: the core ideas or entities mentioned.
5. **Suggest tags**: Obsidian-style tags (e.g. #productivity, #AI).
   Use lowercase, hyphenated multi-word tags. Aim for 3-8 tags.
6. **Suggest wikilinks**: concepts that likely correspond to other notes
   in a knowledge vault (format: [[Concept Name]]).
7. **Convert to Markdown**: clean, well-structured Obsidian-flavoured
   Markdown. Use headings, lists, tables, callouts as appropriate.
   Preserve the author's meaning exactly; improve only structure and
   formatting, never rewrite ideas.
8. **Write a 1-2 sentence summary** of the note.

Respond with ONLY a JSON object (no markdown fences) with these keys:
{
  "title": "...",
  "note_type": "general|list|outline|table|diagram",
  "summary": "...",
  "key_concepts": ["..."],
  "tags": ["#tag1", "#tag2"],
  "suggested_links": ["[[Link1]]", "[[Link2]]"],
  "markdown": "...",
  "confidence": 0.0-1.0
}
"##;

const OCR_INSTRUCTION: &str = "Extract ALL text from this image exactly as written. If it contains a sketch, \
diagram, list, or chart, describe the structure and content in detail. Return only the extracted content.";

const RECOMMEND_SYSTEM_PROMPT: &str = "You are a knowledge-graph expert for an Obsidian vault. Given a new note \
and a summary of existing vault notes, recommend additional tags and wikilinks that would strengthen the \
knowledge graph. Only recommend links to notes that exist. Respond with JSON: {\"additional_tags\": [\"#tag\"], \
\"additional_links\": [\"[[Title]]\"], \"reasoning\": \"...\"}";

/// Vault notes shown to the recommender.
const RECOMMEND_SAMPLE: usize = 200;

pub struct NoteAnalyzer<'a> {
    llm: &'a dyn TextGenerator,
}

impl<'a> NoteAnalyzer<'a> {
    pub fn new(llm: &'a dyn TextGenerator) -> Self {
        Self { llm }
    }

    /// Raw text of a supported file. Unknown extensions are read as text.
    pub fn extract_text(&self, path: &Path) -> Result<String> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => match pdf_extract::extract_text(path) {
                Ok(text) => Ok(text),
                Err(e) => {
                    tracing::warn!(path = %path.display(), "could not extract PDF text: {e}");
                    Ok(String::new())
                }
            },
            "png" | "jpg" | "jpeg" => {
                let media_type = if ext == "png" { "image/png" } else { "image/jpeg" };
                let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
                let text = self.llm.describe_image(&bytes, media_type, OCR_INSTRUCTION, GenerateOptions::new(4096, 0.7))?;
                Ok(text)
            }
            _ => Ok(read_text(path, None)?.text),
        }
    }

    /// Full analysis of one file. Empty input yields an empty result; model
    /// output that is not usable JSON keeps the raw text under the file stem.
    pub fn analyze(&self, path: &Path) -> Result<AnalysisResult> {
        let raw = self.extract_text(path)?;
        if raw.trim().is_empty() {
            tracing::warn!(path = %path.display(), "no content extracted; skipping");
            return Ok(AnalysisResult::default());
        }

        let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let prompt = format!("Analyze the following raw note and produce the JSON output.\n\n--- RAW NOTE ---\n{raw}\n--- END ---");
        let response = self.llm.generate(ANALYSIS_SYSTEM_PROMPT, &prompt, GenerateOptions::default())?;

        let mut analysis = match extract_as::<AnalysisResult>(&response) {
            Ok(analysis) => analysis,
            Err(_) => {
                tracing::error!(path = %path.display(), "analysis response was not valid JSON");
                return Ok(AnalysisResult {
                    title: stem,
                    markdown: raw,
                    summary: ANALYSIS_FAILED_SUMMARY.to_string(),
                    ..AnalysisResult::default()
                });
            }
        };
        if analysis.title.trim().is_empty() {
            analysis.title = stem;
        }
        if analysis.markdown.trim().is_empty() {
            analysis.markdown = raw;
        }
        Ok(analysis)
    }

    /// Ask for extra tags and links given the current vault index.
    pub fn recommend_links_and_tags(&self, analysis: &AnalysisResult, vault: &VaultManager) -> Result<LinkRecommendations> {
        let sample: Vec<String> = vault
            .notes()
            .iter()
            .take(RECOMMEND_SAMPLE)
            .map(|n| {
                format!(
                    "- {}  tags:[{}]  links:[{}]",
                    n.title,
                    n.tags.iter().take(5).cloned().collect::<Vec<_>>().join(", "),
                    n.links.iter().take(5).cloned().collect::<Vec<_>>().join(", ")
                )
            })
            .collect();
        let prompt = format!(
            "## New note\nTitle: {}\nSummary: {}\nCurrent tags: {:?}\nCurrent links: {:?}\nKey concepts: {:?}\n\n\
             ## Existing vault notes (sample)\n{}\n\n## All existing tags\n{:?}\n\n## All existing note titles\n{:?}\n\n\
             Recommend additional tags and wikilinks.",
            analysis.title,
            analysis.summary,
            analysis.tags,
            analysis.suggested_links,
            analysis.key_concepts,
            sample.join("\n"),
            vault.all_tags(),
            vault.all_titles(),
        );
        let response = self.llm.generate(RECOMMEND_SYSTEM_PROMPT, &prompt, GenerateOptions::new(4096, 0.7))?;
        Ok(extract_as(&response).unwrap_or_default())
    }
}

/// Append recommended tags and links that the analysis does not already carry.
pub fn merge_recommendations(analysis: &mut AnalysisResult, recs: LinkRecommendations) {
    for tag in recs.additional_tags {
        if !analysis.tags.contains(&tag) {
            analysis.tags.push(tag);
        }
    }
    for link in recs.additional_links {
        if !analysis.suggested_links.contains(&link) {
            analysis.suggested_links.push(link);
        }
    }
}
