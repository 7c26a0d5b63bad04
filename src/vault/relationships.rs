//! Congruent clusters, catalytic pairs and real-world recommendations
//! across the whole vault.

use super::note::VaultNote;
use super::{joined_prefix, or_default, report_header, wikilinks};
use crate::domain::vault::RelationshipAnalysis;
use crate::llm::{extract_as, GenerateOptions, LlmError, TextGenerator};

pub const REPORT_TITLE: &str = "Vault Relationship Report";

const SYSTEM_PROMPT: &str = r#"You are an innovation analyst and knowledge-graph expert.

Given a digest of notes from an Obsidian vault, perform three analyses:

1. **Congruency Analysis**: Identify clusters of notes that share themes, domains, or concepts. For each cluster, explain the shared thread and how the notes reinforce each other.

2. **Catalytic Relationship Analysis**: Find pairs or small groups of notes that, when combined, could catalyze a new insight. These are notes from *different* domains whose intersection is non-obvious but promising.

3. **Real-World Recommendations**: Based on the above, propose concrete, actionable ideas: a new app, tool, workflow, standard operating procedure, class, or presentation. Each recommendation should cite the vault notes that inspired it.

Respond with ONLY a JSON object (no markdown fences):
{
  "congruent_clusters": [
    {"notes": ["Title1","Title2"], "theme": "...", "explanation": "..."}
  ],
  "catalytic_pairs": [
    {"notes": ["TitleA","TitleB"], "spark": "...", "potential": "..."}
  ],
  "recommendations": [
    {"type": "app|workflow|procedure|class|presentation",
     "title": "...", "description": "...", "source_notes": ["..."],
     "next_steps": ["..."]}
  ]
}"#;

/// One line per note: bold title, up to eight tags and links, summary.
pub fn digest(notes: &[VaultNote]) -> String {
    notes
        .iter()
        .map(|n| {
            let summary = if n.summary.is_empty() { String::new() } else { format!(" — {}", n.summary) };
            format!(
                "- **{}**  [tags: {}] [links: {}]{summary}",
                n.title,
                joined_prefix(&n.tags, 8),
                joined_prefix(&n.links, 8)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct RelationshipAnalyzer<'a> {
    llm: &'a dyn TextGenerator,
}

impl<'a> RelationshipAnalyzer<'a> {
    pub fn new(llm: &'a dyn TextGenerator) -> Self {
        Self { llm }
    }

    /// An empty vault is answered without asking the model.
    pub fn analyze(&self, notes: &[VaultNote]) -> Result<RelationshipAnalysis, LlmError> {
        let digest = digest(notes);
        if digest.trim().is_empty() {
            tracing::warn!("vault is empty; nothing to analyze");
            return Ok(RelationshipAnalysis::default());
        }
        let prompt = format!("## Vault Digest ({} notes)\n\n{digest}", notes.len());
        let response = self.llm.generate(SYSTEM_PROMPT, &prompt, GenerateOptions::default())?;
        Ok(extract_as(&response).unwrap_or_default())
    }

    pub fn report(&self, notes: &[VaultNote], date: &str) -> Result<String, LlmError> {
        Ok(render_report(&self.analyze(notes)?, date))
    }
}

pub fn render_report(analysis: &RelationshipAnalysis, date: &str) -> String {
    let mut lines = report_header(REPORT_TITLE, &["agent-report", "relationship-analysis"], date);

    lines.push("## Congruent Clusters".into());
    lines.push(String::new());
    for (i, cluster) in analysis.congruent_clusters.iter().enumerate() {
        lines.push(format!("### Cluster {}: {}", i + 1, or_default(&cluster.theme, "Unnamed")));
        lines.push(format!("**Notes:** {}", wikilinks(&cluster.notes, ", ")));
        lines.push(format!("\n{}", cluster.explanation));
        lines.push(String::new());
    }

    lines.push("## Catalytic Relationships".into());
    lines.push(String::new());
    for pair in &analysis.catalytic_pairs {
        lines.push(format!("### {}", wikilinks(&pair.notes, " × ")));
        lines.push(format!("**Spark:** {}", pair.spark));
        lines.push(format!("**Potential:** {}", pair.potential));
        lines.push(String::new());
    }

    lines.push("## Real-World Recommendations".into());
    lines.push(String::new());
    for rec in &analysis.recommendations {
        lines.push(format!(
            "### [{}] {}",
            or_default(&rec.kind, "idea").to_uppercase(),
            or_default(&rec.title, "Untitled")
        ));
        lines.push(rec.description.clone());
        lines.push(format!("\n**Source notes:** {}", wikilinks(&rec.source_notes, ", ")));
        if !rec.next_steps.is_empty() {
            lines.push("**Next steps:**".into());
            lines.extend(rec.next_steps.iter().map(|s| format!("- [ ] {s}")));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedGenerator;
    use std::path::PathBuf;

    fn note(title: &str, tags: &[&str], summary: &str) -> VaultNote {
        VaultNote {
            path: PathBuf::from(format!("{title}.md")),
            title: title.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            links: vec![],
            summary: summary.into(),
        }
    }

    #[test]
    fn digest_lists_each_note() {
        let notes = [note("Tides", &["ocean"], "Moon pulls sea."), note("Bees", &[], "")];
        assert_eq!(
            digest(&notes),
            "- **Tides**  [tags: ocean] [links: ] — Moon pulls sea.\n- **Bees**  [tags: ] [links: ]"
        );
    }

    #[test]
    fn empty_vault_does_not_call_the_model() {
        let llm = ScriptedGenerator::new(Vec::<String>::new());
        let analysis = RelationshipAnalyzer::new(&llm).analyze(&[]).expect("analysis");
        assert_eq!(analysis, RelationshipAnalysis::default());
        assert!(llm.requests.lock().expect("lock").is_empty());
    }

    #[test]
    fn report_renders_all_sections() {
        let llm = ScriptedGenerator::new([r#"{
            "congruent_clusters": [{"notes": ["Tides", "Moon"], "theme": "Gravity", "explanation": "Both orbit."}],
            "catalytic_pairs": [{"notes": ["Tides", "Bees"], "spark": "Rhythms", "potential": "A calendar app"}],
            "recommendations": [{"type": "app", "title": "Tide Hive", "description": "Track both.",
                                 "source_notes": ["Bees"], "next_steps": ["Sketch UI"]}]
        }"#]);
        let notes = [note("Tides", &[], ""), note("Bees", &[], "")];
        let report = RelationshipAnalyzer::new(&llm).report(&notes, "2026-01-05").expect("report");

        assert!(llm.last_user_text().starts_with("## Vault Digest (2 notes)\n\n- **Tides**"));
        let expected = "\
## Congruent Clusters

### Cluster 1: Gravity
**Notes:** [[Tides]], [[Moon]]

Both orbit.

## Catalytic Relationships

### [[Tides]] × [[Bees]]
**Spark:** Rhythms
**Potential:** A calendar app

## Real-World Recommendations

### [APP] Tide Hive
Track both.

**Source notes:** [[Bees]]
**Next steps:**
- [ ] Sketch UI
";
        assert!(report.starts_with("---\ntitle: \"Vault Relationship Report — 2026-01-05\"\n"));
        similar_asserts::assert_eq!(report.split_once("# Vault Relationship Report — 2026-01-05\n\n").expect("heading").1, expected);
    }

    #[test]
    fn unparsable_response_gives_empty_sections() {
        let llm = ScriptedGenerator::new(["cannot comply"]);
        let report = RelationshipAnalyzer::new(&llm).report(&[note("A", &[], "")], "2026-01-05").expect("report");
        assert!(report.ends_with("## Real-World Recommendations\n"));
    }
}
