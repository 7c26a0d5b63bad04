//! Learning projects, research queries, class ideas and consulting
//! opportunities surfaced from the vault.

use super::note::VaultNote;
use super::{joined_prefix, or_default, report_header, wikilinks};
use crate::domain::vault::ResearchOpportunities;
use crate::llm::{extract_as, GenerateOptions, LlmError, TextGenerator};
use crate::utils::text::truncate_chars;

pub const REPORT_TITLE: &str = "Research Opportunities Report";

const RESPONSE_SHAPE: &str = r#"Respond with JSON (no fences):
{
  "nblm_projects": [
    {"title": "...", "objective": "...", "source_notes": ["..."],
     "suggested_resources": ["..."], "priority": "high|medium|low"}
  ],
  "perplexity_queries": [
    {"query": "...", "context": "...", "expected_value": "..."}
  ],
  "class_ideas": [
    {"title": "...", "description": "...", "source_notes": ["..."],
     "outline": ["..."]}
  ],
  "consulting_opportunities": [
    {"opportunity": "...", "client_relevance": "...",
     "source_notes": ["..."]}
  ]
}"#;

fn system_prompt(domains: &[String]) -> String {
    format!(
        "You are a strategic research advisor and innovation consultant.

Given a digest of notes from a knowledge vault and the user's consulting domains ({}), identify:

1. **NBLM Projects**: Next-Best-Learning-Move projects. These are knowledge gaps, emerging themes, or \
under-developed ideas in the vault that deserve a dedicated research sprint. Each should have a clear learning \
objective and suggested resources.

2. **Perplexity Research Queries**: specific, well-formed research questions that could be submitted to \
Perplexity (or similar deep-search tools) to generate reports. Each should target a gap or opportunity.

3. **Class / Presentation Ideas**: topics where the vault contains enough depth and breadth to develop a class, \
workshop, or conference talk. Include a tentative outline.

4. **Consulting Opportunities**: insights from the vault that could directly benefit the user's consulting \
clients or open new engagements.

{RESPONSE_SHAPE}",
        domains.join(", ")
    )
}

/// One line per note: up to six tags and links and the first 100
/// characters of the summary.
pub fn digest(notes: &[VaultNote]) -> String {
    notes
        .iter()
        .map(|n| {
            format!(
                "- {} | tags: [{}] | links: [{}] | summary: {}",
                n.title,
                joined_prefix(&n.tags, 6),
                joined_prefix(&n.links, 6),
                truncate_chars(&n.summary, 100)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct ResearchRecommender<'a> {
    llm: &'a dyn TextGenerator,
    domains: &'a [String],
}

impl<'a> ResearchRecommender<'a> {
    pub fn new(llm: &'a dyn TextGenerator, consulting_domains: &'a [String]) -> Self {
        Self { llm, domains: consulting_domains }
    }

    pub fn identify(&self, notes: &[VaultNote]) -> Result<ResearchOpportunities, LlmError> {
        let prompt = format!("## Vault Digest ({} notes)\n\n{}", notes.len(), digest(notes));
        let response = self.llm.generate(&system_prompt(self.domains), &prompt, GenerateOptions::default())?;
        Ok(extract_as(&response).unwrap_or_default())
    }

    pub fn report(&self, notes: &[VaultNote], date: &str) -> Result<String, LlmError> {
        Ok(render_report(&self.identify(notes)?, date))
    }
}

pub fn render_report(found: &ResearchOpportunities, date: &str) -> String {
    let mut lines = report_header(REPORT_TITLE, &["agent-report", "research-opportunities", "nblm"], date);

    lines.push("## NBLM Projects".into());
    lines.push(String::new());
    for project in &found.nblm_projects {
        lines.push(format!(
            "### [{}] {}",
            or_default(&project.priority, "medium").to_uppercase(),
            or_default(&project.title, "Untitled")
        ));
        lines.push(format!("**Objective:** {}", project.objective));
        lines.push(format!("**Source notes:** {}", wikilinks(&project.source_notes, ", ")));
        if !project.suggested_resources.is_empty() {
            lines.push("**Suggested resources:**".into());
            lines.extend(project.suggested_resources.iter().map(|r| format!("- {r}")));
        }
        lines.push(String::new());
    }

    lines.push("## Perplexity Research Queries".into());
    lines.push(String::new());
    for query in &found.perplexity_queries {
        lines.push(format!("### Query: {}", query.query));
        lines.push(format!("**Context:** {}", query.context));
        lines.push(format!("**Expected value:** {}", query.expected_value));
        lines.push(String::new());
    }

    lines.push("## Class & Presentation Ideas".into());
    lines.push(String::new());
    for idea in &found.class_ideas {
        lines.push(format!("### {}", or_default(&idea.title, "Untitled")));
        lines.push(idea.description.clone());
        lines.push(format!("**Source notes:** {}", wikilinks(&idea.source_notes, ", ")));
        if !idea.outline.is_empty() {
            lines.push("**Tentative outline:**".into());
            lines.extend(idea.outline.iter().enumerate().map(|(i, item)| format!("{}. {item}", i + 1)));
        }
        lines.push(String::new());
    }

    lines.push("## Consulting Opportunities".into());
    lines.push(String::new());
    for opportunity in &found.consulting_opportunities {
        lines.push(format!("### {}", or_default(&opportunity.opportunity, "Untitled")));
        lines.push(format!("**Client relevance:** {}", opportunity.client_relevance));
        lines.push(format!("**Source notes:** {}", wikilinks(&opportunity.source_notes, ", ")));
        lines.push(String::new());
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedGenerator;
    use std::path::PathBuf;

    #[test]
    fn system_prompt_names_consulting_domains() {
        let llm = ScriptedGenerator::new(["{}"]);
        let domains = vec!["education".to_string(), "robotics".to_string()];
        ResearchRecommender::new(&llm, &domains).identify(&[]).expect("identify");

        let requests = llm.requests.lock().expect("lock");
        let system = requests[0].system.as_deref().unwrap_or_default();
        assert!(system.contains("consulting domains (education, robotics)"));
        assert_eq!(requests[0].options.max_tokens, 8192);
    }

    #[test]
    fn digest_truncates_summary() {
        let note = VaultNote {
            path: PathBuf::from("a.md"),
            title: "Long".into(),
            tags: (0..8).map(|i| format!("t{i}")).collect(),
            links: vec!["B".into()],
            summary: "x".repeat(150),
        };
        let line = digest(&[note]);
        assert!(line.starts_with("- Long | tags: [t0, t1, t2, t3, t4, t5] | links: [B] | summary: "));
        assert!(line.ends_with(&"x".repeat(100)));
        assert!(!line.ends_with(&"x".repeat(101)));
    }

    #[test]
    fn report_numbers_outline_and_upcases_priority() {
        let llm = ScriptedGenerator::new([r#"{
            "nblm_projects": [{"title": "Tidal energy", "objective": "Learn basics", "source_notes": ["Tides"],
                               "suggested_resources": ["MIT OCW"], "priority": "high"}],
            "perplexity_queries": [{"query": "tidal farms 2026", "context": "Tides", "expected_value": "market size"}],
            "class_ideas": [{"title": "Ocean 101", "description": "Intro", "source_notes": [], "outline": ["Waves", "Tides"]}],
            "consulting_opportunities": [{"opportunity": "Port audit", "client_relevance": "Harbor clients", "source_notes": ["Tides"]}]
        }"#]);
        let report = ResearchRecommender::new(&llm, &[]).report(&[], "2026-02-01").expect("report");

        assert!(report.contains("tags: [agent-report, research-opportunities, nblm]"));
        assert!(report.contains("### [HIGH] Tidal energy\n**Objective:** Learn basics\n**Source notes:** [[Tides]]\n**Suggested resources:**\n- MIT OCW\n"));
        assert!(report.contains("### Query: tidal farms 2026\n**Context:** Tides\n**Expected value:** market size\n"));
        assert!(report.contains("**Tentative outline:**\n1. Waves\n2. Tides\n"));
        assert!(report.contains("### Port audit\n**Client relevance:** Harbor clients\n**Source notes:** [[Tides]]\n"));
    }
}
