//! Monthly notes export: split into ideas, plan each idea as a project.

use super::AgentError;
use crate::domain::reports::{ProjectIdea, ProjectPlan};
use crate::llm::{decode, extract_as, extract_json, Extracted, GenerateOptions, LlmError, TextGenerator};
use serde_json::Value;

const IDEAS_SYSTEM: &str = r#"You are an expert at parsing Obsidian markdown notes. Your job is to identify distinct project ideas or concepts from a monthly review export.

Return ONLY valid JSON: an array of project ideas:
[
    {
        "title": "Project title or name",
        "raw_content": "The full raw content/description of this project idea",
        "tags": ["tag1", "tag2"],
        "links": ["any [[wikilinks]] or references found"],
        "category": "software/business/creative/research/infrastructure/other"
    }
]

Rules:
- Each distinct project idea should be its own entry
- Preserve the original content in raw_content
- Extract any #tags or [[wikilinks]] found
- If the export contains multiple ideas separated by headings, split them
- If it's a single cohesive idea, return a single-item array"#;

const PLAN_SYSTEM: &str = r#"You are a senior project manager and technical architect. Given a raw project idea, create a comprehensive project plan.

Return ONLY valid JSON:
{
    "title": "Clean project title",
    "description": "2-3 paragraph project description explaining scope, goals and expected outcomes",
    "requirements": ["Specific requirement"],
    "tasks": [
        {
            "name": "Actionable task description (start with a verb)",
            "assignee": "Role that should handle this (Developer, Designer, PM)",
            "due_date": "YYYY-MM-DD (realistic dates starting from today)",
            "priority": "High/Medium/Low",
            "phase": "Planning/Design/Development/Testing/Launch"
        }
    ],
    "milestones": [
        {
            "name": "Milestone name",
            "target_date": "YYYY-MM-DD",
            "description": "What this milestone represents",
            "deliverables": ["Deliverable"]
        }
    ],
    "timeline_recommendation": "A paragraph recommending overall timeline, key dependencies, critical path items and risks, with date ranges and phase durations.",
    "estimated_duration_weeks": 8,
    "team_size_recommendation": "Recommended team composition",
    "risks": ["Risk"],
    "next_steps": ["Immediate next step"]
}

Rules:
- Tasks are concrete and ordered with dependencies in mind
- Due dates are realistic; do not compress everything into one week
- Milestones mark meaningful progress points
- Assign tasks to roles, not specific people, unless names are provided
- Include design, documentation and testing work, and leave time for review cycles"#;

pub struct IdeaPlanner<'a> {
    llm: &'a dyn TextGenerator,
}

impl<'a> IdeaPlanner<'a> {
    pub fn new(llm: &'a dyn TextGenerator) -> Self {
        Self { llm }
    }

    /// Ideas in the export. A single object is accepted when it has a title;
    /// an unreadable answer yields no ideas.
    pub fn parse_ideas(&self, markdown: &str) -> Result<Vec<ProjectIdea>, LlmError> {
        let user = format!(
            "Parse this Obsidian monthly review export and extract all project ideas.\n\n\
             --- OBSIDIAN EXPORT ---\n{markdown}\n--- END EXPORT ---\n\nReturn the structured JSON array."
        );
        let text = self.llm.generate(IDEAS_SYSTEM, &user, GenerateOptions::new(4096, 0.2))?;
        let items = match extract_json(&text) {
            Extracted::Parsed(Value::Array(items)) => items,
            Extracted::Parsed(obj @ Value::Object(_)) if obj.get("title").is_some() => vec![obj],
            _ => Vec::new(),
        };
        Ok(items.into_iter().filter_map(|item| decode::<ProjectIdea>(item).ok()).collect())
    }

    /// Plan one idea; `today` (`YYYY-MM-DD`) anchors the generated dates.
    pub fn generate_plan(&self, idea: &ProjectIdea, today: &str) -> Result<ProjectPlan, AgentError> {
        let title = if idea.title.is_empty() { "Untitled" } else { idea.title.as_str() };
        let category = if idea.category.is_empty() { "general" } else { idea.category.as_str() };
        let body = if idea.raw_content.is_empty() { &idea.description } else { &idea.raw_content };
        let user = format!(
            "Create a detailed project plan for this idea. Today's date is {today}.\n\n\
             Project Title: {title}\nCategory: {category}\nTags: {}\n\n\
             --- RAW IDEA ---\n{body}\n--- END IDEA ---\n\nGenerate the complete project plan JSON.",
            idea.tags.join(", ")
        );
        let text = self.llm.generate(PLAN_SYSTEM, &user, GenerateOptions::new(8192, 0.3))?;
        Ok(extract_as(&text)?)
    }

    /// Parse and plan without touching the workspace; ideas whose plan fails
    /// are skipped.
    pub fn plan_all(&self, markdown: &str, today: &str) -> Result<Vec<ProjectPlan>, LlmError> {
        let ideas = self.parse_ideas(markdown)?;
        Ok(ideas
            .iter()
            .filter_map(|idea| match self.generate_plan(idea, today) {
                Ok(plan) => Some(plan),
                Err(e) => {
                    tracing::warn!(title = %idea.title, "plan generation failed: {e}");
                    None
                }
            })
            .collect())
    }
}
