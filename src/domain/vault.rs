//! Structured payloads for the knowledge-vault pipelines.

use serde::{Deserialize, Serialize};

pub const ANALYSIS_FAILED_SUMMARY: &str = "Analysis failed; raw content preserved.";

/// Everything the analyzer produces for a single ingested file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisResult {
    pub title: String,
    pub markdown: String,
    pub tags: Vec<String>,
    pub suggested_links: Vec<String>,
    /// One of `general`, `list`, `outline`, `table`, `diagram`.
    pub note_type: String,
    pub summary: String,
    pub key_concepts: Vec<String>,
    pub confidence: f64,
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self {
            title: String::new(),
            markdown: String::new(),
            tags: Vec::new(),
            suggested_links: Vec::new(),
            note_type: "general".to_string(),
            summary: String::new(),
            key_concepts: Vec::new(),
            confidence: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkRecommendations {
    pub additional_tags: Vec<String>,
    pub additional_links: Vec<String>,
    pub reasoning: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipAnalysis {
    pub congruent_clusters: Vec<Cluster>,
    pub catalytic_pairs: Vec<CatalyticPair>,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cluster {
    pub notes: Vec<String>,
    pub theme: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalyticPair {
    pub notes: Vec<String>,
    pub spark: String,
    pub potential: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: String,
    pub source_notes: Vec<String>,
    pub next_steps: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchOpportunities {
    pub nblm_projects: Vec<LearningProject>,
    pub perplexity_queries: Vec<ResearchQuery>,
    pub class_ideas: Vec<ClassIdea>,
    pub consulting_opportunities: Vec<ConsultingOpportunity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningProject {
    pub title: String,
    pub objective: String,
    pub source_notes: Vec<String>,
    pub suggested_resources: Vec<String>,
    pub priority: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchQuery {
    pub query: String,
    pub context: String,
    pub expected_value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassIdea {
    pub title: String,
    pub description: String,
    pub source_notes: Vec<String>,
    pub outline: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsultingOpportunity {
    pub opportunity: String,
    pub client_relevance: String,
    pub source_notes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageResult {
    pub projects: Vec<TriagedNote>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriagedNote {
    pub title: String,
    pub reason: String,
    pub priority: String,
    pub tags: Vec<String>,
}

/// A note pushed to the workspace export database.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedNote {
    pub title: String,
    pub notion_id: String,
}
