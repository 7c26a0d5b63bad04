//! Research support: topics, fact checks, world, character and setting notes.

use super::{bullets, optional_line};
use crate::llm::{GenerateOptions, LlmError, TextGenerator};
use serde::Deserialize;

const TOPIC_SYSTEM: &str = "You are a research specialist who supports authors with accurate, detailed, and \
well-organized information. Writers need not just facts but the telling details, sensory information, and \
authentic nuances that bring settings, characters, and events to life. Always note when information might \
need verification from primary sources.";

const FACT_CHECK_SYSTEM: &str = "You are a rigorous fact-checker who reviews manuscripts for accuracy. For \
fiction, you verify real-world references, historical accuracy, and internal consistency. For nonfiction, you \
verify all factual claims. You clearly distinguish between verifiable facts and areas needing author \
verification.";

const WORLD_SYSTEM: &str = "You are a world-building consultant who draws on deep knowledge of history, \
anthropology, geography, political science, and technology to help authors create internally consistent and \
believable fictional worlds.";

const CHARACTER_SYSTEM: &str = "You are a character research specialist who helps authors create authentic, \
three-dimensional characters. You draw on psychology, sociology, cultural studies, and lived experience \
research so characters feel real and are portrayed respectfully and accurately.";

const SETTING_SYSTEM: &str = "You are a setting research specialist who provides the rich, specific details \
authors need to create immersive, authentic settings. You focus on sensory details, period accuracy, and the \
lived experience of a place.";

const BIBLIOGRAPHY_SYSTEM: &str = "You are an academic research librarian who helps nonfiction authors build \
comprehensive bibliographies. You recommend authoritative, well-regarded sources and format citations properly.";

pub const DEFAULT_WORLD_ASPECTS: [&str; 5] = ["geography", "culture", "technology", "politics", "economics"];

/// How far a topic brief should go. Unknown values read as `Standard`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ResearchDepth {
    Brief,
    #[default]
    Standard,
    Deep,
}

impl From<String> for ResearchDepth {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "brief" => ResearchDepth::Brief,
            "deep" => ResearchDepth::Deep,
            _ => ResearchDepth::Standard,
        }
    }
}

impl ResearchDepth {
    fn instructions(self) -> &'static str {
        match self {
            ResearchDepth::Brief => "Provide a concise overview with key facts.",
            ResearchDepth::Standard => {
                "Provide a thorough overview with key facts, historical context, and relevant details."
            }
            ResearchDepth::Deep => {
                "Provide an exhaustive analysis with historical context, nuances, controversies, expert \
                 perspectives, and primary source references."
            }
        }
    }
}

pub struct ResearchService<'a> {
    llm: &'a dyn TextGenerator,
}

impl<'a> ResearchService<'a> {
    pub fn new(llm: &'a dyn TextGenerator) -> Self {
        Self { llm }
    }

    pub fn research_topic(&self, topic: &str, project_context: &str, depth: ResearchDepth) -> Result<String, LlmError> {
        let prompt = format!(
            "Research the following topic for a writing project:

TOPIC: {topic}
{}
DEPTH: {}

Provide your research organized as:

1. OVERVIEW: Core facts and context the writer needs to know
2. KEY DETAILS: Specific details useful for authentic writing (sensory details, period-accurate terminology, cultural nuances)
3. COMMON MISCONCEPTIONS: What most people get wrong about this topic
4. NARRATIVE OPPORTUNITIES: How this information could enrich the story/narrative
5. FURTHER RESEARCH: Specific areas the author should verify or explore further
6. SUGGESTED SOURCES: Types of primary and secondary sources to consult
7. AUTHENTICITY NOTES: Details critical for avoiding anachronisms or inaccuracies",
            optional_line("PROJECT CONTEXT", project_context),
            depth.instructions()
        );
        self.llm.generate(TOPIC_SYSTEM, &prompt, GenerateOptions::default())
    }

    pub fn fact_check(&self, content: &str, project_type: &str) -> Result<String, LlmError> {
        let prompt = format!(
            "Fact-check the following {project_type} text:

TEXT:
{content}

Provide:
1. VERIFIED FACTS: Claims that appear accurate based on your knowledge
2. POTENTIAL ERRORS: Claims that may be inaccurate, with corrections
3. UNVERIFIABLE CLAIMS: Statements that need primary source verification
4. ANACHRONISMS: Any time-period inconsistencies (if applicable)
5. TECHNICAL ACCURACY: Assessment of any technical, scientific, or specialized content
6. RECOMMENDATIONS: Specific suggestions for improving accuracy

Rate overall factual confidence: HIGH / MEDIUM / LOW with explanation."
        );
        self.llm.generate(FACT_CHECK_SYSTEM, &prompt, GenerateOptions::default())
    }

    pub fn world_building(&self, world_details: &str, aspects: &[String]) -> Result<String, LlmError> {
        let aspects = if aspects.is_empty() { DEFAULT_WORLD_ASPECTS.join(", ") } else { aspects.join(", ") };
        let prompt = format!(
            "Help develop world-building research for the following:

WORLD DETAILS:
{world_details}

ASPECTS TO DEVELOP: {aspects}

For each aspect, provide:
- How this element would realistically function given the world's parameters
- Historical and real-world parallels for inspiration
- Internal consistency considerations
- Telling details that would make the world feel authentic
- Potential conflicts or tensions this element creates (useful for plot)"
        );
        self.llm.generate(WORLD_SYSTEM, &prompt, GenerateOptions::default())
    }

    pub fn character_research(&self, character_details: &str, research_needs: &str) -> Result<String, LlmError> {
        let prompt = format!(
            "Research to support character development:

CHARACTER DETAILS:
{character_details}

RESEARCH NEEDS:
{research_needs}

Provide:
1. PSYCHOLOGICAL PROFILE: Realistic psychological patterns based on the character's background
2. BEHAVIORAL DETAILS: Authentic behavioral patterns, habits, speech patterns
3. CULTURAL CONTEXT: Relevant cultural details for authentic portrayal
4. SENSITIVITY NOTES: Areas requiring particular care for respectful representation
5. TELLING DETAILS: Small, specific details that would make this character feel real
6. FURTHER READING: Recommended sources for deeper understanding"
        );
        self.llm.generate(CHARACTER_SYSTEM, &prompt, GenerateOptions::new(4096, 0.7))
    }

    pub fn setting_research(&self, setting: &str, time_period: &str, focus_areas: &[String]) -> Result<String, LlmError> {
        let period = if time_period.trim().is_empty() { "Contemporary" } else { time_period };
        let focus = if focus_areas.is_empty() {
            "all sensory and factual details".to_string()
        } else {
            focus_areas.join(", ")
        };
        let prompt = format!(
            "Research the following setting for a writing project:

SETTING: {setting}
TIME PERIOD: {period}
FOCUS: {focus}

Provide:
1. VISUAL DETAILS: What the place looks like: architecture, landscape, light, color
2. SOUNDS: The soundscape of this place
3. SMELLS & TASTES: Olfactory and gustatory details
4. TEXTURES & TEMPERATURES: Tactile sensations
5. CULTURAL ATMOSPHERE: The feel and energy of this place, social dynamics
6. PERIOD-SPECIFIC DETAILS: Technology, fashion, language, customs of the era
7. DAILY LIFE: What ordinary life looks and feels like here
8. UNIQUE FEATURES: What makes this setting distinct and memorable"
        );
        self.llm.generate(SETTING_SYSTEM, &prompt, GenerateOptions::new(4096, 0.7))
    }

    pub fn bibliography(&self, topics: &[String], citation_style: &str) -> Result<String, LlmError> {
        let style = if citation_style.trim().is_empty() { "chicago" } else { citation_style };
        let prompt = format!(
            "Generate a recommended bibliography for a nonfiction project covering:

TOPICS:
{}

CITATION STYLE: {style}

Provide:
1. PRIMARY SOURCES: Essential foundational works (5-10)
2. SECONDARY SOURCES: Important analytical and interpretive works (5-10)
3. CONTEMPORARY REFERENCES: Recent works and current scholarship (5-10)
4. ACCESSIBLE SOURCES: Well-written works suitable for general readers
5. MULTIMEDIA SOURCES: Documentaries, archives, databases, interviews

Format all citations in {style} style.
Note: Verify all sources independently and check library catalogs.",
            bullets(topics)
        );
        self.llm.generate(BIBLIOGRAPHY_SYSTEM, &prompt, GenerateOptions::new(4096, 0.7))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedGenerator;

    #[test]
    fn unknown_depth_reads_as_standard() {
        let depth: ResearchDepth = serde_json::from_str(r#""exhaustive""#).expect("depth");
        assert_eq!(depth, ResearchDepth::Standard);
        let depth: ResearchDepth = serde_json::from_str(r#""deep""#).expect("depth");
        assert_eq!(depth, ResearchDepth::Deep);
    }

    #[test]
    fn topic_prompt_carries_depth_and_context() {
        let llm = ScriptedGenerator::new(["notes"]);
        ResearchService::new(&llm)
            .research_topic("Lighthouses", "Victorian novel", ResearchDepth::Brief)
            .expect("research");
        let prompt = llm.last_user_text();
        assert!(prompt.contains("TOPIC: Lighthouses\nPROJECT CONTEXT: Victorian novel\nDEPTH: Provide a concise overview"));
    }

    #[test]
    fn setting_defaults_period_and_focus() {
        let llm = ScriptedGenerator::new(["notes"]);
        ResearchService::new(&llm).setting_research("Lisbon docks", "", &[]).expect("setting");
        let prompt = llm.last_user_text();
        assert!(prompt.contains("TIME PERIOD: Contemporary"));
        assert!(prompt.contains("FOCUS: all sensory and factual details"));
        assert_eq!(llm.requests.lock().expect("lock")[0].options.max_tokens, 4096);
    }

    #[test]
    fn bibliography_lists_topics() {
        let llm = ScriptedGenerator::new(["refs"]);
        ResearchService::new(&llm)
            .bibliography(&["Tides".into(), "Optics".into()], "")
            .expect("bibliography");
        let prompt = llm.last_user_text();
        assert!(prompt.contains("TOPICS:\n- Tides\n- Optics"));
        assert!(prompt.contains("CITATION STYLE: chicago"));
    }
}
