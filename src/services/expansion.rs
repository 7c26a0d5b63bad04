//! Ideas, outlines, beats and summaries expanded into prose.

use super::{bullets, default_chapter_num, default_project_type, default_target_words};
use crate::llm::{GenerateOptions, LlmError, TextGenerator};
use serde::Deserialize;

const OUTLINE_SYSTEM: &str = "You are a master literary architect and developmental editor with decades of \
experience crafting bestselling novels and acclaimed nonfiction. You create detailed, narratively compelling \
outlines that serve as robust blueprints for full manuscripts. Your outlines feature strong narrative arcs, \
thematic depth, and commercially viable structure.";

const CHAPTER_SYSTEM: &str = "You are an award-winning author known for literary prose that is both accessible \
and artistically sophisticated. You write with vivid sensory detail, psychologically complex characters, \
authentic dialogue, and masterful pacing. Your prose reads naturally and avoids purple prose while maintaining \
literary quality appropriate for traditional publication.";

const SCENE_SYSTEM: &str = "You are a masterful prose stylist who excels at crafting immersive, emotionally \
resonant scenes. Every scene you write advances plot, reveals character, builds theme and engages the \
reader's senses.";

const CONCEPT_SYSTEM: &str = "You are a creative development consultant who helps writers transform rough \
concepts into viable, compelling story ideas. You think about commercial viability, thematic resonance, \
narrative potential, and originality.";

const BEATS_SYSTEM: &str = "You are an expert fiction author who transforms story beats into seamless, \
immersive narrative prose. Beats are the skeleton; your job is to add the flesh, blood, and soul.";

/// Prose generation runs warmer than analysis.
const PROSE: GenerateOptions = GenerateOptions { max_tokens: 8192, temperature: 0.8 };

#[derive(Debug, Clone, Deserialize)]
pub struct OutlineRequest {
    pub idea: String,
    #[serde(default = "default_project_type")]
    pub project_type: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default = "default_num_chapters")]
    pub num_chapters: u32,
}

fn default_num_chapters() -> u32 {
    12
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChapterRequest {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub project_context: String,
    #[serde(default = "default_chapter_num")]
    pub chapter_num: u32,
    #[serde(default)]
    pub style_notes: String,
    #[serde(default = "default_target_words")]
    pub target_words: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneRequest {
    pub scene_brief: String,
    #[serde(default)]
    pub chapter_context: String,
    #[serde(default = "default_scene_type")]
    pub scene_type: String,
}

fn default_scene_type() -> String {
    "action".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct BeatsRequest {
    pub beats: Vec<String>,
    #[serde(default)]
    pub project_context: String,
    #[serde(default = "default_chapter_num")]
    pub chapter_num: u32,
    #[serde(default = "default_target_words")]
    pub target_words: u32,
}

pub struct ExpansionService<'a> {
    llm: &'a dyn TextGenerator,
}

impl<'a> ExpansionService<'a> {
    pub fn new(llm: &'a dyn TextGenerator) -> Self {
        Self { llm }
    }

    /// Full project outline in the line-oriented `TITLE:` / `CHAPTERS:` format.
    pub fn expand_idea_to_outline(&self, req: &OutlineRequest) -> Result<String, LlmError> {
        let OutlineRequest { idea, project_type, genre, num_chapters } = req;
        let genre = if genre.trim().is_empty() { "Determine the best genre fit" } else { genre.as_str() };
        let prompt = format!(
            "Take the following idea and develop it into a comprehensive {project_type} outline
with {num_chapters} chapters.

IDEA: {idea}
GENRE: {genre}
TYPE: {project_type}

Provide the outline in this exact format:

TITLE: [Compelling title]
SUBTITLE: [If applicable]
GENRE: [Specific genre/subgenre]
SYNOPSIS: [2-3 paragraph synopsis suitable for a query letter]
THEMES: [Comma-separated list of major themes]
SETTING: [Description of the primary setting(s)]

CHARACTERS:
- [Name] | [Role: protagonist/antagonist/supporting] | [Brief description] | [Motivation] | [Arc]
(List all major characters)

CHAPTERS:
Chapter 1: [Title]
Summary: [Detailed 2-3 paragraph summary of chapter events, character development, and narrative purpose]
POV: [Point of view character if applicable]
Setting: [Chapter setting]

(Continue for all {num_chapters} chapters)

Ensure the outline has:
- A compelling narrative arc with rising action, climax, and resolution
- Well-developed character arcs that intersect meaningfully
- Thematic consistency throughout
- Proper pacing with tension and release
- A satisfying but not predictable ending"
        );
        self.llm.generate(OUTLINE_SYSTEM, &prompt, GenerateOptions::default())
    }

    pub fn expand_outline_to_chapter(&self, req: &ChapterRequest) -> Result<String, LlmError> {
        let style = if req.style_notes.trim().is_empty() {
            "Literary fiction with accessible prose"
        } else {
            req.style_notes.as_str()
        };
        let prompt = format!(
            "Write Chapter {num} as full, publication-quality prose based on the following:

PROJECT CONTEXT:
{context}

CHAPTER SUMMARY:
{summary}

STYLE NOTES: {style}
TARGET LENGTH: Approximately {words} words

Requirements:
- Write complete, polished prose ready for editorial review
- Open the chapter with a compelling hook
- Develop scenes with full sensory detail and interiority
- Write natural, character-revealing dialogue with distinct voices
- Use varied sentence structure and paragraph length for rhythm
- Maintain consistent tone and point of view
- End with a compelling chapter ending that drives the reader forward
- Include scene breaks (marked with ###) where appropriate
- Show, don't tell: convey emotion through action and sensory detail
- Ensure continuity with the project context provided

Write the complete chapter now:",
            num = req.chapter_num,
            context = req.project_context,
            summary = req.summary,
            words = req.target_words,
        );
        self.llm.generate(CHAPTER_SYSTEM, &prompt, PROSE)
    }

    pub fn expand_scene(&self, req: &SceneRequest) -> Result<String, LlmError> {
        let prompt = format!(
            "Write a complete scene based on the following:

SCENE BRIEF: {}
SCENE TYPE: {}
CHAPTER CONTEXT: {}

Write this scene with full sensory immersion, natural dialogue, and emotional depth.
The scene should feel organic within its chapter context and serve clear narrative purposes.",
            req.scene_brief, req.scene_type, req.chapter_context
        );
        self.llm.generate(SCENE_SYSTEM, &prompt, PROSE)
    }

    pub fn develop_concept(&self, concept: &str, project_type: &str) -> Result<String, LlmError> {
        let prompt = format!(
            "Develop the following raw concept into a fully fleshed-out {project_type} idea:

RAW CONCEPT: {concept}

Provide:
1. DEVELOPED PREMISE: A compelling, specific premise (2-3 paragraphs)
2. UNIQUE ANGLE: What makes this fresh and different from existing works
3. TARGET AUDIENCE: Who this would appeal to and comparable titles
4. THEMATIC DEPTH: Core themes and what the work explores about the human condition
5. NARRATIVE APPROACH: Recommended structure, POV, tone, and style
6. KEY CONFLICTS: Central conflicts (internal and external) that drive the narrative
7. COMMERCIAL VIABILITY: Why this would resonate with readers and publishers
8. POTENTIAL CHALLENGES: Writing challenges to be aware of and strategies to address them"
        );
        self.llm.generate(CONCEPT_SYSTEM, &prompt, GenerateOptions::new(4096, 0.7))
    }

    pub fn chapter_from_beats(&self, req: &BeatsRequest) -> Result<String, LlmError> {
        let prompt = format!(
            "Transform these story beats into a complete Chapter {}:

STORY BEATS:
{}

PROJECT CONTEXT:
{}

TARGET LENGTH: ~{} words

Write full, publication-quality prose that incorporates all beats naturally.
Don't let the seams show: the reader should never feel they're reading a
sequence of events, but rather experiencing an organic narrative flow.",
            req.chapter_num,
            bullets(&req.beats),
            req.project_context,
            req.target_words
        );
        self.llm.generate(BEATS_SYSTEM, &prompt, PROSE)
    }
}
