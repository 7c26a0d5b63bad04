//! Editing passes over existing prose.

use super::optional_line;
use crate::llm::{GenerateOptions, LlmError, TextGenerator};

const DEVELOPMENTAL_SYSTEM: &str = "You are a senior developmental editor at a major publishing house with 25+ \
years of experience. You provide constructive, specific, actionable feedback that respects the author's voice \
while strengthening the work.";

const LINE_SYSTEM: &str = "You are an expert line editor known for polishing prose to publication standard while \
preserving the author's unique voice. You focus on sentence-level craft: rhythm, word choice, clarity, and impact.";

const COPY_SYSTEM: &str = "You are a meticulous copy editor who follows the Chicago Manual of Style. You catch \
every grammatical error, punctuation issue, and consistency problem while respecting intentional stylistic choices.";

const REWRITE_SYSTEM: &str = "You are a skilled ghostwriter and prose artisan who can rewrite text to meet any \
specification while maintaining narrative coherence and literary quality.";

const IMPROVE_SYSTEM: &str = "You are a prose improvement specialist who elevates writing from good to \
exceptional. You enhance without overwriting, improving the text while keeping it recognizably the author's work.";

const CONTINUITY_SYSTEM: &str = "You are a continuity editor with an encyclopedic memory for detail. You catch \
every inconsistency in timelines, character details, settings, and plot points.";

const TONE_SYSTEM: &str = "You are an expert at modulating prose tone while maintaining meaning and narrative \
integrity. You understand how word choice, sentence structure, and pacing create emotional tone.";

const DIALOGUE_SYSTEM: &str = "You are a dialogue specialist who makes characters sound like real people with \
distinct voices. Every line of dialogue you write reveals character, advances plot, or creates tension.";

/// Focus areas used by [`EditorService::improve_prose`] when none are given.
pub const DEFAULT_FOCUS_AREAS: [&str; 4] = ["clarity", "imagery", "rhythm", "impact"];

const REWORK: GenerateOptions = GenerateOptions { max_tokens: 8192, temperature: 0.7 };

pub struct EditorService<'a> {
    llm: &'a dyn TextGenerator,
}

impl<'a> EditorService<'a> {
    pub fn new(llm: &'a dyn TextGenerator) -> Self {
        Self { llm }
    }

    pub fn developmental_edit(&self, content: &str, project_context: &str) -> Result<String, LlmError> {
        let prompt = format!(
            "Provide a thorough developmental edit of the following text:

{}

TEXT TO EDIT:
{content}

Provide your editorial feedback in these categories:

1. OVERALL ASSESSMENT: Strengths and general impressions (2-3 paragraphs)
2. STRUCTURE & PACING: Analysis of narrative flow, scene structure, chapter rhythm
3. CHARACTER: Voice consistency, development, authenticity of dialogue
4. PLOT & NARRATIVE: Logic, tension, stakes, foreshadowing, payoffs
5. PROSE QUALITY: Sentence-level craft, word choice, imagery, rhythm
6. THEMATIC COHERENCE: How well themes are woven through the narrative
7. SPECIFIC LINE EDITS: Cite 5-10 specific passages with suggested improvements
8. PRIORITY REVISIONS: Ordered list of the most important changes to make

Be honest but encouraging. Identify what's working well alongside what needs improvement.",
            optional_line("PROJECT CONTEXT", project_context)
        );
        self.llm.generate(DEVELOPMENTAL_SYSTEM, &prompt, GenerateOptions::default())
    }

    pub fn line_edit(&self, content: &str) -> Result<String, LlmError> {
        let prompt = format!(
            "Perform a thorough line edit of the following text. Return the edited text
with tracked changes indicated in this format:
- Deletions: [DEL: removed text]
- Additions: [ADD: new text]
- Suggestions: [SUGGEST: alternative phrasing | reason]

Focus on:
- Eliminating redundancy and wordiness
- Strengthening verbs and reducing adverb dependence
- Improving sentence rhythm and variety
- Fixing awkward constructions
- Enhancing imagery and sensory detail
- Ensuring consistent tone and voice
- Catching cliche and suggesting fresh alternatives

TEXT TO EDIT:
{content}

Provide the edited text followed by a brief summary of the types of changes made."
        );
        self.llm.generate(LINE_SYSTEM, &prompt, GenerateOptions::default())
    }

    pub fn copy_edit(&self, content: &str) -> Result<String, LlmError> {
        let prompt = format!(
            "Perform a thorough copy edit of the following text:

TEXT:
{content}

Return:
1. CORRECTED TEXT: The fully corrected text
2. CHANGES LOG: A numbered list of every change made and why
3. STYLE NOTES: Any style consistency issues to watch for in the larger work
4. QUERIES: Any questions for the author about ambiguous passages"
        );
        self.llm.generate(COPY_SYSTEM, &prompt, GenerateOptions::default())
    }

    pub fn rewrite_passage(&self, content: &str, instructions: &str, preserve_voice: bool) -> Result<String, LlmError> {
        let voice_note = if preserve_voice {
            "Carefully preserve the author's original voice, tone, and style."
        } else {
            "You may adapt the voice and style as the instructions require."
        };
        let prompt = format!(
            "Rewrite the following passage according to these instructions:

INSTRUCTIONS: {instructions}
NOTE: {voice_note}

ORIGINAL TEXT:
{content}

Provide:
1. REWRITTEN TEXT: The complete rewritten passage
2. REVISION NOTES: Brief explanation of the key changes and why they address the instructions"
        );
        self.llm.generate(REWRITE_SYSTEM, &prompt, REWORK)
    }

    /// Improve prose along `focus_areas`, or [`DEFAULT_FOCUS_AREAS`] when empty.
    pub fn improve_prose(&self, content: &str, focus_areas: &[String]) -> Result<String, LlmError> {
        let areas = if focus_areas.is_empty() {
            DEFAULT_FOCUS_AREAS.join(", ")
        } else {
            focus_areas.join(", ")
        };
        let prompt = format!(
            "Improve the following prose with focus on: {areas}

ORIGINAL TEXT:
{content}

Return:
1. IMPROVED TEXT: The enhanced version
2. IMPROVEMENT NOTES: What was changed and why, organized by focus area"
        );
        self.llm.generate(IMPROVE_SYSTEM, &prompt, REWORK)
    }

    pub fn check_continuity(&self, chapters: &str, project_context: &str) -> Result<String, LlmError> {
        let prompt = format!(
            "Review the following chapters for continuity errors:

{}

CHAPTERS:
{chapters}

Identify:
1. TIMELINE INCONSISTENCIES: Any chronological errors or impossible sequences
2. CHARACTER INCONSISTENCIES: Changes in appearance, behavior, knowledge, or abilities that aren't explained
3. SETTING ERRORS: Contradictions in physical descriptions, distances, layouts
4. PLOT HOLES: Logical gaps, unresolved threads, contradictory events
5. FACTUAL ERRORS: Any incorrect real-world facts or internal world-building contradictions
6. DIALOGUE CONSISTENCY: Characters saying things that contradict established knowledge

For each issue, cite the specific passages involved and suggest a fix.",
            optional_line("PROJECT CONTEXT", project_context)
        );
        self.llm.generate(CONTINUITY_SYSTEM, &prompt, GenerateOptions::default())
    }

    pub fn adjust_tone(&self, content: &str, target_tone: &str, current_tone: &str) -> Result<String, LlmError> {
        let current = if current_tone.trim().is_empty() { "As written" } else { current_tone };
        let prompt = format!(
            "Adjust the tone of the following passage:

CURRENT TONE: {current}
TARGET TONE: {target_tone}

TEXT:
{content}

Return the rewritten passage with the adjusted tone. Preserve all plot points,
character actions, and essential information while shifting the emotional register."
        );
        self.llm.generate(TONE_SYSTEM, &prompt, REWORK)
    }

    pub fn strengthen_dialogue(&self, content: &str) -> Result<String, LlmError> {
        let prompt = format!(
            "Improve the dialogue in the following passage:

TEXT:
{content}

Focus on:
- Making each character's voice distinct and recognizable
- Removing on-the-nose dialogue (characters stating exactly what they feel)
- Adding subtext: what's said beneath what's said
- Using dialogue beats and action tags instead of adverb-heavy attribution
- Ensuring dialogue sounds natural when read aloud
- Cutting unnecessary pleasantries and filler

Return:
1. IMPROVED TEXT: The passage with strengthened dialogue
2. DIALOGUE NOTES: Key changes and the reasoning behind them"
        );
        self.llm.generate(DIALOGUE_SYSTEM, &prompt, GenerateOptions::new(8192, 0.8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedGenerator;

    #[test]
    fn developmental_edit_omits_blank_context() {
        let llm = ScriptedGenerator::new(["notes", "notes"]);
        let editor = EditorService::new(&llm);
        editor.developmental_edit("It was a dark night.", "").expect("edit");
        assert!(!llm.last_user_text().contains("PROJECT CONTEXT"));

        editor.developmental_edit("It was a dark night.", "Gothic novel").expect("edit");
        assert!(llm.last_user_text().contains("PROJECT CONTEXT: Gothic novel"));
    }

    #[test]
    fn improve_falls_back_to_default_focus() {
        let llm = ScriptedGenerator::new(["better"]);
        EditorService::new(&llm).improve_prose("text", &[]).expect("improve");
        assert!(llm.last_user_text().starts_with("Improve the following prose with focus on: clarity, imagery, rhythm, impact"));
    }

    #[test]
    fn rewrite_voice_note_follows_flag() {
        let llm = ScriptedGenerator::new(["a", "b"]);
        let editor = EditorService::new(&llm);
        editor.rewrite_passage("text", "shorter", true).expect("rewrite");
        assert!(llm.last_user_text().contains("Carefully preserve the author's original voice"));
        editor.rewrite_passage("text", "shorter", false).expect("rewrite");
        assert!(llm.last_user_text().contains("You may adapt the voice"));
    }

    #[test]
    fn tone_defaults_current_tone() {
        let llm = ScriptedGenerator::new(["x"]);
        EditorService::new(&llm).adjust_tone("text", "wry", " ").expect("tone");
        assert!(llm.last_user_text().contains("CURRENT TONE: As written\nTARGET TONE: wry"));
    }
}
