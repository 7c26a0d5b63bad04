//! Generation, editing and research endpoints. Each answers `{"result": text}`.

use super::error::{required, ApiError, JsonBody};
use super::{blocking, AppState, SharedState};
use crate::services::expansion::{BeatsRequest, ChapterRequest, OutlineRequest, SceneRequest};
use crate::services::{EditorService, ExpansionService, ResearchDepth, ResearchService};
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/ai/expand-idea", post(expand_idea))
        .route("/ai/develop-concept", post(develop_concept))
        .route("/ai/expand-chapter", post(expand_chapter))
        .route("/ai/expand-scene", post(expand_scene))
        .route("/ai/chapter-from-beats", post(chapter_from_beats))
        .route("/ai/developmental-edit", post(developmental_edit))
        .route("/ai/line-edit", post(line_edit))
        .route("/ai/copy-edit", post(copy_edit))
        .route("/ai/rewrite", post(rewrite))
        .route("/ai/improve", post(improve))
        .route("/ai/strengthen-dialogue", post(strengthen_dialogue))
        .route("/ai/adjust-tone", post(adjust_tone))
        .route("/ai/continuity-check", post(continuity_check))
        .route("/ai/research", post(research))
        .route("/ai/fact-check", post(fact_check))
        .route("/ai/world-building", post(world_building))
        .route("/ai/character-research", post(character_research))
        .route("/ai/setting-research", post(setting_research))
        .route("/ai/bibliography", post(bibliography))
}

type AiResult = Result<Json<Value>, ApiError>;

/// Run a generation on the blocking pool and wrap its text.
async fn respond<F>(state: &SharedState, work: F) -> AiResult
where
    F: FnOnce(&AppState) -> Result<String, ApiError> + Send + 'static,
{
    let result = blocking(state, work).await?;
    Ok(Json(json!({ "result": result })))
}

fn fiction() -> String {
    "fiction".to_string()
}

fn yes() -> bool {
    true
}

// --- expansion ---

async fn expand_idea(State(state): State<SharedState>, JsonBody(req): JsonBody<OutlineRequest>) -> AiResult {
    required(&req.idea, "idea")?;
    respond(&state, move |s| Ok(ExpansionService::new(s.llm.as_ref()).expand_idea_to_outline(&req)?)).await
}

#[derive(Debug, Deserialize)]
struct ConceptBody {
    #[serde(default)]
    concept: String,
    #[serde(default = "fiction")]
    project_type: String,
}

async fn develop_concept(State(state): State<SharedState>, JsonBody(body): JsonBody<ConceptBody>) -> AiResult {
    required(&body.concept, "concept")?;
    respond(&state, move |s| {
        Ok(ExpansionService::new(s.llm.as_ref()).develop_concept(&body.concept, &body.project_type)?)
    })
    .await
}

#[derive(Debug, Deserialize)]
struct ExpandChapterBody {
    chapter_id: Option<i64>,
    #[serde(flatten)]
    request: ChapterRequest,
}

/// With `chapter_id` the chapter supplies summary, number and project
/// context, and the generated prose is saved back into it.
async fn expand_chapter(State(state): State<SharedState>, JsonBody(body): JsonBody<ExpandChapterBody>) -> AiResult {
    let ExpandChapterBody { chapter_id, mut request } = body;
    let Some(chapter_id) = chapter_id else {
        required(&request.summary, "summary")?;
        return respond(&state, move |s| {
            Ok(ExpansionService::new(s.llm.as_ref()).expand_outline_to_chapter(&request)?)
        })
        .await;
    };

    respond(&state, move |s| {
        let (chapter, project) = {
            let store = s.store();
            let chapter = store.get_chapter(chapter_id, false)?;
            let project = store.get_project(chapter.project_id, false)?;
            (chapter, project)
        };
        if request.project_context.trim().is_empty() {
            request.project_context =
                format!("Title: {}\nGenre: {}\nSynopsis: {}", project.title, project.genre, project.synopsis);
        }
        if request.summary.trim().is_empty() {
            request.summary = chapter.summary.clone();
        }
        request.chapter_num = u32::try_from(chapter.order).unwrap_or(1);

        let prose = ExpansionService::new(s.llm.as_ref()).expand_outline_to_chapter(&request)?;
        s.store().save_expanded_chapter(chapter.id, &prose)?;
        tracing::info!(chapter_id, words = prose.split_whitespace().count(), "chapter expanded");
        Ok(prose)
    })
    .await
}

async fn expand_scene(State(state): State<SharedState>, JsonBody(req): JsonBody<SceneRequest>) -> AiResult {
    required(&req.scene_brief, "scene_brief")?;
    respond(&state, move |s| Ok(ExpansionService::new(s.llm.as_ref()).expand_scene(&req)?)).await
}

async fn chapter_from_beats(State(state): State<SharedState>, JsonBody(req): JsonBody<BeatsRequest>) -> AiResult {
    if req.beats.iter().all(|b| b.trim().is_empty()) {
        return Err(ApiError::missing("beats"));
    }
    respond(&state, move |s| Ok(ExpansionService::new(s.llm.as_ref()).chapter_from_beats(&req)?)).await
}

// --- editing ---

#[derive(Debug, Deserialize)]
struct ContentBody {
    #[serde(default)]
    content: String,
    #[serde(default)]
    project_context: String,
}

async fn developmental_edit(State(state): State<SharedState>, JsonBody(body): JsonBody<ContentBody>) -> AiResult {
    required(&body.content, "content")?;
    respond(&state, move |s| {
        Ok(EditorService::new(s.llm.as_ref()).developmental_edit(&body.content, &body.project_context)?)
    })
    .await
}

async fn line_edit(State(state): State<SharedState>, JsonBody(body): JsonBody<ContentBody>) -> AiResult {
    required(&body.content, "content")?;
    respond(&state, move |s| Ok(EditorService::new(s.llm.as_ref()).line_edit(&body.content)?)).await
}

async fn copy_edit(State(state): State<SharedState>, JsonBody(body): JsonBody<ContentBody>) -> AiResult {
    required(&body.content, "content")?;
    respond(&state, move |s| Ok(EditorService::new(s.llm.as_ref()).copy_edit(&body.content)?)).await
}

async fn strengthen_dialogue(State(state): State<SharedState>, JsonBody(body): JsonBody<ContentBody>) -> AiResult {
    required(&body.content, "content")?;
    respond(&state, move |s| Ok(EditorService::new(s.llm.as_ref()).strengthen_dialogue(&body.content)?)).await
}

#[derive(Debug, Deserialize)]
struct RewriteBody {
    #[serde(default)]
    content: String,
    #[serde(default)]
    instructions: String,
    #[serde(default = "yes")]
    preserve_voice: bool,
}

async fn rewrite(State(state): State<SharedState>, JsonBody(body): JsonBody<RewriteBody>) -> AiResult {
    required(&body.content, "content")?;
    required(&body.instructions, "instructions")?;
    respond(&state, move |s| {
        Ok(EditorService::new(s.llm.as_ref()).rewrite_passage(&body.content, &body.instructions, body.preserve_voice)?)
    })
    .await
}

#[derive(Debug, Deserialize)]
struct ImproveBody {
    #[serde(default)]
    content: String,
    #[serde(default)]
    focus_areas: Vec<String>,
}

async fn improve(State(state): State<SharedState>, JsonBody(body): JsonBody<ImproveBody>) -> AiResult {
    required(&body.content, "content")?;
    respond(&state, move |s| Ok(EditorService::new(s.llm.as_ref()).improve_prose(&body.content, &body.focus_areas)?))
        .await
}

#[derive(Debug, Deserialize)]
struct ToneBody {
    #[serde(default)]
    content: String,
    #[serde(default)]
    target_tone: String,
    #[serde(default)]
    current_tone: String,
}

async fn adjust_tone(State(state): State<SharedState>, JsonBody(body): JsonBody<ToneBody>) -> AiResult {
    required(&body.content, "content")?;
    required(&body.target_tone, "target_tone")?;
    respond(&state, move |s| {
        Ok(EditorService::new(s.llm.as_ref()).adjust_tone(&body.content, &body.target_tone, &body.current_tone)?)
    })
    .await
}

#[derive(Debug, Deserialize)]
struct ContinuityBody {
    project_id: Option<i64>,
    #[serde(default)]
    content: String,
    #[serde(default)]
    project_context: String,
}

/// With `project_id` every chapter of the project is checked, in order.
async fn continuity_check(State(state): State<SharedState>, JsonBody(body): JsonBody<ContinuityBody>) -> AiResult {
    if body.project_id.is_none() {
        required(&body.content, "content")?;
    }
    respond(&state, move |s| {
        let (chapters, context) = match body.project_id {
            Some(id) => {
                let project = s.store().get_project(id, true)?;
                let mut chapters: Vec<_> = project.chapters.iter().flatten().collect();
                chapters.sort_by_key(|c| c.order);
                let text: String = chapters
                    .iter()
                    .map(|c| {
                        let passage = if c.content.is_empty() { &c.summary } else { &c.content };
                        format!("\n--- Chapter {}: {} ---\n{passage}\n", c.order, c.title)
                    })
                    .collect();
                (text, format!("Title: {}\nGenre: {}", project.title, project.genre))
            }
            None => (body.content, body.project_context),
        };
        Ok(EditorService::new(s.llm.as_ref()).check_continuity(&chapters, &context)?)
    })
    .await
}

// --- research ---

#[derive(Debug, Deserialize)]
struct TopicBody {
    #[serde(default)]
    topic: String,
    #[serde(default)]
    project_context: String,
    #[serde(default)]
    depth: ResearchDepth,
}

async fn research(State(state): State<SharedState>, JsonBody(body): JsonBody<TopicBody>) -> AiResult {
    required(&body.topic, "topic")?;
    respond(&state, move |s| {
        Ok(ResearchService::new(s.llm.as_ref()).research_topic(&body.topic, &body.project_context, body.depth)?)
    })
    .await
}

#[derive(Debug, Deserialize)]
struct FactCheckBody {
    #[serde(default)]
    content: String,
    #[serde(default = "fiction")]
    project_type: String,
}

async fn fact_check(State(state): State<SharedState>, JsonBody(body): JsonBody<FactCheckBody>) -> AiResult {
    required(&body.content, "content")?;
    respond(&state, move |s| Ok(ResearchService::new(s.llm.as_ref()).fact_check(&body.content, &body.project_type)?))
        .await
}

#[derive(Debug, Deserialize)]
struct WorldBody {
    #[serde(default)]
    world_details: String,
    #[serde(default)]
    aspects: Vec<String>,
}

async fn world_building(State(state): State<SharedState>, JsonBody(body): JsonBody<WorldBody>) -> AiResult {
    required(&body.world_details, "world_details")?;
    respond(&state, move |s| {
        Ok(ResearchService::new(s.llm.as_ref()).world_building(&body.world_details, &body.aspects)?)
    })
    .await
}

#[derive(Debug, Deserialize)]
struct CharacterBody {
    #[serde(default)]
    character_details: String,
    #[serde(default)]
    research_needs: String,
}

async fn character_research(State(state): State<SharedState>, JsonBody(body): JsonBody<CharacterBody>) -> AiResult {
    required(&body.character_details, "character_details")?;
    required(&body.research_needs, "research_needs")?;
    respond(&state, move |s| {
        Ok(ResearchService::new(s.llm.as_ref()).character_research(&body.character_details, &body.research_needs)?)
    })
    .await
}

#[derive(Debug, Deserialize)]
struct SettingBody {
    #[serde(default)]
    setting: String,
    #[serde(default)]
    time_period: String,
    #[serde(default)]
    focus_areas: Vec<String>,
}

async fn setting_research(State(state): State<SharedState>, JsonBody(body): JsonBody<SettingBody>) -> AiResult {
    required(&body.setting, "setting")?;
    respond(&state, move |s| {
        Ok(ResearchService::new(s.llm.as_ref()).setting_research(&body.setting, &body.time_period, &body.focus_areas)?)
    })
    .await
}

#[derive(Debug, Deserialize)]
struct BibliographyBody {
    #[serde(default)]
    topics: Vec<String>,
    #[serde(default)]
    citation_style: String,
}

async fn bibliography(State(state): State<SharedState>, JsonBody(body): JsonBody<BibliographyBody>) -> AiResult {
    if body.topics.is_empty() {
        return Err(ApiError::missing("topics"));
    }
    respond(&state, move |s| {
        Ok(ResearchService::new(s.llm.as_ref()).bibliography(&body.topics, &body.citation_style)?)
    })
    .await
}
