//! Projects, chapters, scenes, characters, research notes, revisions and
//! manuscript exports.

use super::error::{ApiError, JsonBody};
use super::{blocking, SharedState};
use crate::services::{ManuscriptService, PacketFile, SynopsisLength};
use crate::store::{
    Chapter, ChapterInput, Character, CharacterInput, Project, ProjectInput, ResearchNote, ResearchNoteInput,
    Revision, Scene, SceneInput,
};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path as FsPath, PathBuf};

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route("/projects/:id", get(get_project).put(update_project).delete(delete_project))
        .route("/projects/:id/chapters", get(list_chapters).post(create_chapter))
        .route("/chapters/:id", get(get_chapter).put(update_chapter).delete(delete_chapter))
        .route("/chapters/:id/scenes", post(create_scene))
        .route("/scenes/:id", put(update_scene).delete(delete_scene))
        .route("/projects/:id/characters", get(list_characters).post(create_character))
        .route("/characters/:id", put(update_character).delete(delete_character))
        .route("/projects/:id/research", get(list_research).post(create_research))
        .route("/research/:id", put(update_research).delete(delete_research))
        .route("/projects/:id/revisions", get(list_revisions))
        .route("/projects/:id/export/manuscript", post(export_manuscript))
        .route("/projects/:id/export/query-letter", post(export_query_letter))
        .route("/projects/:id/export/synopsis", post(export_synopsis))
        .route("/projects/:id/export/submission-packet", post(export_submission_packet))
        .route("/projects/:id/export/download/*filename", get(download))
}

type ApiResult<T> = Result<Json<T>, ApiError>;
type Created<T> = Result<(StatusCode, Json<T>), ApiError>;

fn deleted(what: &str) -> Json<Value> {
    Json(json!({ "message": format!("{what} deleted") }))
}

// --- projects ---

async fn list_projects(State(state): State<SharedState>) -> ApiResult<Vec<Project>> {
    blocking(&state, |s| Ok(s.store().list_projects()?)).await.map(Json)
}

async fn create_project(State(state): State<SharedState>, JsonBody(input): JsonBody<ProjectInput>) -> Created<Project> {
    let project = blocking(&state, move |s| Ok(s.store().create_project(&input)?)).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

async fn get_project(State(state): State<SharedState>, Path(id): Path<i64>) -> ApiResult<Project> {
    blocking(&state, move |s| Ok(s.store().get_project(id, true)?)).await.map(Json)
}

async fn update_project(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    JsonBody(input): JsonBody<ProjectInput>,
) -> ApiResult<Project> {
    blocking(&state, move |s| Ok(s.store().update_project(id, &input)?)).await.map(Json)
}

async fn delete_project(State(state): State<SharedState>, Path(id): Path<i64>) -> ApiResult<Value> {
    blocking(&state, move |s| Ok(s.store().delete_project(id)?)).await?;
    Ok(deleted("Project"))
}

// --- chapters and scenes ---

async fn list_chapters(State(state): State<SharedState>, Path(project_id): Path<i64>) -> ApiResult<Vec<Chapter>> {
    blocking(&state, move |s| {
        let store = s.store();
        store.get_project(project_id, false)?;
        Ok(store.list_chapters(project_id, false)?)
    })
    .await
    .map(Json)
}

async fn create_chapter(
    State(state): State<SharedState>,
    Path(project_id): Path<i64>,
    JsonBody(input): JsonBody<ChapterInput>,
) -> Created<Chapter> {
    let chapter = blocking(&state, move |s| Ok(s.store().create_chapter(project_id, &input)?)).await?;
    Ok((StatusCode::CREATED, Json(chapter)))
}

async fn get_chapter(State(state): State<SharedState>, Path(id): Path<i64>) -> ApiResult<Chapter> {
    blocking(&state, move |s| Ok(s.store().get_chapter(id, true)?)).await.map(Json)
}

async fn update_chapter(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    JsonBody(input): JsonBody<ChapterInput>,
) -> ApiResult<Chapter> {
    blocking(&state, move |s| Ok(s.store().update_chapter(id, &input)?)).await.map(Json)
}

async fn delete_chapter(State(state): State<SharedState>, Path(id): Path<i64>) -> ApiResult<Value> {
    blocking(&state, move |s| Ok(s.store().delete_chapter(id)?)).await?;
    Ok(deleted("Chapter"))
}

async fn create_scene(
    State(state): State<SharedState>,
    Path(chapter_id): Path<i64>,
    JsonBody(input): JsonBody<SceneInput>,
) -> Created<Scene> {
    let scene = blocking(&state, move |s| Ok(s.store().create_scene(chapter_id, &input)?)).await?;
    Ok((StatusCode::CREATED, Json(scene)))
}

async fn update_scene(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    JsonBody(input): JsonBody<SceneInput>,
) -> ApiResult<Scene> {
    blocking(&state, move |s| Ok(s.store().update_scene(id, &input)?)).await.map(Json)
}

async fn delete_scene(State(state): State<SharedState>, Path(id): Path<i64>) -> ApiResult<Value> {
    blocking(&state, move |s| Ok(s.store().delete_scene(id)?)).await?;
    Ok(deleted("Scene"))
}

// --- characters ---

async fn list_characters(State(state): State<SharedState>, Path(project_id): Path<i64>) -> ApiResult<Vec<Character>> {
    blocking(&state, move |s| Ok(s.store().list_characters(project_id)?)).await.map(Json)
}

async fn create_character(
    State(state): State<SharedState>,
    Path(project_id): Path<i64>,
    JsonBody(input): JsonBody<CharacterInput>,
) -> Created<Character> {
    let character = blocking(&state, move |s| Ok(s.store().create_character(project_id, &input)?)).await?;
    Ok((StatusCode::CREATED, Json(character)))
}

async fn update_character(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    JsonBody(input): JsonBody<CharacterInput>,
) -> ApiResult<Character> {
    blocking(&state, move |s| Ok(s.store().update_character(id, &input)?)).await.map(Json)
}

async fn delete_character(State(state): State<SharedState>, Path(id): Path<i64>) -> ApiResult<Value> {
    blocking(&state, move |s| Ok(s.store().delete_character(id)?)).await?;
    Ok(deleted("Character"))
}

// --- research notes ---

async fn list_research(State(state): State<SharedState>, Path(project_id): Path<i64>) -> ApiResult<Vec<ResearchNote>> {
    blocking(&state, move |s| Ok(s.store().list_research_notes(project_id)?)).await.map(Json)
}

async fn create_research(
    State(state): State<SharedState>,
    Path(project_id): Path<i64>,
    JsonBody(input): JsonBody<ResearchNoteInput>,
) -> Created<ResearchNote> {
    let note = blocking(&state, move |s| Ok(s.store().create_research_note(project_id, &input)?)).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

async fn update_research(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    JsonBody(input): JsonBody<ResearchNoteInput>,
) -> ApiResult<ResearchNote> {
    blocking(&state, move |s| Ok(s.store().update_research_note(id, &input)?)).await.map(Json)
}

async fn delete_research(State(state): State<SharedState>, Path(id): Path<i64>) -> ApiResult<Value> {
    blocking(&state, move |s| Ok(s.store().delete_research_note(id)?)).await?;
    Ok(deleted("Research note"))
}

async fn list_revisions(State(state): State<SharedState>, Path(project_id): Path<i64>) -> ApiResult<Vec<Revision>> {
    blocking(&state, move |s| Ok(s.store().list_revisions(project_id)?)).await.map(Json)
}

// --- exports ---

async fn export_manuscript(State(state): State<SharedState>, Path(id): Path<i64>) -> Result<Response, ApiError> {
    let (path, bytes) = blocking(&state, move |s| {
        let project = s.store().get_project(id, true)?;
        let dir = s.config.manuscripts.dir.join(id.to_string());
        let path = ManuscriptService::write_manuscript(&project, &dir)?;
        let bytes = std::fs::read(&path)
            .map_err(|e| ApiError::Internal(format!("failed to read {}: {e}", path.display())))?;
        Ok((path, bytes))
    })
    .await?;
    Ok(attachment(&path, bytes))
}

async fn export_query_letter(State(state): State<SharedState>, Path(id): Path<i64>) -> ApiResult<Value> {
    let letter = blocking(&state, move |s| {
        let project = s.store().get_project(id, true)?;
        Ok(ManuscriptService::new(s.llm.as_ref()).query_letter(&project)?)
    })
    .await?;
    Ok(Json(json!({ "result": letter })))
}

#[derive(Debug, Deserialize)]
struct SynopsisBody {
    #[serde(default)]
    length: SynopsisLength,
}

async fn export_synopsis(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    body: Option<JsonBody<SynopsisBody>>,
) -> ApiResult<Value> {
    let length = body.map(|JsonBody(b)| b.length).unwrap_or_default();
    let synopsis = blocking(&state, move |s| {
        let project = s.store().get_project(id, true)?;
        Ok(ManuscriptService::new(s.llm.as_ref()).synopsis(&project, length)?)
    })
    .await?;
    Ok(Json(json!({ "result": synopsis })))
}

async fn export_submission_packet(State(state): State<SharedState>, Path(id): Path<i64>) -> ApiResult<Value> {
    let files: Vec<PacketFile> = blocking(&state, move |s| {
        let project = s.store().get_project(id, true)?;
        let dir = s.config.manuscripts.dir.join(id.to_string()).join("submission_packet");
        Ok(ManuscriptService::new(s.llm.as_ref()).submission_packet(&project, &dir)?)
    })
    .await?;
    Ok(Json(json!({ "message": "Submission packet generated", "files": files })))
}

/// Serve a previously generated file from the project's export directory.
async fn download(
    State(state): State<SharedState>,
    Path((id, filename)): Path<(i64, String)>,
) -> Result<Response, ApiError> {
    let not_found = || ApiError::NotFound("File not found".to_string());
    let relative = PathBuf::from(filename.trim_start_matches('/'));
    if !crate::utils::paths::is_contained(&relative) {
        return Err(not_found());
    }
    let path = state.config.manuscripts.dir.join(id.to_string()).join(relative);
    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => {}
        _ => return Err(not_found()),
    }
    let bytes = tokio::fs::read(&path).await.map_err(|_| not_found())?;
    Ok(attachment(&path, bytes))
}

fn attachment(path: &FsPath, bytes: Vec<u8>) -> Response {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("download");
    let content_type = match path.extension().and_then(|e| e.to_str()) {
        Some("docx") => DOCX_MIME,
        Some("md" | "txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    };
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{name}\"")),
        ],
        bytes,
    )
        .into_response()
}
