//! Client-report agent endpoints.
//!
//! The pipeline endpoints that write to the workspace require the webhook
//! secret when one is configured; previews and the client registry do not.

use super::error::{required, ApiError, JsonBody};
use super::{blocking, AppState, SharedState};
use crate::agent::{AgentError, IdeaPlanner, PipelineStatus, ReportProcessor};
use crate::store::clients::{CLIENT_RECENT_LOGS, DEFAULT_LOG_LIMIT, MAX_LOG_LIMIT};
use crate::store::{AgentLog, ClientInput, ClientRecord};
use crate::utils::hashing::secrets_match;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const SECRET_HEADER: &str = "X-Webhook-Secret";

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/fireflies/process", post(process_report))
        .route("/fireflies/scan-inbox", post(scan_inbox))
        .route("/fireflies/parse-only", post(parse_report))
        .route("/obsidian/process", post(process_ideas))
        .route("/obsidian/parse-only", post(parse_ideas))
        .route("/clients", get(list_clients).post(create_client))
        .route("/clients/:id", get(get_client).put(update_client).delete(delete_client))
        .route("/logs", get(list_logs))
        .route("/status", get(status))
}

fn verify_secret(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let expected = state.config.server.webhook_secret.as_str();
    if expected.is_empty() {
        return Ok(());
    }
    let provided = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok()).unwrap_or_default();
    if secrets_match(expected, provided) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

/// 200 unless the pipeline did not get going at all. `Error` means a
/// required setting is missing, which is a server misconfiguration (500).
fn pipeline_response(status: PipelineStatus, payload: impl Serialize) -> Response {
    let code = match status {
        PipelineStatus::Failed | PipelineStatus::Error => StatusCode::INTERNAL_SERVER_ERROR,
        PipelineStatus::Completed | PipelineStatus::CompletedWithErrors => StatusCode::OK,
    };
    (code, Json(payload)).into_response()
}

// --- meeting reports ---

#[derive(Debug, Deserialize)]
struct ReportBody {
    #[serde(default)]
    report: String,
}

async fn process_report(
    State(state): State<SharedState>,
    headers: HeaderMap,
    JsonBody(body): JsonBody<ReportBody>,
) -> Result<Response, ApiError> {
    verify_secret(&state, &headers)?;
    required(&body.report, "report")?;
    let outcome = blocking(&state, move |s| Ok(s.agent().process_report(&body.report))).await?;
    Ok(pipeline_response(outcome.status, outcome))
}

async fn scan_inbox(State(state): State<SharedState>, headers: HeaderMap) -> Result<Response, ApiError> {
    verify_secret(&state, &headers)?;
    let scan = blocking(&state, |s| Ok(s.agent().scan_inbox())).await?;
    Ok(pipeline_response(scan.status, scan))
}

/// Parse, extract tasks and identify the client without touching the
/// workspace. A report the model cannot structure comes back as the
/// parse error with the raw answer.
async fn parse_report(State(state): State<SharedState>, JsonBody(body): JsonBody<ReportBody>) -> Result<Json<Value>, ApiError> {
    required(&body.report, "report")?;
    blocking(&state, move |s| {
        let processor = ReportProcessor::new(s.llm.as_ref());
        let (parsed, attendees) = match processor.parse(&body.report) {
            Ok(parsed) => {
                let attendees = parsed.attendees.clone();
                (serde_json::to_value(parsed).unwrap_or(Value::Null), attendees)
            }
            Err(AgentError::Unparsable(e)) => (json!({ "error": e.to_string(), "raw": e.raw }), Vec::new()),
            Err(AgentError::Llm(e)) => return Err(e.into()),
        };
        let tasks = processor.extract_tasks(&body.report, &attendees)?;
        let known = s.store().client_names()?;
        let client = processor.identify_client(&body.report, &known)?;
        Ok(Json(json!({
            "parsed_report": parsed,
            "extracted_tasks": tasks,
            "client_identification": client,
        })))
    })
    .await
}

// --- notes exports ---

#[derive(Debug, Deserialize)]
struct MarkdownBody {
    #[serde(default)]
    markdown: String,
}

async fn process_ideas(
    State(state): State<SharedState>,
    headers: HeaderMap,
    JsonBody(body): JsonBody<MarkdownBody>,
) -> Result<Response, ApiError> {
    verify_secret(&state, &headers)?;
    required(&body.markdown, "markdown")?;
    let outcome = blocking(&state, move |s| Ok(s.agent().process_ideas(&body.markdown))).await?;
    Ok(pipeline_response(outcome.status, outcome))
}

async fn parse_ideas(State(state): State<SharedState>, JsonBody(body): JsonBody<MarkdownBody>) -> Result<Json<Value>, ApiError> {
    required(&body.markdown, "markdown")?;
    blocking(&state, move |s| {
        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let plans = IdeaPlanner::new(s.llm.as_ref()).plan_all(&body.markdown, &today)?;
        Ok(Json(json!({ "count": plans.len(), "projects": plans })))
    })
    .await
}

// --- clients ---

async fn list_clients(State(state): State<SharedState>) -> Result<Json<Vec<ClientRecord>>, ApiError> {
    blocking(&state, |s| Ok(s.store().list_clients()?)).await.map(Json)
}

async fn create_client(
    State(state): State<SharedState>,
    JsonBody(input): JsonBody<ClientInput>,
) -> Result<(StatusCode, Json<ClientRecord>), ApiError> {
    required(input.name.as_deref().unwrap_or_default(), "name")?;
    let client = blocking(&state, move |s| Ok(s.store().create_client(&input)?)).await?;
    tracing::info!(client = %client.name, "client registered");
    Ok((StatusCode::CREATED, Json(client)))
}

#[derive(Debug, Serialize)]
struct ClientWithLogs {
    #[serde(flatten)]
    client: ClientRecord,
    recent_logs: Vec<AgentLog>,
}

async fn get_client(State(state): State<SharedState>, Path(id): Path<i64>) -> Result<Json<ClientWithLogs>, ApiError> {
    blocking(&state, move |s| {
        let store = s.store();
        let client = store.get_client(id)?;
        let recent_logs = store.client_logs(id, CLIENT_RECENT_LOGS)?;
        Ok(Json(ClientWithLogs { client, recent_logs }))
    })
    .await
}

async fn update_client(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    JsonBody(input): JsonBody<ClientInput>,
) -> Result<Json<ClientRecord>, ApiError> {
    blocking(&state, move |s| Ok(s.store().update_client(id, &input)?)).await.map(Json)
}

async fn delete_client(State(state): State<SharedState>, Path(id): Path<i64>) -> Result<Json<Value>, ApiError> {
    let client = blocking(&state, move |s| Ok(s.store().delete_client(id)?)).await?;
    Ok(Json(json!({ "message": format!("Client '{}' deleted", client.name) })))
}

// --- logs and status ---

#[derive(Debug, Deserialize)]
struct LogQuery {
    limit: Option<usize>,
    event_type: Option<String>,
}

async fn list_logs(State(state): State<SharedState>, Query(query): Query<LogQuery>) -> Result<Json<Vec<AgentLog>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT).min(MAX_LOG_LIMIT);
    let event_type = query.event_type.filter(|t| !t.is_empty());
    blocking(&state, move |s| Ok(s.store().list_logs(limit, event_type.as_deref())?)).await.map(Json)
}

async fn status(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    blocking(&state, |s| {
        let notion = &s.config.notion;
        let notion_api = !notion.token.is_empty();
        let anthropic_api = !s.config.llm.api_key.is_empty();
        let stats = s.store().agent_stats()?;
        Ok(Json(json!({
            "configured": {
                "notion_api": notion_api,
                "anthropic_api": anthropic_api,
                "fireflies_inbox": !notion.fireflies_inbox_db_id.is_empty(),
                "projects_page": !notion.projects_page_id.is_empty(),
            },
            "ready": notion_api && anthropic_api,
            "stats": stats,
        })))
    })
    .await
}
