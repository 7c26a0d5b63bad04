//! HTTP API.
//!
//! Manuscript resources, AI helpers and exports live under `/api`; the
//! client-report agent lives under `/agent/api`. Handlers are thin: every
//! call that touches SQLite or a remote API runs on the blocking pool.

use crate::agent::Agent;
use crate::domain::Config;
use crate::llm::{AnthropicClient, TextGenerator};
use crate::store::Store;
use crate::workspace::{NotionClient, Workspace};
use anyhow::{Context, Result};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::trace::TraceLayer;

pub mod agent;
pub mod ai;
pub mod error;
pub mod resources;

pub use error::{ApiError, JsonBody};

pub struct AppState {
    store: Mutex<Store>,
    pub llm: Arc<dyn TextGenerator>,
    pub workspace: Arc<dyn Workspace>,
    pub config: Config,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(store: Store, llm: Arc<dyn TextGenerator>, workspace: Arc<dyn Workspace>, config: Config) -> Self {
        Self { store: Mutex::new(store), llm, workspace, config }
    }

    /// Open the database and build the remote clients named by `config`.
    pub fn from_config(config: Config) -> Result<Self> {
        if let Some(parent) = config.database.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
        }
        let store = Store::open(&config.database.path)
            .with_context(|| format!("Failed to open database {}", config.database.path.display()))?;
        let llm = Arc::new(AnthropicClient::new(&config.llm));
        let workspace = Arc::new(NotionClient::new(&config.notion));
        Ok(Self::new(store, llm, workspace, config))
    }

    /// The store; a poisoned lock is recovered since every write is a
    /// single statement.
    pub fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn agent(&self) -> Agent<'_> {
        Agent::new(self.llm.as_ref(), self.workspace.as_ref(), &self.store, &self.config.notion)
    }
}

/// Run `work` on the blocking pool with the shared state.
pub(crate) async fn blocking<T, F>(state: &SharedState, work: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppState) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || work(&state))
        .await
        .map_err(|e| ApiError::Internal(format!("worker task failed: {e}")))?
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", resources::routes().merge(ai::routes()))
        .nest("/agent/api", agent::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: SharedState, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    tracing::info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await
        .context("HTTP server failed")
}

/// Build the state from `config` and serve until Ctrl+C.
pub fn run(config: Config) -> Result<()> {
    let bind = config.server.bind.clone();
    let state = Arc::new(AppState::from_config(config)?);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(serve(state, &bind))
}
