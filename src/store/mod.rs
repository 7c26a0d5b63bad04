//! Relational persistence for manuscripts, client records and agent logs.

use chrono::{SecondsFormat, Utc};
use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

pub mod clients;
pub mod models;
pub mod projects;
pub mod schema;
pub mod writing;

pub use models::*;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    #[error("{0}")]
    Conflict(String),

    #[error("database schema error: {0}")]
    Schema(String),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self { conn: schema::open_or_create(path)? })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self { conn: schema::open_in_memory()? })
    }
}

pub(crate) fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Map a missing row to `NotFound` for the given record kind.
pub(crate) fn found<T>(row: Option<T>, kind: &'static str, id: i64) -> Result<T, StoreError> {
    row.ok_or(StoreError::NotFound { kind, id })
}
