//! Client registry and the agent event log.

use super::models::{AgentLog, AgentStats, ClientInput, ClientRecord};
use super::{found, now, Store, StoreError};
use rusqlite::{params, OptionalExtension, Row};
use serde_json::Value;

const CLIENT_COLUMNS: &str =
    "id, name, notion_page_id, notion_database_id, notes, created_at, updated_at";

pub const DEFAULT_LOG_LIMIT: usize = 50;
pub const MAX_LOG_LIMIT: usize = 200;
pub const CLIENT_RECENT_LOGS: usize = 20;

fn client_row(row: &Row<'_>) -> rusqlite::Result<ClientRecord> {
    Ok(ClientRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        notion_page_id: row.get(2)?,
        notion_database_id: row.get(3)?,
        notes: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn log_row(row: &Row<'_>) -> rusqlite::Result<AgentLog> {
    Ok(AgentLog {
        id: row.get(0)?,
        event_type: row.get(1)?,
        client_id: row.get(2)?,
        data: row.get(3)?,
        created_at: row.get(4)?,
    })
}

impl Store {
    /// Clients ordered by name.
    pub fn list_clients(&self) -> Result<Vec<ClientRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {CLIENT_COLUMNS} FROM client_records ORDER BY name COLLATE NOCASE"))?;
        let rows = stmt.query_map([], client_row)?.collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn client_names(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.list_clients()?.into_iter().map(|c| c.name).collect())
    }

    pub fn get_client(&self, id: i64) -> Result<ClientRecord, StoreError> {
        let row = self
            .conn
            .query_row(&format!("SELECT {CLIENT_COLUMNS} FROM client_records WHERE id = ?1"), [id], client_row)
            .optional()?;
        found(row, "client", id)
    }

    /// Case-insensitive lookup by name.
    pub fn find_client_by_name(&self, name: &str) -> Result<Option<ClientRecord>, StoreError> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {CLIENT_COLUMNS} FROM client_records WHERE name = ?1 COLLATE NOCASE"),
                [name.trim()],
                client_row,
            )
            .optional()?)
    }

    /// Register a client; a name already present (in any case) is a `Conflict`.
    pub fn create_client(&self, input: &ClientInput) -> Result<ClientRecord, StoreError> {
        let name = input.name.as_deref().map(str::trim).unwrap_or_default();
        if name.is_empty() {
            return Err(StoreError::Conflict("client name must not be empty".to_string()));
        }
        if let Some(existing) = self.find_client_by_name(name)? {
            return Err(StoreError::Conflict(format!("Client '{}' already exists", existing.name)));
        }
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        let ts = now();
        self.conn.execute(
            "INSERT INTO client_records (name, notion_page_id, notion_database_id, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![name, text(&input.notion_page_id), text(&input.notion_database_id), text(&input.notes), ts],
        )?;
        self.get_client(self.conn.last_insert_rowid())
    }

    pub fn update_client(&self, id: i64, input: &ClientInput) -> Result<ClientRecord, StoreError> {
        let current = self.get_client(id)?;
        let pick = |new: &Option<String>, old: &str| new.clone().unwrap_or_else(|| old.to_string());
        self.conn.execute(
            "UPDATE client_records SET name = ?1, notion_page_id = ?2, notion_database_id = ?3,
                notes = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                pick(&input.name, &current.name),
                pick(&input.notion_page_id, &current.notion_page_id),
                pick(&input.notion_database_id, &current.notion_database_id),
                pick(&input.notes, &current.notes),
                now(),
                id,
            ],
        )?;
        self.get_client(id)
    }

    /// Delete a client and return the removed record.
    pub fn delete_client(&self, id: i64) -> Result<ClientRecord, StoreError> {
        let client = self.get_client(id)?;
        self.conn.execute("DELETE FROM client_records WHERE id = ?1", [id])?;
        Ok(client)
    }

    pub fn log_event(&self, event_type: &str, client_id: Option<i64>, data: &Value) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO agent_logs (event_type, client_id, data, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![event_type, client_id, data.to_string(), now()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Newest logs first, optionally filtered by event type. The limit is capped at 200.
    pub fn list_logs(&self, limit: usize, event_type: Option<&str>) -> Result<Vec<AgentLog>, StoreError> {
        let limit = limit.min(MAX_LOG_LIMIT) as i64;
        let mut stmt = self.conn.prepare(
            "SELECT id, event_type, client_id, data, created_at FROM agent_logs
             WHERE (?1 IS NULL OR event_type = ?1)
             ORDER BY created_at DESC, id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![event_type, limit], log_row)?.collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn client_logs(&self, client_id: i64, limit: usize) -> Result<Vec<AgentLog>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, event_type, client_id, data, created_at FROM agent_logs
             WHERE client_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![client_id, limit as i64], log_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn agent_stats(&self) -> Result<AgentStats, StoreError> {
        let known_clients = self.conn.query_row("SELECT COUNT(*) FROM client_records", [], |r| r.get(0))?;
        let total_events_logged = self.conn.query_row("SELECT COUNT(*) FROM agent_logs", [], |r| r.get(0))?;
        let last_activity = self
            .conn
            .query_row("SELECT MAX(created_at) FROM agent_logs", [], |r| r.get::<_, Option<String>>(0))?;
        Ok(AgentStats { known_clients, total_events_logged, last_activity })
    }
}
