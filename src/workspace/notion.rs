//! Notion REST client (blocking).

use super::blocks;
use super::{DatabaseRef, ExportPage, Workspace, WorkspaceError};
use crate::domain::config::NotionConfig;
use crate::domain::reports::{ParsedReport, ProjectPlan, TaskRecord};
use reqwest::Method;
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct NotionClient {
    token: String,
    base_url: String,
    api_version: String,
    timeout: Option<Duration>,
}

impl NotionClient {
    pub fn new(config: &NotionConfig) -> Self {
        Self {
            token: config.token.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            timeout: (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs)),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.token.trim().is_empty()
    }

    fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value, WorkspaceError> {
        if !self.is_configured() {
            return Err(WorkspaceError::MissingToken);
        }
        let url = format!("{}/v1/{}", self.base_url, path.trim_start_matches('/'));

        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|source| WorkspaceError::Transport { url: url.clone(), source })?;

        tracing::debug!(%method, %url, "notion request");
        let mut req = client
            .request(method, &url)
            .bearer_auth(&self.token)
            .header("Notion-Version", &self.api_version);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().map_err(|source| WorkspaceError::Transport { url: url.clone(), source })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(WorkspaceError::Http { status: status.as_u16(), body });
        }
        resp.json().map_err(|e| WorkspaceError::InvalidBody(e.to_string()))
    }

    fn post(&self, path: &str, body: &Value) -> Result<Value, WorkspaceError> {
        self.request(Method::POST, path, Some(body))
    }

    fn create_page(&self, body: &Value) -> Result<String, WorkspaceError> {
        id_of(&self.post("pages", body)?)
    }

    /// Every child block of `block_id`, following pagination cursors.
    pub fn block_children(&self, block_id: &str) -> Result<Vec<Value>, WorkspaceError> {
        let mut results = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let path = match &cursor {
                Some(c) => format!("blocks/{block_id}/children?start_cursor={c}"),
                None => format!("blocks/{block_id}/children"),
            };
            let page = self.request(Method::GET, &path, None)?;
            if let Some(items) = page.get("results").and_then(Value::as_array) {
                results.extend(items.iter().cloned());
            }
            let has_more = page.get("has_more").and_then(Value::as_bool).unwrap_or(false);
            cursor = page.get("next_cursor").and_then(Value::as_str).map(str::to_string);
            if !has_more || cursor.is_none() {
                return Ok(results);
            }
        }
    }
}

fn id_of(value: &Value) -> Result<String, WorkspaceError> {
    value
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| WorkspaceError::InvalidBody("response has no id".to_string()))
}

fn page_parent(page_id: &str) -> Value {
    json!({ "type": "page_id", "page_id": page_id })
}

impl Workspace for NotionClient {
    fn find_client_database(&self, client_name: &str) -> Result<Option<DatabaseRef>, WorkspaceError> {
        let found = self.post(
            "search",
            &json!({ "query": client_name, "filter": { "property": "object", "value": "database" } }),
        )?;
        let needle = client_name.to_lowercase();
        let hit = found
            .get("results")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .find(|db| blocks::plain_title(&db["title"]).to_lowercase().contains(&needle));
        Ok(hit.and_then(|db| {
            let id = db.get("id")?.as_str()?.to_string();
            let parent_page_id = db["parent"].get("page_id").and_then(Value::as_str).map(str::to_string);
            Some(DatabaseRef { id, parent_page_id })
        }))
    }

    fn create_client_page(&self, client_name: &str, parent_page_id: &str) -> Result<String, WorkspaceError> {
        self.create_page(&json!({
            "parent": page_parent(parent_page_id),
            "properties": { "title": blocks::rich_text(client_name) },
            "children": blocks::client_hub_blocks(client_name),
        }))
    }

    fn create_client_database(&self, client_name: &str, parent_page_id: &str) -> Result<String, WorkspaceError> {
        let created = self.post(
            "databases",
            &json!({
                "parent": page_parent(parent_page_id),
                "title": blocks::rich_text(&blocks::client_database_title(client_name)),
                "properties": blocks::client_database_schema(),
            }),
        )?;
        id_of(&created)
    }

    fn create_meeting_page(&self, parent_page_id: &str, report: &ParsedReport) -> Result<String, WorkspaceError> {
        self.create_page(&json!({
            "parent": page_parent(parent_page_id),
            "properties": { "title": blocks::rich_text(&blocks::meeting_page_title(report)) },
            "children": blocks::meeting_blocks(report),
        }))
    }

    fn create_task(&self, database_id: &str, task: &TaskRecord) -> Result<String, WorkspaceError> {
        self.create_page(&json!({
            "parent": { "database_id": database_id },
            "properties": blocks::task_properties(task),
        }))
    }

    fn create_project_page(&self, parent_page_id: &str, plan: &ProjectPlan) -> Result<String, WorkspaceError> {
        let title = if plan.title.is_empty() { "New Project" } else { plan.title.as_str() };
        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        self.create_page(&json!({
            "parent": page_parent(parent_page_id),
            "properties": { "title": blocks::rich_text(title) },
            "children": blocks::project_blocks(plan, &today),
        }))
    }

    fn create_export_page(&self, database_id: &str, page: &ExportPage) -> Result<String, WorkspaceError> {
        let imported = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string();
        let id = self.create_page(&json!({
            "parent": { "database_id": database_id },
            "properties": blocks::export_properties(page, &imported),
            "children": blocks::export_blocks(page),
        }))?;
        tracing::info!(title = %page.title, %id, "created export page");
        Ok(id)
    }

    fn unprocessed_pages(&self, database_id: &str) -> Result<Vec<String>, WorkspaceError> {
        let found = self.post(
            &format!("databases/{database_id}/query"),
            &json!({
                "filter": { "property": "Processed", "checkbox": { "equals": false } },
                "sorts": [{ "property": "Created", "direction": "ascending" }],
            }),
        )?;
        Ok(found
            .get("results")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|p| p.get("id").and_then(Value::as_str).map(str::to_string))
            .collect())
    }

    fn page_text(&self, page_id: &str) -> Result<String, WorkspaceError> {
        Ok(blocks::blocks_to_text(&self.block_children(page_id)?))
    }

    fn mark_processed(&self, page_id: &str) -> Result<(), WorkspaceError> {
        self.request(
            Method::PATCH,
            &format!("pages/{page_id}"),
            Some(&json!({ "properties": { "Processed": { "checkbox": true } } })),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Answer `bodies.len()` requests in order and return the raw requests.
    fn scripted_server(bodies: Vec<&'static str>) -> (String, thread::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let handle = thread::spawn(move || {
            let mut seen = Vec::new();
            for body in bodies {
                let (stream, _) = listener.accept().expect("accept");
                let mut reader = BufReader::new(stream.try_clone().expect("clone"));
                let mut head = String::new();
                let mut length = 0usize;
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).expect("line");
                    if let Some(v) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                        length = v.trim().parse().expect("length");
                    }
                    head.push_str(&line);
                    if line == "\r\n" || line.is_empty() {
                        break;
                    }
                }
                let mut buf = vec![0u8; length];
                reader.read_exact(&mut buf).expect("body");
                let mut stream = stream;
                write!(
                    stream,
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                )
                .expect("write");
                seen.push(head + &String::from_utf8_lossy(&buf));
            }
            seen
        });
        (format!("http://{addr}"), handle)
    }

    fn client(base_url: String) -> NotionClient {
        NotionClient::new(&NotionConfig { token: "secret".into(), base_url, ..NotionConfig::default() })
    }

    #[test]
    fn missing_token_is_reported() {
        let client = NotionClient::new(&NotionConfig::default());
        assert!(matches!(client.mark_processed("p"), Err(WorkspaceError::MissingToken)));
    }

    #[test]
    fn find_database_matches_title_case_insensitively() {
        let (url, handle) = scripted_server(vec![
            r#"{"results":[
                {"id":"db-other","title":[{"plain_text":"Beta - Tasks"}],"parent":{"type":"workspace"}},
                {"id":"db-acme","title":[{"plain_text":"ACME Corp - Tasks & Meetings"}],"parent":{"type":"page_id","page_id":"page-acme"}}
            ]}"#,
        ]);
        let found = client(url).find_client_database("Acme Corp").expect("search");
        assert_eq!(
            found,
            Some(DatabaseRef { id: "db-acme".into(), parent_page_id: Some("page-acme".into()) })
        );
        let raw = handle.join().expect("server");
        assert!(raw[0].starts_with("POST /v1/search"));
        assert!(raw[0].to_ascii_lowercase().contains("authorization: bearer secret"));
        assert!(raw[0].contains("notion-version: 2022-06-28") || raw[0].contains("Notion-Version: 2022-06-28"));
    }

    #[test]
    fn page_text_follows_cursor() {
        let (url, handle) = scripted_server(vec![
            r#"{"results":[{"type":"paragraph","paragraph":{"rich_text":[{"plain_text":"first"}]}}],"has_more":true,"next_cursor":"c2"}"#,
            r#"{"results":[{"type":"paragraph","paragraph":{"rich_text":[{"plain_text":"second"}]}}],"has_more":false,"next_cursor":null}"#,
        ]);
        let text = client(url).page_text("page-1").expect("text");
        assert_eq!(text, "first\nsecond");
        let raw = handle.join().expect("server");
        assert!(raw[1].starts_with("GET /v1/blocks/page-1/children?start_cursor=c2"));
    }
}
