//! Integration tests for CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread;
use tempfile::TempDir;

/// The binary run from `dir` with no inherited vault or workspace settings.
fn scribe(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("scribe"));
    cmd.current_dir(dir.path())
        .env_remove("OBSIDIAN_VAULT_PATH")
        .env_remove("NOTION_DATABASE_ID")
        .env_remove("NOTION_TOKEN")
        .env_remove("ANTHROPIC_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_version() {
    let dir = TempDir::new().unwrap();
    scribe(&dir).arg("--version").assert().success().stdout(predicate::str::contains("scribe"));
}

#[test]
fn test_cli_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    scribe(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Manuscript assistant"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("ingest-file"))
        .stdout(predicate::str::contains("run-all"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_completions_bash() {
    let dir = TempDir::new().unwrap();
    scribe(&dir)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("scribe"));
}

#[test]
fn test_ingest_file_missing_path() {
    let dir = TempDir::new().unwrap();
    let vault = dir.path().join("vault");
    fs::create_dir(&vault).unwrap();
    scribe(&dir)
        .arg("--vault")
        .arg(&vault)
        .args(["ingest-file", "does-not-exist.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("file not found"));
}

#[test]
fn test_vault_commands_require_a_vault() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("note.txt"), "some text").unwrap();
    scribe(&dir)
        .args(["ingest-file", "note.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("OBSIDIAN_VAULT_PATH is not set"));
}

#[test]
fn test_export_without_database_writes_empty_report() {
    let dir = TempDir::new().unwrap();
    let vault = dir.path().join("vault");
    fs::create_dir(&vault).unwrap();
    fs::write(vault.join("Idea.md"), "# Idea\n\nA tool for tracking tide tables.\n").unwrap();

    scribe(&dir)
        .arg("--vault")
        .arg(&vault)
        .arg("export")
        .assert()
        .success()
        .stdout(predicate::str::contains("Export report written"));

    let reports: Vec<_> = fs::read_dir(vault.join("AgentReports")).unwrap().collect();
    assert_eq!(reports.len(), 1);
}

#[test]
fn test_invalid_config_file_is_reported() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("broken.toml"), "[server\nbind = 1").unwrap();
    scribe(&dir)
        .args(["--config", "broken.toml", "analyze"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

/// Answer every Messages API request with `text`; returns the base URL.
fn fake_messages_endpoint(text: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let body = serde_json::json!({ "content": [{ "type": "text", "text": text }] }).to_string();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { continue };
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
                    break;
                }
                if let Some(v) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = v.trim().parse().unwrap_or(0);
                }
            }
            let mut request = vec![0u8; content_length];
            let _ = reader.read_exact(&mut request);
            let mut stream = stream;
            let _ = write!(
                stream,
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
        }
    });
    format!("http://{addr}")
}

#[test]
fn test_ingest_file_writes_analyzed_note() {
    let analysis = r##"{"title": "Tide Tables", "markdown": "# Tide Tables\n\nTrack local tides.",
        "tags": ["ocean"], "suggested_links": [], "note_type": "general",
        "summary": "A tide tracking idea.", "key_concepts": ["tides"], "confidence": 0.9}"##;
    let base_url = fake_messages_endpoint(analysis);

    let dir = TempDir::new().unwrap();
    let vault = dir.path().join("vault");
    fs::create_dir(&vault).unwrap();
    fs::write(dir.path().join("tides.txt"), "track the tides near the harbour").unwrap();

    scribe(&dir)
        .env("ANTHROPIC_API_KEY", "test-key")
        .env("SCRIBE_LLM__BASE_URL", &base_url)
        .arg("--vault")
        .arg(&vault)
        .args(["ingest-file", "tides.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Note written"));

    let note = fs::read_to_string(vault.join("Inbox").join("Tide Tables.md")).unwrap();
    assert!(note.starts_with("---\n"), "{note}");
    assert!(note.contains("status: inbox"), "{note}");
    assert!(note.contains("Track local tides."), "{note}");
}
