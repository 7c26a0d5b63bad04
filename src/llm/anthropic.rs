//! Anthropic Messages API client (blocking).

use super::{LlmError, Request, TextGenerator};
use crate::domain::config::LlmConfig;
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    api_key: String,
    model: String,
    base_url: String,
    api_version: String,
    timeout: Option<Duration>,
}

impl AnthropicClient {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            timeout: (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs)),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    fn body(&self, request: &Request) -> Value {
        let mut body = json!({
            "model": self.model,
            "max_tokens": request.options.max_tokens,
            "temperature": request.options.temperature,
            "messages": request.messages,
        });
        if let Some(system) = &request.system {
            body["system"] = json!(system);
        }
        body
    }
}

impl TextGenerator for AnthropicClient {
    fn complete(&self, request: &Request) -> Result<String, LlmError> {
        if !self.is_configured() {
            return Err(LlmError::MissingApiKey);
        }

        let url = format!("{}/v1/messages", self.base_url);

        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client =
            builder.build().map_err(|source| LlmError::Transport { url: url.clone(), source })?;

        tracing::debug!(model = %self.model, max_tokens = request.options.max_tokens, "anthropic request");

        let resp = client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&self.body(request))
            .send()
            .map_err(|source| LlmError::Transport { url: url.clone(), source })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(LlmError::Http { status: status.as_u16(), body });
        }

        let value: Value = resp.json().map_err(|e| LlmError::InvalidBody(e.to_string()))?;
        extract_output_text(&value).ok_or(LlmError::EmptyResponse)
    }
}

/// Concatenate the `text` blocks of a Messages API response.
fn extract_output_text(value: &Value) -> Option<String> {
    let blocks = value.get("content")?.as_array()?;
    let text: Vec<&str> = blocks
        .iter()
        .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|b| b.get("text").and_then(Value::as_str))
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text.join(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{GenerateOptions, Message};
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve one HTTP response and hand back the raw request it answered.
    fn one_shot_server(status: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream.try_clone().expect("clone"));
            let mut head = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).expect("line");
                if let Some(v) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = v.trim().parse().expect("length");
                }
                head.push_str(&line);
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }
            let mut buf = vec![0u8; content_length];
            reader.read_exact(&mut buf).expect("body");
            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            )
            .expect("write");
            head + &String::from_utf8_lossy(&buf)
        });
        (format!("http://{addr}"), handle)
    }

    fn client(base_url: String, key: &str) -> AnthropicClient {
        AnthropicClient::new(&LlmConfig {
            api_key: key.into(),
            base_url,
            model: "claude-test".into(),
            ..LlmConfig::default()
        })
    }

    #[test]
    fn missing_key_fails_before_any_request() {
        let err = client("http://127.0.0.1:9".into(), "  ")
            .generate("s", "u", GenerateOptions::default())
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn posts_messages_and_joins_text_blocks() {
        let (url, handle) = one_shot_server(
            "200 OK",
            r#"{"content":[{"type":"text","text":"Hello"},{"type":"tool_use"},{"type":"text","text":" world"}]}"#,
        );
        let out = client(url, "sk-test")
            .generate_with_context(
                "be brief",
                vec![Message::user("hi"), Message::assistant("yo"), Message::user("again")],
                GenerateOptions::new(64, 0.2),
            )
            .expect("text");
        assert_eq!(out, "Hello world");

        let raw = handle.join().expect("server");
        assert!(raw.starts_with("POST /v1/messages"));
        assert!(raw.to_ascii_lowercase().contains("x-api-key: sk-test"));
        assert!(raw.contains("anthropic-version"));
        assert!(raw.contains(r#""system":"be brief""#));
        assert!(raw.contains(r#""model":"claude-test""#));
        assert!(raw.contains(r#""role":"assistant""#));
    }

    #[test]
    fn non_success_status_is_reported_with_body() {
        let (url, handle) = one_shot_server("529 Overloaded", r#"{"error":"overloaded"}"#);
        let err = client(url, "sk-test").generate("", "u", GenerateOptions::default()).unwrap_err();
        handle.join().expect("server");
        match err {
            LlmError::Http { status, body } => {
                assert_eq!(status, 529);
                assert!(body.contains("overloaded"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn response_without_text_is_empty() {
        assert!(extract_output_text(&json!({"content": []})).is_none());
        assert!(extract_output_text(&json!({"id": "x"})).is_none());
    }
}
