//! LLM access.
//!
//! Services depend on the [`TextGenerator`] trait; [`AnthropicClient`] is the
//! production implementation. A request carries a system prompt and one or
//! more messages whose content may mix text and images.

use serde::Serialize;
use thiserror::Error;

pub mod anthropic;
pub mod extract;

pub use anthropic::AnthropicClient;
pub use extract::{decode, extract_as, extract_json, Extracted, Unparsable};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("ANTHROPIC_API_KEY is not set. Add it to the environment or the [llm] config section.")]
    MissingApiKey,

    #[error("failed to reach LLM endpoint {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("LLM http error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("LLM returned invalid JSON: {0}")]
    InvalidBody(String),

    #[error("LLM response contained no text blocks")]
    EmptyResponse,
}

impl LlmError {
    /// True when the failure is a missing credential rather than an upstream fault.
    pub fn is_configuration(&self) -> bool {
        matches!(self, LlmError::MissingApiKey)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerateOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self { max_tokens: 8192, temperature: 0.7 }
    }
}

impl GenerateOptions {
    pub fn new(max_tokens: u32, temperature: f32) -> Self {
        Self { max_tokens, temperature }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentPart {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageSource {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub media_type: String,
    /// Base64-encoded image bytes.
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentPart>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, content: vec![ContentPart::Text { text: text.into() }] }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: vec![ContentPart::Text { text: text.into() }] }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub system: Option<String>,
    pub messages: Vec<Message>,
    pub options: GenerateOptions,
}

/// Single request, single text response.
pub trait TextGenerator: Send + Sync {
    fn complete(&self, request: &Request) -> Result<String, LlmError>;

    fn generate(
        &self,
        system: &str,
        user: &str,
        options: GenerateOptions,
    ) -> Result<String, LlmError> {
        self.generate_with_context(system, vec![Message::user(user)], options)
    }

    /// Multi-turn conversation; `messages` alternate user and assistant turns.
    fn generate_with_context(
        &self,
        system: &str,
        messages: Vec<Message>,
        options: GenerateOptions,
    ) -> Result<String, LlmError> {
        let system = (!system.is_empty()).then(|| system.to_string());
        self.complete(&Request { system, messages, options })
    }

    /// Ask the model to transcribe or describe an image.
    fn describe_image(
        &self,
        image: &[u8],
        media_type: &str,
        instruction: &str,
        options: GenerateOptions,
    ) -> Result<String, LlmError> {
        use base64::Engine as _;

        let data = base64::engine::general_purpose::STANDARD.encode(image);
        let message = Message {
            role: Role::User,
            content: vec![
                ContentPart::Image {
                    source: ImageSource {
                        kind: "base64",
                        media_type: media_type.to_string(),
                        data,
                    },
                },
                ContentPart::Text { text: instruction.to_string() },
            ],
        };
        self.complete(&Request { system: None, messages: vec![message], options })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses in order and records every request.
    #[derive(Default)]
    pub struct ScriptedGenerator {
        responses: Mutex<VecDeque<Result<String, LlmError>>>,
        pub requests: Mutex<Vec<Request>>,
    }

    impl ScriptedGenerator {
        pub fn new<I, S>(responses: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                responses: Mutex::new(responses.into_iter().map(|r| Ok(r.into())).collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            let gen = Self::default();
            gen.responses.lock().expect("lock").push_back(Err(LlmError::MissingApiKey));
            gen
        }

        pub fn last_user_text(&self) -> String {
            let requests = self.requests.lock().expect("lock");
            let Some(request) = requests.last() else {
                return String::new();
            };
            request
                .messages
                .iter()
                .flat_map(|m| m.content.iter())
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::Image { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
    }

    impl TextGenerator for ScriptedGenerator {
        fn complete(&self, request: &Request) -> Result<String, LlmError> {
            self.requests.lock().expect("lock").push(request.clone());
            self.responses.lock().expect("lock").pop_front().unwrap_or(Err(LlmError::EmptyResponse))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedGenerator;
    use super::*;

    #[test]
    fn generate_wraps_single_user_message() {
        let gen = ScriptedGenerator::new(["ok"]);
        let out = gen.generate("sys", "hello", GenerateOptions::new(10, 0.1)).expect("text");
        assert_eq!(out, "ok");

        let requests = gen.requests.lock().expect("lock");
        assert_eq!(requests[0].system.as_deref(), Some("sys"));
        assert_eq!(requests[0].messages, vec![Message::user("hello")]);
        assert_eq!(requests[0].options.max_tokens, 10);
    }

    #[test]
    fn describe_image_sends_base64_payload() {
        let gen = ScriptedGenerator::new(["text in image"]);
        gen.describe_image(b"png", "image/png", "read it", GenerateOptions::default())
            .expect("text");

        let requests = gen.requests.lock().expect("lock");
        let body = serde_json::to_value(&requests[0].messages[0]).expect("json");
        assert_eq!(body["content"][0]["type"], "image");
        assert_eq!(body["content"][0]["source"]["type"], "base64");
        assert_eq!(body["content"][0]["source"]["data"], "cG5n");
        assert_eq!(body["content"][1]["text"], "read it");
        assert!(requests[0].system.is_none());
    }
}
