//! Gemini `generateContent` chat over HTTPS.
//!
//! The client keeps the whole dialogue locally and resends it on every call,
//! which is how the REST API models a chat. The system instructions are the
//! first history entry; the tool declarations ride along with every request.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, instrument, warn};

use crate::core::tools::ToolDeclaration;
use crate::core::types::{Candidate, ModelReply, Part, ToolCallRequest};
use crate::io::model::{ModelSession, ServiceError};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Connection settings for one chat.
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    pub timeout: Option<Duration>,
}

/// A Gemini chat session implementing [`ModelSession`].
pub struct GeminiChat {
    client: Client,
    url: String,
    api_key: String,
    tools: Vec<WireTool>,
    history: Vec<WireContent>,
}

impl GeminiChat {
    /// Open a chat seeded with `instructions` and declaring `tools`.
    pub fn new(
        settings: GeminiSettings,
        instructions: &str,
        tools: &[ToolDeclaration],
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .context("build HTTP client")?;
        let url = format!(
            "{}/models/{}:generateContent",
            settings.endpoint.trim_end_matches('/'),
            settings.model
        );
        let declarations = tools
            .iter()
            .map(|tool| WireFunctionDeclaration {
                name: tool.name.to_string(),
                description: tool.description.to_string(),
                parameters_json_schema: tool.parameters.clone(),
            })
            .collect();
        Ok(Self {
            client,
            url,
            api_key: settings.api_key,
            tools: vec![WireTool {
                function_declarations: declarations,
            }],
            history: vec![WireContent::user(vec![WirePart::text(instructions)])],
        })
    }

    /// Number of history entries kept for the next request.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    fn request_body<'a>(&'a self, message: &'a WireContent) -> GenerateRequest<'a> {
        let mut contents: Vec<&WireContent> = self.history.iter().collect();
        contents.push(message);
        GenerateRequest {
            contents,
            tools: &self.tools,
        }
    }

    /// Record an exchange once the service has answered.
    fn record(&mut self, message: WireContent, response: &GenerateResponse) {
        self.history.push(message);
        let reply = response
            .candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .filter(|content| !content.parts.is_empty());
        if let Some(content) = reply {
            self.history.push(WireContent {
                role: Some("model".to_string()),
                parts: content.parts.clone(),
            });
        }
    }
}

impl ModelSession for GeminiChat {
    #[instrument(skip_all, fields(parts = parts.len(), history = self.history.len()))]
    fn send(&mut self, parts: &[Part]) -> Result<ModelReply, ServiceError> {
        let message = WireContent::user(parts.iter().filter_map(WirePart::from_part).collect());
        let body = self.request_body(&message);
        debug!(url = %self.url, "sending generateContent request");

        let response = self
            .client
            .post(&self.url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .map_err(|err| ServiceError::Transport(describe_reqwest_error(&err)))?;
        let status = response.status();
        let text = response
            .text()
            .map_err(|err| ServiceError::Transport(describe_reqwest_error(&err)))?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "model service returned an error status");
            return Err(ServiceError::Status {
                status: status.as_u16(),
                detail: error_detail(&text),
            });
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&text).map_err(|err| ServiceError::Decode(err.to_string()))?;
        self.record(message, &parsed);
        let reply = parsed.to_reply();
        debug!(candidates = reply.candidates.len(), "received reply");
        Ok(reply)
    }
}

fn describe_reqwest_error(err: &reqwest::Error) -> String {
    match std::error::Error::source(err) {
        Some(source) => format!("{err}: {source}"),
        None => err.to_string(),
    }
}

/// Pull `error.message` out of an API error body, falling back to the raw text.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<&'a WireContent>,
    tools: &'a [WireTool],
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireTool {
    function_declarations: Vec<WireFunctionDeclaration>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireFunctionDeclaration {
    name: String,
    description: String,
    parameters_json_schema: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

impl WireContent {
    fn user(parts: Vec<WirePart>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts,
        }
    }
}

/// One part on the wire. Model parts are stored verbatim in history so fields
/// such as thought signatures are echoed back unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<WireFunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<WireFunctionResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought_signature: Option<String>,
}

impl WirePart {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::default()
        }
    }

    fn from_part(part: &Part) -> Option<Self> {
        match part {
            Part::Text { text } => Some(Self::text(text)),
            Part::FunctionCall(call) => Some(Self {
                function_call: Some(WireFunctionCall {
                    name: call.name.clone(),
                    args: Some(call.args.clone()),
                }),
                ..Self::default()
            }),
            Part::FunctionResponse(result) => Some(Self {
                function_response: Some(WireFunctionResponse {
                    name: result.name.clone(),
                    response: json!({ "result": result.output }),
                }),
                ..Self::default()
            }),
            Part::Unsupported => None,
        }
    }

    fn to_part(&self) -> Part {
        if self.thought == Some(true) {
            return Part::Unsupported;
        }
        if let Some(call) = &self.function_call {
            return Part::FunctionCall(ToolCallRequest::new(
                call.name.clone(),
                call.args.clone().unwrap_or_default(),
            ));
        }
        match &self.text {
            Some(text) => Part::text(text.clone()),
            None => Part::Unsupported,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    args: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCandidate {
    #[serde(default)]
    content: Option<WireContent>,
}

impl GenerateResponse {
    fn to_reply(&self) -> ModelReply {
        ModelReply {
            candidates: self
                .candidates
                .iter()
                .map(|candidate| Candidate {
                    parts: candidate
                        .content
                        .as_ref()
                        .map(|content| content.parts.iter().map(WirePart::to_part).collect())
                        .unwrap_or_default(),
                })
                .collect(),
        }
    }
}
