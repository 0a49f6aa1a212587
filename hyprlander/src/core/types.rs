//! Shared deterministic types for the conversation core.
//!
//! These types describe what flows between the driver, the classifier and the
//! model session. They carry no I/O and serialize into the transcript export.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One content part of a message, in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Part {
    /// Free text.
    Text { text: String },
    /// Structured tool-call request issued by the model.
    FunctionCall(ToolCallRequest),
    /// Structured tool result sent back to the model.
    FunctionResponse(ToolResult),
    /// A part the client does not interpret (inline data, thoughts, ...).
    Unsupported,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }
}

/// One candidate completion returned by the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub parts: Vec<Part>,
}

/// A full model reply: zero or more candidates, each with zero or more parts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelReply {
    pub candidates: Vec<Candidate>,
}

/// Model-issued instruction naming a tool and its raw arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub name: String,
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl ToolCallRequest {
    pub fn new(name: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Compact single-line rendering of the arguments for prompts and logs.
    pub fn args_display(&self) -> String {
        serde_json::to_string(&self.args).unwrap_or_else(|_| "<unserializable args>".to_string())
    }
}

/// Outcome of one tool execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub name: String,
    pub output: String,
    pub success: bool,
}

impl ToolResult {
    pub fn success(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            output: output.into(),
            success: true,
        }
    }

    pub fn failure(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            output: error.into(),
            success: false,
        }
    }
}

/// Author of a session message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions given to the model before the first request.
    System,
    /// Outbound message (user text or tool result).
    User,
    /// Inbound model content.
    Model,
    /// Local note kept for debugging; never sent to the model.
    Audit,
}

/// Why a reply was classified as unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    NoCandidates,
    NoParts,
    UnrecognizedPart,
}

impl EmptyReason {
    pub fn describe(self) -> &'static str {
        match self {
            EmptyReason::NoCandidates => "No response from the model",
            EmptyReason::NoParts => "No content parts in response",
            EmptyReason::UnrecognizedPart => "Unexpected response format",
        }
    }
}

/// Why a turn is retried without acting on a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryReason {
    /// The model call itself failed; the same directive is resent.
    ServiceError(String),
    /// The reply carried nothing actionable; the model is nudged to proceed.
    EmptyReply(EmptyReason),
}

/// Per-iteration decision produced by the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Queue a text prompt. An empty string queues the proceed nudge.
    ContinueWithText(String),
    /// Queue a structured tool result.
    ContinueWithToolResult(ToolResult),
    /// The model asked for clarification from the user.
    AwaitUserInput,
    /// The model signalled completion.
    TerminateSuccess,
    /// The user declined a tool call.
    TerminateCancelled { tool: String },
    /// Nothing actionable happened this turn.
    Retry(RetryReason),
}

/// Terminal reason for a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Termination {
    /// The completion marker was observed.
    Completed,
    /// The user declined the named tool call.
    Cancelled { tool: String },
    /// The turn limit was reached without any other terminal condition.
    TurnsExhausted,
}
