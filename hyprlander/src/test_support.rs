//! Scripted fakes for driving conversations and setup flows in tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use anyhow::{Result, anyhow};
use serde_json::{Map, Value};

use crate::core::tools::ToolInvocation;
use crate::core::types::{Candidate, ModelReply, Part, ToolCallRequest};
use crate::io::model::{ModelSession, ServiceError};
use crate::io::tools::{ToolError, ToolExecutor};
use crate::io::ui::Ui;

/// Reply with one candidate holding one text part.
pub fn text_reply(text: &str) -> ModelReply {
    reply_with_parts(vec![Part::text(text)])
}

/// Reply with one candidate holding one function call.
///
/// `args` must be a JSON object; anything else yields empty arguments.
pub fn tool_reply(name: &str, args: Value) -> ModelReply {
    let args: Map<String, Value> = args.as_object().cloned().unwrap_or_default();
    reply_with_parts(vec![Part::FunctionCall(ToolCallRequest::new(name, args))])
}

/// Reply with one candidate holding the given parts.
pub fn reply_with_parts(parts: Vec<Part>) -> ModelReply {
    ModelReply {
        candidates: vec![Candidate { parts }],
    }
}

/// Reply with no candidates at all.
pub fn empty_reply() -> ModelReply {
    ModelReply::default()
}

/// Model session replaying a fixed script and recording every message sent.
///
/// Once the script runs out every call fails with a transport error.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    script: VecDeque<Result<ModelReply, ServiceError>>,
    sent: Vec<Vec<Part>>,
}

impl ScriptedModel {
    pub fn new(replies: impl IntoIterator<Item = ModelReply>) -> Self {
        Self::with_results(replies.into_iter().map(Ok))
    }

    pub fn with_results(
        results: impl IntoIterator<Item = Result<ModelReply, ServiceError>>,
    ) -> Self {
        Self {
            script: results.into_iter().collect(),
            sent: Vec::new(),
        }
    }

    /// Every outbound message in send order.
    pub fn sent(&self) -> &[Vec<Part>] {
        &self.sent
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl ModelSession for ScriptedModel {
    fn send(&mut self, parts: &[Part]) -> Result<ModelReply, ServiceError> {
        self.sent.push(parts.to_vec());
        self.script.pop_front().unwrap_or_else(|| {
            Err(ServiceError::Transport(
                "scripted model has no more replies".to_string(),
            ))
        })
    }
}

/// Tool executor that records invocations instead of running them.
#[derive(Debug, Default)]
pub struct RecordingTools {
    calls: RefCell<Vec<ToolInvocation>>,
    results: RefCell<VecDeque<Result<String, ToolError>>>,
}

impl RecordingTools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue results returned by successive calls. Unscripted calls return `"ok"`.
    pub fn with_results(results: impl IntoIterator<Item = Result<String, ToolError>>) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            results: RefCell::new(results.into_iter().collect()),
        }
    }

    pub fn calls(&self) -> Vec<ToolInvocation> {
        self.calls.borrow().clone()
    }
}

impl ToolExecutor for RecordingTools {
    fn execute(&self, invocation: &ToolInvocation) -> Result<String, ToolError> {
        self.calls.borrow_mut().push(invocation.clone());
        self.results
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok("ok".to_string()))
    }
}

/// Output channel a [`ScriptedUi`] line was printed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Plain,
    Agent,
    Error,
    Success,
    Warning,
    Title,
}

/// [`Ui`] answering prompts from a fixed script and capturing all output.
///
/// Running out of answers behaves like a closed terminal: `input` fails.
#[derive(Debug, Default)]
pub struct ScriptedUi {
    answers: VecDeque<String>,
    prompts: Vec<String>,
    lines: Vec<(Channel, String)>,
    tools: Vec<String>,
}

impl ScriptedUi {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    /// Names of the tool calls shown to the user.
    pub fn tools_shown(&self) -> Vec<String> {
        self.tools.clone()
    }

    /// Lines printed on `channel`, in order.
    pub fn printed(&self, channel: Channel) -> Vec<String> {
        self.lines
            .iter()
            .filter(|(line_channel, _)| *line_channel == channel)
            .map(|(_, text)| text.clone())
            .collect()
    }

    fn push(&mut self, channel: Channel, text: &str) -> Result<()> {
        self.lines.push((channel, text.to_string()));
        Ok(())
    }
}

impl Ui for ScriptedUi {
    fn input(&mut self, prompt: &str) -> Result<String> {
        self.prompts.push(prompt.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| anyhow!("input stream closed"))
    }

    fn print(&mut self, text: &str) -> Result<()> {
        self.push(Channel::Plain, text)
    }

    fn print_agent(&mut self, text: &str) -> Result<()> {
        self.push(Channel::Agent, text)
    }

    fn print_tool(&mut self, call: &ToolCallRequest) -> Result<()> {
        self.tools.push(call.name.clone());
        Ok(())
    }

    fn print_error(&mut self, text: &str) -> Result<()> {
        self.push(Channel::Error, text)
    }

    fn print_success(&mut self, text: &str) -> Result<()> {
        self.push(Channel::Success, text)
    }

    fn print_warning(&mut self, text: &str) -> Result<()> {
        self.push(Channel::Warning, text)
    }

    fn print_title(&mut self, text: &str) -> Result<()> {
        self.push(Channel::Title, text)
    }
}
