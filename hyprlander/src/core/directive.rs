//! The single queued input for the next outbound message.

use crate::core::prompts::PROCEED_NUDGE;
use crate::core::types::{Part, ToolResult, TurnOutcome};

/// Exactly one pending input between turns.
///
/// Being an enum, a directive can never hold a text prompt and a tool result at
/// the same time, and there is no "nothing queued" state while the loop runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// A text prompt (opening request, user input, corrective prompt).
    Text(String),
    /// A structured tool result from the previous turn.
    ToolResult(ToolResult),
    /// Let the model keep reasoning without new input.
    Proceed,
}

impl Directive {
    /// Queue a text prompt; blank text becomes [`Directive::Proceed`].
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.trim().is_empty() {
            Directive::Proceed
        } else {
            Directive::Text(text)
        }
    }

    /// Directive implied by a turn outcome, or `None` when the outcome does not
    /// queue anything by itself (terminal, awaiting input, retry).
    pub fn from_outcome(outcome: &TurnOutcome) -> Option<Self> {
        match outcome {
            TurnOutcome::ContinueWithText(text) => Some(Directive::from_text(text.clone())),
            TurnOutcome::ContinueWithToolResult(result) => {
                Some(Directive::ToolResult(result.clone()))
            }
            _ => None,
        }
    }

    /// Render as the parts of an outbound message.
    pub fn to_parts(&self) -> Vec<Part> {
        match self {
            Directive::Text(text) => vec![Part::text(text.clone())],
            Directive::ToolResult(result) => vec![Part::FunctionResponse(result.clone())],
            Directive::Proceed => vec![Part::text(PROCEED_NUDGE)],
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Directive::Text(_) => "text",
            Directive::ToolResult(_) => "tool_result",
            Directive::Proceed => "proceed",
        }
    }
}
