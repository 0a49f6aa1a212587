//! Turn-based conversation driver.
//!
//! Each turn sends the single pending [`Directive`], classifies the reply and
//! decides what to queue next. The turn budget bounds the loop; every turn
//! consumes one unit of it whatever happens during the turn.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::confirm::confirm_tool_call;
use crate::core::budget::TurnBudget;
use crate::core::classifier::{Classified, classify};
use crate::core::directive::Directive;
use crate::core::markers::{TextSignal, text_signal};
use crate::core::prompts::{self, CONFIRMATION_UNAVAILABLE, WRITE_NUDGE};
use crate::core::tools::resolve_invocation;
use crate::core::types::{
    ModelReply, Part, RetryReason, Role, Termination, ToolCallRequest, ToolResult, TurnOutcome,
};
use crate::io::model::ModelSession;
use crate::io::tools::ToolExecutor;
use crate::io::ui::Ui;

/// One entry of the session history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionMessage {
    pub role: Role,
    pub parts: Vec<Part>,
}

/// Conversation state owned by the caller and mutated only by the driver.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    messages: Vec<SessionMessage>,
    budget: TurnBudget,
}

impl Session {
    /// Start a session whose history opens with the system instructions.
    pub fn new(instructions: impl Into<String>, turn_limit: u32) -> Self {
        Self {
            messages: vec![SessionMessage {
                role: Role::System,
                parts: vec![Part::text(instructions)],
            }],
            budget: TurnBudget::new(turn_limit),
        }
    }

    pub fn messages(&self) -> &[SessionMessage] {
        &self.messages
    }

    pub fn budget(&self) -> &TurnBudget {
        &self.budget
    }

    /// Messages with the given role, in order.
    pub fn messages_with_role(&self, role: Role) -> Vec<&SessionMessage> {
        self.messages
            .iter()
            .filter(|message| message.role == role)
            .collect()
    }

    fn push(&mut self, role: Role, parts: Vec<Part>) {
        self.messages.push(SessionMessage { role, parts });
    }

    /// Write the session as pretty JSON with a trailing newline.
    pub fn write_transcript(&self, path: &Path) -> Result<()> {
        let mut payload = serde_json::to_string_pretty(self).context("serialize transcript")?;
        payload.push('\n');
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        fs::write(path, payload).with_context(|| format!("write transcript {}", path.display()))
    }
}

/// How a conversation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationOutcome {
    pub turns_used: u32,
    pub termination: Termination,
}

/// Drives a model session, a tool executor and a user interface through one
/// conversation.
pub struct Conversation<'a, M, T, U> {
    model: &'a mut M,
    tools: &'a T,
    ui: &'a mut U,
}

impl<'a, M: ModelSession, T: ToolExecutor, U: Ui> Conversation<'a, M, T, U> {
    pub fn new(model: &'a mut M, tools: &'a T, ui: &'a mut U) -> Self {
        Self { model, tools, ui }
    }

    /// Run until completion, cancellation or budget exhaustion.
    ///
    /// Errors are returned only when the terminal itself fails; every model
    /// and tool failure is reported and retried within the budget.
    #[instrument(skip_all, fields(turn_limit = session.budget.limit()))]
    pub fn run(&mut self, session: &mut Session, request: &str) -> Result<ConversationOutcome> {
        let mut directive = Directive::from_text(request);
        loop {
            let Some(turn) = session.budget.begin_turn() else {
                let limit = session.budget.limit();
                info!(limit, "turn limit reached");
                self.ui.print_warning(&format!(
                    "Reached the limit of {limit} turns without a conclusion."
                ))?;
                return Ok(ConversationOutcome {
                    turns_used: session.budget.used(),
                    termination: Termination::TurnsExhausted,
                });
            };

            let parts = directive.to_parts();
            debug!(turn, directive = directive.kind(), "sending directive");
            session.push(Role::User, parts.clone());

            let outcome = match self.model.send(&parts) {
                Ok(reply) => {
                    record_reply(session, &reply);
                    self.handle_reply(session, &reply)?
                }
                Err(err) => {
                    warn!(turn, error = %err, "model call failed");
                    self.ui.print_error(&err.to_string())?;
                    TurnOutcome::Retry(RetryReason::ServiceError(err.to_string()))
                }
            };
            debug!(turn, outcome = ?outcome, "turn finished");

            if let Some(next) = Directive::from_outcome(&outcome) {
                directive = next;
                continue;
            }
            match outcome {
                TurnOutcome::AwaitUserInput => {
                    directive = Directive::from_text(self.read_user_input()?);
                }
                TurnOutcome::TerminateSuccess => {
                    info!(turn, "conversation completed");
                    return Ok(ConversationOutcome {
                        turns_used: session.budget.used(),
                        termination: Termination::Completed,
                    });
                }
                TurnOutcome::TerminateCancelled { tool } => {
                    info!(turn, tool = %tool, "conversation cancelled");
                    return Ok(ConversationOutcome {
                        turns_used: session.budget.used(),
                        termination: Termination::Cancelled { tool },
                    });
                }
                TurnOutcome::Retry(RetryReason::ServiceError(_)) => {}
                TurnOutcome::Retry(RetryReason::EmptyReply(reason)) => {
                    self.ui.print_error(reason.describe())?;
                    directive = Directive::Proceed;
                }
                TurnOutcome::ContinueWithText(_) | TurnOutcome::ContinueWithToolResult(_) => {}
            }
        }
    }

    fn handle_reply(&mut self, session: &mut Session, reply: &ModelReply) -> Result<TurnOutcome> {
        match classify(reply) {
            Classified::Empty(reason) => {
                warn!(reason = ?reason, "reply carried nothing actionable");
                Ok(TurnOutcome::Retry(RetryReason::EmptyReply(reason)))
            }
            Classified::Text(text) => {
                self.ui.print_agent(text)?;
                Ok(match text_signal(text) {
                    TextSignal::Clarification => TurnOutcome::AwaitUserInput,
                    TextSignal::UnwrittenChange => {
                        debug!("reply describes a change that was not written");
                        TurnOutcome::ContinueWithText(WRITE_NUDGE.to_string())
                    }
                    TextSignal::Completion => TurnOutcome::TerminateSuccess,
                    TextSignal::Narrative => TurnOutcome::ContinueWithText(String::new()),
                })
            }
            Classified::ToolCall(call) => self.handle_tool_call(session, call),
        }
    }

    #[instrument(skip_all, fields(tool = %call.name))]
    fn handle_tool_call(
        &mut self,
        session: &mut Session,
        call: &ToolCallRequest,
    ) -> Result<TurnOutcome> {
        let invocation = match resolve_invocation(call) {
            Ok(invocation) => invocation,
            Err(err) => {
                warn!(error = %err, "rejected tool call arguments");
                self.ui.print_error(&err.to_string())?;
                return Ok(TurnOutcome::ContinueWithText(prompts::tool_argument_error(
                    &call.name,
                    &err.to_string(),
                )));
            }
        };

        let approved = match confirm_tool_call(&mut *self.ui, call) {
            Ok(approved) => approved,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "confirmation unavailable");
                self.ui
                    .print_error(&format!("could not read confirmation: {err:#}"))?;
                return Ok(TurnOutcome::ContinueWithText(
                    CONFIRMATION_UNAVAILABLE.to_string(),
                ));
            }
        };
        if !approved {
            session.push(
                Role::Audit,
                vec![Part::text(prompts::permission_denied(
                    &call.name,
                    &call.args_display(),
                ))],
            );
            self.ui.print_warning(&format!("Declined {}.", call.name))?;
            return Ok(TurnOutcome::TerminateCancelled {
                tool: call.name.clone(),
            });
        }

        let result = match self.tools.execute(&invocation) {
            Ok(output) => {
                info!(bytes = output.len(), "tool succeeded");
                self.ui.print_success(&format!("{} succeeded.", call.name))?;
                ToolResult::success(&call.name, output)
            }
            Err(err) => {
                warn!(error = %err, "tool failed");
                self.ui.print_error(&err.to_string())?;
                ToolResult::failure(&call.name, err.to_string())
            }
        };
        if result.success {
            Ok(TurnOutcome::ContinueWithToolResult(result))
        } else {
            Ok(TurnOutcome::ContinueWithText(prompts::tool_failure(
                &result.output,
            )))
        }
    }

    /// Ask the user to answer a clarification. A closed terminal counts as no
    /// further input.
    fn read_user_input(&mut self) -> Result<String> {
        let input = match self.ui.input("Your answer") {
            Ok(input) => input,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "no clarification available");
                self.ui.print_error(&format!("could not read input: {err:#}"))?;
                String::new()
            }
        };
        Ok(prompts::user_input(&input))
    }
}

/// Keep the first candidate's parts as the model side of the history.
fn record_reply(session: &mut Session, reply: &ModelReply) {
    if let Some(candidate) = reply.candidates.first() {
        session.push(Role::Model, candidate.parts.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::prompts::PROCEED_NUDGE;
    use crate::core::tools::ToolInvocation;
    use crate::io::model::ServiceError;
    use crate::io::tools::ToolError;
    use crate::test_support::{
        Channel, RecordingTools, ScriptedModel, ScriptedUi, empty_reply, reply_with_parts,
        text_reply, tool_reply,
    };
    use serde_json::json;

    fn run(
        model: &mut ScriptedModel,
        tools: &RecordingTools,
        ui: &mut ScriptedUi,
        limit: u32,
    ) -> (Session, ConversationOutcome) {
        let mut session = Session::new("instructions", limit);
        let outcome = Conversation::new(model, tools, ui)
            .run(&mut session, "make the gaps bigger")
            .expect("run");
        (session, outcome)
    }

    fn sent_text(parts: &[Part]) -> &str {
        match parts {
            [Part::Text { text }] => text,
            other => panic!("expected one text part, got {other:?}"),
        }
    }

    #[test]
    fn completion_marker_ends_on_same_turn() {
        let mut model = ScriptedModel::new([text_reply(
            "All done.\n**Conclusion:** nothing to change",
        )]);
        let tools = RecordingTools::new();
        let mut ui = ScriptedUi::default();

        let (_, outcome) = run(&mut model, &tools, &mut ui, 10);
        assert_eq!(outcome.termination, Termination::Completed);
        assert_eq!(outcome.turns_used, 1);
        assert_eq!(model.sent().len(), 1);
        assert_eq!(sent_text(&model.sent()[0]), "make the gaps bigger");
    }

    #[test]
    fn narrative_text_queues_proceed_nudge() {
        let mut model = ScriptedModel::new([
            text_reply("Let me look at the file first."),
            text_reply("**Conclusion:** done"),
        ]);
        let tools = RecordingTools::new();
        let mut ui = ScriptedUi::default();

        let (_, outcome) = run(&mut model, &tools, &mut ui, 10);
        assert_eq!(outcome.turns_used, 2);
        assert_eq!(sent_text(&model.sent()[1]), PROCEED_NUDGE);
    }

    #[test]
    fn approved_tool_call_sends_tool_result() {
        let mut model = ScriptedModel::new([
            tool_reply("readFile", json!({"path": "/hypr/hyprland.conf"})),
            text_reply("**Conclusion:** read it"),
        ]);
        let tools = RecordingTools::with_results([Ok("gaps_in = 5".to_string())]);
        let mut ui = ScriptedUi::new(["y"]);

        let (_, outcome) = run(&mut model, &tools, &mut ui, 10);
        assert_eq!(outcome.termination, Termination::Completed);
        assert_eq!(
            tools.calls(),
            vec![ToolInvocation::ReadFile {
                path: "/hypr/hyprland.conf".to_string()
            }]
        );
        assert_eq!(
            model.sent()[1],
            vec![Part::FunctionResponse(ToolResult::success(
                "readFile",
                "gaps_in = 5"
            ))]
        );
    }

    #[test]
    fn declined_tool_call_cancels_without_executing() {
        let mut model = ScriptedModel::new([tool_reply(
            "shellExecute",
            json!({"command": "rm -rf /"}),
        )]);
        let tools = RecordingTools::new();
        let mut ui = ScriptedUi::new(["n"]);

        let (session, outcome) = run(&mut model, &tools, &mut ui, 10);
        assert_eq!(
            outcome.termination,
            Termination::Cancelled {
                tool: "shellExecute".to_string()
            }
        );
        assert!(tools.calls().is_empty());
        assert_eq!(model.sent().len(), 1);
        let audit = session.messages_with_role(Role::Audit);
        assert_eq!(audit.len(), 1);
        match &audit[0].parts[..] {
            [Part::Text { text }] => assert!(text.contains("denied permission")),
            other => panic!("unexpected audit parts {other:?}"),
        }
    }

    #[test]
    fn missing_argument_never_reaches_gate_or_executor() {
        let mut model = ScriptedModel::new([
            tool_reply("writeFile", json!({"path": "/hypr/hyprland.conf"})),
            text_reply("**Conclusion:** gave up"),
        ]);
        let tools = RecordingTools::new();
        let mut ui = ScriptedUi::default();

        let (_, outcome) = run(&mut model, &tools, &mut ui, 10);
        assert_eq!(outcome.termination, Termination::Completed);
        assert!(tools.calls().is_empty());
        assert!(ui.tools_shown().is_empty());
        assert!(sent_text(&model.sent()[1]).contains("writeFile"));
        assert_eq!(ui.printed(Channel::Error).len(), 1);
    }

    #[test]
    fn tool_failure_is_explained_to_the_model() {
        let mut model = ScriptedModel::new([
            tool_reply("readFile", json!({"path": "/missing"})),
            text_reply("**Conclusion:** file missing"),
        ]);
        let tools = RecordingTools::with_results([Err(ToolError::EmptyCommand)]);
        let mut ui = ScriptedUi::new(["yes"]);

        run(&mut model, &tools, &mut ui, 10);
        let prompt = sent_text(&model.sent()[1]);
        assert!(prompt.contains("empty command"));
        assert!(prompt.contains("alternative"));
        assert_eq!(tools.calls().len(), 1);
    }

    #[test]
    fn clarification_waits_for_user_input() {
        let mut model = ScriptedModel::new([
            text_reply("Which monitor? [NEEDS-USER-INPUT]"),
            text_reply("**Conclusion:** configured DP-1"),
        ]);
        let tools = RecordingTools::new();
        let mut ui = ScriptedUi::new(["DP-1"]);

        run(&mut model, &tools, &mut ui, 10);
        assert_eq!(sent_text(&model.sent()[1]), "The user responded: DP-1");
    }

    #[test]
    fn unwritten_change_gets_write_nudge() {
        let mut model = ScriptedModel::new([
            text_reply("The gap size has been updated to 10."),
            text_reply("**Conclusion:** done"),
        ]);
        let tools = RecordingTools::new();
        let mut ui = ScriptedUi::default();

        run(&mut model, &tools, &mut ui, 10);
        assert_eq!(sent_text(&model.sent()[1]), WRITE_NUDGE);
    }

    #[test]
    fn empty_reply_retries_with_proceed() {
        let mut model = ScriptedModel::new([
            empty_reply(),
            reply_with_parts(Vec::new()),
            text_reply("**Conclusion:** done"),
        ]);
        let tools = RecordingTools::new();
        let mut ui = ScriptedUi::default();

        let (_, outcome) = run(&mut model, &tools, &mut ui, 10);
        assert_eq!(outcome.turns_used, 3);
        assert_eq!(sent_text(&model.sent()[1]), PROCEED_NUDGE);
        assert_eq!(sent_text(&model.sent()[2]), PROCEED_NUDGE);
        assert_eq!(ui.printed(Channel::Error).len(), 2);
        assert!(ui.printed(Channel::Warning).is_empty());
    }

    #[test]
    fn service_error_resends_same_directive() {
        let mut model = ScriptedModel::with_results([
            Err(ServiceError::Status {
                status: 503,
                detail: "overloaded".to_string(),
            }),
            Ok(text_reply("**Conclusion:** done")),
        ]);
        let tools = RecordingTools::new();
        let mut ui = ScriptedUi::default();

        let (_, outcome) = run(&mut model, &tools, &mut ui, 10);
        assert_eq!(outcome.turns_used, 2);
        assert_eq!(model.sent()[0], model.sent()[1]);
        assert!(ui.printed(Channel::Error)[0].contains("overloaded"));
    }

    #[test]
    fn closed_terminal_during_confirmation_asks_model_to_retry() {
        let mut model = ScriptedModel::new([
            tool_reply("shellExecute", json!({"command": "hyprctl reload"})),
            text_reply("**Conclusion:** skipped reload"),
        ]);
        let tools = RecordingTools::new();
        let mut ui = ScriptedUi::default();

        run(&mut model, &tools, &mut ui, 10);
        assert!(tools.calls().is_empty());
        assert_eq!(sent_text(&model.sent()[1]), CONFIRMATION_UNAVAILABLE);
    }

    #[test]
    fn budget_bounds_the_loop() {
        let replies = (0..5).map(|i| text_reply(&format!("thinking {i}")));
        let mut model = ScriptedModel::new(replies);
        let tools = RecordingTools::new();
        let mut ui = ScriptedUi::default();

        let (session, outcome) = run(&mut model, &tools, &mut ui, 3);
        assert_eq!(outcome.termination, Termination::TurnsExhausted);
        assert_eq!(outcome.turns_used, 3);
        assert_eq!(model.sent().len(), 3);
        assert!(model.sent().iter().all(|parts| parts.len() == 1));
        assert!(session.budget().is_exhausted());
    }

    #[test]
    fn transcript_is_pretty_json() {
        let mut model = ScriptedModel::new([text_reply("**Conclusion:** done")]);
        let tools = RecordingTools::new();
        let mut ui = ScriptedUi::default();
        let (session, _) = run(&mut model, &tools, &mut ui, 10);

        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("out/transcript.json");
        session.write_transcript(&path).expect("write");
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");
        let roles: Vec<&str> = value["messages"]
            .as_array()
            .expect("messages")
            .iter()
            .filter_map(|message| message["role"].as_str())
            .collect();
        assert_eq!(roles, vec!["system", "user", "model"]);
    }
}
