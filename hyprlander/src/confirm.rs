//! Confirmation gate in front of every tool execution.

use anyhow::Result;
use tracing::debug;

use crate::core::types::ToolCallRequest;
use crate::io::ui::Ui;

pub const CONFIRM_QUESTION: &str = "Do you want to proceed?";

/// Show `call` and block until the user answers yes or no.
///
/// Only prompts and reads; the call is neither validated nor executed here.
/// A failed read is returned as an error and never counts as consent.
pub fn confirm_tool_call<U: Ui>(ui: &mut U, call: &ToolCallRequest) -> Result<bool> {
    ui.print_tool(call)?;
    let approved = ui.confirm(CONFIRM_QUESTION)?;
    debug!(tool = %call.name, approved, "confirmation answered");
    Ok(approved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedUi;
    use serde_json::{Map, json};

    fn shell_call(command: &str) -> ToolCallRequest {
        let mut args = Map::new();
        args.insert("command".to_string(), json!(command));
        ToolCallRequest::new("shellExecute", args)
    }

    #[test]
    fn yes_approves() {
        let mut ui = ScriptedUi::new(["yes"]);
        assert!(confirm_tool_call(&mut ui, &shell_call("hyprctl reload")).expect("confirm"));
        assert_eq!(ui.tools_shown(), vec!["shellExecute".to_string()]);
    }

    #[test]
    fn ambiguous_answers_reprompt_then_decline() {
        let mut ui = ScriptedUi::new(["", "sure", "N"]);
        assert!(!confirm_tool_call(&mut ui, &shell_call("rm -rf /")).expect("confirm"));
        assert_eq!(ui.prompts().len(), 3);
    }

    #[test]
    fn exhausted_input_is_an_error_not_consent() {
        let mut ui = ScriptedUi::new(["ok"]);
        assert!(confirm_tool_call(&mut ui, &shell_call("rm -rf /")).is_err());
    }
}
