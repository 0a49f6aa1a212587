//! Fixed prompt strings the driver synthesizes between turns.

/// Sent when the previous turn queued no new input.
pub const PROCEED_NUDGE: &str = "Proceed.";

/// Sent when the model describes a change without calling `writeFile`.
pub const WRITE_NUDGE: &str = "You mentioned making changes but didn't use the writeFile function. \
You MUST use writeFile to actually implement the changes. Please call writeFile now with the modified content.";

/// Sent when the confirmation prompt could not be read.
pub const CONFIRMATION_UNAVAILABLE: &str = "Could not run the tool. Try again.";

pub fn tool_failure(error: &str) -> String {
    format!("The function call failed with error: {error}. Please provide an alternative solution.")
}

pub fn tool_argument_error(tool: &str, error: &str) -> String {
    format!(
        "The call to {tool} was rejected before execution: {error}. \
Call the tool again with every required argument supplied as a string."
    )
}

pub fn permission_denied(tool: &str, args: &str) -> String {
    format!(
        "The user denied permission to run {tool} with arguments {args}. \
The conversation was ended without executing it."
    )
}

pub fn user_input(input: &str) -> String {
    let input = input.trim();
    if input.is_empty() {
        return "The user has no further input. Proceed with your best judgment.".to_string();
    }
    format!("The user responded: {input}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_input_wraps_response() {
        assert_eq!(user_input(" use 8px "), "The user responded: use 8px");
        assert!(user_input("").contains("no further input"));
    }

    #[test]
    fn tool_failure_names_error() {
        let prompt = tool_failure("failed to read file /nope");
        assert!(prompt.contains("/nope"));
        assert!(prompt.contains("alternative"));
    }
}
