//! Text signals shared between the system instructions and the classifier.
//!
//! The instructions template embeds [`COMPLETION_MARKER`] and
//! [`CLARIFICATION_MARKER`] verbatim, so changing either here changes both sides
//! of the contract.

use std::sync::LazyLock;

use regex::Regex;

/// Sentinel the model emits when the requested change is finished.
pub const COMPLETION_MARKER: &str = "**Conclusion:**";

/// Sentinel the model emits when it needs input from the user (case-insensitive).
pub const CLARIFICATION_MARKER: &str = "[needs-user-input]";

static UNWRITTEN_CHANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(i will (change|modify|update)|has been (changed|modified|updated))")
        .expect("unwritten change pattern should be valid")
});

/// What a plain-text reply asks the driver to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSignal {
    /// Ask the user for input.
    Clarification,
    /// The model describes a change it has not written; nudge it to call `writeFile`.
    UnwrittenChange,
    /// The conversation is done.
    Completion,
    /// Narrative or reasoning text; let the model proceed.
    Narrative,
}

/// Classify a non-empty text reply. Checks run in priority order.
pub fn text_signal(text: &str) -> TextSignal {
    if requests_clarification(text) {
        TextSignal::Clarification
    } else if claims_unwritten_change(text) {
        TextSignal::UnwrittenChange
    } else if signals_completion(text) {
        TextSignal::Completion
    } else {
        TextSignal::Narrative
    }
}

pub fn requests_clarification(text: &str) -> bool {
    text.to_lowercase().contains(CLARIFICATION_MARKER)
}

pub fn signals_completion(text: &str) -> bool {
    text.contains(COMPLETION_MARKER)
}

/// Best-effort guess that the model talks about a change without having made it.
///
/// Substring heuristics only; a reply carrying the completion marker is never
/// flagged.
pub fn claims_unwritten_change(text: &str) -> bool {
    !signals_completion(text) && UNWRITTEN_CHANGE_RE.is_match(text)
}
