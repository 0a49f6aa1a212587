//! Deterministic classification of model replies.

use crate::core::types::{EmptyReason, ModelReply, Part, ToolCallRequest};

/// Category of a model reply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classified<'a> {
    /// Non-empty text.
    Text(&'a str),
    /// A tool-call request (arguments not yet validated).
    ToolCall(&'a ToolCallRequest),
    /// Nothing actionable.
    Empty(EmptyReason),
}

/// Classify a reply by its first content part only.
///
/// Only the first part of the first candidate is examined. Later candidates and
/// later parts are ignored, so a reply whose first part is empty text is
/// `Empty` even when a tool call follows it.
pub fn classify(reply: &ModelReply) -> Classified<'_> {
    let Some(candidate) = reply.candidates.first() else {
        return Classified::Empty(EmptyReason::NoCandidates);
    };
    let Some(part) = candidate.parts.first() else {
        return Classified::Empty(EmptyReason::NoParts);
    };
    match part {
        Part::Text { text } if !text.is_empty() => Classified::Text(text),
        Part::FunctionCall(call) => Classified::ToolCall(call),
        _ => Classified::Empty(EmptyReason::UnrecognizedPart),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Candidate;
    use serde_json::Map;

    fn reply(parts: Vec<Part>) -> ModelReply {
        ModelReply {
            candidates: vec![Candidate { parts }],
        }
    }

    fn call(name: &str) -> Part {
        Part::FunctionCall(ToolCallRequest::new(name, Map::new()))
    }

    #[test]
    fn no_candidates_is_empty() {
        assert_eq!(
            classify(&ModelReply::default()),
            Classified::Empty(EmptyReason::NoCandidates)
        );
    }

    #[test]
    fn no_parts_is_empty() {
        assert_eq!(
            classify(&reply(Vec::new())),
            Classified::Empty(EmptyReason::NoParts)
        );
    }

    #[test]
    fn first_text_part_wins() {
        let reply = reply(vec![Part::text("hello"), call("readFile")]);
        assert_eq!(classify(&reply), Classified::Text("hello"));
    }

    #[test]
    fn first_tool_call_wins() {
        let reply = reply(vec![call("readFile"), Part::text("ignored")]);
        assert!(matches!(classify(&reply), Classified::ToolCall(c) if c.name == "readFile"));
    }

    #[test]
    fn empty_first_part_hides_later_tool_call() {
        let reply = reply(vec![Part::text(""), call("writeFile")]);
        assert_eq!(
            classify(&reply),
            Classified::Empty(EmptyReason::UnrecognizedPart)
        );
    }

    #[test]
    fn only_first_candidate_is_examined() {
        let reply = ModelReply {
            candidates: vec![
                Candidate {
                    parts: Vec::new(),
                },
                Candidate {
                    parts: vec![Part::text("second candidate")],
                },
            ],
        };
        assert_eq!(classify(&reply), Classified::Empty(EmptyReason::NoParts));
    }

    #[test]
    fn unsupported_part_is_empty() {
        let reply = reply(vec![Part::Unsupported, Part::text("late")]);
        assert_eq!(
            classify(&reply),
            Classified::Empty(EmptyReason::UnrecognizedPart)
        );
    }
}
