//! Parsing of interactive answers.
//!
//! Parsers return `None` for anything they do not recognize so callers
//! re-prompt instead of picking a default.

/// Parse a yes/no answer. Empty or unrecognized input yields `None`.
pub fn parse_confirmation(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Parse a 1-based menu choice into a 0-based index.
pub fn parse_selection(input: &str, options: usize) -> Option<usize> {
    let choice: usize = input.trim().parse().ok()?;
    (1..=options).contains(&choice).then(|| choice - 1)
}
