//! Stable exit codes for hyprlander CLI commands.

/// Command succeeded. Declined tool calls and exhausted turn budgets also exit
/// with this code.
pub const OK: i32 = 0;
/// Setup, configuration or terminal failure.
pub const INVALID: i32 = 1;
