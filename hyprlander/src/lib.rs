//! Terminal assistant that edits a Hyprland configuration through a model
//! with tool calling.
//!
//! The user states a request; the model reads files, proposes edits and runs
//! commands through three tools, and every tool call is confirmed by the user
//! before it runs. The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (classification, markers, tool
//!   argument resolution, turn budget). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting adapters (files, processes, the model service,
//!   the terminal). Each sits behind a trait so tests can script it.
//!
//! Orchestration modules ([`conversation`], [`assist`], [`setup`]) combine the
//! two to implement CLI commands.

pub mod assist;
pub mod confirm;
pub mod conversation;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod setup;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
