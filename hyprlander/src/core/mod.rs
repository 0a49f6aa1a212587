//! Deterministic, pure logic shared by the conversation driver.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod answers;
pub mod budget;
pub mod classifier;
pub mod directive;
pub mod markers;
pub mod prompts;
pub mod tools;
pub mod types;
