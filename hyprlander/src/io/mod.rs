//! Side-effecting adapters: files, processes, the model service and the terminal.

pub mod config;
pub mod gemini;
pub mod model;
pub mod paths;
pub mod process;
pub mod prompt;
pub mod store;
pub mod tools;
pub mod tree;
pub mod ui;
