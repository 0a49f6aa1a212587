//! System instructions rendered from a minijinja template.

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use serde::Serialize;
use tracing::debug;

use crate::core::markers::{CLARIFICATION_MARKER, COMPLETION_MARKER};
use crate::core::tools::{ToolDeclaration, declarations};

const SYSTEM_TEMPLATE: &str = include_str!("prompts/system.md");

/// Inputs for the system instructions.
#[derive(Debug, Clone)]
pub struct InstructionInputs {
    /// Hyprland configuration directory the model should work in.
    pub config_dir: String,
    /// Rendered directory tree of `config_dir`.
    pub tree: String,
}

/// Tool entry for template rendering.
#[derive(Debug, Clone, Serialize)]
struct ToolContext {
    name: &'static str,
    params: Vec<String>,
    description: &'static str,
}

impl ToolContext {
    fn from_declaration(declaration: &ToolDeclaration) -> Self {
        let params = declaration
            .parameters
            .get("required")
            .and_then(|required| required.as_array())
            .map(|required| {
                required
                    .iter()
                    .filter_map(|name| name.as_str())
                    .map(|name| format!("{name} string"))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            name: declaration.name,
            params,
            description: declaration.description,
        }
    }
}

/// Render the system instructions sent as the first history entry.
pub fn render_instructions(inputs: &InstructionInputs) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("system", SYSTEM_TEMPLATE)
        .context("load system template")?;
    let tools: Vec<ToolContext> = declarations()
        .iter()
        .map(ToolContext::from_declaration)
        .collect();
    let rendered = env
        .get_template("system")?
        .render(context! {
            config_dir => inputs.config_dir.trim(),
            tree => inputs.tree.trim_end(),
            tools => tools,
            clarification_marker => CLARIFICATION_MARKER,
            completion_marker => COMPLETION_MARKER,
        })
        .context("render system template")?;
    debug!(bytes = rendered.len(), "rendered system instructions");
    Ok(rendered)
}
