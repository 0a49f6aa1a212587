//! Tool declarations and argument resolution.
//!
//! Each tool's parameters are declared once as a JSON Schema. The same schema
//! is sent to the model and used to validate the arguments of every call
//! before anything is dispatched.

use jsonschema::Draft;
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::core::types::ToolCallRequest;

/// The fixed set of local tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    ReadFile,
    WriteFile,
    ShellExecute,
}

impl ToolName {
    pub const ALL: [ToolName; 3] = [
        ToolName::ReadFile,
        ToolName::WriteFile,
        ToolName::ShellExecute,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::ReadFile => "readFile",
            ToolName::WriteFile => "writeFile",
            ToolName::ShellExecute => "shellExecute",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }

    fn description(self) -> &'static str {
        match self {
            ToolName::ReadFile => {
                "Reads the entire content of a file given its path and returns it as a string."
            }
            ToolName::WriteFile => {
                "Writes content to a file at a given path. Creates the file if it does not exist, \
and overwrites it if it does. MUST be used when making configuration changes that require \
modifying file contents."
            }
            ToolName::ShellExecute => {
                "Executes a command and returns its combined output. The command is split on \
whitespace; pipes, redirects and quoting are not supported."
            }
        }
    }

    /// JSON Schema for this tool's arguments.
    pub fn parameters(self) -> Value {
        match self {
            ToolName::ReadFile => json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string", "description": "The path of the file to read."}
                },
                "required": ["path"]
            }),
            ToolName::WriteFile => json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string", "description": "The path of the file to write to."},
                    "content": {
                        "type": "string",
                        "description": "The complete content to write into the file, including both modified and unchanged parts."
                    }
                },
                "required": ["path", "content"]
            }),
            ToolName::ShellExecute => json!({
                "type": "object",
                "properties": {
                    "command": {"type": "string", "description": "The command to execute (e.g., 'ls -l')."}
                },
                "required": ["command"]
            }),
        }
    }
}

/// Tool declaration as advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDeclaration {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

/// Declarations for every tool, in a stable order.
pub fn declarations() -> Vec<ToolDeclaration> {
    ToolName::ALL
        .into_iter()
        .map(|tool| ToolDeclaration {
            name: tool.as_str(),
            description: tool.description(),
            parameters: tool.parameters(),
        })
        .collect()
}

/// A tool call whose arguments are known to be well-formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolInvocation {
    ReadFile { path: String },
    WriteFile { path: String, content: String },
    ShellExecute { command: String },
}

impl ToolInvocation {
    pub fn name(&self) -> ToolName {
        match self {
            ToolInvocation::ReadFile { .. } => ToolName::ReadFile,
            ToolInvocation::WriteFile { .. } => ToolName::WriteFile,
            ToolInvocation::ShellExecute { .. } => ToolName::ShellExecute,
        }
    }
}

/// A model-issued call that cannot be dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolArgumentError {
    #[error("unknown function: {name}")]
    UnknownTool { name: String },
    #[error("invalid arguments for {tool}: {}", .violations.join("; "))]
    InvalidArguments {
        tool: &'static str,
        violations: Vec<String>,
    },
    #[error("invalid tool schema for {tool}: {message}")]
    Schema { tool: &'static str, message: String },
}

/// Resolve a raw request into a typed invocation.
///
/// Arguments are validated against the tool's declared schema (Draft 2020-12);
/// every violation is reported. Undeclared extra arguments are ignored.
pub fn resolve_invocation(request: &ToolCallRequest) -> Result<ToolInvocation, ToolArgumentError> {
    let tool = ToolName::parse(&request.name).ok_or_else(|| ToolArgumentError::UnknownTool {
        name: request.name.clone(),
    })?;

    let schema = tool.parameters();
    let validator = jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&schema)
        .map_err(|err| ToolArgumentError::Schema {
            tool: tool.as_str(),
            message: err.to_string(),
        })?;
    let instance = Value::Object(request.args.clone());
    let violations: Vec<String> = validator
        .iter_errors(&instance)
        .map(|err| err.to_string())
        .collect();
    if !violations.is_empty() {
        return Err(ToolArgumentError::InvalidArguments {
            tool: tool.as_str(),
            violations,
        });
    }

    let arg = |key: &str| -> String {
        request
            .args
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    Ok(match tool {
        ToolName::ReadFile => ToolInvocation::ReadFile { path: arg("path") },
        ToolName::WriteFile => ToolInvocation::WriteFile {
            path: arg("path"),
            content: arg("content"),
        },
        ToolName::ShellExecute => ToolInvocation::ShellExecute {
            command: arg("command"),
        },
    })
}
