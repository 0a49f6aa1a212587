//! Local tool execution.
//!
//! The [`ToolExecutor`] trait decouples the conversation driver from the file
//! system and process table. Tests use recording executors that never touch
//! either.

use std::fs;
use std::process::Command;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::core::tools::ToolInvocation;
use crate::io::process::run_command;

/// Failure of a dispatched tool call.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to read file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("empty command")]
    EmptyCommand,
    #[error("failed to execute shell command '{command}': {message}")]
    Spawn { command: String, message: String },
    #[error("command '{command}' failed with status {status}, output: {output}")]
    Execution {
        command: String,
        status: String,
        output: String,
    },
}

/// Executes one validated tool invocation and returns its text output.
pub trait ToolExecutor {
    fn execute(&self, invocation: &ToolInvocation) -> Result<String, ToolError>;
}

/// Executes tools against the local file system and process table.
///
/// No path sandboxing is applied: any path reachable by the process can be read
/// or overwritten, and any program on `PATH` can be run.
#[derive(Debug, Clone)]
pub struct LocalToolExecutor {
    shell_timeout: Option<Duration>,
    output_limit_bytes: usize,
}

impl LocalToolExecutor {
    pub fn new(shell_timeout: Option<Duration>, output_limit_bytes: usize) -> Self {
        Self {
            shell_timeout,
            output_limit_bytes,
        }
    }
}

impl Default for LocalToolExecutor {
    fn default() -> Self {
        Self::new(None, 100_000)
    }
}

impl ToolExecutor for LocalToolExecutor {
    #[instrument(skip_all, fields(tool = invocation.name().as_str()))]
    fn execute(&self, invocation: &ToolInvocation) -> Result<String, ToolError> {
        match invocation {
            ToolInvocation::ReadFile { path } => read_file(path),
            ToolInvocation::WriteFile { path, content } => write_file(path, content),
            ToolInvocation::ShellExecute { command } => {
                shell_execute(command, self.shell_timeout, self.output_limit_bytes)
            }
        }
    }
}

pub fn read_file(path: &str) -> Result<String, ToolError> {
    debug!(path, "reading file");
    let bytes = fs::read(path).map_err(|source| ToolError::Read {
        path: path.to_string(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Replace the whole file with `content`, creating it when absent.
pub fn write_file(path: &str, content: &str) -> Result<String, ToolError> {
    fs::write(path, content).map_err(|source| ToolError::Write {
        path: path.to_string(),
        source,
    })?;
    info!(path, bytes = content.len(), "file written");
    Ok(format!(
        "Successfully wrote {} bytes to file: {path}",
        content.len()
    ))
}

/// Run `command` split on whitespace, without any shell interpretation.
///
/// The first token is the program and the rest are its arguments. Pipes,
/// redirects, globs and quotes are passed through as literal arguments.
pub fn shell_execute(
    command: &str,
    timeout: Option<Duration>,
    output_limit_bytes: usize,
) -> Result<String, ToolError> {
    let mut tokens = command.split_whitespace();
    let program = tokens.next().ok_or(ToolError::EmptyCommand)?;
    let mut cmd = Command::new(program);
    cmd.args(tokens);

    let output = run_command(cmd, timeout, output_limit_bytes).map_err(|err| ToolError::Spawn {
        command: command.to_string(),
        message: format!("{err:#}"),
    })?;
    let combined = output.combined();
    if output.timed_out {
        warn!(command, "shell command timed out");
        return Err(ToolError::Execution {
            command: command.to_string(),
            status: "timed out".to_string(),
            output: combined,
        });
    }
    if !output.status.success() {
        warn!(command, exit_code = ?output.status.code(), "shell command failed");
        return Err(ToolError::Execution {
            command: command.to_string(),
            status: output.status.to_string(),
            output: combined,
        });
    }
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_file_overwrites_whole_content() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("x.conf");
        fs::write(&path, "a=0\n").expect("seed");
        let path_str = path.to_str().expect("utf-8 path");

        let message = LocalToolExecutor::default()
            .execute(&ToolInvocation::WriteFile {
                path: path_str.to_string(),
                content: "a=1\n".to_string(),
            })
            .expect("write");

        assert_eq!(fs::read_to_string(&path).expect("read"), "a=1\n");
        assert!(message.contains("4 bytes"));
    }

    #[test]
    fn write_file_creates_missing_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("new.conf");
        write_file(path.to_str().expect("utf-8 path"), "gaps_in = 5\n").expect("write");
        assert_eq!(fs::read_to_string(&path).expect("read"), "gaps_in = 5\n");
    }

    #[test]
    fn read_file_accepts_non_utf8_content() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("latin1.conf");
        fs::write(&path, b"# caf\xe9\ngaps_in = 5\n").expect("seed");

        let content = read_file(path.to_str().expect("utf-8 path")).expect("read");
        assert!(content.starts_with("# caf\u{fffd}"));
        assert!(content.contains("gaps_in = 5"));
    }

    #[test]
    fn read_missing_file_is_io_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("missing.conf");
        let err = read_file(path.to_str().expect("utf-8 path")).unwrap_err();
        assert!(matches!(err, ToolError::Read { .. }));
        assert!(err.to_string().contains("missing.conf"));
    }

    #[test]
    fn empty_command_is_rejected() {
        let err = shell_execute("   ", None, 1024).unwrap_err();
        assert!(matches!(err, ToolError::EmptyCommand));
    }

    #[test]
    fn unknown_program_is_spawn_error() {
        let err = shell_execute("hyprlander-definitely-not-a-program", None, 1024).unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn shell_metacharacters_are_literal_arguments() {
        let output = shell_execute("echo a | wc -l", None, 1024).expect("run");
        assert_eq!(output, "a | wc -l\n");
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_carries_output() {
        let err = shell_execute("ls /hyprlander-missing-dir", None, 1024).unwrap_err();
        match err {
            ToolError::Execution { output, .. } => assert!(!output.is_empty()),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
