//! Terminal interaction: prompts, confirmations and categorized output.
//!
//! The conversation and setup flows talk to the user only through [`Ui`], so
//! tests can drive them with scripted answers.

use std::fs;
use std::io::{self, BufRead, IsTerminal, Stdin, Stdout, Write};

use anyhow::{Context, Result, bail};
use crossterm::style::{Color, Stylize};
use similar::TextDiff;

use crate::core::answers::{parse_confirmation, parse_selection};
use crate::core::types::ToolCallRequest;

/// User-facing input and output channel.
pub trait Ui {
    /// Read one line after showing `prompt`. A closed input stream is an error.
    fn input(&mut self, prompt: &str) -> Result<String>;

    fn print(&mut self, text: &str) -> Result<()>;
    fn print_agent(&mut self, text: &str) -> Result<()>;
    /// Show a pending tool call. Must not modify anything.
    fn print_tool(&mut self, call: &ToolCallRequest) -> Result<()>;
    fn print_error(&mut self, text: &str) -> Result<()>;
    fn print_success(&mut self, text: &str) -> Result<()>;
    fn print_warning(&mut self, text: &str) -> Result<()>;
    fn print_title(&mut self, text: &str) -> Result<()>;

    /// Read a non-empty, trimmed line, re-prompting on blank input.
    fn input_required(&mut self, prompt: &str) -> Result<String> {
        loop {
            let value = self.input(prompt)?;
            let value = value.trim();
            if !value.is_empty() {
                return Ok(value.to_string());
            }
            self.print_warning("A value is required.")?;
        }
    }

    /// Ask a yes/no question until a recognized answer arrives.
    fn confirm(&mut self, question: &str) -> Result<bool> {
        loop {
            let answer = self.input(&format!("{question} (y/n)"))?;
            match parse_confirmation(&answer) {
                Some(decision) => return Ok(decision),
                None => self.print_warning("Please answer y or n.")?,
            }
        }
    }

    /// Present a numbered menu and return the 0-based index of the choice.
    fn select(&mut self, prompt: &str, options: &[String]) -> Result<usize> {
        if options.is_empty() {
            bail!("nothing to select for: {prompt}");
        }
        self.print_title(prompt)?;
        for (index, option) in options.iter().enumerate() {
            self.print(&format!("  {}. {option}", index + 1))?;
        }
        loop {
            let answer = self.input(&format!("Choose 1-{}", options.len()))?;
            match parse_selection(&answer, options.len()) {
                Some(index) => return Ok(index),
                None => self.print_warning("Please enter one of the listed numbers.")?,
            }
        }
    }
}

/// [`Ui`] over a line reader and a writer, normally stdin/stdout.
pub struct ConsoleUi<R, W> {
    reader: R,
    writer: W,
    styled: bool,
}

impl ConsoleUi<io::StdinLock<'static>, Stdout> {
    /// Console on the process's stdio, styled only when stdout is a terminal.
    pub fn stdio() -> Self {
        let stdin: Stdin = io::stdin();
        let stdout = io::stdout();
        let styled = stdout.is_terminal();
        ConsoleUi::new(stdin.lock(), stdout).with_style(styled)
    }
}

impl<R: BufRead, W: Write> ConsoleUi<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            styled: false,
        }
    }

    pub fn with_style(mut self, styled: bool) -> Self {
        self.styled = styled;
        self
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.styled {
            text.with(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn line(&mut self, text: &str) -> Result<()> {
        writeln!(self.writer, "{text}").context("write to terminal")?;
        self.writer.flush().context("flush terminal")
    }

    fn diff_line(&self, line: &str) -> String {
        if line.starts_with("+++") || line.starts_with("---") {
            self.paint(line, Color::DarkGrey)
        } else if line.starts_with('+') {
            self.paint(line, Color::Green)
        } else if line.starts_with('-') {
            self.paint(line, Color::Red)
        } else if line.starts_with("@@") {
            self.paint(line, Color::Cyan)
        } else {
            line.to_string()
        }
    }
}

impl<R: BufRead, W: Write> Ui for ConsoleUi<R, W> {
    fn input(&mut self, prompt: &str) -> Result<String> {
        let prompt = self.paint(&format!("{prompt}: "), Color::Yellow);
        write!(self.writer, "{prompt}").context("write prompt")?;
        self.writer.flush().context("flush terminal")?;
        let mut buf = String::new();
        let read = self.reader.read_line(&mut buf).context("read input")?;
        if read == 0 {
            bail!("input stream closed");
        }
        Ok(buf.trim_end_matches(['\r', '\n']).to_string())
    }

    fn print(&mut self, text: &str) -> Result<()> {
        self.line(text)
    }

    fn print_agent(&mut self, text: &str) -> Result<()> {
        let label = self.paint("agent>", Color::Magenta);
        self.line(&format!("{label} {}", text.trim_end()))
    }

    fn print_tool(&mut self, call: &ToolCallRequest) -> Result<()> {
        let header = self.paint(&format!("tool> {}", call.name), Color::Blue);
        self.line(&header)?;
        let string_arg = |key: &str| call.args.get(key).and_then(|value| value.as_str());
        match call.name.as_str() {
            "writeFile" => {
                let path = string_arg("path").unwrap_or("<missing path>");
                let content = string_arg("content").unwrap_or_default();
                self.line(&format!("  path: {path}"))?;
                let preview = render_write_preview(path, content);
                let painted: Vec<String> =
                    preview.lines().map(|line| self.diff_line(line)).collect();
                for line in painted {
                    self.line(&line)?;
                }
                Ok(())
            }
            "readFile" => {
                let path = string_arg("path").unwrap_or("<missing path>");
                self.line(&format!("  path: {path}"))
            }
            "shellExecute" => {
                let command = string_arg("command").unwrap_or("<missing command>");
                self.line(&format!("  $ {command}"))
            }
            _ => self.line(&format!("  args: {}", call.args_display())),
        }
    }

    fn print_error(&mut self, text: &str) -> Result<()> {
        let text = self.paint(&format!("error: {text}"), Color::Red);
        self.line(&text)
    }

    fn print_success(&mut self, text: &str) -> Result<()> {
        let text = self.paint(text, Color::Green);
        self.line(&text)
    }

    fn print_warning(&mut self, text: &str) -> Result<()> {
        let text = self.paint(&format!("warning: {text}"), Color::Yellow);
        self.line(&text)
    }

    fn print_title(&mut self, text: &str) -> Result<()> {
        let text = if self.styled {
            text.bold().to_string()
        } else {
            text.to_string()
        };
        self.line(&text)
    }
}

/// Preview of a `writeFile` call: a unified diff against the current file, or
/// the full content when the file cannot be read.
pub fn render_write_preview(path: &str, content: &str) -> String {
    match fs::read_to_string(path) {
        Ok(current) if current == content => "  (content unchanged)\n".to_string(),
        Ok(current) => TextDiff::from_lines(current.as_str(), content)
            .unified_diff()
            .header(path, path)
            .to_string(),
        Err(_) => {
            let mut preview = String::from("  (new file)\n");
            for line in content.lines() {
                preview.push_str(&format!("+{line}\n"));
            }
            preview
        }
    }
}
