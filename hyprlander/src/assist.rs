//! Orchestration for `hyprlander prompt`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::conversation::{Conversation, ConversationOutcome, Session};
use crate::core::tools::declarations;
use crate::core::types::Termination;
use crate::io::config::load_config;
use crate::io::gemini::{GeminiChat, GeminiSettings};
use crate::io::model::ModelSession;
use crate::io::paths::AppPaths;
use crate::io::prompt::{InstructionInputs, render_instructions};
use crate::io::store::{API_KEY, HYPRLAND_DIR, ensure_directory, load_store};
use crate::io::tools::{LocalToolExecutor, ToolExecutor};
use crate::io::tree::render_tree;
use crate::io::ui::Ui;

/// Arguments of one `prompt` invocation.
#[derive(Debug, Clone)]
pub struct PromptRequest {
    pub request: String,
    /// Overrides `max_turns` from `config.toml`.
    pub max_turns: Option<u32>,
    /// Write the session history here after the run.
    pub transcript: Option<PathBuf>,
}

/// Load settings, open a Gemini chat and run one conversation.
///
/// Setup problems (missing store, unset keys, bad directory) fail before any
/// model call is made.
pub fn run_prompt<U: Ui>(
    ui: &mut U,
    paths: &AppPaths,
    request: &PromptRequest,
) -> Result<ConversationOutcome> {
    if request.request.trim().is_empty() {
        bail!("the request must not be empty");
    }
    let store = load_store(&paths.secrets_path)?;
    let api_key = store.require(API_KEY, &paths.secrets_path)?.to_string();
    let config_dir = PathBuf::from(store.require(HYPRLAND_DIR, &paths.secrets_path)?);
    ensure_directory(&config_dir)?;

    let cfg = load_config(&paths.config_path)?;
    let turn_limit = request.max_turns.unwrap_or(cfg.max_turns);
    if turn_limit == 0 {
        bail!("--max-turns must be > 0");
    }

    let tree = render_tree(&config_dir, cfg.tree_max_entries)?;
    let instructions = render_instructions(&InstructionInputs {
        config_dir: config_dir.display().to_string(),
        tree,
    })?;
    debug!(model = %cfg.model, turn_limit, "opening model session");
    let mut chat = GeminiChat::new(
        GeminiSettings {
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key,
            timeout: cfg.request_timeout(),
        },
        &instructions,
        &declarations(),
    )?;
    let tools = LocalToolExecutor::new(cfg.shell_timeout(), cfg.tool_output_limit_bytes);

    converse(
        ui,
        &mut chat,
        &tools,
        Session::new(instructions, turn_limit),
        &request.request,
        request.transcript.as_deref(),
    )
}

/// Run `session` to its end, report the outcome and export the transcript.
pub fn converse<U: Ui, M: ModelSession, T: ToolExecutor>(
    ui: &mut U,
    model: &mut M,
    tools: &T,
    mut session: Session,
    request: &str,
    transcript: Option<&Path>,
) -> Result<ConversationOutcome> {
    let outcome = Conversation::new(&mut *model, tools, &mut *ui).run(&mut session, request)?;
    info!(turns = outcome.turns_used, termination = ?outcome.termination, "conversation finished");
    let summary = match &outcome.termination {
        Termination::Completed => format!("Done in {} turn(s).", outcome.turns_used),
        Termination::Cancelled { tool } => {
            format!("Stopped: {tool} was not approved. Nothing was run.")
        }
        Termination::TurnsExhausted => format!(
            "Stopped after {} turns. Run again with --max-turns to allow more.",
            outcome.turns_used
        ),
    };
    if outcome.termination == Termination::Completed {
        ui.print_success(&summary)?;
    } else {
        ui.print_warning(&summary)?;
    }
    if let Some(path) = transcript {
        session
            .write_transcript(path)
            .with_context(|| format!("export transcript to {}", path.display()))?;
        ui.print(&format!("Transcript written to {}", path.display()))?;
    }
    Ok(outcome)
}
