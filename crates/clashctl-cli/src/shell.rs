//! The interactive read-eval loop.

use std::path::PathBuf;

use crossterm::style::Stylize;
use rustyline::config::{CompletionType, Config};
use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::Editor;
use tokio::runtime::Runtime;
use tracing::{debug, warn};

use crate::commands::{CommandRegistry, Flow};
use crate::helper::ShellHelper;
use crate::session::Session;

pub const PROMPT: &str = ">>> ";

/// Run one line on the session's runtime.
pub fn execute(
    rt: &Runtime,
    registry: &CommandRegistry,
    session: &mut Session,
    line: &str,
) -> anyhow::Result<Flow> {
    rt.block_on(registry.dispatch(session, line))
}

/// Print a command error as a single red line.
pub fn report(error: &anyhow::Error) {
    eprintln!("{}", format!("{error:#}").red());
}

/// Read lines until `exit` or Ctrl-D.
pub fn run(
    rt: &Runtime,
    registry: &CommandRegistry,
    session: &mut Session,
    history: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = Config::builder()
        .completion_type(CompletionType::List)
        .auto_add_history(false)
        .build();
    let mut editor: Editor<ShellHelper, FileHistory> = Editor::with_config(config)?;
    editor.set_helper(Some(ShellHelper::new(
        registry.tree(&session.store),
        rt.handle().clone(),
    )));

    if let Some(path) = &history {
        if let Err(e) = editor.load_history(path) {
            debug!(path = %path.display(), error = %e, "no shell history loaded");
        }
    }

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);
                match execute(rt, registry, session, line) {
                    Ok(Flow::Exit) => break,
                    Ok(Flow::Continue) => {}
                    Err(e) => report(&e),
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => {
                println!("Bye!");
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    if let Some(path) = &history {
        if let Err(e) = editor.save_history(path) {
            warn!(path = %path.display(), error = %e, "failed to save shell history");
        }
    }
    Ok(())
}
