//! Tab completion for the shell prompt.

use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use tokio::runtime::Handle;

use clashctl_core::{CommandTree, Suggestion};

/// Completes against the command tree.
///
/// Dynamic providers are async, so completion blocks on the session's
/// runtime. This is only sound because readline runs outside of it.
pub struct ShellHelper {
    tree: CommandTree,
    handle: Handle,
}

impl ShellHelper {
    pub fn new(tree: CommandTree, handle: Handle) -> Self {
        Self { tree, handle }
    }
}

/// Byte offset where the token under the cursor starts.
pub fn token_start(before_cursor: &str) -> usize {
    before_cursor.rfind(' ').map_or(0, |i| i + 1)
}

fn to_pair(suggestion: Suggestion) -> Pair {
    let display = if suggestion.description.is_empty() {
        suggestion.text.clone()
    } else {
        format!("{:<14} {}", suggestion.text, suggestion.description)
    };
    Pair {
        display,
        replacement: suggestion.text,
    }
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let before = line.get(..pos).unwrap_or(line);
        let suggestions = self.handle.block_on(self.tree.complete(before));
        Ok((
            token_start(before),
            suggestions.into_iter().map(to_pair).collect(),
        ))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;
}

impl Highlighter for ShellHelper {}

impl Validator for ShellHelper {}

impl Helper for ShellHelper {}
