//! Command registry and dispatch.
//!
//! Each root command implements [`Command`] and contributes its own subtree
//! to the completion tree, so the words the shell completes and the words it
//! executes come from the same registration.

mod meta;
mod misc;
mod mode;
mod proxy;
mod server;
mod stats;

use std::future::Future;
use std::pin::Pin;

use clashctl_config::ConfigStore;
use clashctl_core::{CommandNode, CommandTree, CtlError};

use crate::session::Session;

pub use meta::{ExitCommand, HelpCommand};
pub use misc::{NowCommand, PingCommand, UseServerCommand};
pub use mode::ModeCommand;
pub use proxy::ProxyCommand;
pub use server::ServerCommand;
pub use stats::{ConnectionsCommand, TrafficCommand};

/// Boxed future returned by [`Command::run`]. Commands run on the shell
/// thread, so the future need not be `Send`.
pub type CommandFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<Flow>> + 'a>>;

/// What the shell does after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// A root-level shell command.
pub trait Command {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Completion subtree rooted at this command.
    fn node(&self, _store: &ConfigStore) -> CommandNode {
        CommandNode::new(self.name(), self.description())
    }

    /// Execute with the tokens after the command name.
    fn run<'a>(&'a self, session: &'a mut Session, args: &'a [&'a str]) -> CommandFuture<'a>;
}

/// Root commands in completion order.
pub struct CommandRegistry {
    commands: Vec<Box<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Every built-in command.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ProxyCommand));
        registry.register(Box::new(ModeCommand));
        registry.register(Box::new(NowCommand));
        registry.register(Box::new(PingCommand));
        registry.register(Box::new(TrafficCommand));
        registry.register(Box::new(ConnectionsCommand));
        registry.register(Box::new(ServerCommand));
        registry.register(Box::new(UseServerCommand));

        let mut entries = registry.list();
        entries.push((HelpCommand::NAME, HelpCommand::DESCRIPTION));
        entries.push((ExitCommand::NAME, ExitCommand::DESCRIPTION));
        registry.register(Box::new(HelpCommand::new(entries)));
        registry.register(Box::new(ExitCommand));
        registry
    }

    /// Register a command. A later registration with the same name replaces
    /// the earlier one in place.
    pub fn register(&mut self, command: Box<dyn Command>) {
        match self.commands.iter_mut().find(|c| c.name() == command.name()) {
            Some(slot) => *slot = command,
            None => self.commands.push(command),
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
    }

    /// `(name, description)` of every command, in registration order.
    pub fn list(&self) -> Vec<(&'static str, &'static str)> {
        self.commands
            .iter()
            .map(|c| (c.name(), c.description()))
            .collect()
    }

    /// Completion tree over every registered command.
    pub fn tree(&self, store: &ConfigStore) -> CommandTree {
        CommandTree::new(self.commands.iter().map(|c| c.node(store)).collect())
    }

    /// Run one input line.
    pub async fn dispatch(&self, session: &mut Session, line: &str) -> anyhow::Result<Flow> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((name, args)) = tokens.split_first() else {
            return Ok(Flow::Continue);
        };
        let command = self.get(name).ok_or_else(|| {
            CtlError::Validation(format!("unknown command `{name}` (try `help`)"))
        })?;
        tracing::debug!(command = name, args = args.len(), "dispatching");
        command.run(session, args).await
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A usage error for `command`.
pub(crate) fn usage(text: &str) -> anyhow::Error {
    CtlError::Validation(format!("usage: {text}")).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clashctl_test_utils::TestStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_root_order() {
        let registry = CommandRegistry::with_defaults();
        let names: Vec<_> = registry.list().into_iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            vec![
                "proxy",
                "mode",
                "now",
                "ping",
                "traffic",
                "connections",
                "server",
                "use",
                "help",
                "exit"
            ]
        );
    }

    #[test]
    fn test_tree_children() {
        let registry = CommandRegistry::with_defaults();
        let tree = registry.tree(&ConfigStore::new("/nonexistent/ctl.toml"));
        let child_labels = |name: &str| -> Vec<String> {
            tree.root()
                .iter()
                .find(|n| n.label == name)
                .map(|n| n.children.iter().map(|c| c.label.clone()).collect())
                .unwrap_or_default()
        };
        assert_eq!(child_labels("proxy"), vec!["ls", "use", "bench", "set"]);
        assert_eq!(child_labels("mode"), vec!["rule", "global", "direct"]);
        assert_eq!(child_labels("server"), vec!["ls", "add", "rm"]);

        let use_node = tree.root().iter().find(|n| n.label == "use").unwrap();
        assert!(use_node.provider.is_some());
    }

    #[tokio::test]
    async fn test_dispatch_blank_and_unknown() {
        let fixture = TestStore::empty().await;
        let registry = CommandRegistry::with_defaults();
        let mut session = Session::new(fixture.store.clone());

        assert_eq!(
            registry.dispatch(&mut session, "   ").await.unwrap(),
            Flow::Continue
        );
        let err = registry
            .dispatch(&mut session, "frobnicate now")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unknown command `frobnicate`"));
    }

    #[tokio::test]
    async fn test_exit_flow() {
        let fixture = TestStore::empty().await;
        let registry = CommandRegistry::with_defaults();
        let mut session = Session::new(fixture.store.clone());
        assert_eq!(
            registry.dispatch(&mut session, "exit").await.unwrap(),
            Flow::Exit
        );
    }

    #[test]
    fn test_register_replaces_by_name() {
        let mut registry = CommandRegistry::new();
        registry.register(Box::new(ExitCommand));
        registry.register(Box::new(ExitCommand));
        assert_eq!(registry.list().len(), 1);
    }
}
