use std::io::{Write, stdout};
use std::sync::Arc;

use crossterm::cursor::{MoveDown, MoveToColumn, MoveUp};
use crossterm::queue;
use crossterm::style::{Print, Stylize};
use crossterm::terminal::{Clear, ClearType};

use clashctl_config::ConfigStore;
use clashctl_core::ping::{PingOptions, PingState, ping_all};
use clashctl_core::providers::ServerNameProvider;
use clashctl_core::CommandNode;

use super::{Command, CommandFuture, Flow, usage};
use crate::session::Session;

pub struct NowCommand;

impl Command for NowCommand {
    fn name(&self) -> &'static str {
        "now"
    }

    fn description(&self) -> &'static str {
        "show the selected server"
    }

    fn run<'a>(&'a self, session: &'a mut Session, _args: &'a [&'a str]) -> CommandFuture<'a> {
        Box::pin(async move {
            let (name, server) = session.store.selected_server().await?;
            println!("now selected {} - {}", name.as_str().green(), server.base_url());
            Ok(Flow::Continue)
        })
    }
}

pub struct UseServerCommand;

impl Command for UseServerCommand {
    fn name(&self) -> &'static str {
        "use"
    }

    fn description(&self) -> &'static str {
        "change the selected server"
    }

    fn node(&self, store: &ConfigStore) -> CommandNode {
        CommandNode::new(self.name(), self.description())
            .with_provider(Arc::new(ServerNameProvider::new(store.clone())))
    }

    fn run<'a>(&'a self, session: &'a mut Session, args: &'a [&'a str]) -> CommandFuture<'a> {
        Box::pin(async move {
            let Some(name) = args.first() else {
                return Err(usage("use <server>"));
            };
            session.store.select_server(name).await?;
            // The listed table belongs to the previous daemon.
            session.reset_selection();
            println!("now use {}", name.green());
            Ok(Flow::Continue)
        })
    }
}

pub struct PingCommand;

fn ping_row(name: &str, state: PingState) -> String {
    let label = match state {
        PingState::Loading => "loading".to_string(),
        PingState::Success => "success".green().to_string(),
        PingState::Error => "error".red().to_string(),
    };
    format!("{name:<20} {label}")
}

impl Command for PingCommand {
    fn name(&self) -> &'static str {
        "ping"
    }

    fn description(&self) -> &'static str {
        "check which servers are alive"
    }

    fn run<'a>(&'a self, session: &'a mut Session, _args: &'a [&'a str]) -> CommandFuture<'a> {
        Box::pin(async move {
            let servers = session.store.load().await?.servers;
            if servers.is_empty() {
                println!("no servers configured (run `server add`)");
                return Ok(Flow::Continue);
            }
            let options = PingOptions {
                min_display: session.ping_min_display,
                ..PingOptions::default()
            };

            // Rows are printed once, then rewritten in place as results arrive.
            let total = servers.len();
            let mut out = stdout();
            ping_all(&servers, options, |index, name, state| {
                let row = ping_row(name, state);
                if state == PingState::Loading {
                    let _ = writeln!(out, "{row}");
                } else {
                    let up = u16::try_from(total - index).unwrap_or(u16::MAX);
                    let _ = queue!(
                        out,
                        MoveUp(up),
                        MoveToColumn(0),
                        Clear(ClearType::CurrentLine),
                        Print(row),
                        MoveDown(up),
                        MoveToColumn(0)
                    );
                }
                let _ = out.flush();
            })
            .await;
            Ok(Flow::Continue)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clashctl_config::ServerConfig;
    use clashctl_test_utils::{TestConfigBuilder, TestStore};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ping_row_loading_is_plain() {
        assert_eq!(ping_row("us1", PingState::Loading), format!("{:<20} loading", "us1"));
    }

    #[tokio::test]
    async fn test_use_switches_and_forgets_table() {
        let config = TestConfigBuilder::new()
            .server("us1", ServerConfig::new("10.0.0.1", 9090))
            .server("jp2", ServerConfig::new("10.0.0.2", 9090))
            .selected("us1")
            .build();
        let fixture = TestStore::with_config(&config).await;
        let mut session = Session::new(fixture.store.clone());

        UseServerCommand.run(&mut session, &["jp2"]).await.unwrap();
        assert_eq!(fixture.store.load().await.unwrap().selected, "jp2");
        assert!(session.selection.current().is_none());

        let err = UseServerCommand
            .run(&mut session, &["nope"])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("nope"));
        assert_eq!(fixture.store.load().await.unwrap().selected, "jp2");
    }

    #[tokio::test]
    async fn test_now_without_selection() {
        let fixture = TestStore::empty().await;
        let mut session = Session::new(fixture.store.clone());
        assert!(NowCommand.run(&mut session, &[]).await.is_err());
    }
}
