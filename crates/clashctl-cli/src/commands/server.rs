use std::sync::Arc;

use crossterm::style::Stylize;

use clashctl_config::{ConfigStore, CtlConfig};
use clashctl_core::providers::ServerNameProvider;
use clashctl_core::render::{Cell, TextTable};
use clashctl_core::CommandNode;

use super::{Command, CommandFuture, Flow, usage};
use crate::form::{self, Prompter, TerminalPrompter};
use crate::session::Session;

const USAGE: &str = "server <ls | add | rm <name>>";

/// Shown in place of a configured secret.
const SECRET_MASK: &str = "******";

pub struct ServerCommand;

fn server_table(config: &CtlConfig) -> TextTable {
    let mut table = TextTable::new(["Name", "Address", "Port", "Secret", "HTTPS"]);
    for (name, server) in &config.servers {
        let name = if *name == config.selected {
            Cell::colored(format!("{name} <-"), crossterm::style::Color::Green)
        } else {
            Cell::new(name.as_str())
        };
        table.push_row(vec![
            name,
            Cell::new(server.host.as_str()),
            Cell::new(server.port.to_string()),
            Cell::new(if server.secret.is_some() { SECRET_MASK } else { "" }),
            Cell::new(server.https.to_string()),
        ]);
    }
    table
}

async fn add<P: Prompter + ?Sized>(store: &ConfigStore, prompter: &mut P) -> anyhow::Result<()> {
    let config = store.load().await?;
    let Some((name, server)) = form::read_server(prompter, &config)? else {
        println!("cancelled");
        return Ok(());
    };
    store.add_server(&name, server).await?;
    tracing::info!(server = %name, "server added");
    println!("server `{}` added", name.as_str().green());
    Ok(())
}

impl Command for ServerCommand {
    fn name(&self) -> &'static str {
        "server"
    }

    fn description(&self) -> &'static str {
        "manage configured daemon servers"
    }

    fn node(&self, store: &ConfigStore) -> CommandNode {
        CommandNode::new(self.name(), self.description()).with_children(vec![
            CommandNode::new("ls", "list configured servers"),
            CommandNode::new("add", "add a server interactively"),
            CommandNode::new("rm", "remove a server")
                .with_provider(Arc::new(ServerNameProvider::new(store.clone()))),
        ])
    }

    fn run<'a>(&'a self, session: &'a mut Session, args: &'a [&'a str]) -> CommandFuture<'a> {
        Box::pin(async move {
            match args {
                ["ls", ..] => {
                    let config = session.store.load().await?;
                    print!("{}", server_table(&config).render());
                }
                ["add", ..] => {
                    let mut prompter = TerminalPrompter::new()?;
                    add(&session.store, &mut prompter).await?;
                }
                ["rm", name, ..] => {
                    session.store.remove_server(name).await?;
                    println!("server `{name}` removed");
                }
                _ => return Err(usage(USAGE)),
            }
            Ok(Flow::Continue)
        })
    }
}
