use std::sync::Arc;

use crossterm::style::Stylize;

use clashctl_config::ConfigStore;
use clashctl_core::providers::{ProxySetProvider, decode_label};
use clashctl_core::render::MARK_OK;
use clashctl_core::selection::parse_id;
use clashctl_core::{CommandNode, CtlError, ProbeOutcome};

use super::{Command, CommandFuture, Flow, usage};
use crate::session::Session;

const USAGE: &str = "proxy <ls | use [id] | bench | set <group> <member>>";

pub struct ProxyCommand;

impl Command for ProxyCommand {
    fn name(&self) -> &'static str {
        "proxy"
    }

    fn description(&self) -> &'static str {
        "manage proxies of the selected server"
    }

    fn node(&self, store: &ConfigStore) -> CommandNode {
        CommandNode::new(self.name(), self.description()).with_children(vec![
            CommandNode::new("ls", "list proxies of the rule selector with ids"),
            CommandNode::new("use", "switch the selector to the proxy with this id"),
            CommandNode::new("bench", "probe the latency of every listed proxy"),
            CommandNode::new("set", "set a group's active proxy by name")
                .with_provider(Arc::new(ProxySetProvider::new(store.clone()))),
        ])
    }

    fn run<'a>(&'a self, session: &'a mut Session, args: &'a [&'a str]) -> CommandFuture<'a> {
        Box::pin(async move {
            match args {
                ["ls", ..] => list(session).await?,
                ["use", rest @ ..] => use_id(session, rest.first().copied()).await?,
                ["bench", ..] => bench(session).await?,
                ["set", group, member, ..] => set(session, group, member).await?,
                _ => return Err(usage(USAGE)),
            }
            Ok(Flow::Continue)
        })
    }
}

async fn list(session: &mut Session) -> anyhow::Result<()> {
    let client = session.client().await?;
    let table = session.selection.build(&client).await?;
    print!("{}", table.to_text_table().render());
    Ok(())
}

async fn use_id(session: &mut Session, raw: Option<&str>) -> anyhow::Result<()> {
    let id = parse_id(raw)?;
    if session.selection.current().is_none() {
        return Err(CtlError::NotInitialized.into());
    }
    let client = session.client().await?;
    let proxy = session.selection.use_member(&client, id).await?;
    println!("{} now using {}", MARK_OK.green(), proxy.name.as_str().green());
    Ok(())
}

/// One result line for a finished probe.
fn probe_line(outcome: &ProbeOutcome) -> String {
    match &outcome.result {
        Ok(delay) => format!("{} {}", outcome.name, format!("{delay}ms").green()),
        Err(e) => format!("{} {}", outcome.name, e.to_string().red()),
    }
}

async fn bench(session: &mut Session) -> anyhow::Result<()> {
    let Some(table) = session.selection.current() else {
        return Err(CtlError::NotInitialized.into());
    };
    let total = table.len();
    let client = session.client().await?;
    let engine = session.engine.clone();

    let report = session
        .selection
        .benchmark(&client, &engine, |outcome| println!("{}", probe_line(outcome)))
        .await?;

    let failed = report.outcomes.iter().filter(|o| !o.is_success()).count();
    if failed > 0 {
        println!("{}", format!("{failed} of {total} probes failed").yellow());
    }
    print!("{}", report.table.render());
    Ok(())
}

async fn set(session: &mut Session, group: &str, member: &str) -> anyhow::Result<()> {
    let (group, member) = (decode_label(group), decode_label(member));
    let client = session.client().await?;
    client.select_proxy(&group, &member).await?;
    println!(
        "{} {} now using {}",
        MARK_OK.green(),
        group.as_str().bold(),
        member.as_str().green()
    );
    Ok(())
}
