use crossterm::style::{Color, Stylize};

use clashctl_config::ConfigStore;
use clashctl_core::{CommandNode, Mode};

use super::{Command, CommandFuture, Flow};
use crate::session::Session;

pub struct ModeCommand;

/// `direct` yellow, `global` red, everything else green.
fn mode_color(mode: &str) -> Color {
    match mode {
        "direct" => Color::Yellow,
        "global" => Color::Red,
        _ => Color::Green,
    }
}

impl Command for ModeCommand {
    fn name(&self) -> &'static str {
        "mode"
    }

    fn description(&self) -> &'static str {
        "show or change the routing mode"
    }

    fn node(&self, _store: &ConfigStore) -> CommandNode {
        CommandNode::new(self.name(), self.description()).with_children(
            Mode::ALL
                .iter()
                .map(|mode| CommandNode::new(mode.as_str(), format!("set as mode - {mode}")))
                .collect(),
        )
    }

    fn run<'a>(&'a self, session: &'a mut Session, args: &'a [&'a str]) -> CommandFuture<'a> {
        Box::pin(async move {
            match args.first() {
                None => {
                    let client = session.client().await?;
                    let mode = client.mode().await?.mode;
                    let color = mode_color(&mode);
                    println!("current mode: {}", mode.with(color));
                }
                Some(raw) => {
                    let mode: Mode = raw.parse()?;
                    let client = session.client().await?;
                    client.set_mode(mode).await?;
                    tracing::info!(%mode, "mode changed");
                    println!("{}", format!("proxy mode is now {mode}").green());
                }
            }
            Ok(Flow::Continue)
        })
    }
}
