use super::{Command, CommandFuture, Flow};
use crate::session::Session;

pub struct HelpCommand {
    entries: Vec<(&'static str, &'static str)>,
}

impl HelpCommand {
    pub const NAME: &'static str = "help";
    pub const DESCRIPTION: &'static str = "list available commands";

    pub fn new(entries: Vec<(&'static str, &'static str)>) -> Self {
        Self { entries }
    }

    fn render(&self) -> String {
        let width = self.entries.iter().map(|(n, _)| n.len()).max().unwrap_or(0);
        self.entries
            .iter()
            .map(|(name, description)| format!("  {name:<width$}  {description}\n"))
            .collect()
    }
}

impl Command for HelpCommand {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn run<'a>(&'a self, _session: &'a mut Session, _args: &'a [&'a str]) -> CommandFuture<'a> {
        Box::pin(async move {
            print!("{}", self.render());
            Ok(Flow::Continue)
        })
    }
}

pub struct ExitCommand;

impl ExitCommand {
    pub const NAME: &'static str = "exit";
    pub const DESCRIPTION: &'static str = "leave the shell";
}

impl Command for ExitCommand {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn run<'a>(&'a self, _session: &'a mut Session, _args: &'a [&'a str]) -> CommandFuture<'a> {
        Box::pin(async move {
            println!("Bye!");
            Ok(Flow::Exit)
        })
    }
}
