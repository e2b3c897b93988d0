//! Interactive `server add` form.
//!
//! Each field is asked until its validator accepts the answer. Ctrl-C or
//! Ctrl-D at any prompt cancels the whole form.

use crossterm::style::Stylize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use clashctl_config::{ConfigError, CtlConfig, ServerConfig, form};

/// Source of answers for the form.
pub trait Prompter {
    /// One line of input, or `None` when the user cancelled.
    fn ask(&mut self, label: &str) -> anyhow::Result<Option<String>>;

    /// Show a rejected answer's reason.
    fn reject(&mut self, reason: &str);
}

/// Prompts on the terminal.
pub struct TerminalPrompter {
    editor: DefaultEditor,
}

impl TerminalPrompter {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl Prompter for TerminalPrompter {
    fn ask(&mut self, label: &str) -> anyhow::Result<Option<String>> {
        match self.editor.readline(&format!("{label}: ")) {
            Ok(line) => Ok(Some(line.trim().to_string())),
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn reject(&mut self, reason: &str) {
        println!("{}", reason.red());
    }
}

/// Ask until `parse` accepts; `None` when cancelled.
fn field<P, T, F>(prompter: &mut P, label: &str, mut parse: F) -> anyhow::Result<Option<T>>
where
    P: Prompter + ?Sized,
    F: FnMut(&str) -> Result<T, ConfigError>,
{
    loop {
        let Some(answer) = prompter.ask(label)? else {
            return Ok(None);
        };
        match parse(&answer) {
            Ok(value) => return Ok(Some(value)),
            Err(e) => prompter.reject(&e.to_string()),
        }
    }
}

/// Run the form. Returns the new server's name and settings, or `None`
/// when the user cancelled.
pub fn read_server<P: Prompter + ?Sized>(
    prompter: &mut P,
    config: &CtlConfig,
) -> anyhow::Result<Option<(String, ServerConfig)>> {
    let Some(name) = field(prompter, "server name", |s| {
        form::validate_name(s, config).map(|()| s.to_string())
    })?
    else {
        return Ok(None);
    };
    let Some(host) = field(prompter, "server address", |s| {
        form::validate_host(s).map(|()| s.to_string())
    })?
    else {
        return Ok(None);
    };
    let Some(port) = field(prompter, "server port", form::parse_port)? else {
        return Ok(None);
    };
    let Some(secret) = field(prompter, "server secret", |s| Ok(s.to_string()))? else {
        return Ok(None);
    };
    let Some(https) = field(prompter, "API is HTTPS? [y/N]", form::parse_https)? else {
        return Ok(None);
    };

    let server = ServerConfig::new(host, port)
        .with_secret(secret)
        .with_https(https);
    Ok(Some((name, server)))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;

    use super::*;
    use pretty_assertions::assert_eq;

    /// Replays scripted answers; runs out as a cancel.
    pub(crate) struct Scripted {
        answers: VecDeque<String>,
        pub rejections: Vec<String>,
    }

    impl Scripted {
        pub(crate) fn new(answers: &[&str]) -> Self {
            Self {
                answers: answers.iter().map(|s| s.to_string()).collect(),
                rejections: Vec::new(),
            }
        }
    }

    impl Prompter for Scripted {
        fn ask(&mut self, _label: &str) -> anyhow::Result<Option<String>> {
            Ok(self.answers.pop_front())
        }

        fn reject(&mut self, reason: &str) {
            self.rejections.push(reason.to_string());
        }
    }

    #[test]
    fn test_form_reprompts_invalid_fields() {
        let mut config = CtlConfig::default();
        config
            .servers
            .insert("home".to_string(), ServerConfig::new("10.0.0.1", 9090));

        let mut prompter = Scripted::new(&[
            "", "home", "office", // name: empty, duplicate, ok
            "10.0.0.2",           // host
            "http", "0", "9090",  // port: text, zero, ok
            "",                   // secret
            "maybe", "Y",         // https
        ]);
        let (name, server) = read_server(&mut prompter, &config).unwrap().unwrap();

        assert_eq!(name, "office");
        assert_eq!(server, ServerConfig::new("10.0.0.2", 9090).with_https(true));
        assert_eq!(prompter.rejections.len(), 5);
    }

    #[test]
    fn test_form_cancel() {
        let mut prompter = Scripted::new(&["office", "10.0.0.2"]);
        let out = read_server(&mut prompter, &CtlConfig::default()).unwrap();
        assert!(out.is_none());
    }
}
