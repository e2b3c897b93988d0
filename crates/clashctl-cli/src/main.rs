#![deny(unsafe_code)]

//! Interactive shell for a Clash-compatible proxy daemon.

mod commands;
mod form;
mod helper;
mod session;
mod shell;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::style::Stylize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use clashctl_config::{ConfigStore, CtlConfig};
use clashctl_core::build_info;

use crate::commands::CommandRegistry;
use crate::session::Session;

/// Shell history file, next to the config file.
const HISTORY_FILE_NAME: &str = "ctl_history";

/// Manage a Clash daemon's proxies, mode and servers.
#[derive(Parser)]
#[command(name = "clashctl", about, long_about = None, disable_version_flag = true)]
struct Cli {
    /// Path to configuration file [default: ~/.config/clash/ctl.toml].
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print version information.
    #[arg(short = 'V', long)]
    version: bool,

    /// Run one shell command (e.g. `proxy ls`) and exit.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

/// Filter from `-v` count, falling back to the config file's level.
fn log_filter(verbose: u8, config_level: &str) -> String {
    match verbose {
        0 => config_level.to_string(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

fn init_tracing(filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            shell::report(&e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    if cli.version {
        println!("clashctl {}", build_info::version_string());
        return Ok(ExitCode::SUCCESS);
    }

    let path = match cli.config {
        Some(path) => path,
        None => ConfigStore::default_path()?,
    };
    let store = ConfigStore::new(path);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(store.init())?;

    // A broken file must not keep the shell from starting; commands that
    // need it report the error themselves.
    let config = rt.block_on(store.load()).unwrap_or_else(|e| {
        eprintln!("{}", format!("warning: {e}").yellow());
        CtlConfig::default()
    });

    init_tracing(&log_filter(cli.verbose, &config.logging.level));
    debug!(version = %build_info::version_string(), config = %store.path().display(), "starting");

    let history = store.path().parent().map(|dir| dir.join(HISTORY_FILE_NAME));
    let mut session = Session::new(store)
        .with_ping_min_display(Duration::from_millis(config.ui.ping_min_display_ms));
    let registry = CommandRegistry::with_defaults();

    if !cli.command.is_empty() {
        let line = cli.command.join(" ");
        return Ok(match shell::execute(&rt, &registry, &mut session, &line) {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                shell::report(&e);
                ExitCode::FAILURE
            }
        });
    }

    shell::run(&rt, &registry, &mut session, history)?;
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_log_filter() {
        assert_eq!(log_filter(0, "warn"), "warn");
        assert_eq!(log_filter(0, "error"), "error");
        assert_eq!(log_filter(1, "warn"), "info");
        assert_eq!(log_filter(2, "warn"), "debug");
        assert_eq!(log_filter(7, "warn"), "trace");
    }

    #[test]
    fn test_trailing_command() {
        let cli = Cli::parse_from(["clashctl", "-v", "proxy", "use", "3"]);
        assert_eq!(cli.verbose, 1);
        assert_eq!(cli.command, vec!["proxy", "use", "3"]);
    }

    #[test]
    fn test_no_command_means_shell() {
        let cli = Cli::parse_from(["clashctl", "--config", "/tmp/x.toml"]);
        assert!(cli.command.is_empty());
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/x.toml")));
    }
}
