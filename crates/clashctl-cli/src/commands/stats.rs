use std::io::{Write, stdout};

use chrono::{DateTime, Utc};
use crossterm::cursor::MoveToColumn;
use crossterm::queue;
use crossterm::style::{Print, Stylize};
use crossterm::terminal::{Clear, ClearType};

use clashctl_core::TrafficStream;
use clashctl_core::render::{Cell, TextTable, format_bytes, format_duration};
use clashctl_core::types::{Connection, Traffic};

use super::{Command, CommandFuture, Flow};
use crate::session::Session;

pub struct TrafficCommand;

fn traffic_line(frame: Traffic) -> String {
    let down = format_bytes(frame.down);
    let up = format_bytes(frame.up);
    format!(
        "Download: {}{} Upload: {}",
        down.as_str().green(),
        " ".repeat(10usize.saturating_sub(down.len())),
        up.as_str().green()
    )
}

impl Command for TrafficCommand {
    fn name(&self) -> &'static str {
        "traffic"
    }

    fn description(&self) -> &'static str {
        "stream live traffic until Ctrl-C"
    }

    fn run<'a>(&'a self, session: &'a mut Session, _args: &'a [&'a str]) -> CommandFuture<'a> {
        Box::pin(async move {
            let client = session.client().await?;
            let stream = TrafficStream::connect(&client).await?;

            let mut out = stdout();
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!(error = %e, "cannot listen for Ctrl-C");
                    std::future::pending::<()>().await;
                }
            };
            stream
                .follow(shutdown, |frame| {
                    let _ = queue!(
                        out,
                        MoveToColumn(0),
                        Clear(ClearType::CurrentLine),
                        Print(traffic_line(frame))
                    );
                    let _ = out.flush();
                })
                .await;
            println!();
            Ok(Flow::Continue)
        })
    }
}

pub struct ConnectionsCommand;

fn parse_start(start: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(start)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

/// `host:port`, bracketing IPv6 literals.
fn join_host_port(host: &str, port: &str) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

/// Rows sorted by start time, oldest first. Unparseable start times sort
/// first and show `-` as elapsed time.
fn connection_rows(mut connections: Vec<Connection>, now: DateTime<Utc>) -> TextTable {
    connections.sort_by_key(|c| parse_start(&c.start));

    let mut table = TextTable::new(["Host", "Network", "Type", "Chain", "Rule", "Time"]);
    for conn in connections {
        let meta = &conn.metadata;
        let host = if meta.host.is_empty() {
            &meta.destination_ip
        } else {
            &meta.host
        };
        let elapsed = parse_start(&conn.start)
            .and_then(|at| (now - at).to_std().ok())
            .map_or_else(|| "-".to_string(), format_duration);

        table.push_row(vec![
            Cell::new(join_host_port(host, &meta.destination_port)),
            Cell::new(meta.network.as_str()),
            Cell::new(meta.kind.as_str()),
            Cell::new(conn.chains.join(" --> ")),
            Cell::new(conn.rule.as_str()),
            Cell::new(elapsed),
        ]);
    }
    table
}

impl Command for ConnectionsCommand {
    fn name(&self) -> &'static str {
        "connections"
    }

    fn description(&self) -> &'static str {
        "list the daemon's open connections"
    }

    fn run<'a>(&'a self, session: &'a mut Session, _args: &'a [&'a str]) -> CommandFuture<'a> {
        Box::pin(async move {
            let client = session.client().await?;
            let snapshot = client.connections().await?;
            println!(
                "total download {} / upload {}",
                format_bytes(snapshot.download_total).green(),
                format_bytes(snapshot.upload_total).green()
            );
            print!("{}", connection_rows(snapshot.connections, Utc::now()).render());
            Ok(Flow::Continue)
        })
    }
}
