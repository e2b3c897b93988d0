//! Selection table: the indexed view of the current selector group.
//!
//! A [`SelectionTable`] is a snapshot: the selector group plus its members
//! sorted by latest delay. [`SelectionState`] holds the snapshot the user
//! last saw, so that `use <id>` resolves the index against exactly the
//! ordering that was rendered. The snapshot only changes through
//! [`SelectionState::build`] (directly, or at the end of a benchmark).

use tracing::{debug, info};

use crate::bench::{BenchmarkEngine, ProbeOutcome};
use crate::catalog::{Catalog, ProxyCatalog, find_selector};
use crate::client::DaemonClient;
use crate::error::CtlError;
use crate::render::{Cell, DelayClass, TextTable};
use crate::types::Proxy;

/// Maximum number of rows rendered for one table.
pub const MAX_RENDERED: usize = 60;

/// Sort key for a delay: `0` (no successful probe) sorts after every real value.
pub fn delay_sort_key(delay: u64) -> u64 {
    if delay == 0 { u64::MAX } else { delay }
}

/// Stable sort by ascending latest delay, unknown delays last.
pub fn sort_by_delay(members: &mut [Proxy]) {
    members.sort_by_key(|proxy| delay_sort_key(proxy.latest_delay()));
}

/// Parse a user-supplied table index. A missing index means `0`.
pub fn parse_id(input: Option<&str>) -> Result<i64, CtlError> {
    match input {
        None => Ok(0),
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| CtlError::Validation(format!("id must be an integer, got {raw:?}"))),
    }
}

/// Snapshot of one selector group and its delay-sorted members.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionTable {
    selector: Proxy,
    members: Vec<Proxy>,
}

impl SelectionTable {
    /// Build from a fetched catalog.
    ///
    /// Members the catalog does not contain are kept as placeholders so the
    /// table still shows them.
    pub fn from_catalog(catalog: &Catalog) -> Result<Self, CtlError> {
        let selector = find_selector(catalog)?.clone();
        let mut members: Vec<Proxy> = selector
            .all
            .iter()
            .map(|name| {
                catalog.get(name).cloned().unwrap_or_else(|| {
                    debug!(member = %name, group = %selector.name, "member missing from catalog");
                    Proxy::missing(name.as_str())
                })
            })
            .collect();
        sort_by_delay(&mut members);
        Ok(Self { selector, members })
    }

    pub fn selector(&self) -> &Proxy {
        &self.selector
    }

    pub fn members(&self) -> &[Proxy] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Member at `id`. Zero and negative ids resolve to the first member.
    pub fn member(&self, id: i64) -> Result<&Proxy, CtlError> {
        let index = usize::try_from(id.max(0)).unwrap_or(usize::MAX);
        self.members.get(index).ok_or(CtlError::OutOfRange {
            id: index,
            len: self.members.len(),
        })
    }

    /// Displayable rows, capped at [`MAX_RENDERED`].
    pub fn rows(&self) -> Vec<SelectionRow> {
        self.members
            .iter()
            .take(MAX_RENDERED)
            .enumerate()
            .map(|(id, proxy)| SelectionRow {
                id,
                active: proxy.name == self.selector.now,
                group: self.selector.name.clone(),
                name: proxy.name.clone(),
                now: proxy.now.clone(),
                delay: proxy.latest_delay(),
            })
            .collect()
    }

    /// Render as a text table.
    pub fn to_text_table(&self) -> TextTable {
        let mut table = TextTable::new(["Id", "Selector", "Proxy Name", "Delay"]);
        for row in self.rows() {
            let class = DelayClass::classify(row.delay);
            table.push_row(vec![
                Cell::new(row.id_label()),
                Cell::new(row.group.as_str()),
                Cell::new(row.name_label()),
                Cell::colored(DelayClass::label(row.delay), class.color()),
            ]);
        }
        table
    }
}

/// One rendered row of a [`SelectionTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRow {
    pub id: usize,
    /// Whether this member is the group's active member.
    pub active: bool,
    pub group: String,
    pub name: String,
    /// The member's own active member, if it is a group itself.
    pub now: String,
    pub delay: u64,
}

impl SelectionRow {
    pub fn id_label(&self) -> String {
        if self.active {
            format!("{} <-", self.id)
        } else {
            self.id.to_string()
        }
    }

    pub fn name_label(&self) -> String {
        if self.now.is_empty() {
            self.name.clone()
        } else {
            format!("{} --> {}", self.name, self.now)
        }
    }
}

/// Result of a benchmark: per-probe outcomes and the refreshed table.
#[derive(Debug)]
pub struct BenchmarkReport {
    pub outcomes: Vec<ProbeOutcome>,
    pub table: TextTable,
}

/// The snapshot most recently built for the user.
#[derive(Debug, Default)]
pub struct SelectionState {
    current: Option<SelectionTable>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot, if one was built.
    pub fn current(&self) -> Option<&SelectionTable> {
        self.current.as_ref()
    }

    fn table(&self) -> Result<&SelectionTable, CtlError> {
        self.current.as_ref().ok_or(CtlError::NotInitialized)
    }

    /// Fetch a fresh catalog and replace the snapshot.
    ///
    /// On failure the previous snapshot is kept.
    pub async fn build(&mut self, client: &DaemonClient) -> Result<&SelectionTable, CtlError> {
        let catalog = ProxyCatalog::new(client).fetch_all().await?;
        let table = SelectionTable::from_catalog(&catalog)?;
        info!(
            group = %table.selector.name,
            members = table.len(),
            "selection table built"
        );
        Ok(self.current.insert(table))
    }

    /// Render the current snapshot.
    pub fn render(&self) -> Result<TextTable, CtlError> {
        Ok(self.table()?.to_text_table())
    }

    /// Switch the group's active member to the proxy at `id`.
    ///
    /// The index is checked before any request is sent. The snapshot is not
    /// modified; its `now` marker updates on the next build.
    pub async fn use_member(&self, client: &DaemonClient, id: i64) -> Result<Proxy, CtlError> {
        let table = self.table()?;
        let proxy = table.member(id)?;
        client
            .select_proxy(&table.selector.name, &proxy.name)
            .await?;
        info!(group = %table.selector.name, proxy = %proxy.name, "proxy switched");
        Ok(proxy.clone())
    }

    /// Probe every member of the current snapshot, then rebuild and render.
    ///
    /// `on_probe` is called once per finished probe, in completion order.
    pub async fn benchmark<F>(
        &mut self,
        client: &DaemonClient,
        engine: &BenchmarkEngine,
        on_probe: F,
    ) -> Result<BenchmarkReport, CtlError>
    where
        F: FnMut(&ProbeOutcome),
    {
        let mut members = self.table()?.members.clone();
        let outcomes = engine.run(client, &mut members, on_probe).await;
        info!(
            probed = outcomes.len(),
            succeeded = outcomes.iter().filter(|o| o.result.is_ok()).count(),
            "benchmark finished"
        );
        let table = self.build(client).await?.to_text_table();
        Ok(BenchmarkReport { outcomes, table })
    }
}
