//! Dynamic completion sources backed by the config file and the daemon.
//!
//! Both providers read fresh state on every call, so suggestions follow
//! `server add`/`server rm` and daemon-side changes without restarting.

use tracing::debug;

use clashctl_config::ConfigStore;

use crate::BoxFuture;
use crate::catalog::{ProxyCatalog, selector_groups};
use crate::client::DaemonClient;
use crate::error::CtlError;
use crate::tree::{ChildProvider, CommandNode};

/// Encode spaces so a name survives whitespace tokenization.
pub fn encode_label(name: &str) -> String {
    name.replace(' ', "%20")
}

/// Reverse of [`encode_label`].
pub fn decode_label(label: &str) -> String {
    label.replace("%20", " ")
}

/// Suggests configured server names for the first parameter.
#[derive(Debug, Clone)]
pub struct ServerNameProvider {
    store: ConfigStore,
}

impl ServerNameProvider {
    pub fn new(store: ConfigStore) -> Self {
        Self { store }
    }
}

impl ChildProvider for ServerNameProvider {
    fn children<'a>(&'a self, params: &'a [&'a str]) -> BoxFuture<'a, (usize, Vec<CommandNode>)> {
        Box::pin(async move {
            if params.len() > 1 {
                return (0, Vec::new());
            }
            match self.store.load().await {
                Ok(config) => (
                    1,
                    config
                        .server_names()
                        .into_iter()
                        .map(CommandNode::leaf)
                        .collect(),
                ),
                Err(e) => {
                    debug!(error = %e, "server name completion unavailable");
                    (0, Vec::new())
                }
            }
        })
    }
}

/// Suggests selector groups, then the chosen group's members.
#[derive(Debug, Clone)]
pub struct ProxySetProvider {
    store: ConfigStore,
}

impl ProxySetProvider {
    pub fn new(store: ConfigStore) -> Self {
        Self { store }
    }

    async fn groups(&self) -> Result<Vec<CommandNode>, CtlError> {
        let client = DaemonClient::for_selected(&self.store).await?;
        let catalog = ProxyCatalog::new(&client).fetch_all().await?;
        Ok(selector_groups(&catalog)
            .map(|group| {
                CommandNode::new(
                    encode_label(&group.name),
                    format!("select `{}` now", group.now),
                )
            })
            .collect())
    }

    async fn members(&self, group: &str) -> Result<Vec<CommandNode>, CtlError> {
        let client = DaemonClient::for_selected(&self.store).await?;
        let group = ProxyCatalog::new(&client)
            .fetch_group(&decode_label(group))
            .await?;
        Ok(group
            .all
            .iter()
            .map(|member| CommandNode::leaf(encode_label(member)))
            .collect())
    }
}

impl ChildProvider for ProxySetProvider {
    fn children<'a>(&'a self, params: &'a [&'a str]) -> BoxFuture<'a, (usize, Vec<CommandNode>)> {
        Box::pin(async move {
            let nodes = match params {
                [_] => self.groups().await,
                [group, _] => self.members(group).await,
                _ => Ok(Vec::new()),
            };
            match nodes {
                Ok(mut nodes) => {
                    nodes.sort_by(|a, b| a.label.cmp(&b.label));
                    (params.len(), nodes)
                }
                Err(e) => {
                    debug!(error = %e, "proxy completion unavailable");
                    (0, Vec::new())
                }
            }
        })
    }
}
