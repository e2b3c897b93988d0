//! Proxy catalog: the daemon's proxy map and group lookup.

use std::collections::BTreeMap;

use crate::client::DaemonClient;
use crate::error::CtlError;
use crate::types::{GLOBAL_GROUP, Proxy};

/// Decoded proxy map keyed by name, iterated in name order.
pub type Catalog = BTreeMap<String, Proxy>;

/// Read access to the daemon's proxies.
pub struct ProxyCatalog<'a> {
    client: &'a DaemonClient,
}

impl<'a> ProxyCatalog<'a> {
    pub fn new(client: &'a DaemonClient) -> Self {
        Self { client }
    }

    /// Fetch every proxy and group.
    pub async fn fetch_all(&self) -> Result<Catalog, CtlError> {
        let mut proxies = self.client.proxies().await?.proxies;
        for (name, proxy) in proxies.iter_mut() {
            if proxy.name.is_empty() {
                proxy.name.clone_from(name);
            }
        }
        Ok(proxies)
    }

    /// Fetch one group by name.
    pub async fn fetch_group(&self, name: &str) -> Result<Proxy, CtlError> {
        match self.client.proxy(name).await {
            Err(CtlError::NotFound(_)) => Err(CtlError::NotFound(format!("group `{name}`"))),
            other => other,
        }
    }

    /// Fetch the catalog and return the rule selector group.
    pub async fn resolve_selector_members(&self) -> Result<Proxy, CtlError> {
        let catalog = self.fetch_all().await?;
        find_selector(&catalog).cloned()
    }
}

/// The first `Selector` group that is not [`GLOBAL_GROUP`].
///
/// Only one current selector is supported: every table, `use`, and benchmark
/// operates on this group.
pub fn find_selector(catalog: &Catalog) -> Result<&Proxy, CtlError> {
    catalog
        .values()
        .find(|proxy| proxy.is_selector() && proxy.name != GLOBAL_GROUP)
        .ok_or(CtlError::NoSelectorFound)
}

/// Every `Selector` group, including [`GLOBAL_GROUP`].
pub fn selector_groups(catalog: &Catalog) -> impl Iterator<Item = &Proxy> {
    catalog.values().filter(|proxy| proxy.is_selector())
}
